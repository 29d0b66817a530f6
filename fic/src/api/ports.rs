//! Port API implementation

use super::common::{FicApiResource, HasOperationStatus};
use super::{ApiError, Client};
use crate::operation::OperationStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive VLAN id range, written `start-end` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRange {
    pub start: i64,
    pub end: i64,
}

impl FromStr for VlanRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("VLAN range {:?} is not of the form start-end", s))?;
        let start = start
            .trim()
            .parse()
            .map_err(|_| format!("VLAN range {:?} has an invalid start", s))?;
        let end = end
            .trim()
            .parse()
            .map_err(|_| format!("VLAN range {:?} has an invalid end", s))?;
        Ok(Self { start, end })
    }
}

impl fmt::Display for VlanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Request body for creating ports. Exactly one of `number_of_vlans` and
/// `vlan_ranges` is sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePortRequest {
    pub name: String,
    pub switch_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_vlans: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_ranges: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Vlan {
    pub vid: i64,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub switch_name: String,
    #[serde(default)]
    pub port_type: String,
    #[serde(default)]
    pub is_activated: bool,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub vlan_ranges: Vec<String>,
    #[serde(default)]
    pub vlans: Vec<Vlan>,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub operation_status: OperationStatus,
}

impl Port {
    pub fn parsed_vlan_ranges(&self) -> Result<Vec<VlanRange>, ApiError> {
        self.vlan_ranges
            .iter()
            .map(|r| r.parse().map_err(ApiError::ParseError))
            .collect()
    }
}

impl FicApiResource for Port {
    const ROOT_KEY: &'static str = "port";
}

impl HasOperationStatus for Port {
    fn operation_status(&self) -> OperationStatus {
        self.operation_status.clone()
    }
}

/// Ports API
pub struct PortsApi<'a> {
    client: &'a Client,
}

impl<'a> PortsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(id: &str) -> String {
        format!("/ports/{}", id)
    }

    /// POST /ports
    pub async fn create(&self, request: &CreatePortRequest) -> Result<Port, ApiError> {
        self.client.post_resource("/ports", request).await
    }

    /// GET /ports/{id}
    pub async fn get(&self, id: &str) -> Result<Port, ApiError> {
        self.client.get_resource(&Self::path(id)).await
    }

    /// POST /ports/{id}/activate
    pub async fn activate(&self, id: &str) -> Result<Port, ApiError> {
        self.client
            .post_action(&format!("{}/activate", Self::path(id)))
            .await
    }

    /// DELETE /ports/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&Self::path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, mock_json};
    use mockito::{Matcher, Server};

    const PORT: &str = r#"{
        "port": {
            "id": "F010123456789",
            "name": "YourPortName",
            "switchName": "SwitchName",
            "portType": "1G",
            "isActivated": false,
            "vlanRanges": ["1137-1152"],
            "tenantId": "ab6e5d4e2e7a4dd4a4b6ee83bbd2d8d5",
            "area": "JPEAST",
            "location": "NTTComTokyo(NW1)",
            "vlans": [{"vid": 1137, "status": "unused"}, {"vid": 1138, "status": "used"}],
            "operationStatus": "Completed"
        }
    }"#;

    #[test]
    fn vlan_range_parses_and_formats() {
        let range: VlanRange = "1137-1152".parse().unwrap();
        assert_eq!(range, VlanRange { start: 1137, end: 1152 });
        assert_eq!(range.to_string(), "1137-1152");
    }

    #[test]
    fn vlan_range_rejects_bad_input() {
        assert!("1137".parse::<VlanRange>().is_err());
        assert!("a-b".parse::<VlanRange>().is_err());
    }

    #[tokio::test]
    async fn create_with_vlan_ranges() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/ports")
            .match_body(Matcher::Json(serde_json::json!({
                "port": {
                    "name": "YourPortName",
                    "switchName": "SwitchName",
                    "portType": "1G",
                    "vlanRanges": ["1137-1152"]
                }
            })))
            .with_status(202)
            .with_body(PORT)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let port = client
            .ports()
            .create(&CreatePortRequest {
                name: "YourPortName".into(),
                switch_name: "SwitchName".into(),
                port_type: Some("1G".into()),
                number_of_vlans: None,
                vlan_ranges: Some(vec!["1137-1152".into()]),
            })
            .await
            .unwrap();

        assert_eq!(port.id, "F010123456789");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_decodes_vlans() {
        let mut server = Server::new_async().await;
        let _m = mock_json(&mut server, "GET", "/ports/F010123456789", 200, PORT).await;

        let client = create_test_client(&server.url());
        let port = client.ports().get("F010123456789").await.unwrap();

        assert_eq!(port.vlans.len(), 2);
        assert_eq!(port.vlans[1].status, "used");
        assert_eq!(
            port.parsed_vlan_ranges().unwrap(),
            vec![VlanRange { start: 1137, end: 1152 }]
        );
    }

    #[tokio::test]
    async fn activate_posts_without_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/ports/F010123456789/activate")
            .with_status(202)
            .with_body(PORT)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let port = client.ports().activate("F010123456789").await.unwrap();
        assert_eq!(port.operation_status, OperationStatus::Completed);
        mock.assert_async().await;
    }
}
