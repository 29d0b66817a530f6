//! Firewall component API implementation

use super::common::{FicApiResource, HasOperationStatus};
use super::{ApiError, Client};
use crate::operation::OperationStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallMatch {
    #[serde(default)]
    pub source_address_sets: Vec<String>,
    #[serde(default)]
    pub destination_address_sets: Vec<String>,
    #[serde(default)]
    pub application: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FirewallEntry {
    pub name: String,
    #[serde(rename = "match", default)]
    pub match_: FirewallMatch,
    #[serde(default)]
    pub action: String,
}

/// Policy entries applied to traffic between two routing groups
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FirewallRule {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub entries: Vec<FirewallEntry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomApplication {
    pub name: String,
    pub protocol: String,
    pub destination_port: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationSet {
    pub name: String,
    #[serde(default)]
    pub applications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddressSet {
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingGroupSetting {
    pub group_name: String,
    #[serde(default)]
    pub address_sets: Vec<AddressSet>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateFirewallRequest {
    pub user_ip_addresses: Vec<String>,
}

/// Full replacement of the firewall policy
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFirewallRequest {
    pub rules: Vec<FirewallRule>,
    pub custom_applications: Vec<CustomApplication>,
    pub application_sets: Vec<ApplicationSet>,
    pub routing_group_settings: Vec<RoutingGroupSetting>,
}

impl UpdateFirewallRequest {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
            && self.custom_applications.is_empty()
            && self.application_sets.is_empty()
            && self.routing_group_settings.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Firewall {
    pub id: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub redundant: bool,
    #[serde(default)]
    pub is_activated: bool,
    #[serde(default)]
    pub user_ip_addresses: Vec<String>,
    #[serde(default)]
    pub rules: Vec<FirewallRule>,
    #[serde(default)]
    pub custom_applications: Vec<CustomApplication>,
    #[serde(default)]
    pub application_sets: Vec<ApplicationSet>,
    #[serde(default)]
    pub routing_group_settings: Vec<RoutingGroupSetting>,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub operation_status: OperationStatus,
}

impl FicApiResource for Firewall {
    const ROOT_KEY: &'static str = "firewall";
}

impl HasOperationStatus for Firewall {
    fn operation_status(&self) -> OperationStatus {
        self.operation_status.clone()
    }
}

pub struct FirewallsApi<'a> {
    client: &'a Client,
    router_id: &'a str,
}

impl<'a> FirewallsApi<'a> {
    pub fn new(client: &'a Client, router_id: &'a str) -> Self {
        Self { client, router_id }
    }

    fn path(&self, firewall_id: &str) -> String {
        format!("/routers/{}/firewalls/{}", self.router_id, firewall_id)
    }

    pub async fn get(&self, firewall_id: &str) -> Result<Firewall, ApiError> {
        self.client.get_resource(&self.path(firewall_id)).await
    }

    pub async fn activate(
        &self,
        firewall_id: &str,
        request: &ActivateFirewallRequest,
    ) -> Result<Firewall, ApiError> {
        self.client
            .post_resource(&format!("{}/activate", self.path(firewall_id)), request)
            .await
    }

    pub async fn update(
        &self,
        firewall_id: &str,
        request: &UpdateFirewallRequest,
    ) -> Result<Firewall, ApiError> {
        self.client.put_resource(&self.path(firewall_id), request).await
    }

    pub async fn deactivate(&self, firewall_id: &str) -> Result<Firewall, ApiError> {
        self.client
            .post_action(&format!("{}/deactivate", self.path(firewall_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, mock_json};
    use mockito::{Matcher, Server};

    const FIREWALL: &str = r#"{
        "firewall": {
            "id": "F040000000335",
            "tenantId": "87e89ae8a6b4473d9fd9bc2e4ba51a8b",
            "redundant": false,
            "isActivated": true,
            "userIpAddresses": ["192.168.0.0/30"],
            "rules": [{
                "from": "group_1",
                "to": "group_2",
                "entries": [{
                    "name": "rule-01",
                    "match": {
                        "sourceAddressSets": ["group1_addset_1"],
                        "destinationAddressSets": ["any"],
                        "application": "app_set_1"
                    },
                    "action": "PERMIT"
                }]
            }],
            "customApplications": [{"name": "google-drive-web", "protocol": "tcp", "destinationPort": "443"}],
            "applicationSets": [{"name": "app_set_1", "applications": ["google-drive-web", "pre-defined-ftp"]}],
            "routingGroupSettings": [{
                "groupName": "group_1",
                "addressSets": [{"name": "group1_addset_1", "addresses": ["172.18.1.0/24"]}]
            }],
            "operationStatus": "Processing"
        }
    }"#;

    #[tokio::test]
    async fn activate_sends_user_ip_addresses() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/routers/F022000000335/firewalls/F040000000335/activate")
            .match_body(Matcher::Json(serde_json::json!({
                "firewall": {"userIpAddresses": ["192.168.0.0/30"]}
            })))
            .with_status(202)
            .with_body(FIREWALL)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let firewall = client
            .firewalls("F022000000335")
            .activate(
                "F040000000335",
                &ActivateFirewallRequest {
                    user_ip_addresses: vec!["192.168.0.0/30".into()],
                },
            )
            .await
            .unwrap();

        assert_eq!(firewall.operation_status, OperationStatus::Processing);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_decodes_policy() {
        let mut server = Server::new_async().await;
        let _m = mock_json(
            &mut server,
            "GET",
            "/routers/F022000000335/firewalls/F040000000335",
            200,
            FIREWALL,
        )
        .await;

        let client = create_test_client(&server.url());
        let firewall = client
            .firewalls("F022000000335")
            .get("F040000000335")
            .await
            .unwrap();

        let entry = &firewall.rules[0].entries[0];
        assert_eq!(entry.match_.application, "app_set_1");
        assert_eq!(entry.action, "PERMIT");
        assert_eq!(firewall.custom_applications[0].destination_port, "443");
        assert_eq!(firewall.application_sets[0].applications.len(), 2);
        assert_eq!(
            firewall.routing_group_settings[0].address_sets[0].addresses,
            vec!["172.18.1.0/24"]
        );
    }

    #[tokio::test]
    async fn update_replaces_policy() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/routers/F022000000335/firewalls/F040000000335")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "firewall": {
                    "customApplications": [
                        {"name": "google-drive-web", "protocol": "tcp", "destinationPort": "443"}
                    ],
                    "rules": []
                }
            })))
            .with_status(202)
            .with_body(FIREWALL)
            .create_async()
            .await;

        let request = UpdateFirewallRequest {
            custom_applications: vec![CustomApplication {
                name: "google-drive-web".into(),
                protocol: "tcp".into(),
                destination_port: "443".into(),
            }],
            ..Default::default()
        };
        assert!(!request.is_empty());

        let client = create_test_client(&server.url());
        client
            .firewalls("F022000000335")
            .update("F040000000335", &request)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn empty_policy_is_detected() {
        assert!(UpdateFirewallRequest::default().is_empty());
    }
}
