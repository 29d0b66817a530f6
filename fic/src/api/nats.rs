//! NAT component API implementation

use super::common::{FicApiResource, HasOperationStatus};
use super::{ApiError, Client};
use crate::operation::OperationStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalIpAddressSetSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub set_type: String,
    pub number_of_addresses: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceNaptEntry {
    #[serde(default)]
    pub then: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceNaptRule {
    #[serde(default)]
    pub from: Vec<String>,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub entries: Vec<SourceNaptEntry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationMatch {
    #[serde(default)]
    pub destination_address: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DestinationNatEntry {
    #[serde(rename = "match", default)]
    pub match_: DestinationMatch,
    #[serde(default)]
    pub then: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DestinationNatRule {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub entries: Vec<DestinationNatEntry>,
}

/// Request body for activating a NAT component
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateNatRequest {
    pub user_ip_addresses: Vec<String>,
    pub global_ip_address_sets: Vec<GlobalIpAddressSetSpec>,
}

/// Request body for replacing the NAT rules
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNatRequest {
    pub source_napt_rules: Vec<SourceNaptRule>,
    pub destination_nat_rules: Vec<DestinationNatRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nat {
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
    pub global_ip_address_sets: Vec<GlobalIpAddressSetSpec>,
    #[serde(default)]
    pub source_napt_rules: Vec<SourceNaptRule>,
    #[serde(default)]
    pub destination_nat_rules: Vec<DestinationNatRule>,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub operation_status: OperationStatus,
}

impl FicApiResource for Nat {
    const ROOT_KEY: &'static str = "nat";
}

impl HasOperationStatus for Nat {
    fn operation_status(&self) -> OperationStatus {
        self.operation_status.clone()
    }
}

/// NAT components of one router
pub struct NatsApi<'a> {
    client: &'a Client,
    router_id: &'a str,
}

impl<'a> NatsApi<'a> {
    pub fn new(client: &'a Client, router_id: &'a str) -> Self {
        Self { client, router_id }
    }

    fn path(&self, nat_id: &str) -> String {
        format!("/routers/{}/nats/{}", self.router_id, nat_id)
    }

    /// GET /routers/{router_id}/nats/{nat_id}
    pub async fn get(&self, nat_id: &str) -> Result<Nat, ApiError> {
        self.client.get_resource(&self.path(nat_id)).await
    }

    /// POST /routers/{router_id}/nats/{nat_id}/activate
    pub async fn activate(&self, nat_id: &str, request: &ActivateNatRequest) -> Result<Nat, ApiError> {
        self.client
            .post_resource(&format!("{}/activate", self.path(nat_id)), request)
            .await
    }

    /// PUT /routers/{router_id}/nats/{nat_id}
    pub async fn update(&self, nat_id: &str, request: &UpdateNatRequest) -> Result<Nat, ApiError> {
        self.client.put_resource(&self.path(nat_id), request).await
    }

    /// POST /routers/{router_id}/nats/{nat_id}/deactivate
    pub async fn deactivate(&self, nat_id: &str) -> Result<Nat, ApiError> {
        self.client
            .post_action(&format!("{}/deactivate", self.path(nat_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, mock_json};
    use mockito::{Matcher, Server};

    const NAT: &str = r#"{
        "nat": {
            "id": "F052000000335",
            "tenantId": "87e89ae8a6b4473d9fd9bc2e4ba51a8b",
            "redundant": false,
            "isActivated": true,
            "userIpAddresses": ["192.168.0.0/30", "192.168.0.4/30", "192.168.0.8/30", "192.168.0.12/30"],
            "sourceNaptRules": [
                {"from": ["group_1"], "to": "group_2", "entries": [{"then": ["src-set-01", "src-set-02"]}]}
            ],
            "destinationNatRules": [
                {"from": "group_2", "to": "group_1", "entries": [
                    {"match": {"destinationAddress": "dst-set-01"}, "then": "192.168.0.1/32"}
                ]}
            ],
            "operationStatus": "Completed"
        }
    }"#;

    #[tokio::test]
    async fn activate_sends_sets() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/routers/F022000000335/nats/F052000000335/activate")
            .match_body(Matcher::Json(serde_json::json!({
                "nat": {
                    "userIpAddresses": ["192.168.0.0/30"],
                    "globalIpAddressSets": [
                        {"name": "src-set-01", "type": "sourceNapt", "numberOfAddresses": 5}
                    ]
                }
            })))
            .with_status(202)
            .with_body(NAT)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let nat = client
            .nats("F022000000335")
            .activate(
                "F052000000335",
                &ActivateNatRequest {
                    user_ip_addresses: vec!["192.168.0.0/30".into()],
                    global_ip_address_sets: vec![GlobalIpAddressSetSpec {
                        name: "src-set-01".into(),
                        set_type: "sourceNapt".into(),
                        number_of_addresses: 5,
                    }],
                },
            )
            .await
            .unwrap();

        assert!(nat.is_activated);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_decodes_rules() {
        let mut server = Server::new_async().await;
        let _m = mock_json(
            &mut server,
            "GET",
            "/routers/F022000000335/nats/F052000000335",
            200,
            NAT,
        )
        .await;

        let client = create_test_client(&server.url());
        let nat = client
            .nats("F022000000335")
            .get("F052000000335")
            .await
            .unwrap();

        assert_eq!(nat.source_napt_rules[0].entries[0].then.len(), 2);
        assert_eq!(
            nat.destination_nat_rules[0].entries[0].match_.destination_address,
            "dst-set-01"
        );
    }

    #[tokio::test]
    async fn update_uses_put_with_match_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/routers/F022000000335/nats/F052000000335")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "nat": {
                    "sourceNaptRules": [],
                    "destinationNatRules": [
                        {"from": "group_2", "to": "group_1", "entries": [
                            {"match": {"destinationAddress": "dst-set-01"}, "then": "192.168.0.1/32"}
                        ]}
                    ]
                }
            })))
            .with_status(202)
            .with_body(NAT)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        client
            .nats("F022000000335")
            .update(
                "F052000000335",
                &UpdateNatRequest {
                    source_napt_rules: vec![],
                    destination_nat_rules: vec![DestinationNatRule {
                        from: "group_2".into(),
                        to: "group_1".into(),
                        entries: vec![DestinationNatEntry {
                            match_: DestinationMatch {
                                destination_address: "dst-set-01".into(),
                            },
                            then: "192.168.0.1/32".into(),
                        }],
                    }],
                },
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn deactivate_posts_to_action() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/routers/F022000000335/nats/F052000000335/deactivate")
            .with_status(202)
            .with_body(NAT)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        client
            .nats("F022000000335")
            .deactivate("F052000000335")
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
