//! Router API implementation

use super::common::{FicApiResource, HasOperationStatus};
use super::{ApiError, Client};
use crate::operation::OperationStatus;
use serde::{Deserialize, Serialize};

/// Request body for creating routers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouterRequest {
    pub name: String,
    pub area: String,
    pub user_ip_address: String,
    pub redundant: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRef {
    pub id: String,
    #[serde(default)]
    pub is_activated: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutingGroup {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    pub id: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub user_ip_address: String,
    #[serde(default)]
    pub redundant: bool,
    #[serde(default)]
    pub firewalls: Vec<ComponentRef>,
    #[serde(default)]
    pub nats: Vec<ComponentRef>,
    #[serde(default)]
    pub routing_groups: Vec<RoutingGroup>,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub operation_status: OperationStatus,
}

impl Router {
    /// Every router carries one firewall and one NAT component, but a router
    /// that is still being built may not list them yet
    pub fn firewall_id(&self) -> Option<&str> {
        self.firewalls.first().map(|f| f.id.as_str())
    }

    pub fn nat_id(&self) -> Option<&str> {
        self.nats.first().map(|n| n.id.as_str())
    }
}

impl FicApiResource for Router {
    const ROOT_KEY: &'static str = "router";
}

impl HasOperationStatus for Router {
    fn operation_status(&self) -> OperationStatus {
        self.operation_status.clone()
    }
}

/// Routers API
pub struct RoutersApi<'a> {
    client: &'a Client,
}

impl<'a> RoutersApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(id: &str) -> String {
        format!("/routers/{}", id)
    }

    /// POST /routers
    pub async fn create(&self, request: &CreateRouterRequest) -> Result<Router, ApiError> {
        self.client.post_resource("/routers", request).await
    }

    /// GET /routers/{id}
    pub async fn get(&self, id: &str) -> Result<Router, ApiError> {
        self.client.get_resource(&Self::path(id)).await
    }

    /// DELETE /routers/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&Self::path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, mock_json};
    use mockito::{Matcher, Server};

    const ROUTER: &str = r#"{
        "router": {
            "id": "F022000000335",
            "tenantId": "87e89ae8a6b4473d9fd9bc2e4ba51a8b",
            "name": "terraform_router_1",
            "area": "JPEAST",
            "userIpAddress": "10.100.0.0/27",
            "redundant": false,
            "firewalls": [{"id": "F040000000335", "isActivated": false}],
            "nats": [{"id": "F050000000335", "isActivated": true}],
            "routingGroups": [{"name": "group_1"}, {"name": "group_2"}],
            "operationId": "ee0d3a4f86c2456693893d54e7f6a8e1",
            "operationStatus": "Processing"
        }
    }"#;

    #[tokio::test]
    async fn create_sends_camel_case_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/routers")
            .match_body(Matcher::Json(serde_json::json!({
                "router": {
                    "name": "terraform_router_1",
                    "area": "JPEAST",
                    "userIpAddress": "10.100.0.0/27",
                    "redundant": false
                }
            })))
            .with_status(202)
            .with_body(ROUTER)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let router = client
            .routers()
            .create(&CreateRouterRequest {
                name: "terraform_router_1".into(),
                area: "JPEAST".into(),
                user_ip_address: "10.100.0.0/27".into(),
                redundant: false,
            })
            .await
            .unwrap();

        assert_eq!(router.id, "F022000000335");
        assert_eq!(router.operation_status, OperationStatus::Processing);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_decodes_components() {
        let mut server = Server::new_async().await;
        let _m = mock_json(&mut server, "GET", "/routers/F022000000335", 200, ROUTER).await;

        let client = create_test_client(&server.url());
        let router = client.routers().get("F022000000335").await.unwrap();

        assert_eq!(router.firewall_id(), Some("F040000000335"));
        assert_eq!(router.nat_id(), Some("F050000000335"));
        assert!(router.nats[0].is_activated);
        assert_eq!(router.routing_groups.len(), 2);
    }

    #[test]
    fn component_ids_are_optional() {
        let router = Router::default();
        assert_eq!(router.firewall_id(), None);
        assert_eq!(router.nat_id(), None);
    }

    #[tokio::test]
    async fn delete_of_missing_router_is_not_found() {
        let mut server = Server::new_async().await;
        let _m = mock_json(&mut server, "DELETE", "/routers/F022000000335", 404, "{}").await;

        let client = create_test_client(&server.url());
        let err = client.routers().delete("F022000000335").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
