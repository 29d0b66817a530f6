//! NAT global IP address set API implementation

use super::common::{FicApiResource, HasOperationStatus};
use super::{ApiError, Client};
use crate::operation::OperationStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGlobalIpAddressSetRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub set_type: String,
    pub number_of_addresses: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalIpAddressSet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub set_type: String,
    #[serde(default)]
    pub number_of_addresses: i64,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub nat_component_id: String,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub operation_status: OperationStatus,
}

impl FicApiResource for GlobalIpAddressSet {
    const ROOT_KEY: &'static str = "globalIpAddressSet";
}

impl HasOperationStatus for GlobalIpAddressSet {
    fn operation_status(&self) -> OperationStatus {
        self.operation_status.clone()
    }
}

/// Global IP address sets attached to a router's NAT component
pub struct GlobalIpAddressSetsApi<'a> {
    client: &'a Client,
    router_id: &'a str,
    nat_id: &'a str,
}

impl<'a> GlobalIpAddressSetsApi<'a> {
    pub fn new(client: &'a Client, router_id: &'a str, nat_id: &'a str) -> Self {
        Self {
            client,
            router_id,
            nat_id,
        }
    }

    fn collection(&self) -> String {
        format!(
            "/routers/{}/nats/{}/global-ip-address-sets",
            self.router_id, self.nat_id
        )
    }

    pub async fn create(
        &self,
        request: &CreateGlobalIpAddressSetRequest,
    ) -> Result<GlobalIpAddressSet, ApiError> {
        self.client.post_resource(&self.collection(), request).await
    }

    pub async fn get(&self, set_id: &str) -> Result<GlobalIpAddressSet, ApiError> {
        self.client
            .get_resource(&format!("{}/{}", self.collection(), set_id))
            .await
    }

    pub async fn delete(&self, set_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/{}", self.collection(), set_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, mock_json};
    use mockito::{Matcher, Server};

    const SET: &str = r#"{
        "globalIpAddressSet": {
            "id": "F030123456789",
            "name": "src-set-01",
            "type": "sourceNapt",
            "natComponentId": "F052000000335",
            "numberOfAddresses": 5,
            "addresses": ["100.131.65.1", "100.131.65.2", "100.131.65.3", "100.131.65.4", "100.131.65.5"],
            "tenantId": "87e89ae8a6b4473d9fd9bc2e4ba51a8b",
            "operationStatus": "Processing"
        }
    }"#;

    #[tokio::test]
    async fn create_posts_to_collection() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                "/routers/F022000000335/nats/F052000000335/global-ip-address-sets",
            )
            .match_body(Matcher::Json(serde_json::json!({
                "globalIpAddressSet": {
                    "name": "src-set-01",
                    "type": "sourceNapt",
                    "numberOfAddresses": 5
                }
            })))
            .with_status(202)
            .with_body(SET)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let set = client
            .global_ip_address_sets("F022000000335", "F052000000335")
            .create(&CreateGlobalIpAddressSetRequest {
                name: "src-set-01".into(),
                set_type: "sourceNapt".into(),
                number_of_addresses: 5,
            })
            .await
            .unwrap();

        assert_eq!(set.id, "F030123456789");
        assert_eq!(set.addresses.len(), 5);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_and_delete_use_member_path() {
        let mut server = Server::new_async().await;
        let path = "/routers/F022000000335/nats/F052000000335/global-ip-address-sets/F030123456789";
        let _get = mock_json(&mut server, "GET", path, 200, SET).await;
        let delete = mock_json(&mut server, "DELETE", path, 202, SET).await;

        let client = create_test_client(&server.url());
        let api = client.global_ip_address_sets("F022000000335", "F052000000335");
        let set = api.get("F030123456789").await.unwrap();
        assert_eq!(set.set_type, "sourceNapt");

        api.delete("F030123456789").await.unwrap();
        delete.assert_async().await;
    }
}
