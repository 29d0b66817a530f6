use super::{ConnectionKind, RouteFilterUpdate, RouterSource, UpdatableConnection};
use serde::{Deserialize, Serialize};

/// Enterprise Cloud tenant. The API key pair is write-only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EclDestination {
    pub interconnect: String,
    pub qos_type: String,
    pub ecl_tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecl_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecl_api_secret_key: Option<String>,
}

pub struct RouterToEcl;

impl ConnectionKind for RouterToEcl {
    const PATH: &'static str = "/router-to-ecl-connections";
    type Source = RouterSource;
    type Destination = EclDestination;
}

impl UpdatableConnection for RouterToEcl {
    type SourceUpdate = RouteFilterUpdate;
    type DestinationUpdate = ();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::connections::{CreateRequestOf, RouteFilter};
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn create_sends_api_keys_and_reads_without_them() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/router-to-ecl-connections")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "connection": {
                    "destination": {
                        "interconnect": "JP5-1",
                        "eclTenantId": "44b5a4d3b2414c3a9d0b6d1a30b2b0d3",
                        "eclApiKey": "key",
                        "eclApiSecretKey": "secret"
                    },
                    "primaryConnectedNetworkAddress": "10.0.0.0/30"
                }
            })))
            .with_status(202)
            .with_body(
                r#"{"connection": {
                    "id": "F030123456789",
                    "source": {"routerId": "F022000000335", "groupName": "group_1",
                               "routeFilter": {"in": "fullRoute", "out": "fullRoute"}},
                    "destination": {"interconnect": "JP5-1", "qosType": "guarantee",
                                    "eclTenantId": "44b5a4d3b2414c3a9d0b6d1a30b2b0d3"},
                    "bandwidth": "1G",
                    "operationStatus": "Processing"
                }}"#,
            )
            .create_async()
            .await;

        let mut request = CreateRequestOf::<RouterToEcl>::new(
            "ecl",
            RouterSource {
                router_id: "F022000000335".into(),
                group_name: "group_1".into(),
                route_filter: RouteFilter {
                    in_: "fullRoute".into(),
                    out: "fullRoute".into(),
                },
            },
            EclDestination {
                interconnect: "JP5-1".into(),
                qos_type: "guarantee".into(),
                ecl_tenant_id: "44b5a4d3b2414c3a9d0b6d1a30b2b0d3".into(),
                ecl_api_key: Some("key".into()),
                ecl_api_secret_key: Some("secret".into()),
            },
            "1G",
        );
        request.primary_connected_network_address = Some("10.0.0.0/30".into());
        request.secondary_connected_network_address = Some("10.0.0.4/30".into());

        let client = create_test_client(&server.url());
        let conn = client
            .connections::<RouterToEcl>()
            .create(&request)
            .await
            .unwrap();

        assert_eq!(conn.destination.ecl_api_key, None);
        mock.assert_async().await;
    }
}
