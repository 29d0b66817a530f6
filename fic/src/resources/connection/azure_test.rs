#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::connections::ConnectionOf;
    use crate::api::test_helpers::{create_test_provider_data, mock_json};
    use crate::resources::common;
    use crate::resources::connection::ConnectionResource;
    use mockito::{Matcher, Server};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tfplug::context::Context;
    use tfplug::resource::{
        ConfigureResourceRequest, Resource, ResourceWithConfigure, UpdateResourceRequest,
    };
    use tfplug::types::{AttributePath, Dynamic};

    const MEMBER: &str = "/router-to-azure-microsoft-connections/F030123456789";

    fn string(value: &str) -> Dynamic {
        Dynamic::String(value.to_string())
    }

    fn strings(values: &[&str]) -> Dynamic {
        Dynamic::List(values.iter().map(|v| string(v)).collect())
    }

    fn object(fields: Vec<(&str, Dynamic)>) -> DynamicValue {
        DynamicValue::new(Dynamic::Map(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<HashMap<_, _>>(),
        ))
    }

    fn port_microsoft_config(shared_key: Option<&str>) -> DynamicValue {
        object(vec![
            ("name", string("YourConnectionName")),
            ("source_primary_port_id", string("F010123456789")),
            ("source_primary_vlan", Dynamic::Number(101.0)),
            ("source_secondary_port_id", string("F019876543210")),
            ("source_secondary_vlan", Dynamic::Number(102.0)),
            ("source_asn", string("65530")),
            ("destination_interconnect", string("Tokyo-1")),
            ("destination_qos_type", string("guarantee")),
            (
                "destination_service_key",
                string("6191b5cd-6f6a-4a0b-a7b1-a3d6e8a0e0a9"),
            ),
            (
                "destination_shared_key",
                shared_key.map(string).unwrap_or(Dynamic::Null),
            ),
            (
                "destination_advertised_public_prefixes",
                strings(&["100.100.1.1/32"]),
            ),
            ("destination_routing_registry_name", string("ARIN")),
            ("primary_connected_network_address", string("10.10.0.0/30")),
            ("secondary_connected_network_address", string("10.20.0.0/30")),
            ("bandwidth", string("100M")),
        ])
    }

    fn router_microsoft_config(filter_out: &str, prefixes: &[&str]) -> DynamicValue {
        object(vec![
            ("name", string("YourConnectionName")),
            ("source_router_id", string("F022000000335")),
            ("source_group_name", string("group_1")),
            ("source_route_filter_in", string("noRoute")),
            ("source_route_filter_out", string(filter_out)),
            ("destination_interconnect", string("Tokyo-1")),
            ("destination_qos_type", string("guarantee")),
            (
                "destination_service_key",
                string("6191b5cd-6f6a-4a0b-a7b1-a3d6e8a0e0a9"),
            ),
            ("destination_advertised_public_prefixes", strings(prefixes)),
            ("bandwidth", string("100M")),
        ])
    }

    const ROUTER_CONNECTION: &str = r#"{"connection": {
        "id": "F030123456789",
        "name": "YourConnectionName",
        "redundant": true,
        "tenantId": "87e89ae8a6b4473d9fd9bc2e4ba51a8b",
        "area": "JPEAST",
        "source": {
            "routerId": "F022000000335",
            "groupName": "group_1",
            "routeFilter": {"in": "noRoute", "out": "natRoute"}
        },
        "destination": {
            "interconnect": "Tokyo-1",
            "qosType": "guarantee",
            "serviceKey": "6191b5cd-6f6a-4a0b-a7b1-a3d6e8a0e0a9",
            "advertisedPublicPrefixes": ["100.100.1.1/32", "100.100.1.2/32"]
        },
        "bandwidth": "100M",
        "primaryConnectedNetworkAddress": "10.10.0.0/30",
        "secondaryConnectedNetworkAddress": "10.20.0.0/30",
        "operationStatus": "Completed"
    }}"#;

    #[test]
    fn test_routing_registry_is_validated() {
        let schema = PortToAzureMicrosoftModel::schema();
        assert!(schema.validate(&port_microsoft_config(None)).is_empty());

        let mut config = port_microsoft_config(None);
        config
            .set_string(
                &AttributePath::new("destination_routing_registry_name"),
                "JPNIC".to_string(),
            )
            .unwrap();
        assert_eq!(schema.validate(&config).len(), 1);
    }

    #[test]
    fn test_shared_key_is_sent_and_kept_from_configuration() {
        let config = port_microsoft_config(Some("secret"));
        let decoded: PortToAzureMicrosoftConfig = common::decode(&config, "connection").unwrap();
        let request = PortToAzureMicrosoftModel::create_request(&decoded).unwrap();
        assert_eq!(request.destination.shared_key.as_deref(), Some("secret"));
        assert_eq!(request.source.secondary.vlan, 102);
        assert_eq!(
            request.secondary_connected_network_address.as_deref(),
            Some("10.20.0.0/30")
        );

        // The API never echoes the key back
        let mut connection: ConnectionOf<PortToAzureMicrosoft> =
            serde_json::from_value(serde_json::json!({
                "id": "F030123456789",
                "source": serde_json::to_value(&request.source).unwrap(),
                "destination": {
                    "interconnect": "Tokyo-1",
                    "qosType": "guarantee",
                    "serviceKey": "6191b5cd-6f6a-4a0b-a7b1-a3d6e8a0e0a9"
                },
                "bandwidth": "100M",
                "operationStatus": "Completed"
            }))
            .unwrap();
        let state = PortToAzureMicrosoftModel::state(&connection, &config);
        assert_eq!(state.destination_shared_key.as_deref(), Some("secret"));
        assert!(state.destination_advertised_public_prefixes.is_empty());

        connection.destination.routing_registry_name = Some("RADB".to_string());
        let state = PortToAzureMicrosoftModel::state(&connection, &DynamicValue::object());
        assert_eq!(state.destination_shared_key, None);
        assert_eq!(state.destination_routing_registry_name.as_deref(), Some("RADB"));
    }

    #[test]
    fn test_microsoft_route_filter_out_excludes_full_route() {
        let schema = RouterToAzureMicrosoftModel::schema();
        assert!(schema
            .validate(&router_microsoft_config("natRoute", &["100.100.1.1/32"]))
            .is_empty());
        let diags = schema.validate(&router_microsoft_config("fullRoute", &["100.100.1.1/32"]));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Invalid value for source_route_filter_out");
    }

    #[test]
    fn test_private_connections_are_not_updatable_in_place() {
        assert!(PortToAzurePrivateModel::UPDATABLE.is_empty());
        assert!(PortToAzurePrivateModel::schema()
            .attribute("destination_advertised_public_prefixes")
            .is_none());
        assert!(RouterToAzurePrivateModel::schema()
            .attribute("primary_connected_network_address")
            .unwrap()
            .required);
    }

    #[tokio::test]
    async fn test_prefix_change_updates_filter_and_prefixes() {
        let mut server = Server::new_async().await;
        let put = server
            .mock("PUT", MEMBER)
            .match_body(Matcher::Json(serde_json::json!({
                "connection": {
                    "source": {"routeFilter": {"in": "noRoute", "out": "natRoute"}},
                    "destination": {"advertisedPublicPrefixes": ["100.100.1.1/32", "100.100.1.2/32"]}
                }
            })))
            .with_status(202)
            .with_body(ROUTER_CONNECTION)
            .create_async()
            .await;
        let _get = mock_json(&mut server, "GET", MEMBER, 200, ROUTER_CONNECTION).await;

        let mut resource = ConnectionResource::<RouterToAzureMicrosoftModel>::new();
        resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: Some(Arc::new(create_test_provider_data(&server.url()))),
                },
            )
            .await;

        let mut prior = router_microsoft_config("natRoute", &["100.100.1.1/32"]);
        prior
            .set_string(&AttributePath::new("id"), "F030123456789".to_string())
            .unwrap();
        let planned = router_microsoft_config("natRoute", &["100.100.1.1/32", "100.100.1.2/32"]);
        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: RouterToAzureMicrosoftModel::TYPE_NAME.to_string(),
                    prior_state: prior,
                    planned_state: planned.clone(),
                    config: planned,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = response.new_state;
        assert_eq!(
            state
                .get_string_list(&AttributePath::new("destination_advertised_public_prefixes"))
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            state
                .get_string(&AttributePath::new("primary_connected_network_address"))
                .unwrap(),
            "10.10.0.0/30"
        );
        put.assert_async().await;
    }
}
