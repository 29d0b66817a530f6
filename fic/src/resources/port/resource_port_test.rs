#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::test_helpers::{create_test_provider_data, mock_json};
    use mockito::{Matcher, Server};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tfplug::types::Dynamic;

    fn port_body(status: &str, activated: bool) -> String {
        format!(
            r#"{{"port": {{
                "id": "F010123456789",
                "name": "YourPortName",
                "switchName": "SwitchName",
                "portType": "1G",
                "isActivated": {},
                "vlanRanges": ["1137-1152"],
                "tenantId": "ab6e5d4e2e7a4dd4a4b6ee83bbd2d8d5",
                "area": "JPEAST",
                "location": "NTTComTokyo(NW1)",
                "vlans": [{{"vid": 1137, "status": "unused"}}],
                "operationStatus": "{}"
            }}}}"#,
            activated, status
        )
    }

    fn port_config(number_of_vlans: Option<f64>, activated: bool) -> DynamicValue {
        let mut obj = HashMap::new();
        obj.insert("name".to_string(), Dynamic::String("YourPortName".to_string()));
        obj.insert("switch_name".to_string(), Dynamic::String("SwitchName".to_string()));
        obj.insert("port_type".to_string(), Dynamic::String("1G".to_string()));
        obj.insert("is_activated".to_string(), Dynamic::Bool(activated));
        match number_of_vlans {
            Some(n) => {
                obj.insert("number_of_vlans".to_string(), Dynamic::Number(n));
                obj.insert("vlan_ranges".to_string(), Dynamic::Unknown);
            }
            None => {
                let mut range = HashMap::new();
                range.insert("start".to_string(), Dynamic::Number(1137.0));
                range.insert("end".to_string(), Dynamic::Number(1152.0));
                obj.insert(
                    "vlan_ranges".to_string(),
                    Dynamic::List(vec![Dynamic::Map(range)]),
                );
                obj.insert("number_of_vlans".to_string(), Dynamic::Null);
            }
        }
        DynamicValue::new(Dynamic::Map(obj))
    }

    async fn configured(server_url: &str) -> PortResource {
        let mut resource = PortResource::new();
        resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: Some(Arc::new(create_test_provider_data(server_url))),
                },
            )
            .await;
        resource
    }

    fn validate(config: DynamicValue) -> Vec<Diagnostic> {
        PortResource::schema_static().validate(&config)
    }

    #[test]
    fn test_number_of_vlans_must_be_multiple_of_16() {
        assert!(validate(port_config(Some(32.0), false)).is_empty());
        assert_eq!(validate(port_config(Some(20.0), false)).len(), 1);
        assert_eq!(validate(port_config(Some(528.0), false)).len(), 1);
    }

    #[test]
    fn test_number_of_vlans_conflicts_with_ranges() {
        let mut config = port_config(None, false);
        config
            .set_number(&AttributePath::new("number_of_vlans"), 16.0)
            .unwrap();
        let diags = validate(config);
        assert!(diags
            .iter()
            .all(|d| d.summary == "Conflicting configuration arguments"));
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_config_sends_ranges_as_strings() {
        let config: PortConfig = port_config(None, false).decode().unwrap();
        let request = config.create_request();
        assert_eq!(request.vlan_ranges, Some(vec!["1137-1152".to_string()]));
        assert_eq!(request.number_of_vlans, None);

        let config: PortConfig = port_config(Some(16.0), false).decode().unwrap();
        let request = config.create_request();
        assert_eq!(request.number_of_vlans, Some(16));
        assert_eq!(request.vlan_ranges, None);
    }

    #[tokio::test]
    async fn test_create_activates_when_requested() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/ports")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "port": {"numberOfVlans": 16}
            })))
            .with_status(202)
            .with_body(port_body("Processing", false))
            .create_async()
            .await;
        let activate = server
            .mock("POST", "/ports/F010123456789/activate")
            .with_status(202)
            .with_body(port_body("Processing", true))
            .expect(1)
            .create_async()
            .await;
        let _get = mock_json(
            &mut server,
            "GET",
            "/ports/F010123456789",
            200,
            &port_body("Completed", true),
        )
        .await;

        let resource = configured(&server.url()).await;
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "fic_eri_port_v1".to_string(),
                    planned_state: port_config(Some(16.0), true),
                    config: port_config(Some(16.0), true),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = response.new_state;
        assert!(state.get_bool(&AttributePath::new("is_activated")).unwrap());
        assert_eq!(state.get_i64(&AttributePath::new("number_of_vlans")).unwrap(), 16);
        assert_eq!(
            state
                .get_i64(&AttributePath::new("vlan_ranges").index(0).attribute("end"))
                .unwrap(),
            1152
        );
        activate.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_without_changes_makes_no_calls() {
        let mut server = Server::new_async().await;
        let activate = server
            .mock("POST", "/ports/F010123456789/activate")
            .expect(0)
            .create_async()
            .await;
        let _get = mock_json(
            &mut server,
            "GET",
            "/ports/F010123456789",
            200,
            &port_body("Completed", false),
        )
        .await;

        let mut prior = port_config(Some(16.0), false);
        prior
            .set_string(&AttributePath::new("id"), "F010123456789".to_string())
            .unwrap();

        let resource = configured(&server.url()).await;
        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "fic_eri_port_v1".to_string(),
                    prior_state: prior.clone(),
                    planned_state: prior.clone(),
                    config: prior,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        activate.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_refuses_deactivation() {
        let server = Server::new_async().await;
        let mut prior = port_config(Some(16.0), true);
        prior
            .set_string(&AttributePath::new("id"), "F010123456789".to_string())
            .unwrap();
        let mut planned = prior.clone();
        planned
            .set_bool(&AttributePath::new("is_activated"), false)
            .unwrap();

        let resource = configured(&server.url()).await;
        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "fic_eri_port_v1".to_string(),
                    prior_state: prior,
                    planned_state: planned.clone(),
                    config: planned,
                },
            )
            .await;

        assert_eq!(response.diagnostics[0].summary, "Port cannot be deactivated");
    }

    #[tokio::test]
    async fn test_delete_of_missing_port_succeeds() {
        let mut server = Server::new_async().await;
        let delete = mock_json(&mut server, "DELETE", "/ports/F010123456789", 404, "{}").await;
        let _get = mock_json(&mut server, "GET", "/ports/F010123456789", 404, "{}").await;

        let mut state = DynamicValue::object();
        state
            .set_string(&AttributePath::new("id"), "F010123456789".to_string())
            .unwrap();

        let resource = configured(&server.url()).await;
        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "fic_eri_port_v1".to_string(),
                    prior_state: state,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        delete.assert_async().await;
    }
}
