#![allow(clippy::disallowed_methods)]

use fic::FicProvider;
use mockito::{Matcher, Server, ServerGuard};
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, DataSource, DataSourceWithConfigure, ReadDataSourceRequest,
};
use tfplug::provider::{ConfigureProviderRequest, ConfigureProviderResponse, Provider};
use tfplug::resource::{
    ConfigureResourceRequest, ImportResourceStateRequest, ReadResourceRequest, Resource,
    ResourceWithConfigure, ResourceWithImportState,
};
use tfplug::types::{AttributePath, ClientCapabilities, Dynamic, DynamicValue};

const TOKEN: &str = "gAAAAABk-subject-token";

fn object(fields: &[(&str, Dynamic)]) -> DynamicValue {
    DynamicValue::new(Dynamic::Map(
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<HashMap<_, _>>(),
    ))
}

fn string(value: &str) -> Dynamic {
    Dynamic::String(value.to_string())
}

async fn identity(server: &mut ServerGuard) -> mockito::Mock {
    let catalog = serde_json::json!({
        "token": {
            "catalog": [{
                "type": "fic-eri",
                "endpoints": [
                    {"interface": "internal", "region": "jp1", "url": "https://internal.invalid"},
                    {"interface": "public", "region": "jp1", "url": server.url()}
                ]
            }]
        }
    });
    server
        .mock("POST", "/v3/auth/tokens")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "auth": {"identity": {"methods": ["password"]}}
        })))
        .with_status(201)
        .with_header("X-Subject-Token", TOKEN)
        .with_header("content-type", "application/json")
        .with_body(catalog.to_string())
        .create_async()
        .await
}

async fn configure(server: &ServerGuard) -> (FicProvider, ConfigureProviderResponse) {
    let config = object(&[
        ("auth_url", string(&format!("{}/v3", server.url()))),
        ("region", string("jp1")),
        ("user_name", string("terraform")),
        ("password", string("secret")),
        ("tenant_id", string("87e89ae8a6b4473d9fd9bc2e4ba51a8b")),
        ("user_domain_id", string("default")),
        ("endpoint_type", string("public")),
    ]);

    let mut provider = FicProvider::new();
    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    (provider, response)
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_authenticates_and_reads_a_switch() {
    let mut server = Server::new_async().await;
    let auth = identity(&mut server).await;
    let switches = server
        .mock("GET", "/v1/switches")
        .match_header("X-Auth-Token", TOKEN)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"switches": [{
                "id": "SW01",
                "switchName": "SwitchName01",
                "area": "JPEAST",
                "location": "NTTComTokyo(NW1)",
                "portTypes": [{"type": "10G", "available": true}],
                "numberOfAvailableVlans": 1000,
                "vlanRanges": [{"range": "1137-1152", "available": true}]
            }]}"#,
        )
        .create_async()
        .await;

    let (provider, response) = configure(&server).await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    auth.assert_async().await;

    let mut data_source = provider.data_sources()["fic_eri_switch_v1"]();
    let configured = data_source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: response.provider_data.clone(),
            },
        )
        .await;
    assert!(configured.diagnostics.is_empty());

    let read = data_source
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "fic_eri_switch_v1".to_string(),
                config: object(&[
                    ("name", Dynamic::Null),
                    ("area", string("JPEAST")),
                    ("location", Dynamic::Null),
                    ("port_type", string("10G")),
                ]),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(read.diagnostics.is_empty(), "{:?}", read.diagnostics);
    assert_eq!(read.state.get_string(&AttributePath::new("id")).unwrap(), "SW01");
    switches.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_reads_and_imports_a_router() {
    let mut server = Server::new_async().await;
    let _auth = identity(&mut server).await;
    let _router = server
        .mock("GET", "/v1/routers/F022000000335")
        .match_header("X-Auth-Token", TOKEN)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"router": {
                "id": "F022000000335",
                "tenantId": "87e89ae8a6b4473d9fd9bc2e4ba51a8b",
                "name": "terraform_router_1",
                "area": "JPEAST",
                "userIpAddress": "10.100.0.0/27",
                "redundant": false,
                "firewalls": [{"id": "F040000000335", "isActivated": false}],
                "nats": [{"id": "F050000000335", "isActivated": true}],
                "routingGroups": [{"name": "group_1"}],
                "operationStatus": "Completed"
            }}"#,
        )
        .create_async()
        .await;

    let (provider, response) = configure(&server).await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    let mut router = provider.resources()["fic_eri_router_v1"]();
    router
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: response.provider_data.clone(),
            },
        )
        .await;

    let imported = router
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "fic_eri_router_v1".to_string(),
                id: "F022000000335".to_string(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(imported.diagnostics.is_empty(), "{:?}", imported.diagnostics);
    let state = imported.imported_resources[0].state.clone();

    let read = router
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "fic_eri_router_v1".to_string(),
                current_state: state,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(read.diagnostics.is_empty(), "{:?}", read.diagnostics);
    let state = read.new_state.unwrap();
    assert_eq!(
        state.get_string(&AttributePath::new("name")).unwrap(),
        "terraform_router_1"
    );
    assert_eq!(
        state.get_string(&AttributePath::new("nat_id")).unwrap(),
        "F050000000335"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_reports_rejected_credentials() {
    let mut server = Server::new_async().await;
    let _auth = server
        .mock("POST", "/v3/auth/tokens")
        .with_status(401)
        .with_body(r#"{"error": {"code": 401, "message": "The request you have made requires authentication."}}"#)
        .create_async()
        .await;

    let (_, response) = configure(&server).await;

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Failed to create API client");
    assert!(response.diagnostics[0].detail.contains("401"));
    assert!(response.provider_data.is_none());
}
