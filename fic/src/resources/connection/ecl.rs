use super::{
    common_computed, forced, forced_one_of, id_attribute, router_source_attributes, write_only,
    ConnectionModel, RouterSourceConfig,
};
use crate::api::connections::ecl::EclDestination;
use crate::api::connections::{
    ConnectionOf, CreateRequestOf, RouterToEcl, UpdateConnectionRequest, UpdateRequestOf,
};
use crate::api::{ApiError, Client};
use crate::resources::common::{BANDWIDTHS_UP_TO_1G, QOS_TYPES, ROUTE_FILTER_OUT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};

#[derive(Debug, Clone, Deserialize)]
pub struct RouterToEclConfig {
    pub name: String,
    #[serde(flatten)]
    pub source: RouterSourceConfig,
    pub destination_interconnect: String,
    pub destination_qos_type: String,
    pub destination_ecl_tenant_id: String,
    pub destination_ecl_api_key: String,
    pub destination_ecl_api_secret_key: String,
    pub primary_connected_network_address: String,
    pub secondary_connected_network_address: String,
    pub bandwidth: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterToEclState {
    pub id: String,
    pub name: String,
    pub source_router_id: String,
    pub source_group_name: String,
    pub source_route_filter_in: String,
    pub source_route_filter_out: String,
    pub destination_interconnect: String,
    pub destination_qos_type: String,
    pub destination_ecl_tenant_id: String,
    pub destination_ecl_api_key: Option<String>,
    pub destination_ecl_api_secret_key: Option<String>,
    pub primary_connected_network_address: String,
    pub secondary_connected_network_address: String,
    pub bandwidth: String,
    pub redundant: bool,
    pub tenant_id: String,
    pub area: String,
}

/// Router to Enterprise Cloud 2.0 tenant
pub struct RouterToEclModel;

fn api_key(name: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .required()
        .sensitive()
        .requires_replace()
        .build()
}

#[async_trait]
impl ConnectionModel for RouterToEclModel {
    type Kind = RouterToEcl;
    type Config = RouterToEclConfig;
    type State = RouterToEclState;

    const TYPE_NAME: &'static str = "fic_eri_router_to_ecl_connection_v1";
    const UPDATABLE: &'static [&'static str] =
        &["source_route_filter_in", "source_route_filter_out"];

    fn schema() -> Schema {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Connection from a FIC router to an Enterprise Cloud tenant")
            .attribute(id_attribute())
            .attribute(forced("name", AttributeType::String));
        let mut builder = router_source_attributes(builder, ROUTE_FILTER_OUT)
            .attribute(forced("destination_interconnect", AttributeType::String))
            .attribute(forced_one_of("destination_qos_type", QOS_TYPES))
            .attribute(forced("destination_ecl_tenant_id", AttributeType::String))
            .attribute(api_key("destination_ecl_api_key"))
            .attribute(api_key("destination_ecl_api_secret_key"))
            .attribute(forced("primary_connected_network_address", AttributeType::String))
            .attribute(forced("secondary_connected_network_address", AttributeType::String))
            .attribute(forced_one_of("bandwidth", BANDWIDTHS_UP_TO_1G));
        for attr in common_computed() {
            builder = builder.attribute(attr);
        }
        builder.build()
    }

    fn create_request(
        config: &RouterToEclConfig,
    ) -> Result<CreateRequestOf<RouterToEcl>, Diagnostic> {
        let mut request = CreateRequestOf::<RouterToEcl>::new(
            &config.name,
            config.source.source(),
            EclDestination {
                interconnect: config.destination_interconnect.clone(),
                qos_type: config.destination_qos_type.clone(),
                ecl_tenant_id: config.destination_ecl_tenant_id.clone(),
                ecl_api_key: Some(config.destination_ecl_api_key.clone()),
                ecl_api_secret_key: Some(config.destination_ecl_api_secret_key.clone()),
            },
            &config.bandwidth,
        );
        request.primary_connected_network_address =
            Some(config.primary_connected_network_address.clone());
        request.secondary_connected_network_address =
            Some(config.secondary_connected_network_address.clone());
        Ok(request)
    }

    fn state(connection: &ConnectionOf<RouterToEcl>, prior: &DynamicValue) -> RouterToEclState {
        let source = &connection.source;
        let destination = &connection.destination;
        RouterToEclState {
            id: connection.id.clone(),
            name: connection.name.clone(),
            source_router_id: source.router_id.clone(),
            source_group_name: source.group_name.clone(),
            source_route_filter_in: source.route_filter.in_.clone(),
            source_route_filter_out: source.route_filter.out.clone(),
            destination_interconnect: destination.interconnect.clone(),
            destination_qos_type: destination.qos_type.clone(),
            destination_ecl_tenant_id: destination.ecl_tenant_id.clone(),
            destination_ecl_api_key: write_only(prior, "destination_ecl_api_key"),
            destination_ecl_api_secret_key: write_only(prior, "destination_ecl_api_secret_key"),
            primary_connected_network_address: connection
                .primary_connected_network_address
                .clone()
                .unwrap_or_default(),
            secondary_connected_network_address: connection
                .secondary_connected_network_address
                .clone()
                .unwrap_or_default(),
            bandwidth: connection.bandwidth.clone(),
            redundant: connection.redundant,
            tenant_id: connection.tenant_id.clone(),
            area: connection.area.clone(),
        }
    }

    async fn update(client: &Client, id: &str, config: &RouterToEclConfig) -> Result<(), ApiError> {
        let request: UpdateRequestOf<RouterToEcl> = UpdateConnectionRequest {
            source: Some(config.source.filter_update()),
            ..Default::default()
        };
        client
            .connections::<RouterToEcl>()
            .update(id, &request)
            .await
            .map(|_| ())
    }
}
