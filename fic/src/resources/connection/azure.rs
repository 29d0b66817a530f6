//! Azure ExpressRoute connections, Microsoft and private peering, sourced
//! from a port pair or a router

use super::{
    common_computed, computed, forced, forced_one_of, id_attribute, router_source_attributes,
    write_only, ConnectionModel, RouterSourceConfig,
};
use crate::api::connections::azure::{AzureDestination, AzurePrefixesUpdate, PortPairSource};
use crate::api::connections::{
    ConnectionOf, CreateRequestOf, PortToAzureMicrosoft, PortToAzurePrivate, PortVlan,
    RouterToAzureMicrosoft, RouterToAzurePrivate, UpdateConnectionRequest, UpdateRequestOf,
};
use crate::api::{ApiError, Client};
use crate::resources::common::{null_default, string_list, BANDWIDTHS, QOS_TYPES};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validator::StringOneOf;

const MICROSOFT_ROUTE_FILTER_OUT: &[&str] = &["natRoute", "noRoute"];
const PRIVATE_ROUTE_FILTER_OUT: &[&str] = &["fullRoute", "noRoute"];

pub const ROUTING_REGISTRIES: &[&str] = &[
    "ARIN", "APNIC", "AFRINIC", "LACNIC", "RIPE", "NCC", "RADB", "ALTDB",
];

fn operation_attributes(builder: SchemaBuilder) -> SchemaBuilder {
    let mut builder = builder
        .attribute(computed("operation_id", AttributeType::String))
        .attribute(computed("operation_status", AttributeType::String));
    for attr in common_computed() {
        builder = builder.attribute(attr);
    }
    builder
}

fn port_pair_attributes(builder: SchemaBuilder) -> SchemaBuilder {
    builder
        .attribute(forced("source_primary_port_id", AttributeType::String))
        .attribute(forced("source_primary_vlan", AttributeType::Number))
        .attribute(forced("source_secondary_port_id", AttributeType::String))
        .attribute(forced("source_secondary_vlan", AttributeType::Number))
        .attribute(forced("source_asn", AttributeType::String))
}

fn destination_attributes(builder: SchemaBuilder) -> SchemaBuilder {
    builder
        .attribute(forced("destination_interconnect", AttributeType::String))
        .attribute(forced_one_of("destination_qos_type", QOS_TYPES))
        .attribute(forced("destination_service_key", AttributeType::String))
}

fn shared_key_attribute(builder: SchemaBuilder) -> SchemaBuilder {
    builder.attribute(
        AttributeBuilder::new("destination_shared_key", AttributeType::String)
            .description("BGP authentication key, never returned by the API")
            .optional()
            .sensitive()
            .requires_replace()
            .build(),
    )
}

fn prefixes_attribute(builder: SchemaBuilder, required: bool) -> SchemaBuilder {
    let attr = AttributeBuilder::new("destination_advertised_public_prefixes", string_list());
    let attr = if required { attr.required() } else { attr.optional() };
    builder.attribute(attr.build())
}

/// Port pair fields shared by both port-sourced kinds
#[derive(Debug, Clone, Deserialize)]
pub struct PortPairConfig {
    pub source_primary_port_id: String,
    pub source_primary_vlan: i64,
    pub source_secondary_port_id: String,
    pub source_secondary_vlan: i64,
    pub source_asn: String,
}

impl PortPairConfig {
    fn source(&self) -> PortPairSource {
        PortPairSource {
            primary: PortVlan {
                port_id: self.source_primary_port_id.clone(),
                vlan: self.source_primary_vlan,
            },
            secondary: PortVlan {
                port_id: self.source_secondary_port_id.clone(),
                vlan: self.source_secondary_vlan,
            },
            asn: self.source_asn.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortToAzureMicrosoftConfig {
    pub name: String,
    #[serde(flatten)]
    pub source: PortPairConfig,
    pub destination_interconnect: String,
    pub destination_qos_type: String,
    pub destination_service_key: String,
    #[serde(default)]
    pub destination_shared_key: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub destination_advertised_public_prefixes: Vec<String>,
    #[serde(default)]
    pub destination_routing_registry_name: Option<String>,
    pub primary_connected_network_address: String,
    pub secondary_connected_network_address: String,
    pub bandwidth: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortToAzureMicrosoftState {
    pub id: String,
    pub name: String,
    pub source_primary_port_id: String,
    pub source_primary_vlan: i64,
    pub source_secondary_port_id: String,
    pub source_secondary_vlan: i64,
    pub source_asn: String,
    pub destination_interconnect: String,
    pub destination_qos_type: String,
    pub destination_service_key: String,
    pub destination_shared_key: Option<String>,
    pub destination_advertised_public_prefixes: Vec<String>,
    pub destination_routing_registry_name: Option<String>,
    pub primary_connected_network_address: String,
    pub secondary_connected_network_address: String,
    pub bandwidth: String,
    pub redundant: bool,
    pub tenant_id: String,
    pub area: String,
    pub operation_id: Option<String>,
    pub operation_status: String,
}

pub struct PortToAzureMicrosoftModel;

#[async_trait]
impl ConnectionModel for PortToAzureMicrosoftModel {
    type Kind = PortToAzureMicrosoft;
    type Config = PortToAzureMicrosoftConfig;
    type State = PortToAzureMicrosoftState;

    const TYPE_NAME: &'static str = "fic_eri_port_to_azure_microsoft_connection_v1";
    const UPDATABLE: &'static [&'static str] = &[
        "destination_advertised_public_prefixes",
        "destination_routing_registry_name",
    ];

    fn schema() -> Schema {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Microsoft peering from a FIC port pair to Azure ExpressRoute")
            .attribute(id_attribute())
            .attribute(forced("name", AttributeType::String));
        let builder = destination_attributes(port_pair_attributes(builder));
        let builder = prefixes_attribute(shared_key_attribute(builder), true)
            .attribute(
                AttributeBuilder::new("destination_routing_registry_name", AttributeType::String)
                    .optional()
                    .validator(StringOneOf::new(ROUTING_REGISTRIES))
                    .build(),
            )
            .attribute(forced("primary_connected_network_address", AttributeType::String))
            .attribute(forced("secondary_connected_network_address", AttributeType::String))
            .attribute(forced_one_of("bandwidth", BANDWIDTHS));
        operation_attributes(builder).build()
    }

    fn create_request(
        config: &PortToAzureMicrosoftConfig,
    ) -> Result<CreateRequestOf<PortToAzureMicrosoft>, Diagnostic> {
        let mut request = CreateRequestOf::<PortToAzureMicrosoft>::new(
            &config.name,
            config.source.source(),
            AzureDestination {
                interconnect: config.destination_interconnect.clone(),
                qos_type: config.destination_qos_type.clone(),
                service_key: config.destination_service_key.clone(),
                shared_key: config.destination_shared_key.clone(),
                advertised_public_prefixes: Some(
                    config.destination_advertised_public_prefixes.clone(),
                ),
                routing_registry_name: config.destination_routing_registry_name.clone(),
            },
            &config.bandwidth,
        );
        request.primary_connected_network_address =
            Some(config.primary_connected_network_address.clone());
        request.secondary_connected_network_address =
            Some(config.secondary_connected_network_address.clone());
        Ok(request)
    }

    fn state(
        connection: &ConnectionOf<PortToAzureMicrosoft>,
        prior: &DynamicValue,
    ) -> PortToAzureMicrosoftState {
        let source = &connection.source;
        let destination = &connection.destination;
        PortToAzureMicrosoftState {
            id: connection.id.clone(),
            name: connection.name.clone(),
            source_primary_port_id: source.primary.port_id.clone(),
            source_primary_vlan: source.primary.vlan,
            source_secondary_port_id: source.secondary.port_id.clone(),
            source_secondary_vlan: source.secondary.vlan,
            source_asn: source.asn.clone(),
            destination_interconnect: destination.interconnect.clone(),
            destination_qos_type: destination.qos_type.clone(),
            destination_service_key: destination.service_key.clone(),
            destination_shared_key: write_only(prior, "destination_shared_key"),
            destination_advertised_public_prefixes: destination
                .advertised_public_prefixes
                .clone()
                .unwrap_or_default(),
            destination_routing_registry_name: destination.routing_registry_name.clone(),
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
            operation_id: connection.operation_id.clone(),
            operation_status: connection.operation_status.to_string(),
        }
    }

    async fn update(
        client: &Client,
        id: &str,
        config: &PortToAzureMicrosoftConfig,
    ) -> Result<(), ApiError> {
        let request: UpdateRequestOf<PortToAzureMicrosoft> = UpdateConnectionRequest {
            destination: Some(AzurePrefixesUpdate {
                advertised_public_prefixes: config.destination_advertised_public_prefixes.clone(),
                routing_registry_name: config.destination_routing_registry_name.clone(),
            }),
            ..Default::default()
        };
        client
            .connections::<PortToAzureMicrosoft>()
            .update(id, &request)
            .await
            .map(|_| ())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortToAzurePrivateConfig {
    pub name: String,
    #[serde(flatten)]
    pub source: PortPairConfig,
    pub destination_interconnect: String,
    pub destination_qos_type: String,
    pub destination_service_key: String,
    #[serde(default)]
    pub destination_shared_key: Option<String>,
    pub primary_connected_network_address: String,
    pub secondary_connected_network_address: String,
    pub bandwidth: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortToAzurePrivateState {
    pub id: String,
    pub name: String,
    pub source_primary_port_id: String,
    pub source_primary_vlan: i64,
    pub source_secondary_port_id: String,
    pub source_secondary_vlan: i64,
    pub source_asn: String,
    pub destination_interconnect: String,
    pub destination_qos_type: String,
    pub destination_service_key: String,
    pub destination_shared_key: Option<String>,
    pub primary_connected_network_address: String,
    pub secondary_connected_network_address: String,
    pub bandwidth: String,
    pub redundant: bool,
    pub tenant_id: String,
    pub area: String,
    pub operation_id: Option<String>,
    pub operation_status: String,
}

pub struct PortToAzurePrivateModel;

#[async_trait]
impl ConnectionModel for PortToAzurePrivateModel {
    type Kind = PortToAzurePrivate;
    type Config = PortToAzurePrivateConfig;
    type State = PortToAzurePrivateState;

    const TYPE_NAME: &'static str = "fic_eri_port_to_azure_private_connection_v1";

    fn schema() -> Schema {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Private peering from a FIC port pair to Azure ExpressRoute")
            .attribute(id_attribute())
            .attribute(forced("name", AttributeType::String));
        let builder = shared_key_attribute(destination_attributes(port_pair_attributes(builder)))
            .attribute(forced("primary_connected_network_address", AttributeType::String))
            .attribute(forced("secondary_connected_network_address", AttributeType::String))
            .attribute(forced_one_of("bandwidth", BANDWIDTHS));
        operation_attributes(builder).build()
    }

    fn create_request(
        config: &PortToAzurePrivateConfig,
    ) -> Result<CreateRequestOf<PortToAzurePrivate>, Diagnostic> {
        let mut request = CreateRequestOf::<PortToAzurePrivate>::new(
            &config.name,
            config.source.source(),
            AzureDestination {
                interconnect: config.destination_interconnect.clone(),
                qos_type: config.destination_qos_type.clone(),
                service_key: config.destination_service_key.clone(),
                shared_key: config.destination_shared_key.clone(),
                ..Default::default()
            },
            &config.bandwidth,
        );
        request.primary_connected_network_address =
            Some(config.primary_connected_network_address.clone());
        request.secondary_connected_network_address =
            Some(config.secondary_connected_network_address.clone());
        Ok(request)
    }

    fn state(
        connection: &ConnectionOf<PortToAzurePrivate>,
        prior: &DynamicValue,
    ) -> PortToAzurePrivateState {
        let source = &connection.source;
        let destination = &connection.destination;
        PortToAzurePrivateState {
            id: connection.id.clone(),
            name: connection.name.clone(),
            source_primary_port_id: source.primary.port_id.clone(),
            source_primary_vlan: source.primary.vlan,
            source_secondary_port_id: source.secondary.port_id.clone(),
            source_secondary_vlan: source.secondary.vlan,
            source_asn: source.asn.clone(),
            destination_interconnect: destination.interconnect.clone(),
            destination_qos_type: destination.qos_type.clone(),
            destination_service_key: destination.service_key.clone(),
            destination_shared_key: write_only(prior, "destination_shared_key"),
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
            operation_id: connection.operation_id.clone(),
            operation_status: connection.operation_status.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterToAzureMicrosoftConfig {
    pub name: String,
    #[serde(flatten)]
    pub source: RouterSourceConfig,
    pub destination_interconnect: String,
    pub destination_qos_type: String,
    pub destination_service_key: String,
    #[serde(default, deserialize_with = "null_default")]
    pub destination_advertised_public_prefixes: Vec<String>,
    pub bandwidth: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterToAzureMicrosoftState {
    pub id: String,
    pub name: String,
    pub source_router_id: String,
    pub source_group_name: String,
    pub source_route_filter_in: String,
    pub source_route_filter_out: String,
    pub destination_interconnect: String,
    pub destination_qos_type: String,
    pub destination_service_key: String,
    pub destination_advertised_public_prefixes: Vec<String>,
    pub primary_connected_network_address: String,
    pub secondary_connected_network_address: String,
    pub bandwidth: String,
    pub redundant: bool,
    pub tenant_id: String,
    pub area: String,
    pub operation_id: Option<String>,
    pub operation_status: String,
}

pub struct RouterToAzureMicrosoftModel;

#[async_trait]
impl ConnectionModel for RouterToAzureMicrosoftModel {
    type Kind = RouterToAzureMicrosoft;
    type Config = RouterToAzureMicrosoftConfig;
    type State = RouterToAzureMicrosoftState;

    const TYPE_NAME: &'static str = "fic_eri_router_to_azure_microsoft_connection_v1";
    const UPDATABLE: &'static [&'static str] = &[
        "source_route_filter_in",
        "source_route_filter_out",
        "destination_advertised_public_prefixes",
    ];

    fn schema() -> Schema {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Microsoft peering from a FIC router to Azure ExpressRoute")
            .attribute(id_attribute())
            .attribute(forced("name", AttributeType::String));
        let builder = router_source_attributes(builder, MICROSOFT_ROUTE_FILTER_OUT);
        let builder = prefixes_attribute(destination_attributes(builder), true)
            .attribute(computed("primary_connected_network_address", AttributeType::String))
            .attribute(computed("secondary_connected_network_address", AttributeType::String))
            .attribute(forced_one_of("bandwidth", BANDWIDTHS));
        operation_attributes(builder).build()
    }

    fn create_request(
        config: &RouterToAzureMicrosoftConfig,
    ) -> Result<CreateRequestOf<RouterToAzureMicrosoft>, Diagnostic> {
        Ok(CreateRequestOf::<RouterToAzureMicrosoft>::new(
            &config.name,
            config.source.source(),
            AzureDestination {
                interconnect: config.destination_interconnect.clone(),
                qos_type: config.destination_qos_type.clone(),
                service_key: config.destination_service_key.clone(),
                advertised_public_prefixes: Some(
                    config.destination_advertised_public_prefixes.clone(),
                ),
                ..Default::default()
            },
            &config.bandwidth,
        ))
    }

    fn state(
        connection: &ConnectionOf<RouterToAzureMicrosoft>,
        _prior: &DynamicValue,
    ) -> RouterToAzureMicrosoftState {
        let source = &connection.source;
        let destination = &connection.destination;
        RouterToAzureMicrosoftState {
            id: connection.id.clone(),
            name: connection.name.clone(),
            source_router_id: source.router_id.clone(),
            source_group_name: source.group_name.clone(),
            source_route_filter_in: source.route_filter.in_.clone(),
            source_route_filter_out: source.route_filter.out.clone(),
            destination_interconnect: destination.interconnect.clone(),
            destination_qos_type: destination.qos_type.clone(),
            destination_service_key: destination.service_key.clone(),
            destination_advertised_public_prefixes: destination
                .advertised_public_prefixes
                .clone()
                .unwrap_or_default(),
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
            operation_id: connection.operation_id.clone(),
            operation_status: connection.operation_status.to_string(),
        }
    }

    async fn update(
        client: &Client,
        id: &str,
        config: &RouterToAzureMicrosoftConfig,
    ) -> Result<(), ApiError> {
        let request: UpdateRequestOf<RouterToAzureMicrosoft> = UpdateConnectionRequest {
            source: Some(config.source.filter_update()),
            destination: Some(AzurePrefixesUpdate {
                advertised_public_prefixes: config.destination_advertised_public_prefixes.clone(),
                routing_registry_name: None,
            }),
            bandwidth: None,
        };
        client
            .connections::<RouterToAzureMicrosoft>()
            .update(id, &request)
            .await
            .map(|_| ())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterToAzurePrivateConfig {
    pub name: String,
    #[serde(flatten)]
    pub source: RouterSourceConfig,
    pub destination_interconnect: String,
    pub destination_qos_type: String,
    pub destination_service_key: String,
    pub primary_connected_network_address: String,
    pub secondary_connected_network_address: String,
    pub bandwidth: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterToAzurePrivateState {
    pub id: String,
    pub name: String,
    pub source_router_id: String,
    pub source_group_name: String,
    pub source_route_filter_in: String,
    pub source_route_filter_out: String,
    pub destination_interconnect: String,
    pub destination_qos_type: String,
    pub destination_service_key: String,
    pub primary_connected_network_address: String,
    pub secondary_connected_network_address: String,
    pub bandwidth: String,
    pub redundant: bool,
    pub tenant_id: String,
    pub area: String,
    pub operation_id: Option<String>,
    pub operation_status: String,
}

pub struct RouterToAzurePrivateModel;

#[async_trait]
impl ConnectionModel for RouterToAzurePrivateModel {
    type Kind = RouterToAzurePrivate;
    type Config = RouterToAzurePrivateConfig;
    type State = RouterToAzurePrivateState;

    const TYPE_NAME: &'static str = "fic_eri_router_to_azure_private_connection_v1";
    const UPDATABLE: &'static [&'static str] =
        &["source_route_filter_in", "source_route_filter_out"];

    fn schema() -> Schema {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Private peering from a FIC router to Azure ExpressRoute")
            .attribute(id_attribute())
            .attribute(forced("name", AttributeType::String));
        let builder = destination_attributes(router_source_attributes(
            builder,
            PRIVATE_ROUTE_FILTER_OUT,
        ))
        .attribute(forced("primary_connected_network_address", AttributeType::String))
        .attribute(forced("secondary_connected_network_address", AttributeType::String))
        .attribute(forced_one_of("bandwidth", BANDWIDTHS));
        operation_attributes(builder).build()
    }

    fn create_request(
        config: &RouterToAzurePrivateConfig,
    ) -> Result<CreateRequestOf<RouterToAzurePrivate>, Diagnostic> {
        let mut request = CreateRequestOf::<RouterToAzurePrivate>::new(
            &config.name,
            config.source.source(),
            AzureDestination {
                interconnect: config.destination_interconnect.clone(),
                qos_type: config.destination_qos_type.clone(),
                service_key: config.destination_service_key.clone(),
                ..Default::default()
            },
            &config.bandwidth,
        );
        request.primary_connected_network_address =
            Some(config.primary_connected_network_address.clone());
        request.secondary_connected_network_address =
            Some(config.secondary_connected_network_address.clone());
        Ok(request)
    }

    fn state(
        connection: &ConnectionOf<RouterToAzurePrivate>,
        _prior: &DynamicValue,
    ) -> RouterToAzurePrivateState {
        let source = &connection.source;
        let destination = &connection.destination;
        RouterToAzurePrivateState {
            id: connection.id.clone(),
            name: connection.name.clone(),
            source_router_id: source.router_id.clone(),
            source_group_name: source.group_name.clone(),
            source_route_filter_in: source.route_filter.in_.clone(),
            source_route_filter_out: source.route_filter.out.clone(),
            destination_interconnect: destination.interconnect.clone(),
            destination_qos_type: destination.qos_type.clone(),
            destination_service_key: destination.service_key.clone(),
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
            operation_id: connection.operation_id.clone(),
            operation_status: connection.operation_status.to_string(),
        }
    }

    async fn update(
        client: &Client,
        id: &str,
        config: &RouterToAzurePrivateConfig,
    ) -> Result<(), ApiError> {
        let request: UpdateRequestOf<RouterToAzurePrivate> = UpdateConnectionRequest {
            source: Some(config.source.filter_update()),
            ..Default::default()
        };
        client
            .connections::<RouterToAzurePrivate>()
            .update(id, &request)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[path = "./azure_test.rs"]
mod azure_test;
