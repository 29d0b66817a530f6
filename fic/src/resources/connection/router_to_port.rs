//! Router to port connections
//!
//! The single and paired kinds share one wire shape. The paired kind fills
//! the `secondary` half on both ends, so its `source_information` and
//! `destination_information` blocks hold two entries each.

use super::{
    common_computed, forced, forced_one_of, id_attribute, route_filter, updatable_one_of,
    ConnectionModel,
};
use crate::api::connections::router_to_port::{
    AsPathPrepend, DestinationHaInfo, PortDestination, PortRouterSource, PortRouterSourceUpdate,
    PrependUpdate, SourceHaInfo,
};
use crate::api::connections::{
    ConnectionOf, CreateRequestOf, RouterToPort, UpdateConnectionRequest, UpdateRequestOf,
};
use crate::api::{ApiError, Client};
use crate::resources::common::{BANDWIDTHS, GROUP_NAMES, ROUTE_FILTER_IN, ROUTE_FILTER_OUT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::schema::{
    AttributeBuilder, AttributeType, BlockBuilder, NestedBlock, NestingMode, Schema, SchemaBuilder,
};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::StringOneOf;

const AS_PATH_PREPEND: &[&str] = &["OFF", "1", "2", "3", "4", "5"];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceInformationModel {
    pub ip_address: String,
    #[serde(default)]
    pub as_path_prepend_in: Option<String>,
    #[serde(default)]
    pub as_path_prepend_out: Option<String>,
}

impl SourceInformationModel {
    fn prepend(&self) -> AsPathPrepend {
        AsPathPrepend {
            in_: self.as_path_prepend_in.clone(),
            out: self.as_path_prepend_out.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DestinationInformationModel {
    pub port_id: String,
    pub vlan: i64,
    pub ip_address: String,
    pub asn: String,
}

impl From<&DestinationInformationModel> for DestinationHaInfo {
    fn from(model: &DestinationInformationModel) -> Self {
        DestinationHaInfo {
            port_id: model.port_id.clone(),
            vlan: model.vlan,
            ip_address: model.ip_address.clone(),
            asn: model.asn.clone(),
        }
    }
}

impl From<&DestinationHaInfo> for DestinationInformationModel {
    fn from(info: &DestinationHaInfo) -> Self {
        DestinationInformationModel {
            port_id: info.port_id.clone(),
            vlan: info.vlan,
            ip_address: info.ip_address.clone(),
            asn: info.asn.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterToPortConfig {
    pub name: String,
    pub source_router_id: String,
    pub source_group_name: String,
    pub source_route_filter_in: String,
    pub source_route_filter_out: String,
    pub source_information: Vec<SourceInformationModel>,
    pub destination_information: Vec<DestinationInformationModel>,
    pub bandwidth: String,
}

impl RouterToPortConfig {
    fn pair<'a, T>(
        items: &'a [T],
        what: &str,
        expected: usize,
    ) -> Result<(&'a T, Option<&'a T>), Diagnostic> {
        if items.len() != expected {
            return Err(Diagnostic::error(
                format!("Invalid {}", what),
                format!("expected {} entries, got {}", expected, items.len()),
            ));
        }
        Ok((&items[0], items.get(1)))
    }

    fn update(&self) -> PortRouterSourceUpdate {
        PortRouterSourceUpdate {
            route_filter: route_filter(&self.source_route_filter_in, &self.source_route_filter_out),
            primary: PrependUpdate {
                as_path_prepend: self
                    .source_information
                    .first()
                    .map(SourceInformationModel::prepend)
                    .unwrap_or_default(),
            },
            secondary: self.source_information.get(1).map(|info| PrependUpdate {
                as_path_prepend: info.prepend(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterToPortState {
    pub id: String,
    pub name: String,
    pub source_router_id: String,
    pub source_group_name: String,
    pub source_route_filter_in: String,
    pub source_route_filter_out: String,
    pub source_information: Vec<SourceInformationModel>,
    pub destination_information: Vec<DestinationInformationModel>,
    pub bandwidth: String,
    pub redundant: bool,
    pub tenant_id: String,
    pub area: String,
}

/// The API reports an unset prepend as `OFF`. Keep an omitted value omitted
/// so an unchanged configuration does not show a diff.
fn prepend_state(
    reported: &Option<String>,
    prior: &DynamicValue,
    index: usize,
    name: &str,
) -> Option<String> {
    let configured = prior.get_string_opt(
        &AttributePath::new("source_information")
            .index(index as i64)
            .attribute(name),
    );
    let off = matches!(reported.as_deref(), None | Some("OFF"));
    if off && configured.as_deref().map_or(true, str::is_empty) {
        return configured;
    }
    reported.clone()
}

fn source_information(
    info: &SourceHaInfo,
    prior: &DynamicValue,
    index: usize,
) -> SourceInformationModel {
    SourceInformationModel {
        ip_address: info.ip_address.clone(),
        as_path_prepend_in: prepend_state(
            &info.as_path_prepend.in_,
            prior,
            index,
            "as_path_prepend_in",
        ),
        as_path_prepend_out: prepend_state(
            &info.as_path_prepend.out,
            prior,
            index,
            "as_path_prepend_out",
        ),
    }
}

fn router_to_port_schema(description: &str, entries: i64) -> Schema {
    let source_information: NestedBlock = BlockBuilder::new("source_information")
        .nesting(NestingMode::List)
        .exactly(entries)
        .attribute(
            AttributeBuilder::new("ip_address", AttributeType::String)
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("as_path_prepend_in", AttributeType::String)
                .optional()
                .validator(StringOneOf::new(AS_PATH_PREPEND))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("as_path_prepend_out", AttributeType::String)
                .optional()
                .validator(StringOneOf::new(AS_PATH_PREPEND))
                .build(),
        )
        .build();

    let destination_information = BlockBuilder::new("destination_information")
        .nesting(NestingMode::List)
        .exactly(entries)
        .requires_replace()
        .attribute(
            AttributeBuilder::new("port_id", AttributeType::String)
                .required()
                .build(),
        )
        .attribute(AttributeBuilder::new("vlan", AttributeType::Number).required().build())
        .attribute(
            AttributeBuilder::new("ip_address", AttributeType::String)
                .required()
                .build(),
        )
        .attribute(AttributeBuilder::new("asn", AttributeType::String).required().build())
        .build();

    let mut builder = SchemaBuilder::new()
        .version(0)
        .description(description)
        .attribute(id_attribute())
        .attribute(forced("name", AttributeType::String))
        .attribute(forced("source_router_id", AttributeType::String))
        .attribute(forced_one_of("source_group_name", GROUP_NAMES))
        .attribute(updatable_one_of("source_route_filter_in", ROUTE_FILTER_IN))
        .attribute(updatable_one_of("source_route_filter_out", ROUTE_FILTER_OUT))
        .attribute(forced_one_of("bandwidth", BANDWIDTHS))
        .block(source_information)
        .block(destination_information);
    for attr in common_computed() {
        builder = builder.attribute(attr);
    }
    builder.build()
}

fn create_request(
    config: &RouterToPortConfig,
    entries: usize,
) -> Result<CreateRequestOf<RouterToPort>, Diagnostic> {
    let (source_primary, source_secondary) =
        RouterToPortConfig::pair(&config.source_information, "source_information", entries)?;
    let (destination_primary, destination_secondary) = RouterToPortConfig::pair(
        &config.destination_information,
        "destination_information",
        entries,
    )?;
    let ha_info = |info: &SourceInformationModel| SourceHaInfo {
        ip_address: info.ip_address.clone(),
        as_path_prepend: info.prepend(),
    };

    Ok(CreateRequestOf::<RouterToPort>::new(
        &config.name,
        PortRouterSource {
            router_id: config.source_router_id.clone(),
            group_name: config.source_group_name.clone(),
            route_filter: route_filter(&config.source_route_filter_in, &config.source_route_filter_out),
            primary: ha_info(source_primary),
            secondary: source_secondary.map(ha_info),
        },
        PortDestination {
            primary: destination_primary.into(),
            secondary: destination_secondary.map(DestinationHaInfo::from),
        },
        &config.bandwidth,
    ))
}

fn state(connection: &ConnectionOf<RouterToPort>, prior: &DynamicValue) -> RouterToPortState {
    let source = &connection.source;
    let destination = &connection.destination;

    let mut source_info = vec![source_information(&source.primary, prior, 0)];
    if let Some(secondary) = &source.secondary {
        source_info.push(source_information(secondary, prior, 1));
    }
    let mut destination_info = vec![DestinationInformationModel::from(&destination.primary)];
    if let Some(secondary) = &destination.secondary {
        destination_info.push(secondary.into());
    }

    RouterToPortState {
        id: connection.id.clone(),
        name: connection.name.clone(),
        source_router_id: source.router_id.clone(),
        source_group_name: source.group_name.clone(),
        source_route_filter_in: source.route_filter.in_.clone(),
        source_route_filter_out: source.route_filter.out.clone(),
        source_information: source_info,
        destination_information: destination_info,
        bandwidth: connection.bandwidth.clone(),
        redundant: connection.redundant,
        tenant_id: connection.tenant_id.clone(),
        area: connection.area.clone(),
    }
}

async fn update(client: &Client, id: &str, config: &RouterToPortConfig) -> Result<(), ApiError> {
    let request: UpdateRequestOf<RouterToPort> = UpdateConnectionRequest {
        source: Some(config.update()),
        ..Default::default()
    };
    client
        .connections::<RouterToPort>()
        .update(id, &request)
        .await
        .map(|_| ())
}

const SOURCE_UPDATABLE: &[&str] = &[
    "source_route_filter_in",
    "source_route_filter_out",
    "source_information",
];

pub struct RouterSingleToPortModel;

#[async_trait]
impl ConnectionModel for RouterSingleToPortModel {
    type Kind = RouterToPort;
    type Config = RouterToPortConfig;
    type State = RouterToPortState;

    const TYPE_NAME: &'static str = "fic_eri_router_single_to_port_connection_v1";
    const UPDATABLE: &'static [&'static str] = SOURCE_UPDATABLE;

    fn schema() -> Schema {
        router_to_port_schema("Connection from a FIC router to a single port", 1)
    }

    fn create_request(
        config: &RouterToPortConfig,
    ) -> Result<CreateRequestOf<RouterToPort>, Diagnostic> {
        create_request(config, 1)
    }

    fn state(connection: &ConnectionOf<RouterToPort>, prior: &DynamicValue) -> RouterToPortState {
        state(connection, prior)
    }

    async fn update(client: &Client, id: &str, config: &RouterToPortConfig) -> Result<(), ApiError> {
        update(client, id, config).await
    }
}

pub struct RouterPairedToPortModel;

#[async_trait]
impl ConnectionModel for RouterPairedToPortModel {
    type Kind = RouterToPort;
    type Config = RouterToPortConfig;
    type State = RouterToPortState;

    const TYPE_NAME: &'static str = "fic_eri_router_paired_to_port_connection_v1";
    const UPDATABLE: &'static [&'static str] = SOURCE_UPDATABLE;

    fn schema() -> Schema {
        router_to_port_schema("Redundant connection from a FIC router to a port pair", 2)
    }

    fn create_request(
        config: &RouterToPortConfig,
    ) -> Result<CreateRequestOf<RouterToPort>, Diagnostic> {
        create_request(config, 2)
    }

    fn state(connection: &ConnectionOf<RouterToPort>, prior: &DynamicValue) -> RouterToPortState {
        state(connection, prior)
    }

    async fn update(client: &Client, id: &str, config: &RouterToPortConfig) -> Result<(), ApiError> {
        update(client, id, config).await
    }
}
