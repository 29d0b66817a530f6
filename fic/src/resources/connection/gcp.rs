//! Paired router to Google Cloud Partner Interconnect
//!
//! Two revisions of the resource exist. v1 derives the secondary MED from
//! the primary one, v2 takes both from configuration.

use super::{computed, id_attribute, route_filter, updatable_one_of, ConnectionModel};
use crate::api::connections::gcp::{
    GcpDestination, GcpInterconnect, GcpSource, GcpSourceUpdate, MedInfo,
};
use crate::api::connections::{
    ConnectionOf, CreateRequestOf, RouterPairedToGcp, UpdateConnectionRequest, UpdateRequestOf,
};
use crate::api::{ApiError, Client};
use crate::operation::PollTimings;
use crate::resources::common::{GROUP_NAMES, ROUTE_FILTER_IN};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tfplug::schema::{
    Attribute, AttributeBuilder, AttributeType, BlockBuilder, NestedBlock, NestingMode, Schema,
    SchemaBuilder,
};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validator::{IntOneOf, StringOneOf, StringPattern};

pub const GCP_BANDWIDTHS: &[&str] = &[
    "10M", "50M", "100M", "200M", "300M", "400M", "500M", "1G", "2G", "5G", "10G",
];

pub const GCP_INTERCONNECTS: &[&str] = &[
    "Equinix-TY2-1",
    "Equinix-TY2-2",
    "Equinix-TY2-3",
    "Equinix-TY2-4",
    "@Tokyo-CC2-1",
    "@Tokyo-CC2-2",
    "@Tokyo-CC2-3",
    "@Tokyo-CC2-4",
    "Equinix-OS1-1",
    "Equinix-OS1-2",
    "Equinix-OS1-3",
    "NTT-Dojima2-1",
    "NTT-Dojima2-2",
    "NTT-Dojima2-3",
];

const GCP_ROUTE_FILTER_OUT: &[&str] = &[
    "fullRoute",
    "fullRouteWithDefaultRoute",
    "defaultRoute",
    "privateRoute",
    "noRoute",
];

const NAME_PATTERN: &str = r"^[\w&()-]{1,64}$";
const ROUTER_ID_PATTERN: &str = r"^F\d{12}$";
const PAIRING_KEY_PATTERN: &str =
    r"^[a-fA-F\d]{8}(-[a-fA-F\d]{4}){3}-[a-fA-F\d]{12}/[a-zA-Z\d-]*/[12]$";

/// Always sent, the attribute is computed
const GCP_QOS_TYPE: &str = "guarantee";

/// Distance between the primary and secondary MED in v1
const SECONDARY_MED_OFFSET: i64 = 10;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteFilterModel {
    #[serde(rename = "in")]
    pub in_: String,
    pub out: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GcpSourceModel {
    pub router_id: String,
    pub group_name: String,
    pub route_filter: Vec<RouteFilterModel>,
    pub primary_med_out: i64,
    #[serde(default)]
    pub secondary_med_out: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InterconnectModel {
    pub interconnect: String,
    pub pairing_key: String,
}

impl From<&InterconnectModel> for GcpInterconnect {
    fn from(model: &InterconnectModel) -> Self {
        GcpInterconnect {
            interconnect: model.interconnect.clone(),
            pairing_key: model.pairing_key.clone(),
        }
    }
}

impl From<&GcpInterconnect> for InterconnectModel {
    fn from(interconnect: &GcpInterconnect) -> Self {
        InterconnectModel {
            interconnect: interconnect.interconnect.clone(),
            pairing_key: interconnect.pairing_key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GcpDestinationModel {
    pub primary: Vec<InterconnectModel>,
    pub secondary: Vec<InterconnectModel>,
    #[serde(default)]
    pub qos_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterPairedToGcpConfig {
    pub name: String,
    pub bandwidth: String,
    pub source: Vec<GcpSourceModel>,
    pub destination: Vec<GcpDestinationModel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterPairedToGcpState {
    pub id: String,
    pub name: String,
    pub bandwidth: String,
    pub source: Vec<GcpSourceModel>,
    pub destination: Vec<GcpDestinationModel>,
    pub redundant: bool,
    pub tenant_id: String,
    pub area: String,
    pub operation_id: Option<String>,
    pub operation_status: String,
    pub primary_connected_network_address: Option<String>,
    pub secondary_connected_network_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Revision {
    V1,
    V2,
}

impl Revision {
    fn secondary_med_attribute(self) -> Attribute {
        let attr = AttributeBuilder::new("secondary_med_out", AttributeType::Number);
        match self {
            Revision::V1 => attr
                .description("Always the primary MED plus 10")
                .computed()
                .build(),
            Revision::V2 => attr.required().validator(IntOneOf::new([20, 40])).build(),
        }
    }

    fn secondary_med(self, source: &GcpSourceModel) -> Result<i64, Diagnostic> {
        match self {
            Revision::V1 => Ok(source.primary_med_out + SECONDARY_MED_OFFSET),
            Revision::V2 => source.secondary_med_out.ok_or_else(|| {
                Diagnostic::error(
                    "Missing secondary_med_out",
                    "source.secondary_med_out must be set",
                )
            }),
        }
    }
}

fn single<'a, T>(items: &'a [T], what: &str) -> Result<&'a T, Diagnostic> {
    match items {
        [item] => Ok(item),
        _ => Err(Diagnostic::error(
            format!("Invalid {}", what),
            format!("expected exactly one {} block, got {}", what, items.len()),
        )),
    }
}

fn source_from(
    config: &RouterPairedToGcpConfig,
    revision: Revision,
) -> Result<GcpSource, Diagnostic> {
    let source = single(&config.source, "source")?;
    let filter = single(&source.route_filter, "source.route_filter")?;
    Ok(GcpSource {
        router_id: source.router_id.clone(),
        group_name: source.group_name.clone(),
        route_filter: route_filter(&filter.in_, &filter.out),
        primary: MedInfo::out(source.primary_med_out),
        secondary: MedInfo::out(revision.secondary_med(source)?),
    })
}

fn interconnect_block(name: &str) -> NestedBlock {
    BlockBuilder::new(name)
        .nesting(NestingMode::List)
        .exactly(1)
        .attribute(
            AttributeBuilder::new("interconnect", AttributeType::String)
                .required()
                .requires_replace()
                .validator(StringOneOf::new(GCP_INTERCONNECTS))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("pairing_key", AttributeType::String)
                .required()
                .requires_replace()
                .validator(StringPattern::new(
                    PAIRING_KEY_PATTERN,
                    "a Partner Interconnect pairing key",
                ))
                .build(),
        )
        .build()
}

fn gcp_schema(revision: Revision) -> Schema {
    let filter = BlockBuilder::new("route_filter")
        .nesting(NestingMode::List)
        .exactly(1)
        .attribute(updatable_one_of("in", ROUTE_FILTER_IN))
        .attribute(updatable_one_of("out", GCP_ROUTE_FILTER_OUT))
        .build();

    let source = BlockBuilder::new("source")
        .nesting(NestingMode::List)
        .exactly(1)
        .attribute(
            AttributeBuilder::new("router_id", AttributeType::String)
                .required()
                .requires_replace()
                .validator(StringPattern::new(ROUTER_ID_PATTERN, "F followed by 12 digits"))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("group_name", AttributeType::String)
                .required()
                .requires_replace()
                .validator(StringOneOf::new(GROUP_NAMES))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("primary_med_out", AttributeType::Number)
                .required()
                .validator(IntOneOf::new([10, 30]))
                .build(),
        )
        .attribute(revision.secondary_med_attribute())
        .block(filter)
        .build();

    let destination = BlockBuilder::new("destination")
        .nesting(NestingMode::List)
        .exactly(1)
        .attribute(computed("qos_type", AttributeType::String))
        .block(interconnect_block("primary"))
        .block(interconnect_block("secondary"))
        .build();

    SchemaBuilder::new()
        .version(0)
        .description("Redundant connection from a FIC router to Google Cloud Partner Interconnect")
        .attribute(id_attribute())
        .attribute(
            AttributeBuilder::new("name", AttributeType::String)
                .required()
                .requires_replace()
                .validator(StringPattern::new(
                    NAME_PATTERN,
                    "at most 64 alphanumeric characters or &()-_",
                ))
                .build(),
        )
        .attribute(updatable_one_of("bandwidth", GCP_BANDWIDTHS))
        .attribute(computed("redundant", AttributeType::Bool))
        .attribute(computed("tenant_id", AttributeType::String))
        .attribute(computed("area", AttributeType::String))
        .attribute(computed("operation_id", AttributeType::String))
        .attribute(computed("operation_status", AttributeType::String))
        .attribute(computed("primary_connected_network_address", AttributeType::String))
        .attribute(computed("secondary_connected_network_address", AttributeType::String))
        .block(source)
        .block(destination)
        .build()
}

fn create_request(
    config: &RouterPairedToGcpConfig,
    revision: Revision,
) -> Result<CreateRequestOf<RouterPairedToGcp>, Diagnostic> {
    let source = source_from(config, revision)?;
    let destination = single(&config.destination, "destination")?;
    let primary = single(&destination.primary, "destination.primary")?;
    let secondary = single(&destination.secondary, "destination.secondary")?;

    Ok(CreateRequestOf::<RouterPairedToGcp>::new(
        &config.name,
        source,
        GcpDestination {
            qos_type: GCP_QOS_TYPE.to_string(),
            primary: primary.into(),
            secondary: secondary.into(),
        },
        &config.bandwidth,
    ))
}

fn state(connection: &ConnectionOf<RouterPairedToGcp>) -> RouterPairedToGcpState {
    let source = &connection.source;
    let destination = &connection.destination;
    RouterPairedToGcpState {
        id: connection.id.clone(),
        name: connection.name.clone(),
        bandwidth: connection.bandwidth.clone(),
        source: vec![GcpSourceModel {
            router_id: source.router_id.clone(),
            group_name: source.group_name.clone(),
            route_filter: vec![RouteFilterModel {
                in_: source.route_filter.in_.clone(),
                out: source.route_filter.out.clone(),
            }],
            primary_med_out: source.primary.med.out,
            secondary_med_out: Some(source.secondary.med.out),
        }],
        destination: vec![GcpDestinationModel {
            primary: vec![(&destination.primary).into()],
            secondary: vec![(&destination.secondary).into()],
            qos_type: Some(destination.qos_type.clone()),
        }],
        redundant: connection.redundant,
        tenant_id: connection.tenant_id.clone(),
        area: connection.area.clone(),
        operation_id: connection.operation_id.clone(),
        operation_status: connection.operation_status.to_string(),
        primary_connected_network_address: connection.primary_connected_network_address.clone(),
        secondary_connected_network_address: connection
            .secondary_connected_network_address
            .clone(),
    }
}

async fn update(
    client: &Client,
    id: &str,
    config: &RouterPairedToGcpConfig,
    revision: Revision,
) -> Result<(), ApiError> {
    let source = source_from(config, revision).map_err(|diag| ApiError::Config(diag.detail))?;
    let request: UpdateRequestOf<RouterPairedToGcp> = UpdateConnectionRequest {
        source: Some(GcpSourceUpdate::from(&source)),
        destination: None,
        bandwidth: Some(config.bandwidth.clone()),
    };
    client
        .connections::<RouterPairedToGcp>()
        .update(id, &request)
        .await
        .map(|_| ())
}

fn gcp_timings(base: PollTimings) -> PollTimings {
    PollTimings {
        min_interval: Duration::from_secs(5),
        ..base
    }
}

const GCP_UPDATABLE: &[&str] = &["source", "bandwidth"];

pub struct RouterPairedToGcpV1Model;

#[async_trait]
impl ConnectionModel for RouterPairedToGcpV1Model {
    type Kind = RouterPairedToGcp;
    type Config = RouterPairedToGcpConfig;
    type State = RouterPairedToGcpState;

    const TYPE_NAME: &'static str = "fic_eri_router_paired_to_gcp_connection_v1";
    const UPDATABLE: &'static [&'static str] = GCP_UPDATABLE;

    fn schema() -> Schema {
        gcp_schema(Revision::V1)
    }

    fn timings(base: PollTimings) -> PollTimings {
        gcp_timings(base)
    }

    fn create_request(
        config: &RouterPairedToGcpConfig,
    ) -> Result<CreateRequestOf<RouterPairedToGcp>, Diagnostic> {
        create_request(config, Revision::V1)
    }

    fn state(
        connection: &ConnectionOf<RouterPairedToGcp>,
        _prior: &DynamicValue,
    ) -> RouterPairedToGcpState {
        state(connection)
    }

    async fn update(
        client: &Client,
        id: &str,
        config: &RouterPairedToGcpConfig,
    ) -> Result<(), ApiError> {
        update(client, id, config, Revision::V1).await
    }
}

pub struct RouterPairedToGcpV2Model;

#[async_trait]
impl ConnectionModel for RouterPairedToGcpV2Model {
    type Kind = RouterPairedToGcp;
    type Config = RouterPairedToGcpConfig;
    type State = RouterPairedToGcpState;

    const TYPE_NAME: &'static str = "fic_eri_router_paired_to_gcp_connection_v2";
    const UPDATABLE: &'static [&'static str] = GCP_UPDATABLE;

    fn schema() -> Schema {
        gcp_schema(Revision::V2)
    }

    fn timings(base: PollTimings) -> PollTimings {
        gcp_timings(base)
    }

    fn create_request(
        config: &RouterPairedToGcpConfig,
    ) -> Result<CreateRequestOf<RouterPairedToGcp>, Diagnostic> {
        create_request(config, Revision::V2)
    }

    fn state(
        connection: &ConnectionOf<RouterPairedToGcp>,
        _prior: &DynamicValue,
    ) -> RouterPairedToGcpState {
        state(connection)
    }

    async fn update(
        client: &Client,
        id: &str,
        config: &RouterPairedToGcpConfig,
    ) -> Result<(), ApiError> {
        update(client, id, config, Revision::V2).await
    }
}
