use super::{
    common_computed, computed, forced, forced_one_of, id_attribute, router_source_attributes,
    updatable_one_of, write_only, ConnectionModel, RouterSourceConfig,
};
use crate::api::connections::uno::{OutboundRouteFilter, UnoDestination, UnoDestinationUpdate};
use crate::api::connections::{
    ConnectionOf, CreateRequestOf, RouterToUno, UpdateConnectionRequest, UpdateRequestOf,
};
use crate::api::{ApiError, Client};
use crate::resources::common::{BANDWIDTHS_UP_TO_1G, QOS_TYPES, ROUTE_FILTER_OUT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};

pub const UNO_INTERCONNECTS: &[&str] = &["Interconnect-Tokyo-1", "Interconnect-Osaka-1"];

/// What the UNO side advertises back towards the router
pub const UNO_ROUTE_FILTER_OUT: &[&str] = &[
    "fullRoute",
    "fullRouteWithDefaultRoute",
    "defaultRoute",
    "privateRoute",
];

#[derive(Debug, Clone, Deserialize)]
pub struct RouterToUnoConfig {
    pub name: String,
    #[serde(flatten)]
    pub source: RouterSourceConfig,
    pub destination_interconnect: String,
    #[serde(default)]
    pub destination_c_number: Option<String>,
    pub destination_parent_contract_number: String,
    pub destination_vpn_number: String,
    pub destination_qos_type: String,
    pub destination_route_filter_out: String,
    pub connected_network_address: String,
    pub bandwidth: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterToUnoState {
    pub id: String,
    pub name: String,
    pub source_router_id: String,
    pub source_group_name: String,
    pub source_route_filter_in: String,
    pub source_route_filter_out: String,
    pub destination_interconnect: String,
    pub destination_c_number: Option<String>,
    pub destination_parent_contract_number: String,
    pub destination_vpn_number: String,
    pub destination_qos_type: String,
    pub destination_route_filter_out: String,
    pub destination_contract_number: Option<String>,
    pub connected_network_address: String,
    pub bandwidth: String,
    pub redundant: bool,
    pub tenant_id: String,
    pub area: String,
}

/// Router to a Universal One VPN
pub struct RouterToUnoModel;

#[async_trait]
impl ConnectionModel for RouterToUnoModel {
    type Kind = RouterToUno;
    type Config = RouterToUnoConfig;
    type State = RouterToUnoState;

    const TYPE_NAME: &'static str = "fic_eri_router_to_uno_connection_v1";
    const UPDATABLE: &'static [&'static str] = &[
        "source_route_filter_in",
        "source_route_filter_out",
        "destination_route_filter_out",
    ];

    fn schema() -> Schema {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Connection from a FIC router to a Universal One VPN")
            .attribute(id_attribute())
            .attribute(forced("name", AttributeType::String));
        let mut builder = router_source_attributes(builder, ROUTE_FILTER_OUT)
            .attribute(forced_one_of("destination_interconnect", UNO_INTERCONNECTS))
            .attribute(
                AttributeBuilder::new("destination_c_number", AttributeType::String)
                    .description("Customer number, only accepted on creation")
                    .optional()
                    .requires_replace()
                    .build(),
            )
            .attribute(forced("destination_parent_contract_number", AttributeType::String))
            .attribute(forced("destination_vpn_number", AttributeType::String))
            .attribute(forced_one_of("destination_qos_type", QOS_TYPES))
            .attribute(updatable_one_of("destination_route_filter_out", UNO_ROUTE_FILTER_OUT))
            .attribute(computed("destination_contract_number", AttributeType::String))
            .attribute(forced("connected_network_address", AttributeType::String))
            .attribute(forced_one_of("bandwidth", BANDWIDTHS_UP_TO_1G));
        for attr in common_computed() {
            builder = builder.attribute(attr);
        }
        builder.build()
    }

    fn create_request(
        config: &RouterToUnoConfig,
    ) -> Result<CreateRequestOf<RouterToUno>, Diagnostic> {
        let mut request = CreateRequestOf::<RouterToUno>::new(
            &config.name,
            config.source.source(),
            UnoDestination {
                interconnect: config.destination_interconnect.clone(),
                c_number: config.destination_c_number.clone(),
                parent_contract_number: config.destination_parent_contract_number.clone(),
                vpn_number: config.destination_vpn_number.clone(),
                qos_type: config.destination_qos_type.clone(),
                route_filter: OutboundRouteFilter {
                    out: config.destination_route_filter_out.clone(),
                },
                contract_number: None,
            },
            &config.bandwidth,
        );
        request.connected_network_address = Some(config.connected_network_address.clone());
        Ok(request)
    }

    fn state(connection: &ConnectionOf<RouterToUno>, prior: &DynamicValue) -> RouterToUnoState {
        let source = &connection.source;
        let destination = &connection.destination;
        RouterToUnoState {
            id: connection.id.clone(),
            name: connection.name.clone(),
            source_router_id: source.router_id.clone(),
            source_group_name: source.group_name.clone(),
            source_route_filter_in: source.route_filter.in_.clone(),
            source_route_filter_out: source.route_filter.out.clone(),
            destination_interconnect: destination.interconnect.clone(),
            destination_c_number: write_only(prior, "destination_c_number"),
            destination_parent_contract_number: destination.parent_contract_number.clone(),
            destination_vpn_number: destination.vpn_number.clone(),
            destination_qos_type: destination.qos_type.clone(),
            destination_route_filter_out: destination.route_filter.out.clone(),
            destination_contract_number: destination.contract_number.clone(),
            connected_network_address: connection
                .connected_network_address
                .clone()
                .unwrap_or_default(),
            bandwidth: connection.bandwidth.clone(),
            redundant: connection.redundant,
            tenant_id: connection.tenant_id.clone(),
            area: connection.area.clone(),
        }
    }

    async fn update(client: &Client, id: &str, config: &RouterToUnoConfig) -> Result<(), ApiError> {
        let request: UpdateRequestOf<RouterToUno> = UpdateConnectionRequest {
            source: Some(config.source.filter_update()),
            destination: Some(UnoDestinationUpdate {
                route_filter: OutboundRouteFilter {
                    out: config.destination_route_filter_out.clone(),
                },
            }),
            bandwidth: None,
        };
        client
            .connections::<RouterToUno>()
            .update(id, &request)
            .await
            .map(|_| ())
    }
}
