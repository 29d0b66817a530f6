use super::{ConnectionKind, RouteFilterUpdate, RouterSource, UpdatableConnection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutboundRouteFilter {
    pub out: String,
}

/// Arcstar Universal One VPN. `c_number` is accepted on create but never
/// returned; `contract_number` is assigned by the service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnoDestination {
    pub interconnect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_number: Option<String>,
    pub parent_contract_number: String,
    pub vpn_number: String,
    pub qos_type: String,
    pub route_filter: OutboundRouteFilter,
    #[serde(default, skip_serializing)]
    pub contract_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnoDestinationUpdate {
    pub route_filter: OutboundRouteFilter,
}

pub struct RouterToUno;

impl ConnectionKind for RouterToUno {
    const PATH: &'static str = "/router-to-uno-connections";
    type Source = RouterSource;
    type Destination = UnoDestination;
}

impl UpdatableConnection for RouterToUno {
    type SourceUpdate = RouteFilterUpdate;
    type DestinationUpdate = UnoDestinationUpdate;
}
