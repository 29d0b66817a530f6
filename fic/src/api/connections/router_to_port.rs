//! Router to port connections, single or paired
//!
//! The paired variant carries a `secondary` block on both ends; the single
//! variant omits it.

use super::{ConnectionKind, RouteFilter, UpdatableConnection};
use crate::api::common::as_path_prepend;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AsPathPrepend {
    #[serde(rename = "in", with = "as_path_prepend", default)]
    pub in_: Option<String>,
    #[serde(with = "as_path_prepend", default)]
    pub out: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHaInfo {
    pub ip_address: String,
    #[serde(default)]
    pub as_path_prepend: AsPathPrepend,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRouterSource {
    pub router_id: String,
    pub group_name: String,
    pub route_filter: RouteFilter,
    pub primary: SourceHaInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SourceHaInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationHaInfo {
    pub port_id: String,
    pub vlan: i64,
    pub ip_address: String,
    pub asn: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortDestination {
    pub primary: DestinationHaInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<DestinationHaInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrependUpdate {
    pub as_path_prepend: AsPathPrepend,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRouterSourceUpdate {
    pub route_filter: RouteFilter,
    pub primary: PrependUpdate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<PrependUpdate>,
}

pub struct RouterToPort;

impl ConnectionKind for RouterToPort {
    const PATH: &'static str = "/router-to-port-connections";
    type Source = PortRouterSource;
    type Destination = PortDestination;
}

impl UpdatableConnection for RouterToPort {
    type SourceUpdate = PortRouterSourceUpdate;
    type DestinationUpdate = ();
}
