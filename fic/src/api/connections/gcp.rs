//! Paired router to Google Cloud Partner Interconnect

use super::{ConnectionKind, RouteFilter, UpdatableConnection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Med {
    pub out: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MedInfo {
    pub med: Med,
}

impl MedInfo {
    pub fn out(out: i64) -> Self {
        Self { med: Med { out } }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpSource {
    pub router_id: String,
    pub group_name: String,
    pub route_filter: RouteFilter,
    pub primary: MedInfo,
    pub secondary: MedInfo,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpInterconnect {
    pub interconnect: String,
    pub pairing_key: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpDestination {
    pub qos_type: String,
    pub primary: GcpInterconnect,
    pub secondary: GcpInterconnect,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpSourceUpdate {
    pub route_filter: RouteFilter,
    pub primary: MedInfo,
    pub secondary: MedInfo,
}

impl From<&GcpSource> for GcpSourceUpdate {
    fn from(source: &GcpSource) -> Self {
        Self {
            route_filter: source.route_filter.clone(),
            primary: source.primary,
            secondary: source.secondary,
        }
    }
}

pub struct RouterPairedToGcp;

impl ConnectionKind for RouterPairedToGcp {
    const PATH: &'static str = "/router-to-gcp-connections";
    type Source = GcpSource;
    type Destination = GcpDestination;
}

impl UpdatableConnection for RouterPairedToGcp {
    type SourceUpdate = GcpSourceUpdate;
    type DestinationUpdate = ();
}
