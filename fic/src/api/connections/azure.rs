//! Connections to Azure ExpressRoute, sourced from a port pair or a router

use super::{ConnectionKind, PortVlan, RouteFilterUpdate, RouterSource, UpdatableConnection};
use serde::{Deserialize, Serialize};

/// Redundant port pair plus the customer's ASN
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortPairSource {
    pub primary: PortVlan,
    pub secondary: PortVlan,
    pub asn: String,
}

/// ExpressRoute circuit. The shared key is write-only and prefixes only apply
/// to Microsoft peering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureDestination {
    pub interconnect: String,
    pub qos_type: String,
    pub service_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertised_public_prefixes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_registry_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzurePrefixesUpdate {
    pub advertised_public_prefixes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_registry_name: Option<String>,
}

pub struct PortToAzureMicrosoft;

impl ConnectionKind for PortToAzureMicrosoft {
    const PATH: &'static str = "/port-to-azure-microsoft-connections";
    type Source = PortPairSource;
    type Destination = AzureDestination;
}

impl UpdatableConnection for PortToAzureMicrosoft {
    type SourceUpdate = ();
    type DestinationUpdate = AzurePrefixesUpdate;
}

pub struct PortToAzurePrivate;

impl ConnectionKind for PortToAzurePrivate {
    const PATH: &'static str = "/port-to-azure-private-connections";
    type Source = PortPairSource;
    type Destination = AzureDestination;
}

pub struct RouterToAzureMicrosoft;

impl ConnectionKind for RouterToAzureMicrosoft {
    const PATH: &'static str = "/router-to-azure-microsoft-connections";
    type Source = RouterSource;
    type Destination = AzureDestination;
}

impl UpdatableConnection for RouterToAzureMicrosoft {
    type SourceUpdate = RouteFilterUpdate;
    type DestinationUpdate = AzurePrefixesUpdate;
}

pub struct RouterToAzurePrivate;

impl ConnectionKind for RouterToAzurePrivate {
    const PATH: &'static str = "/router-to-azure-private-connections";
    type Source = RouterSource;
    type Destination = AzureDestination;
}

impl UpdatableConnection for RouterToAzurePrivate {
    type SourceUpdate = RouteFilterUpdate;
    type DestinationUpdate = ();
}
