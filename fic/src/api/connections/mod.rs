//! Connection API implementation
//!
//! Every connection kind lives under its own collection path and shares the
//! same envelope (`{"connection": {...}}`) and lifecycle. A kind only differs
//! in the shape of its `source` and `destination` objects, so the request and
//! response types are generic over those two and the per-kind modules supply
//! the concrete shapes.

pub mod azure;
pub mod ecl;
pub mod gcp;
pub mod port_to_port;
pub mod router_to_port;
pub mod uno;

use super::common::{FicApiResource, HasOperationStatus};
use super::{ApiError, Client};
use crate::operation::OperationStatus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

pub use azure::{PortToAzureMicrosoft, PortToAzurePrivate, RouterToAzureMicrosoft, RouterToAzurePrivate};
pub use ecl::RouterToEcl;
pub use gcp::RouterPairedToGcp;
pub use port_to_port::PortToPort;
pub use router_to_port::RouterToPort;
pub use uno::RouterToUno;

/// Describes one connection kind: where it lives and what its endpoints
/// look like on the wire
pub trait ConnectionKind: Send + Sync + 'static {
    const PATH: &'static str;
    type Source: Serialize + DeserializeOwned + Clone + Send + Sync;
    type Destination: Serialize + DeserializeOwned + Clone + Send + Sync;
}

/// Kinds whose route filters or destinations can change in place
pub trait UpdatableConnection: ConnectionKind {
    type SourceUpdate: Serialize + Send + Sync;
    type DestinationUpdate: Serialize + Send + Sync;
}

/// BGP route filter of a router-sourced endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteFilter {
    #[serde(rename = "in")]
    pub in_: String,
    pub out: String,
}

/// Port and VLAN pair
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortVlan {
    pub port_id: String,
    pub vlan: i64,
}

/// Source of every router-sourced kind that only carries a route filter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSource {
    pub router_id: String,
    pub group_name: String,
    pub route_filter: RouteFilter,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteFilterUpdate {
    pub route_filter: RouteFilter,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionRequest<S, D> {
    pub name: String,
    pub source: S,
    pub destination: D,
    pub bandwidth: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_connected_network_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_connected_network_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_network_address: Option<String>,
}

impl<S, D> CreateConnectionRequest<S, D> {
    pub fn new(name: impl Into<String>, source: S, destination: D, bandwidth: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source,
            destination,
            bandwidth: bandwidth.into(),
            primary_connected_network_address: None,
            secondary_connected_network_address: None,
            connected_network_address: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConnectionRequest<S, D> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<String>,
}

impl<S, D> Default for UpdateConnectionRequest<S, D> {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            bandwidth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<S, D> {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub redundant: bool,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub bandwidth: String,
    pub source: S,
    pub destination: D,
    #[serde(default)]
    pub primary_connected_network_address: Option<String>,
    #[serde(default)]
    pub secondary_connected_network_address: Option<String>,
    #[serde(default)]
    pub connected_network_address: Option<String>,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub operation_status: OperationStatus,
}

impl<S: DeserializeOwned, D: DeserializeOwned> FicApiResource for Connection<S, D> {
    const ROOT_KEY: &'static str = "connection";
}

impl<S, D> HasOperationStatus for Connection<S, D> {
    fn operation_status(&self) -> OperationStatus {
        self.operation_status.clone()
    }
}

pub type ConnectionOf<K> =
    Connection<<K as ConnectionKind>::Source, <K as ConnectionKind>::Destination>;
pub type CreateRequestOf<K> =
    CreateConnectionRequest<<K as ConnectionKind>::Source, <K as ConnectionKind>::Destination>;
pub type UpdateRequestOf<K> = UpdateConnectionRequest<
    <K as UpdatableConnection>::SourceUpdate,
    <K as UpdatableConnection>::DestinationUpdate,
>;

/// Connections API for one kind
pub struct ConnectionsApi<'a, K: ConnectionKind> {
    client: &'a Client,
    kind: PhantomData<K>,
}

impl<'a, K: ConnectionKind> ConnectionsApi<'a, K> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }

    fn path(id: &str) -> String {
        format!("{}/{}", K::PATH, id)
    }

    pub async fn create(&self, request: &CreateRequestOf<K>) -> Result<ConnectionOf<K>, ApiError> {
        self.client.post_resource(K::PATH, request).await
    }

    pub async fn get(&self, id: &str) -> Result<ConnectionOf<K>, ApiError> {
        self.client.get_resource(&Self::path(id)).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&Self::path(id)).await
    }
}

impl<'a, K: UpdatableConnection> ConnectionsApi<'a, K> {
    pub async fn update(
        &self,
        id: &str,
        request: &UpdateRequestOf<K>,
    ) -> Result<ConnectionOf<K>, ApiError> {
        self.client.put_resource(&Self::path(id), request).await
    }
}
