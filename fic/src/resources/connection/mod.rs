//! Connection resources
//!
//! All connection kinds share one lifecycle: create, wait until `Completed`,
//! read back, optionally update a few attributes in place, delete and wait
//! until the connection is gone. [`ConnectionResource`] implements that
//! lifecycle once and each kind plugs in a [`ConnectionModel`] describing its
//! schema and how configuration and state map onto the wire types.

pub mod azure;
pub mod ecl;
pub mod gcp;
pub mod port_to_port;
pub mod router_to_port;
pub mod uno;

pub use azure::{
    PortToAzureMicrosoftModel, PortToAzurePrivateModel, RouterToAzureMicrosoftModel,
    RouterToAzurePrivateModel,
};
pub use ecl::RouterToEclModel;
pub use gcp::{RouterPairedToGcpV1Model, RouterPairedToGcpV2Model};
pub use port_to_port::PortToPortModel;
pub use router_to_port::{RouterPairedToPortModel, RouterSingleToPortModel};
pub use uno::RouterToUnoModel;

use crate::api::connections::{
    ConnectionKind, ConnectionOf, CreateRequestOf, RouteFilter, RouteFilterUpdate, RouterSource,
};
use crate::api::{ApiError, Client};
use crate::operation::PollTimings;
use crate::provider_data::FicProviderData;
use crate::resources::common::{
    self, api_error, bounded_timings, delete_and_wait, found, not_configured, operation_error,
    wait_completed, with_status, GROUP_NAMES, ROUTE_FILTER_IN,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, ResourceWithImportState,
    UpdateResourceRequest, UpdateResourceResponse, ValidateResourceConfigRequest,
    ValidateResourceConfigResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::StringOneOf;
use tracing::{debug, info};

/// One connection kind as seen by Terraform
#[async_trait]
pub trait ConnectionModel: Send + Sync + 'static {
    type Kind: ConnectionKind;
    type Config: DeserializeOwned + Send + Sync;
    type State: Serialize;

    const TYPE_NAME: &'static str;

    /// Attributes that are changed in place. A change anywhere else forces
    /// replacement through the schema.
    const UPDATABLE: &'static [&'static str] = &[];

    fn schema() -> Schema;

    fn timings(base: PollTimings) -> PollTimings {
        base
    }

    fn create_request(config: &Self::Config) -> Result<CreateRequestOf<Self::Kind>, Diagnostic>;

    /// Flattens a fetched connection. `prior` is the configuration or the
    /// previous state and supplies values the API never returns.
    fn state(connection: &ConnectionOf<Self::Kind>, prior: &DynamicValue) -> Self::State;

    /// Sends the in-place update for a changed configuration
    async fn update(_client: &Client, _id: &str, _config: &Self::Config) -> Result<(), ApiError> {
        Ok(())
    }
}

pub struct ConnectionResource<M: ConnectionModel> {
    provider_data: Option<FicProviderData>,
    model: PhantomData<M>,
}

impl<M: ConnectionModel> Default for ConnectionResource<M> {
    fn default() -> Self {
        Self {
            provider_data: None,
            model: PhantomData,
        }
    }
}

impl<M: ConnectionModel> ConnectionResource<M> {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_state(
        client: &Client,
        id: &str,
        prior: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        match found(client.connections::<M::Kind>().get(id).await) {
            Ok(Some(connection)) => common::encode(&M::state(&connection, prior)).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(api_error("Failed to read connection", &e)),
        }
    }

    fn has_update(request: &UpdateResourceRequest) -> bool {
        M::UPDATABLE.iter().any(|name| {
            request
                .prior_state
                .has_change(&request.planned_state, &AttributePath::new(name))
        })
    }
}

#[async_trait]
impl<M: ConnectionModel> Resource for ConnectionResource<M> {
    fn type_name(&self) -> &str {
        M::TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: M::TYPE_NAME.to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: M::schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: M::schema().validate(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return CreateResourceResponse {
                new_state: DynamicValue::null(),
                diagnostics,
            };
        };

        let create_request = match common::decode::<M::Config>(&request.config, "connection")
            .and_then(|config| M::create_request(&config))
        {
            Ok(r) => r,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let client = provider_data.client.as_ref();
        let connection = match client.connections::<M::Kind>().create(&create_request).await {
            Ok(connection) => connection,
            Err(e) => {
                diagnostics.push(api_error("Failed to create connection", &e));
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };
        info!("{} ID: {}", M::TYPE_NAME, connection.id);

        let mut new_state = match common::encode(&M::state(&connection, &request.config)) {
            Ok(state) => state,
            Err(diag) => {
                diagnostics.push(diag);
                DynamicValue::null()
            }
        };

        let id = connection.id.as_str();
        let timings = M::timings(bounded_timings(&ctx, provider_data.timings));
        if let Err(e) = wait_completed(id, timings, move || async move {
            with_status(client.connections::<M::Kind>().get(id).await)
        })
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for connection ({}) to become ready", id),
                &e,
            ));
            return CreateResourceResponse {
                new_state,
                diagnostics,
            };
        }

        match Self::read_state(client, id, &request.config).await {
            Ok(Some(state)) => new_state = state,
            Ok(None) => diagnostics.push(Diagnostic::error(
                "Connection disappeared",
                format!("Connection {} was not found right after creation", id),
            )),
            Err(diag) => diagnostics.push(diag),
        }

        CreateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics,
            };
        };

        let Some(id) = request.current_state.get_string_opt(&AttributePath::new("id")) else {
            return ReadResourceResponse {
                new_state: None,
                diagnostics,
            };
        };

        match Self::read_state(&provider_data.client, &id, &request.current_state).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics,
            },
            Err(diag) => {
                diagnostics.push(diag);
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        if !Self::has_update(&request) {
            return UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics,
            };
        }

        let Some(id) = request.prior_state.get_string_opt(&AttributePath::new("id")) else {
            diagnostics.push(Diagnostic::error(
                "Missing connection id",
                "The prior state carries no id to update",
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        let config = match common::decode::<M::Config>(&request.config, "connection") {
            Ok(config) => config,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let client = provider_data.client.as_ref();
        debug!("Updating connection {}", id);
        if let Err(e) = M::update(client, &id, &config).await {
            diagnostics.push(api_error("Failed to update connection", &e));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let id = id.as_str();
        let timings = M::timings(bounded_timings(&ctx, provider_data.timings));
        if let Err(e) = wait_completed(id, timings, move || async move {
            with_status(client.connections::<M::Kind>().get(id).await)
        })
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for connection ({}) to be updated", id),
                &e,
            ));
            return UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics,
            };
        }

        let new_state = match Self::read_state(client, id, &request.config).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                diagnostics.push(Diagnostic::error(
                    "Connection disappeared",
                    format!("Connection {} was not found after the update", id),
                ));
                request.planned_state
            }
            Err(diag) => {
                diagnostics.push(diag);
                request.planned_state
            }
        };

        UpdateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return DeleteResourceResponse { diagnostics };
        };

        let Some(id) = request.prior_state.get_string_opt(&AttributePath::new("id")) else {
            return DeleteResourceResponse { diagnostics };
        };

        let client = provider_data.client.as_ref();
        let id = id.as_str();
        let timings = M::timings(bounded_timings(&ctx, provider_data.timings));
        if let Err(e) = delete_and_wait(
            id,
            timings,
            move || async move { client.connections::<M::Kind>().delete(id).await },
            move || async move { with_status(client.connections::<M::Kind>().get(id).await) },
        )
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for connection ({}) to delete", id),
                &e,
            ));
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<M: ConnectionModel> ResourceWithConfigure for ConnectionResource<M> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];
        match common::provider_data_from(request.provider_data) {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<M: ConnectionModel> ResourceWithImportState for ConnectionResource<M> {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        tfplug::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

// Attribute builders shared by the connection schemas

pub(crate) fn id_attribute() -> Attribute {
    AttributeBuilder::new("id", AttributeType::String)
        .description("Connection id")
        .computed()
        .build()
}

/// Required input that can only change through replacement
pub(crate) fn forced(name: &str, type_: AttributeType) -> Attribute {
    AttributeBuilder::new(name, type_)
        .required()
        .requires_replace()
        .build()
}

pub(crate) fn forced_one_of(name: &str, allowed: &[&str]) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .required()
        .requires_replace()
        .validator(StringOneOf::new(allowed))
        .build()
}

/// Required input sent again on update
pub(crate) fn updatable_one_of(name: &str, allowed: &[&str]) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .required()
        .validator(StringOneOf::new(allowed))
        .build()
}

pub(crate) fn computed(name: &str, type_: AttributeType) -> Attribute {
    AttributeBuilder::new(name, type_).computed().build()
}

/// `redundant`, `tenant_id` and `area` are reported by every kind
pub(crate) fn common_computed() -> Vec<Attribute> {
    vec![
        computed("redundant", AttributeType::Bool),
        computed("tenant_id", AttributeType::String),
        computed("area", AttributeType::String),
    ]
}

pub(crate) fn router_source_attributes(builder: SchemaBuilder, filter_out: &[&str]) -> SchemaBuilder {
    builder
        .attribute(forced("source_router_id", AttributeType::String))
        .attribute(forced_one_of("source_group_name", GROUP_NAMES))
        .attribute(updatable_one_of("source_route_filter_in", ROUTE_FILTER_IN))
        .attribute(updatable_one_of("source_route_filter_out", filter_out))
}

pub(crate) fn route_filter(in_: &str, out: &str) -> RouteFilter {
    RouteFilter {
        in_: in_.to_string(),
        out: out.to_string(),
    }
}

/// Reads a value that only lives in configuration, e.g. a shared key
pub(crate) fn write_only(prior: &DynamicValue, name: &str) -> Option<String> {
    prior.get_string_opt(&AttributePath::new(name))
}

/// Source fields of the router-sourced kinds that carry a plain route filter
#[derive(Debug, Clone, Deserialize)]
pub struct RouterSourceConfig {
    pub source_router_id: String,
    pub source_group_name: String,
    pub source_route_filter_in: String,
    pub source_route_filter_out: String,
}

impl RouterSourceConfig {
    pub fn source(&self) -> RouterSource {
        RouterSource {
            router_id: self.source_router_id.clone(),
            group_name: self.source_group_name.clone(),
            route_filter: route_filter(&self.source_route_filter_in, &self.source_route_filter_out),
        }
    }

    pub fn filter_update(&self) -> RouteFilterUpdate {
        RouteFilterUpdate {
            route_filter: route_filter(&self.source_route_filter_in, &self.source_route_filter_out),
        }
    }
}
