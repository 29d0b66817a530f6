//! Router resource implementation

use crate::api::routers::{CreateRouterRequest, Router};
use crate::provider_data::FicProviderData;
use crate::resources::common::{
    self, api_error, bounded_timings, delete_and_wait, found, not_configured, object_list,
    operation_error, wait_completed, with_status,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
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
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    pub name: String,
    pub area: String,
    pub user_ip_address: String,
    #[serde(default)]
    pub redundant: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentState {
    pub id: String,
    pub is_activated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutingGroupState {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterState {
    pub id: String,
    pub name: String,
    pub area: String,
    pub user_ip_address: String,
    pub redundant: bool,
    pub tenant_id: String,
    pub firewalls: Vec<ComponentState>,
    pub nats: Vec<ComponentState>,
    pub routing_groups: Vec<RoutingGroupState>,
    pub firewall_id: Option<String>,
    pub nat_id: Option<String>,
}

impl From<&Router> for RouterState {
    fn from(router: &Router) -> Self {
        let components = |refs: &[crate::api::routers::ComponentRef]| {
            refs.iter()
                .map(|c| ComponentState {
                    id: c.id.clone(),
                    is_activated: c.is_activated,
                })
                .collect()
        };

        Self {
            id: router.id.clone(),
            name: router.name.clone(),
            area: router.area.clone(),
            user_ip_address: router.user_ip_address.clone(),
            redundant: router.redundant,
            tenant_id: router.tenant_id.clone(),
            firewalls: components(&router.firewalls),
            nats: components(&router.nats),
            routing_groups: router
                .routing_groups
                .iter()
                .map(|g| RoutingGroupState {
                    name: g.name.clone(),
                })
                .collect(),
            firewall_id: router.firewall_id().map(str::to_string),
            nat_id: router.nat_id().map(str::to_string),
        }
    }
}

#[derive(Default)]
pub struct RouterResource {
    provider_data: Option<FicProviderData>,
}

impl RouterResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        let component = || {
            object_list(&[
                ("id", AttributeType::String),
                ("is_activated", AttributeType::Bool),
            ])
        };

        SchemaBuilder::new()
            .version(0)
            .description("Manages a FIC ERI router")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Router id")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("area", AttributeType::String)
                    .description("Area the router lives in, e.g. JPEAST")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("user_ip_address", AttributeType::String)
                    .description("CIDR handed to the router for its interfaces")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("redundant", AttributeType::Bool)
                    .optional()
                    .requires_replace()
                    .default_value(Dynamic::Bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tenant_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(AttributeBuilder::new("firewalls", component()).computed().build())
            .attribute(AttributeBuilder::new("nats", component()).computed().build())
            .attribute(
                AttributeBuilder::new("routing_groups", object_list(&[("name", AttributeType::String)]))
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("firewall_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("nat_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .build()
    }

    fn extract_router_config(config: &DynamicValue) -> Result<CreateRouterRequest, Diagnostic> {
        let config: RouterConfig = common::decode(config, "router")?;
        Ok(CreateRouterRequest {
            name: config.name,
            area: config.area,
            user_ip_address: config.user_ip_address,
            redundant: config.redundant.unwrap_or(false),
        })
    }

    /// Fetches the router; `Ok(None)` when it no longer exists
    async fn read_state(
        provider_data: &FicProviderData,
        id: &str,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        match found(provider_data.client.routers().get(id).await) {
            Ok(Some(router)) => common::encode(&RouterState::from(&router)).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(api_error("Failed to read router", &e)),
        }
    }
}

#[async_trait]
impl Resource for RouterResource {
    fn type_name(&self) -> &str {
        "fic_eri_router_v1"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: Self::schema_static().validate(&request.config),
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

        let create_request = match Self::extract_router_config(&request.config) {
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
        let router = match client.routers().create(&create_request).await {
            Ok(router) => router,
            Err(e) => {
                diagnostics.push(api_error("Failed to create router", &e));
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };
        info!("Router ID: {}", router.id);

        // From here on the router exists, so any failure still records its id
        let mut new_state = match common::encode(&RouterState::from(&router)) {
            Ok(state) => state,
            Err(diag) => {
                diagnostics.push(diag);
                DynamicValue::null()
            }
        };

        let id = router.id.as_str();
        let timings = bounded_timings(&ctx, provider_data.timings);
        if let Err(e) = wait_completed(id, timings, move || async move {
            with_status(client.routers().get(id).await)
        })
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for router ({}) to become ready", id),
                &e,
            ));
            return CreateResourceResponse {
                new_state,
                diagnostics,
            };
        }

        match Self::read_state(provider_data, id).await {
            Ok(Some(state)) => new_state = state,
            Ok(None) => diagnostics.push(Diagnostic::error(
                "Router disappeared",
                format!("Router {} was not found right after creation", id),
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

        match Self::read_state(provider_data, &id).await {
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

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        // Every input forces replacement
        UpdateResourceResponse {
            new_state: request.prior_state,
            diagnostics: vec![],
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
        let timings = bounded_timings(&ctx, provider_data.timings);
        if let Err(e) = delete_and_wait(
            id,
            timings,
            move || async move { client.routers().delete(id).await },
            move || async move { with_status(client.routers().get(id).await) },
        )
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for router ({}) to delete", id),
                &e,
            ));
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for RouterResource {
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
impl ResourceWithImportState for RouterResource {
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

#[cfg(test)]
#[path = "./resource_router_test.rs"]
mod resource_router_test;
