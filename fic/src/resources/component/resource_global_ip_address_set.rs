//! NAT global IP address set resource implementation

use crate::api::global_ip_address_sets::{CreateGlobalIpAddressSetRequest, GlobalIpAddressSet};
use crate::api::Client;
use crate::id::GlobalIpAddressSetId;
use crate::operation::{delete_with_retry, Poller};
use crate::provider_data::FicProviderData;
use crate::resources::common::{
    self, api_error, bounded_timings, found, not_configured, operation_error, string_list,
    wait_completed, with_status,
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
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{NumberRange, StringOneOf};
use tokio::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalIpAddressSetConfig {
    pub router_id: String,
    pub nat_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub set_type: String,
    pub number_of_addresses: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalIpAddressSetState {
    pub id: String,
    pub router_id: String,
    pub nat_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub set_type: String,
    pub number_of_addresses: i64,
    pub addresses: Vec<String>,
    pub operation_status: String,
}

impl GlobalIpAddressSetState {
    fn new(id: &GlobalIpAddressSetId, set: &GlobalIpAddressSet) -> Self {
        Self {
            id: id.to_string(),
            router_id: id.router_id.clone(),
            nat_id: id.nat_id.clone(),
            name: set.name.clone(),
            set_type: set.set_type.clone(),
            number_of_addresses: set.number_of_addresses,
            addresses: set.addresses.clone(),
            operation_status: set.operation_status.to_string(),
        }
    }
}

#[derive(Default)]
pub struct GlobalIpAddressSetResource {
    provider_data: Option<FicProviderData>,
}

impl GlobalIpAddressSetResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        let forced = |name: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .required()
                .requires_replace()
                .build()
        };

        SchemaBuilder::new()
            .version(0)
            .description("Reserves a set of global IP addresses on a NAT component")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(forced("router_id"))
            .attribute(forced("nat_id"))
            .attribute(forced("name"))
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .required()
                    .requires_replace()
                    .validator(StringOneOf::new(&["sourceNapt", "destinationNat"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("number_of_addresses", AttributeType::Number)
                    .required()
                    .requires_replace()
                    .validator(NumberRange {
                        min: Some(1.0),
                        max: None,
                    })
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("addresses", string_list())
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("operation_status", AttributeType::String)
                    .computed()
                    .build(),
            )
            .build()
    }

    fn set_id(state: &DynamicValue) -> Result<Option<GlobalIpAddressSetId>, Diagnostic> {
        let Some(raw) = state.get_string_opt(&AttributePath::new("id")) else {
            return Ok(None);
        };
        raw.parse::<GlobalIpAddressSetId>()
            .map(Some)
            .map_err(|e| Diagnostic::error("Invalid global IP address set id", e.to_string()))
    }

    async fn read_state(
        client: &Client,
        id: &GlobalIpAddressSetId,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        match found(
            client
                .global_ip_address_sets(&id.router_id, &id.nat_id)
                .get(&id.set_id)
                .await,
        ) {
            Ok(Some(set)) => common::encode(&GlobalIpAddressSetState::new(id, &set)).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(api_error("Failed to read global IP address set", &e)),
        }
    }
}

#[async_trait]
impl Resource for GlobalIpAddressSetResource {
    fn type_name(&self) -> &str {
        "fic_eri_nat_global_ip_address_set_v1"
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

        let config: GlobalIpAddressSetConfig =
            match common::decode(&request.config, "global IP address set") {
                Ok(config) => config,
                Err(diag) => {
                    diagnostics.push(diag);
                    return CreateResourceResponse {
                        new_state: DynamicValue::null(),
                        diagnostics,
                    };
                }
            };

        let _guard = provider_data.locks.lock(&config.router_id).await;

        let client = provider_data.client.as_ref();
        let create_request = CreateGlobalIpAddressSetRequest {
            name: config.name.clone(),
            set_type: config.set_type.clone(),
            number_of_addresses: config.number_of_addresses,
        };
        let set = match client
            .global_ip_address_sets(&config.router_id, &config.nat_id)
            .create(&create_request)
            .await
        {
            Ok(set) => set,
            Err(e) => {
                diagnostics.push(api_error("Failed to create global IP address set", &e));
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let id = GlobalIpAddressSetId::new(&config.router_id, &config.nat_id, &set.id);
        info!("Global IP Address Set ID: {}", set.id);

        let mut new_state = match common::encode(&GlobalIpAddressSetState::new(&id, &set)) {
            Ok(state) => state,
            Err(diag) => {
                diagnostics.push(diag);
                DynamicValue::null()
            }
        };

        let (router_id, nat_id, set_id) = (
            id.router_id.as_str(),
            id.nat_id.as_str(),
            id.set_id.as_str(),
        );
        let timings = bounded_timings(&ctx, provider_data.timings);
        if let Err(e) = wait_completed(set_id, timings, move || async move {
            with_status(
                client
                    .global_ip_address_sets(router_id, nat_id)
                    .get(set_id)
                    .await,
            )
        })
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for global ip address set ({}) to become ready", set_id),
                &e,
            ));
            return CreateResourceResponse {
                new_state,
                diagnostics,
            };
        }

        match Self::read_state(client, &id).await {
            Ok(Some(state)) => new_state = state,
            Ok(None) => diagnostics.push(Diagnostic::error(
                "Global IP address set disappeared",
                format!("Global IP address set {} was not found right after creation", id),
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

        let id = match Self::set_id(&request.current_state) {
            Ok(Some(id)) => id,
            Ok(None) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                }
            }
            Err(diag) => {
                diagnostics.push(diag);
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        match Self::read_state(&provider_data.client, &id).await {
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

        let id = match Self::set_id(&request.prior_state) {
            Ok(Some(id)) => id,
            Ok(None) => return DeleteResourceResponse { diagnostics },
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };
        let _guard = provider_data.locks.lock(&id.router_id).await;

        let client = provider_data.client.as_ref();
        let (router_id, nat_id, set_id) = (
            id.router_id.as_str(),
            id.nat_id.as_str(),
            id.set_id.as_str(),
        );
        let timings = bounded_timings(&ctx, provider_data.timings);
        let deadline = Instant::now() + timings.timeout;

        let deleted =
            delete_with_retry(set_id, timings.timeout, timings.min_interval, move || async move {
                client
                    .global_ip_address_sets(router_id, nat_id)
                    .delete(set_id)
                    .await
            })
            .await;
        // The set never reports Completed while it is being released
        let result = match deleted {
            Ok(()) => Poller::until_removed(set_id, timings.until(deadline))
                .run(move || async move {
                    with_status(
                        client
                            .global_ip_address_sets(router_id, nat_id)
                            .get(set_id)
                            .await,
                    )
                })
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            diagnostics.push(operation_error(
                format!("Error waiting for global ip address set ({}) to delete", id),
                &e,
            ));
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for GlobalIpAddressSetResource {
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
impl ResourceWithImportState for GlobalIpAddressSetResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        let id = match request.id.parse::<GlobalIpAddressSetId>() {
            Ok(id) => id,
            Err(e) => {
                response.diagnostics.push(Diagnostic::error(
                    "Invalid import ID",
                    format!("expected router_id/nat_id/set_id: {}", e),
                ));
                return response;
            }
        };

        tfplug::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        if let Some(imported) = response.imported_resources.last_mut() {
            for (name, value) in [("router_id", &id.router_id), ("nat_id", &id.nat_id)] {
                if let Err(e) = imported
                    .state
                    .set_string(&AttributePath::new(name), value.clone())
                {
                    response
                        .diagnostics
                        .push(Diagnostic::error("Failed to set import ID", e.to_string()));
                }
            }
        }
        response
    }
}

#[cfg(test)]
#[path = "./resource_global_ip_address_set_test.rs"]
mod resource_global_ip_address_set_test;
