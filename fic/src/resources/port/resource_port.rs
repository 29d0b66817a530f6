//! Port resource implementation

use crate::api::ports::{CreatePortRequest, Port, VlanRange};
use crate::api::Client;
use crate::operation::{OperationError, PollTimings};
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
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{IntOneOf, StringOneOf};
use tracing::{debug, info};

const MAX_VLANS: i64 = 512;

#[derive(Debug, Clone, Deserialize)]
pub struct PortConfig {
    pub name: String,
    pub switch_name: String,
    #[serde(default)]
    pub port_type: Option<String>,
    #[serde(default)]
    pub number_of_vlans: Option<i64>,
    #[serde(default)]
    pub vlan_ranges: Option<Vec<VlanRange>>,
    #[serde(default)]
    pub is_activated: Option<bool>,
}

impl PortConfig {
    fn create_request(&self) -> CreatePortRequest {
        let (number_of_vlans, vlan_ranges) = match (self.number_of_vlans, &self.vlan_ranges) {
            (Some(n), _) if n != 0 => (Some(n), None),
            (_, Some(ranges)) => (None, Some(ranges.iter().map(VlanRange::to_string).collect())),
            _ => (None, None),
        };

        CreatePortRequest {
            name: self.name.clone(),
            switch_name: self.switch_name.clone(),
            port_type: self.port_type.clone(),
            number_of_vlans,
            vlan_ranges,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VlanState {
    pub vid: i64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortState {
    pub id: String,
    pub name: String,
    pub switch_name: String,
    pub port_type: String,
    /// Only known from configuration, the API reports ranges
    pub number_of_vlans: Option<i64>,
    pub vlan_ranges: Vec<VlanRange>,
    pub is_activated: bool,
    pub tenant_id: String,
    pub area: String,
    pub location: String,
    pub vlans: Vec<VlanState>,
}

impl PortState {
    fn new(port: &Port, number_of_vlans: Option<i64>) -> Result<Self, Diagnostic> {
        let vlan_ranges = port
            .parsed_vlan_ranges()
            .map_err(|e| api_error("Failed to read port VLAN ranges", &e))?;

        Ok(Self {
            id: port.id.clone(),
            name: port.name.clone(),
            switch_name: port.switch_name.clone(),
            port_type: port.port_type.clone(),
            number_of_vlans,
            vlan_ranges,
            is_activated: port.is_activated,
            tenant_id: port.tenant_id.clone(),
            area: port.area.clone(),
            location: port.location.clone(),
            vlans: port
                .vlans
                .iter()
                .map(|v| VlanState {
                    vid: v.vid,
                    status: v.status.clone(),
                })
                .collect(),
        })
    }
}

#[derive(Default)]
pub struct PortResource {
    provider_data: Option<FicProviderData>,
}

impl PortResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        let range = object_list(&[("start", AttributeType::Number), ("end", AttributeType::Number)]);

        SchemaBuilder::new()
            .version(0)
            .description("Manages a FIC ERI port")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
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
                AttributeBuilder::new("switch_name", AttributeType::String)
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("number_of_vlans", AttributeType::Number)
                    .description("Number of VLANs to reserve, a multiple of 16")
                    .optional()
                    .requires_replace()
                    .conflicts_with(&["vlan_ranges"])
                    .validator(IntOneOf::new((1..=MAX_VLANS / 16).map(|n| n * 16)))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vlan_ranges", range)
                    .description("Explicit VLAN ranges to reserve")
                    .optional()
                    .computed()
                    .requires_replace()
                    .conflicts_with(&["number_of_vlans"])
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("port_type", AttributeType::String)
                    .optional()
                    .computed()
                    .requires_replace()
                    .validator(StringOneOf::new(&["1G", "10G"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("is_activated", AttributeType::Bool)
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tenant_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(AttributeBuilder::new("area", AttributeType::String).computed().build())
            .attribute(
                AttributeBuilder::new("location", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "vlans",
                    object_list(&[("vid", AttributeType::Number), ("status", AttributeType::String)]),
                )
                .computed()
                .build(),
            )
            .build()
    }

    async fn activate(client: &Client, id: &str, timings: PollTimings) -> Result<(), OperationError> {
        client
            .ports()
            .activate(id)
            .await
            .map_err(|e| OperationError::from_api(id, e))?;
        debug!("Waiting for port ({}) to become active", id);
        wait_completed(id, timings, move || async move {
            with_status(client.ports().get(id).await)
        })
        .await?;
        Ok(())
    }

    async fn read_state(
        provider_data: &FicProviderData,
        id: &str,
        number_of_vlans: Option<i64>,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        match found(provider_data.client.ports().get(id).await) {
            Ok(Some(port)) => common::encode(&PortState::new(&port, number_of_vlans)?).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(api_error("Failed to read port", &e)),
        }
    }

    fn number_of_vlans(state: &DynamicValue) -> Option<i64> {
        state.get_i64(&AttributePath::new("number_of_vlans")).ok()
    }
}

#[async_trait]
impl Resource for PortResource {
    fn type_name(&self) -> &str {
        "fic_eri_port_v1"
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

        let config: PortConfig = match common::decode(&request.config, "port") {
            Ok(config) => config,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let client = provider_data.client.as_ref();
        let port = match client.ports().create(&config.create_request()).await {
            Ok(port) => port,
            Err(e) => {
                diagnostics.push(api_error("Error creating FIC ERI port", &e));
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };
        info!("Port ID: {}", port.id);

        let id = port.id.as_str();
        let mut new_state = match PortState::new(&port, config.number_of_vlans)
            .and_then(|state| common::encode(&state))
        {
            Ok(state) => state,
            Err(diag) => {
                diagnostics.push(diag);
                DynamicValue::null()
            }
        };

        let timings = bounded_timings(&ctx, provider_data.timings);
        if let Err(e) = wait_completed(id, timings, move || async move {
            with_status(client.ports().get(id).await)
        })
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for port ({}) to become ready", id),
                &e,
            ));
            return CreateResourceResponse {
                new_state,
                diagnostics,
            };
        }

        if config.is_activated == Some(true) {
            if let Err(e) = Self::activate(client, id, timings).await {
                diagnostics.push(operation_error(
                    format!("Error waiting for port ({}) to become active", id),
                    &e,
                ));
                return CreateResourceResponse {
                    new_state,
                    diagnostics,
                };
            }
        }

        match Self::read_state(provider_data, id, config.number_of_vlans).await {
            Ok(Some(state)) => new_state = state,
            Ok(None) => diagnostics.push(Diagnostic::error(
                "Port disappeared",
                format!("Port {} was not found right after creation", id),
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

        let number_of_vlans = Self::number_of_vlans(&request.current_state);
        match Self::read_state(provider_data, &id, number_of_vlans).await {
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

        let Some(id) = request.prior_state.get_string_opt(&AttributePath::new("id")) else {
            diagnostics.push(Diagnostic::error("Missing port id", "The prior state has no id"));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        let path = AttributePath::new("is_activated");
        if request.prior_state.has_change(&request.planned_state, &path) {
            match request.planned_state.get_bool(&path) {
                Ok(true) => {
                    let timings = bounded_timings(&ctx, provider_data.timings);
                    if let Err(e) = Self::activate(&provider_data.client, &id, timings).await {
                        diagnostics.push(operation_error(
                            format!("Error waiting for port ({}) to become active", id),
                            &e,
                        ));
                        return UpdateResourceResponse {
                            new_state: request.prior_state,
                            diagnostics,
                        };
                    }
                }
                Ok(false) => {
                    diagnostics.push(
                        Diagnostic::error(
                            "Port cannot be deactivated",
                            "An activated port stays active until it is deleted",
                        )
                        .with_attribute(path),
                    );
                    return UpdateResourceResponse {
                        new_state: request.prior_state,
                        diagnostics,
                    };
                }
                // Left to the API when not configured
                Err(_) => {}
            }
        }

        let number_of_vlans = Self::number_of_vlans(&request.prior_state);
        match Self::read_state(provider_data, &id, number_of_vlans).await {
            Ok(Some(state)) => UpdateResourceResponse {
                new_state: state,
                diagnostics,
            },
            Ok(None) => {
                diagnostics.push(Diagnostic::error(
                    "Port disappeared",
                    format!("Port {} was not found", id),
                ));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
            Err(diag) => {
                diagnostics.push(diag);
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
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
            move || async move { client.ports().delete(id).await },
            move || async move { with_status(client.ports().get(id).await) },
        )
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for port ({}) to delete", id),
                &e,
            ));
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for PortResource {
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
impl ResourceWithImportState for PortResource {
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
#[path = "./resource_port_test.rs"]
mod resource_port_test;
