//! NAT component resource implementation

use super::{component_id, deactivate_and_wait, COMPONENT_GROUP_NAMES};
use crate::api::nats::{
    ActivateNatRequest, DestinationMatch, DestinationNatEntry, DestinationNatRule,
    GlobalIpAddressSetSpec, Nat, SourceNaptEntry, SourceNaptRule, UpdateNatRequest,
};
use crate::api::Client;
use crate::id::ComponentId;
use crate::provider_data::FicProviderData;
use crate::resources::common::{
    self, api_error, bounded_timings, found, not_configured, null_default, operation_error,
    string_list, wait_completed, with_status,
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
use tfplug::schema::{
    AttributeBuilder, AttributeType, BlockBuilder, NestingMode, Schema, SchemaBuilder,
};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{Each, ListLength, StringOneOf};
use tracing::{debug, info};

const SET_TYPES: &[&str] = &["sourceNapt", "destinationNat"];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GlobalIpAddressSetModel {
    pub name: String,
    #[serde(rename = "type")]
    pub set_type: String,
    pub number_of_addresses: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct SourceNaptEntryModel {
    #[serde(default, deserialize_with = "null_default")]
    pub then: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct SourceNaptRuleModel {
    #[serde(default, deserialize_with = "null_default")]
    pub from: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub to: String,
    #[serde(default, deserialize_with = "null_default")]
    pub entries: Vec<SourceNaptEntryModel>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DestinationNatEntryModel {
    #[serde(default, deserialize_with = "null_default")]
    pub match_destination_address: String,
    #[serde(default, deserialize_with = "null_default")]
    pub then: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DestinationNatRuleModel {
    #[serde(default, deserialize_with = "null_default")]
    pub from: String,
    #[serde(default, deserialize_with = "null_default")]
    pub to: String,
    #[serde(default, deserialize_with = "null_default")]
    pub entries: Vec<DestinationNatEntryModel>,
}

impl From<&GlobalIpAddressSetSpec> for GlobalIpAddressSetModel {
    fn from(spec: &GlobalIpAddressSetSpec) -> Self {
        Self {
            name: spec.name.clone(),
            set_type: spec.set_type.clone(),
            number_of_addresses: spec.number_of_addresses,
        }
    }
}

impl From<&GlobalIpAddressSetModel> for GlobalIpAddressSetSpec {
    fn from(model: &GlobalIpAddressSetModel) -> Self {
        Self {
            name: model.name.clone(),
            set_type: model.set_type.clone(),
            number_of_addresses: model.number_of_addresses,
        }
    }
}

impl From<&SourceNaptRuleModel> for SourceNaptRule {
    fn from(model: &SourceNaptRuleModel) -> Self {
        Self {
            from: model.from.clone(),
            to: model.to.clone(),
            entries: model
                .entries
                .iter()
                .map(|e| SourceNaptEntry {
                    then: e.then.clone(),
                })
                .collect(),
        }
    }
}

impl From<&SourceNaptRule> for SourceNaptRuleModel {
    fn from(rule: &SourceNaptRule) -> Self {
        Self {
            from: rule.from.clone(),
            to: rule.to.clone(),
            entries: rule
                .entries
                .iter()
                .map(|e| SourceNaptEntryModel {
                    then: e.then.clone(),
                })
                .collect(),
        }
    }
}

impl From<&DestinationNatRuleModel> for DestinationNatRule {
    fn from(model: &DestinationNatRuleModel) -> Self {
        Self {
            from: model.from.clone(),
            to: model.to.clone(),
            entries: model
                .entries
                .iter()
                .map(|e| DestinationNatEntry {
                    match_: DestinationMatch {
                        destination_address: e.match_destination_address.clone(),
                    },
                    then: e.then.clone(),
                })
                .collect(),
        }
    }
}

impl From<&DestinationNatRule> for DestinationNatRuleModel {
    fn from(rule: &DestinationNatRule) -> Self {
        Self {
            from: rule.from.clone(),
            to: rule.to.clone(),
            entries: rule
                .entries
                .iter()
                .map(|e| DestinationNatEntryModel {
                    match_destination_address: e.match_.destination_address.clone(),
                    then: e.then.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatConfig {
    pub router_id: String,
    pub nat_id: String,
    pub user_ip_addresses: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub global_ip_address_sets: Vec<GlobalIpAddressSetModel>,
    #[serde(default, deserialize_with = "null_default")]
    pub source_napt_rules: Vec<SourceNaptRuleModel>,
    #[serde(default, deserialize_with = "null_default")]
    pub destination_nat_rules: Vec<DestinationNatRuleModel>,
}

impl NatConfig {
    pub fn activate_request(&self) -> ActivateNatRequest {
        ActivateNatRequest {
            user_ip_addresses: self.user_ip_addresses.clone(),
            global_ip_address_sets: self.global_ip_address_sets.iter().map(Into::into).collect(),
        }
    }

    pub fn rules_request(&self) -> UpdateNatRequest {
        UpdateNatRequest {
            source_napt_rules: self.source_napt_rules.iter().map(Into::into).collect(),
            destination_nat_rules: self.destination_nat_rules.iter().map(Into::into).collect(),
        }
    }

    pub fn has_rules(&self) -> bool {
        !self.source_napt_rules.is_empty() || !self.destination_nat_rules.is_empty()
    }
}

/// Values the API does not echo back and that are kept from the prior state
#[derive(Debug, Default, Deserialize)]
struct NatPrior {
    #[serde(default, deserialize_with = "null_default")]
    global_ip_address_sets: Vec<GlobalIpAddressSetModel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NatState {
    pub id: String,
    pub router_id: String,
    pub nat_id: String,
    pub user_ip_addresses: Vec<String>,
    pub global_ip_address_sets: Vec<GlobalIpAddressSetModel>,
    pub source_napt_rules: Vec<SourceNaptRuleModel>,
    pub destination_nat_rules: Vec<DestinationNatRuleModel>,
    pub redundant: bool,
    pub is_activated: bool,
}

impl NatState {
    fn new(id: &ComponentId, nat: &Nat, prior_sets: Vec<GlobalIpAddressSetModel>) -> Self {
        let global_ip_address_sets = if nat.global_ip_address_sets.is_empty() {
            prior_sets
        } else {
            nat.global_ip_address_sets.iter().map(Into::into).collect()
        };

        Self {
            id: id.to_string(),
            router_id: id.router_id.clone(),
            nat_id: id.component_id.clone(),
            user_ip_addresses: nat.user_ip_addresses.clone(),
            global_ip_address_sets,
            source_napt_rules: nat.source_napt_rules.iter().map(Into::into).collect(),
            destination_nat_rules: nat.destination_nat_rules.iter().map(Into::into).collect(),
            redundant: nat.redundant,
            is_activated: nat.is_activated,
        }
    }
}

#[derive(Default)]
pub struct NatResource {
    provider_data: Option<FicProviderData>,
}

impl NatResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        let group = || StringOneOf::new(COMPONENT_GROUP_NAMES);

        SchemaBuilder::new()
            .version(0)
            .description("Activates and configures the NAT component of a FIC ERI router")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("router_id", AttributeType::String)
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("nat_id", AttributeType::String)
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("user_ip_addresses", string_list())
                    .description("Four /30 networks handed to the NAT component")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("redundant", AttributeType::Bool)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("is_activated", AttributeType::Bool)
                    .computed()
                    .build(),
            )
            .block(
                BlockBuilder::new("global_ip_address_sets")
                    .nesting(NestingMode::List)
                    .min_items(1)
                    .requires_replace()
                    .attribute(
                        AttributeBuilder::new("name", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("type", AttributeType::String)
                            .required()
                            .validator(StringOneOf::new(SET_TYPES))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("number_of_addresses", AttributeType::Number)
                            .required()
                            .build(),
                    )
                    .build(),
            )
            .block(
                BlockBuilder::new("source_napt_rules")
                    .nesting(NestingMode::List)
                    .attribute(
                        AttributeBuilder::new("from", string_list())
                            .required()
                            .validator(Each(group()))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("to", AttributeType::String)
                            .required()
                            .validator(group())
                            .build(),
                    )
                    .block(
                        BlockBuilder::new("entries")
                            .nesting(NestingMode::List)
                            .min_items(1)
                            .attribute(
                                AttributeBuilder::new("then", string_list())
                                    .description("Global IP address set names, at most 8")
                                    .required()
                                    .validator(ListLength {
                                        min: Some(1),
                                        max: Some(8),
                                    })
                                    .build(),
                            )
                            .build(),
                    )
                    .build(),
            )
            .block(
                BlockBuilder::new("destination_nat_rules")
                    .nesting(NestingMode::List)
                    .attribute(
                        AttributeBuilder::new("from", AttributeType::String)
                            .required()
                            .validator(group())
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("to", AttributeType::String)
                            .required()
                            .validator(group())
                            .build(),
                    )
                    .block(
                        BlockBuilder::new("entries")
                            .nesting(NestingMode::List)
                            .min_items(1)
                            .attribute(
                                AttributeBuilder::new(
                                    "match_destination_address",
                                    AttributeType::String,
                                )
                                .required()
                                .build(),
                            )
                            .attribute(
                                AttributeBuilder::new("then", AttributeType::String)
                                    .required()
                                    .build(),
                            )
                            .build(),
                    )
                    .build(),
            )
            .build()
    }

    async fn read_state(
        client: &Client,
        id: &ComponentId,
        prior: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let nat = match found(client.nats(&id.router_id).get(&id.component_id).await) {
            Ok(Some(nat)) => nat,
            Ok(None) => return Ok(None),
            Err(e) => return Err(api_error("Failed to read NAT component", &e)),
        };

        let prior: NatPrior = prior.decode().unwrap_or_default();
        common::encode(&NatState::new(id, &nat, prior.global_ip_address_sets)).map(Some)
    }

    /// Replaces the NAT rules and waits for the router to apply them
    async fn apply_rules(
        provider_data: &FicProviderData,
        ctx: &Context,
        id: &ComponentId,
        config: &NatConfig,
    ) -> Result<(), Diagnostic> {
        let client = provider_data.client.as_ref();
        let (router_id, nat_id) = (id.router_id.as_str(), id.component_id.as_str());

        client
            .nats(router_id)
            .update(nat_id, &config.rules_request())
            .await
            .map_err(|e| api_error("Failed to update NAT rules", &e))?;

        let timings = bounded_timings(ctx, provider_data.timings);
        wait_completed(nat_id, timings, move || async move {
            with_status(client.nats(router_id).get(nat_id).await)
        })
        .await
        .map(|_| ())
        .map_err(|e| {
            operation_error(
                format!("Error waiting for NAT component ({}) to be updated", id),
                &e,
            )
        })
    }
}

#[async_trait]
impl Resource for NatResource {
    fn type_name(&self) -> &str {
        "fic_eri_nat_component_v1"
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

        let config: NatConfig = match common::decode(&request.config, "NAT component") {
            Ok(config) => config,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let id = ComponentId::new(&config.router_id, &config.nat_id);
        let _guard = provider_data.locks.lock(&config.router_id).await;

        let client = provider_data.client.as_ref();
        let (router_id, nat_id) = (config.router_id.as_str(), config.nat_id.as_str());
        let nat = match client
            .nats(router_id)
            .activate(nat_id, &config.activate_request())
            .await
        {
            Ok(nat) => nat,
            Err(e) => {
                diagnostics.push(api_error("Failed to activate NAT component", &e));
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };
        info!("NAT component ID: {}", id);

        let mut new_state =
            match common::encode(&NatState::new(&id, &nat, config.global_ip_address_sets.clone())) {
                Ok(state) => state,
                Err(diag) => {
                    diagnostics.push(diag);
                    DynamicValue::null()
                }
            };

        let timings = bounded_timings(&ctx, provider_data.timings);
        if let Err(e) = wait_completed(nat_id, timings, move || async move {
            with_status(client.nats(router_id).get(nat_id).await)
        })
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for NAT component ({}) to become ready", id),
                &e,
            ));
            return CreateResourceResponse {
                new_state,
                diagnostics,
            };
        }

        if config.has_rules() {
            debug!("Applying NAT rules to {}", id);
            if let Err(diag) = Self::apply_rules(provider_data, &ctx, &id, &config).await {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state,
                    diagnostics,
                };
            }
        }

        match Self::read_state(client, &id, &request.config).await {
            Ok(Some(state)) => new_state = state,
            Ok(None) => diagnostics.push(Diagnostic::error(
                "NAT component disappeared",
                format!("NAT component {} was not found right after activation", id),
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

        let id = match component_id(&request.current_state) {
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

        let rules_changed = ["source_napt_rules", "destination_nat_rules"]
            .iter()
            .any(|name| {
                request
                    .prior_state
                    .has_change(&request.planned_state, &AttributePath::new(name))
            });
        if !rules_changed {
            return UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics,
            };
        }

        let config: NatConfig = match common::decode(&request.config, "NAT component") {
            Ok(config) => config,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };
        let id = ComponentId::new(&config.router_id, &config.nat_id);
        let _guard = provider_data.locks.lock(&config.router_id).await;

        if let Err(diag) = Self::apply_rules(provider_data, &ctx, &id, &config).await {
            diagnostics.push(diag);
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        match Self::read_state(&provider_data.client, &id, &request.prior_state).await {
            Ok(Some(state)) => UpdateResourceResponse {
                new_state: state,
                diagnostics,
            },
            Ok(None) => {
                diagnostics.push(Diagnostic::error(
                    "NAT component disappeared",
                    format!("NAT component {} was not found after the update", id),
                ));
                UpdateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                }
            }
            Err(diag) => {
                diagnostics.push(diag);
                UpdateResourceResponse {
                    new_state: request.planned_state,
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

        let id = match component_id(&request.prior_state) {
            Ok(Some(id)) => id,
            Ok(None) => return DeleteResourceResponse { diagnostics },
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };
        let _guard = provider_data.locks.lock(&id.router_id).await;

        let client = provider_data.client.as_ref();
        let (router_id, nat_id) = (id.router_id.as_str(), id.component_id.as_str());
        let timings = bounded_timings(&ctx, provider_data.timings);
        if let Err(e) = deactivate_and_wait(
            nat_id,
            timings,
            move || async move { client.nats(router_id).deactivate(nat_id).await },
            move || async move { with_status(client.nats(router_id).get(nat_id).await) },
        )
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for NAT component ({}) to deactivate", id),
                &e,
            ));
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for NatResource {
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
impl ResourceWithImportState for NatResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        tfplug::import_state_split_id(&ctx, &["router_id", "nat_id"], &request, &mut response);
        response
    }
}

#[cfg(test)]
#[path = "./resource_nat_test.rs"]
mod resource_nat_test;
