//! Firewall component resource implementation

use super::{component_id, deactivate_and_wait, COMPONENT_GROUP_NAMES};
use crate::api::firewalls::{
    ActivateFirewallRequest, AddressSet, ApplicationSet, CustomApplication, Firewall,
    FirewallEntry, FirewallMatch, FirewallRule, RoutingGroupSetting, UpdateFirewallRequest,
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
    Attribute, AttributeBuilder, AttributeType, BlockBuilder, NestingMode, Schema, SchemaBuilder,
};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{ListLength, StringOneOf};
use tracing::{debug, info};

const PROTOCOLS: &[&str] = &["tcp", "udp"];

/// Attributes whose change sends a new policy
const POLICY_ATTRIBUTES: &[&str] = &[
    "rules",
    "custom_applications",
    "application_sets",
    "routing_group_settings",
];

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct FirewallEntryModel {
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub match_source_address_sets: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub match_destination_address_sets: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub match_application: String,
    #[serde(default, deserialize_with = "null_default")]
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct FirewallRuleModel {
    pub from: String,
    pub to: String,
    #[serde(default, deserialize_with = "null_default")]
    pub entries: Vec<FirewallEntryModel>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CustomApplicationModel {
    pub name: String,
    pub protocol: String,
    pub destination_port: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ApplicationSetModel {
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub applications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct AddressSetModel {
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct RoutingGroupSettingModel {
    pub group_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub address_sets: Vec<AddressSetModel>,
}

impl From<&FirewallRuleModel> for FirewallRule {
    fn from(model: &FirewallRuleModel) -> Self {
        Self {
            from: model.from.clone(),
            to: model.to.clone(),
            entries: model
                .entries
                .iter()
                .map(|e| FirewallEntry {
                    name: e.name.clone(),
                    match_: FirewallMatch {
                        source_address_sets: e.match_source_address_sets.clone(),
                        destination_address_sets: e.match_destination_address_sets.clone(),
                        application: e.match_application.clone(),
                    },
                    action: e.action.clone(),
                })
                .collect(),
        }
    }
}

impl From<&FirewallRule> for FirewallRuleModel {
    fn from(rule: &FirewallRule) -> Self {
        Self {
            from: rule.from.clone(),
            to: rule.to.clone(),
            entries: rule
                .entries
                .iter()
                .map(|e| FirewallEntryModel {
                    name: e.name.clone(),
                    match_source_address_sets: e.match_.source_address_sets.clone(),
                    match_destination_address_sets: e.match_.destination_address_sets.clone(),
                    match_application: e.match_.application.clone(),
                    action: e.action.clone(),
                })
                .collect(),
        }
    }
}

impl From<&CustomApplicationModel> for CustomApplication {
    fn from(model: &CustomApplicationModel) -> Self {
        Self {
            name: model.name.clone(),
            protocol: model.protocol.clone(),
            destination_port: model.destination_port.clone(),
        }
    }
}

impl From<&CustomApplication> for CustomApplicationModel {
    fn from(app: &CustomApplication) -> Self {
        Self {
            name: app.name.clone(),
            protocol: app.protocol.clone(),
            destination_port: app.destination_port.clone(),
        }
    }
}

impl From<&ApplicationSetModel> for ApplicationSet {
    fn from(model: &ApplicationSetModel) -> Self {
        Self {
            name: model.name.clone(),
            applications: model.applications.clone(),
        }
    }
}

impl From<&ApplicationSet> for ApplicationSetModel {
    fn from(set: &ApplicationSet) -> Self {
        Self {
            name: set.name.clone(),
            applications: set.applications.clone(),
        }
    }
}

impl From<&RoutingGroupSettingModel> for RoutingGroupSetting {
    fn from(model: &RoutingGroupSettingModel) -> Self {
        Self {
            group_name: model.group_name.clone(),
            address_sets: model
                .address_sets
                .iter()
                .map(|s| AddressSet {
                    name: s.name.clone(),
                    addresses: s.addresses.clone(),
                })
                .collect(),
        }
    }
}

impl From<&RoutingGroupSetting> for RoutingGroupSettingModel {
    fn from(setting: &RoutingGroupSetting) -> Self {
        Self {
            group_name: setting.group_name.clone(),
            address_sets: setting
                .address_sets
                .iter()
                .map(|s| AddressSetModel {
                    name: s.name.clone(),
                    addresses: s.addresses.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirewallConfig {
    pub router_id: String,
    pub firewall_id: String,
    pub user_ip_addresses: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub rules: Vec<FirewallRuleModel>,
    #[serde(default, deserialize_with = "null_default")]
    pub custom_applications: Vec<CustomApplicationModel>,
    #[serde(default, deserialize_with = "null_default")]
    pub application_sets: Vec<ApplicationSetModel>,
    #[serde(default, deserialize_with = "null_default")]
    pub routing_group_settings: Vec<RoutingGroupSettingModel>,
}

impl FirewallConfig {
    pub fn policy_request(&self) -> UpdateFirewallRequest {
        UpdateFirewallRequest {
            rules: self.rules.iter().map(Into::into).collect(),
            custom_applications: self.custom_applications.iter().map(Into::into).collect(),
            application_sets: self.application_sets.iter().map(Into::into).collect(),
            routing_group_settings: self.routing_group_settings.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FirewallState {
    pub id: String,
    pub router_id: String,
    pub firewall_id: String,
    pub user_ip_addresses: Vec<String>,
    pub rules: Vec<FirewallRuleModel>,
    pub custom_applications: Vec<CustomApplicationModel>,
    pub application_sets: Vec<ApplicationSetModel>,
    pub routing_group_settings: Vec<RoutingGroupSettingModel>,
    pub redundant: bool,
    pub is_activated: bool,
}

impl FirewallState {
    fn new(id: &ComponentId, firewall: &Firewall) -> Self {
        Self {
            id: id.to_string(),
            router_id: id.router_id.clone(),
            firewall_id: id.component_id.clone(),
            user_ip_addresses: firewall.user_ip_addresses.clone(),
            rules: firewall.rules.iter().map(Into::into).collect(),
            custom_applications: firewall.custom_applications.iter().map(Into::into).collect(),
            application_sets: firewall.application_sets.iter().map(Into::into).collect(),
            routing_group_settings: firewall
                .routing_group_settings
                .iter()
                .map(Into::into)
                .collect(),
            redundant: firewall.redundant,
            is_activated: firewall.is_activated,
        }
    }
}

#[derive(Default)]
pub struct FirewallResource {
    provider_data: Option<FicProviderData>,
}

impl FirewallResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        let group = |name: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .required()
                .validator(StringOneOf::new(COMPONENT_GROUP_NAMES))
                .build()
        };
        let names = |name: &str, max: usize| -> Attribute {
            AttributeBuilder::new(name, string_list())
                .required()
                .validator(ListLength {
                    min: None,
                    max: Some(max),
                })
                .build()
        };
        let required = |name: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .required()
                .build()
        };

        SchemaBuilder::new()
            .version(0)
            .description("Activates and configures the firewall component of a FIC ERI router")
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
                AttributeBuilder::new("firewall_id", AttributeType::String)
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("user_ip_addresses", string_list())
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
                BlockBuilder::new("rules")
                    .nesting(NestingMode::List)
                    .attribute(group("from"))
                    .attribute(group("to"))
                    .block(
                        BlockBuilder::new("entries")
                            .nesting(NestingMode::List)
                            .min_items(1)
                            .attribute(required("name"))
                            .attribute(names("match_source_address_sets", 10))
                            .attribute(names("match_destination_address_sets", 10))
                            .attribute(required("match_application"))
                            .attribute(required("action"))
                            .build(),
                    )
                    .build(),
            )
            .block(
                BlockBuilder::new("custom_applications")
                    .nesting(NestingMode::List)
                    .attribute(required("name"))
                    .attribute(
                        AttributeBuilder::new("protocol", AttributeType::String)
                            .required()
                            .validator(StringOneOf::new(PROTOCOLS))
                            .build(),
                    )
                    .attribute(required("destination_port"))
                    .build(),
            )
            .block(
                BlockBuilder::new("application_sets")
                    .nesting(NestingMode::List)
                    .attribute(required("name"))
                    .attribute(names("applications", 10))
                    .build(),
            )
            .block(
                BlockBuilder::new("routing_group_settings")
                    .nesting(NestingMode::List)
                    .attribute(group("group_name"))
                    .block(
                        BlockBuilder::new("address_sets")
                            .nesting(NestingMode::List)
                            .min_items(1)
                            .max_items(5)
                            .attribute(required("name"))
                            .attribute(names("addresses", 10))
                            .build(),
                    )
                    .build(),
            )
            .build()
    }

    async fn read_state(
        client: &Client,
        id: &ComponentId,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        match found(client.firewalls(&id.router_id).get(&id.component_id).await) {
            Ok(Some(firewall)) => common::encode(&FirewallState::new(id, &firewall)).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(api_error("Failed to read firewall component", &e)),
        }
    }

    /// Replaces the whole policy and waits until the router has applied it
    async fn apply_policy(
        provider_data: &FicProviderData,
        ctx: &Context,
        id: &ComponentId,
        request: &UpdateFirewallRequest,
    ) -> Result<(), Diagnostic> {
        let client = provider_data.client.as_ref();
        let (router_id, firewall_id) = (id.router_id.as_str(), id.component_id.as_str());

        client
            .firewalls(router_id)
            .update(firewall_id, request)
            .await
            .map_err(|e| api_error("Failed to update firewall component", &e))?;

        let timings = bounded_timings(ctx, provider_data.timings);
        wait_completed(firewall_id, timings, move || async move {
            with_status(client.firewalls(router_id).get(firewall_id).await)
        })
        .await
        .map(|_| ())
        .map_err(|e| {
            operation_error(
                format!("Error waiting for firewall component ({}) to be updated", id),
                &e,
            )
        })
    }
}

#[async_trait]
impl Resource for FirewallResource {
    fn type_name(&self) -> &str {
        "fic_eri_firewall_component_v1"
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

        let config: FirewallConfig = match common::decode(&request.config, "firewall component") {
            Ok(config) => config,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let id = ComponentId::new(&config.router_id, &config.firewall_id);
        let _guard = provider_data.locks.lock(&config.router_id).await;

        let client = provider_data.client.as_ref();
        let (router_id, firewall_id) = (config.router_id.as_str(), config.firewall_id.as_str());
        let activate = ActivateFirewallRequest {
            user_ip_addresses: config.user_ip_addresses.clone(),
        };
        let firewall = match client.firewalls(router_id).activate(firewall_id, &activate).await {
            Ok(firewall) => firewall,
            Err(e) => {
                diagnostics.push(api_error("Failed to activate firewall component", &e));
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };
        info!("Firewall component ID: {}", id);

        let mut new_state = match common::encode(&FirewallState::new(&id, &firewall)) {
            Ok(state) => state,
            Err(diag) => {
                diagnostics.push(diag);
                DynamicValue::null()
            }
        };

        let timings = bounded_timings(&ctx, provider_data.timings);
        if let Err(e) = wait_completed(firewall_id, timings, move || async move {
            with_status(client.firewalls(router_id).get(firewall_id).await)
        })
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for firewall component ({}) to become ready", id),
                &e,
            ));
            return CreateResourceResponse {
                new_state,
                diagnostics,
            };
        }

        let policy = config.policy_request();
        if !policy.is_empty() {
            debug!("Applying firewall policy to {}", id);
            if let Err(diag) = Self::apply_policy(provider_data, &ctx, &id, &policy).await {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state,
                    diagnostics,
                };
            }
        }

        match Self::read_state(client, &id).await {
            Ok(Some(state)) => new_state = state,
            Ok(None) => diagnostics.push(Diagnostic::error(
                "Firewall component disappeared",
                format!("Firewall component {} was not found right after activation", id),
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

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        let changed = POLICY_ATTRIBUTES.iter().any(|name| {
            request
                .prior_state
                .has_change(&request.planned_state, &AttributePath::new(name))
        });
        if !changed {
            return UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics,
            };
        }

        let config: FirewallConfig = match common::decode(&request.config, "firewall component") {
            Ok(config) => config,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };
        let id = ComponentId::new(&config.router_id, &config.firewall_id);
        let _guard = provider_data.locks.lock(&config.router_id).await;

        // An empty request clears the policy on the router
        if let Err(diag) =
            Self::apply_policy(provider_data, &ctx, &id, &config.policy_request()).await
        {
            diagnostics.push(diag);
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let new_state = match Self::read_state(&provider_data.client, &id).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                diagnostics.push(Diagnostic::error(
                    "Firewall component disappeared",
                    format!("Firewall component {} was not found after the update", id),
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
        let (router_id, firewall_id) = (id.router_id.as_str(), id.component_id.as_str());
        let timings = bounded_timings(&ctx, provider_data.timings);
        if let Err(e) = deactivate_and_wait(
            firewall_id,
            timings,
            move || async move { client.firewalls(router_id).deactivate(firewall_id).await },
            move || async move { with_status(client.firewalls(router_id).get(firewall_id).await) },
        )
        .await
        {
            diagnostics.push(operation_error(
                format!("Error waiting for firewall component ({}) to deactivate", id),
                &e,
            ));
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for FirewallResource {
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
impl ResourceWithImportState for FirewallResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        tfplug::import_state_split_id(
            &ctx,
            &["router_id", "firewall_id"],
            &request,
            &mut response,
        );
        response
    }
}

#[cfg(test)]
#[path = "./resource_firewall_test.rs"]
mod resource_firewall_test;
