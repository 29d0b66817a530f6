//! Terraform provider for the Flexible InterConnect ERI API

pub mod api;
pub mod config;
pub mod data_sources;
pub mod id;
pub mod lock;
pub mod operation;
pub mod provider_data;
pub mod resources;

pub use provider_data::FicProviderData;

use async_trait::async_trait;
use config::ProviderConfig;
use resources::connection::{
    ConnectionModel, PortToAzureMicrosoftModel, PortToAzurePrivateModel, PortToPortModel,
    RouterPairedToGcpV1Model, RouterPairedToGcpV2Model, RouterPairedToPortModel,
    RouterSingleToPortModel, RouterToAzureMicrosoftModel, RouterToAzurePrivateModel,
    RouterToEclModel, RouterToUnoModel,
};
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory, StopProviderRequest, StopProviderResponse,
    ValidateProviderConfigRequest, ValidateProviderConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, ServerCapabilities};
use tfplug::validator::StringOneOf;
use tracing::{debug, info};

const ENDPOINT_TYPES: &[&str] = &[
    "internal",
    "internalURL",
    "admin",
    "adminURL",
    "public",
    "publicURL",
    "",
];

#[derive(Default)]
pub struct FicProvider {
    provider_data: Option<FicProviderData>,
}

impl FicProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        let setting = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(description)
                .optional()
                .build()
        };
        let secret = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(description)
                .optional()
                .sensitive()
                .build()
        };

        SchemaBuilder::new()
            .version(0)
            .description("Flexible InterConnect ERI provider")
            .attribute(setting(
                "auth_url",
                "Identity v3 endpoint. Falls back to OS_AUTH_URL",
            ))
            .attribute(setting("region", "Region used for the catalog lookup"))
            .attribute(setting("user_name", "User name to log in with"))
            .attribute(setting("user_id", "User ID to log in with"))
            .attribute(secret("password", "Password to log in with"))
            .attribute(secret("token", "Pre-issued token, skips password auth"))
            .attribute(setting("tenant_id", "Tenant (project) ID"))
            .attribute(setting("tenant_name", "Tenant (project) name"))
            .attribute(setting("user_domain_name", "Domain name of the user"))
            .attribute(setting("user_domain_id", "Domain ID of the user"))
            .attribute(setting("project_domain_name", "Domain name of the project"))
            .attribute(setting("project_domain_id", "Domain ID of the project"))
            .attribute(setting("domain_id", "Domain ID to scope to"))
            .attribute(setting("domain_name", "Domain name to scope to"))
            .attribute(setting("default_domain", "Domain used when none is given"))
            .attribute(
                AttributeBuilder::new("insecure", AttributeType::Bool)
                    .description("Skip TLS certificate verification")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("endpoint_type", AttributeType::String)
                    .description("Catalog interface to use, e.g. public or internal")
                    .optional()
                    .validator(StringOneOf::new(ENDPOINT_TYPES))
                    .build(),
            )
            .attribute(setting("cacert_file", "CA bundle to trust, path or PEM"))
            .attribute(setting("cert", "Client certificate, path or PEM"))
            .attribute(secret("key", "Client certificate key, path or PEM"))
            .attribute(setting(
                "endpoint",
                "ERI endpoint. Overrides the service catalog",
            ))
            .build()
    }

    fn connection<M: ConnectionModel>(factories: &mut HashMap<String, ResourceFactory>) {
        factories.insert(
            M::TYPE_NAME.to_string(),
            Box::new(|| Box::new(resources::ConnectionResource::<M>::new())),
        );
    }

    /// Type names of every registered resource and data source together
    /// with their schemas, as printed by `terraform-provider-fic schema`
    pub async fn catalog(&self) -> serde_json::Value {
        let mut resource_schemas = serde_json::Map::new();
        for (name, factory) in self.resources() {
            let resource = factory();
            let response = resource
                .schema(Context::new(), tfplug::resource::ResourceSchemaRequest)
                .await;
            resource_schemas.insert(name, describe(&response.schema));
        }

        let mut data_source_schemas = serde_json::Map::new();
        for (name, factory) in self.data_sources() {
            let data_source = factory();
            let response = data_source
                .schema(Context::new(), tfplug::data_source::DataSourceSchemaRequest)
                .await;
            data_source_schemas.insert(name, describe(&response.schema));
        }

        serde_json::json!({
            "provider": describe(&Self::schema_static()),
            "resource_schemas": resource_schemas,
            "data_source_schemas": data_source_schemas,
        })
    }
}

fn describe_block(block: &tfplug::schema::Block) -> serde_json::Value {
    let attributes: serde_json::Map<String, serde_json::Value> = block
        .attributes
        .iter()
        .map(|attr| {
            (
                attr.name.clone(),
                serde_json::json!({
                    "required": attr.required,
                    "optional": attr.optional,
                    "computed": attr.computed,
                    "sensitive": attr.sensitive,
                    "force_new": attr.requires_replace,
                }),
            )
        })
        .collect();
    let blocks: serde_json::Map<String, serde_json::Value> = block
        .block_types
        .iter()
        .map(|nested| {
            let mut value = describe_block(&nested.block);
            value["min_items"] = nested.min_items.into();
            value["max_items"] = nested.max_items.into();
            (nested.type_name.clone(), value)
        })
        .collect();
    serde_json::json!({
        "description": block.description,
        "attributes": attributes,
        "blocks": blocks,
    })
}

fn describe(schema: &Schema) -> serde_json::Value {
    let mut value = describe_block(&schema.block);
    value["version"] = schema.version.into();
    value
}

#[async_trait]
impl Provider for FicProvider {
    fn type_name(&self) -> &str {
        "fic"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
            server_capabilities: ServerCapabilities::default(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse {
            diagnostics: Self::schema_static().validate(&request.config),
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut diagnostics = vec![];

        let config = match ProviderConfig::load(&request.config) {
            Ok(config) => config,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider configuration",
                    e.to_string(),
                ));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };
        debug!(
            "Configuring provider for region {:?}, endpoint type {}",
            config.region,
            config.interface()
        );

        match api::Client::connect(&config).await {
            Ok(client) => {
                info!("Connected to ERI endpoint {}", client.base_url());
                let data = FicProviderData::new(client);
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: Some(Arc::new(data)),
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create API client",
                    format!("API error: {}", e),
                ));
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    async fn stop(&self, _ctx: Context, _request: StopProviderRequest) -> StopProviderResponse {
        StopProviderResponse { error: None }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            "fic_eri_router_v1".to_string(),
            Box::new(|| Box::new(resources::RouterResource::new())),
        );
        factories.insert(
            "fic_eri_port_v1".to_string(),
            Box::new(|| Box::new(resources::PortResource::new())),
        );
        factories.insert(
            "fic_eri_nat_component_v1".to_string(),
            Box::new(|| Box::new(resources::NatResource::new())),
        );
        factories.insert(
            "fic_eri_firewall_component_v1".to_string(),
            Box::new(|| Box::new(resources::FirewallResource::new())),
        );
        factories.insert(
            "fic_eri_nat_global_ip_address_set_v1".to_string(),
            Box::new(|| Box::new(resources::GlobalIpAddressSetResource::new())),
        );

        Self::connection::<PortToPortModel>(&mut factories);
        Self::connection::<PortToAzureMicrosoftModel>(&mut factories);
        Self::connection::<PortToAzurePrivateModel>(&mut factories);
        Self::connection::<RouterToAzureMicrosoftModel>(&mut factories);
        Self::connection::<RouterToAzurePrivateModel>(&mut factories);
        Self::connection::<RouterToEclModel>(&mut factories);
        Self::connection::<RouterToUnoModel>(&mut factories);
        Self::connection::<RouterSingleToPortModel>(&mut factories);
        Self::connection::<RouterPairedToPortModel>(&mut factories);
        Self::connection::<RouterPairedToGcpV1Model>(&mut factories);
        Self::connection::<RouterPairedToGcpV2Model>(&mut factories);
        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories: HashMap<String, DataSourceFactory> = HashMap::new();
        factories.insert(
            "fic_eri_switch_v1".to_string(),
            Box::new(|| Box::new(data_sources::SwitchDataSource::new())),
        );
        factories
    }
}
