//! Switch lookup data source

use crate::api::ports::VlanRange;
use crate::api::switches::{Switch, SwitchFilter};
use crate::provider_data::FicProviderData;
use crate::resources::common::{self, api_error, not_configured, object_list};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validator::StringOneOf;
use tracing::debug;

const PORT_TYPES: &[&str] = &["1G", "10G"];

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub port_type: String,
}

impl From<SwitchQuery> for SwitchFilter {
    fn from(query: SwitchQuery) -> Self {
        SwitchFilter {
            name: query.name,
            area: query.area,
            location: query.location,
            port_type: query.port_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchState {
    pub id: String,
    pub name: String,
    pub area: String,
    pub location: String,
    pub port_type: String,
    pub number_of_available_vlans: i64,
    pub vlan_ranges: Vec<VlanRange>,
}

impl SwitchState {
    fn new(switch: &Switch, port_type: &str) -> Result<Self, Diagnostic> {
        let vlan_ranges = switch
            .available_vlan_ranges()
            .map_err(|e| api_error("Failed to read switch VLAN ranges", &e))?;
        Ok(Self {
            id: switch.id.clone(),
            name: switch.switch_name.clone(),
            area: switch.area.clone(),
            location: switch.location.clone(),
            port_type: port_type.to_string(),
            number_of_available_vlans: switch.number_of_available_vlans,
            vlan_ranges,
        })
    }
}

#[derive(Default)]
pub struct SwitchDataSource {
    provider_data: Option<FicProviderData>,
}

impl SwitchDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        let lookup = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(description)
                .optional()
                .computed()
                .build()
        };

        SchemaBuilder::new()
            .version(0)
            .description("Looks up a single switch offering the requested port type")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Switch ID")
                    .computed()
                    .build(),
            )
            .attribute(lookup("name", "Switch name"))
            .attribute(lookup("area", "Area the switch belongs to, e.g. JPEAST"))
            .attribute(lookup("location", "Data center the switch is located in"))
            .attribute(
                AttributeBuilder::new("port_type", AttributeType::String)
                    .description("Port type the switch must have available")
                    .required()
                    .validator(StringOneOf::new(PORT_TYPES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("number_of_available_vlans", AttributeType::Number)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "vlan_ranges",
                    object_list(&[
                        ("start", AttributeType::Number),
                        ("end", AttributeType::Number),
                    ]),
                )
                .description("VLAN ranges still available on the switch")
                .computed()
                .build(),
            )
            .build()
    }

    async fn lookup(
        provider_data: &FicProviderData,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let query: SwitchQuery = common::decode(config, "switch query")?;
        let port_type = query.port_type.clone();
        let filter = SwitchFilter::from(query);

        let switches = provider_data
            .client
            .switches()
            .list()
            .await
            .map_err(|e| api_error("Failed to list switches", &e))?;
        debug!("Matching {} switches against {:?}", switches.len(), filter);

        let switch = filter
            .select(&switches)
            .map_err(|detail| Diagnostic::error("Failed to find switch", detail))?;
        common::encode(&SwitchState::new(switch, &port_type)?)
    }
}

#[async_trait]
impl DataSource for SwitchDataSource {
    fn type_name(&self) -> &str {
        "fic_eri_switch_v1"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: Self::schema_static().validate(&request.config),
        }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![not_configured()],
            };
        };

        match Self::lookup(provider_data, &request.config).await {
            Ok(state) => ReadDataSourceResponse {
                state,
                diagnostics: vec![],
            },
            Err(diag) => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![diag],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for SwitchDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];
        match common::provider_data_from(request.provider_data) {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureDataSourceResponse { diagnostics }
    }
}

#[cfg(test)]
#[path = "./data_source_switch_test.rs"]
mod data_source_switch_test;
