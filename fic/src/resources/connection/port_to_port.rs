use super::{common_computed, forced, forced_one_of, id_attribute, ConnectionModel};
use crate::api::connections::{ConnectionOf, CreateRequestOf, PortToPort, PortVlan};
use crate::resources::common::BANDWIDTHS;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::schema::{AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};

#[derive(Debug, Clone, Deserialize)]
pub struct PortToPortConfig {
    pub name: String,
    pub source_port_id: String,
    pub source_vlan: i64,
    pub destination_port_id: String,
    pub destination_vlan: i64,
    pub bandwidth: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortToPortState {
    pub id: String,
    pub name: String,
    pub source_port_id: String,
    pub source_vlan: i64,
    pub destination_port_id: String,
    pub destination_vlan: i64,
    pub bandwidth: String,
    pub redundant: bool,
    pub tenant_id: String,
    pub area: String,
}

pub struct PortToPortModel;

#[async_trait]
impl ConnectionModel for PortToPortModel {
    type Kind = PortToPort;
    type Config = PortToPortConfig;
    type State = PortToPortState;

    const TYPE_NAME: &'static str = "fic_eri_port_to_port_connection_v1";

    fn schema() -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Layer 2 connection between two FIC ports")
            .attribute(id_attribute())
            .attribute(forced("name", AttributeType::String))
            .attribute(forced("source_port_id", AttributeType::String))
            .attribute(forced("source_vlan", AttributeType::Number))
            .attribute(forced("destination_port_id", AttributeType::String))
            .attribute(forced("destination_vlan", AttributeType::Number))
            .attribute(forced_one_of("bandwidth", BANDWIDTHS));
        for attr in common_computed() {
            builder = builder.attribute(attr);
        }
        builder.build()
    }

    fn create_request(config: &PortToPortConfig) -> Result<CreateRequestOf<PortToPort>, Diagnostic> {
        Ok(CreateRequestOf::<PortToPort>::new(
            &config.name,
            PortVlan {
                port_id: config.source_port_id.clone(),
                vlan: config.source_vlan,
            },
            PortVlan {
                port_id: config.destination_port_id.clone(),
                vlan: config.destination_vlan,
            },
            &config.bandwidth,
        ))
    }

    fn state(connection: &ConnectionOf<PortToPort>, _prior: &DynamicValue) -> PortToPortState {
        PortToPortState {
            id: connection.id.clone(),
            name: connection.name.clone(),
            source_port_id: connection.source.port_id.clone(),
            source_vlan: connection.source.vlan,
            destination_port_id: connection.destination.port_id.clone(),
            destination_vlan: connection.destination.vlan,
            bandwidth: connection.bandwidth.clone(),
            redundant: connection.redundant,
            tenant_id: connection.tenant_id.clone(),
            area: connection.area.clone(),
        }
    }
}
