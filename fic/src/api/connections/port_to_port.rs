use super::{ConnectionKind, PortVlan};

/// Layer 2 connection between two ports
pub struct PortToPort;

impl ConnectionKind for PortToPort {
    const PATH: &'static str = "/port-to-port-connections";
    type Source = PortVlan;
    type Destination = PortVlan;
}
