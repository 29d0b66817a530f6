//! Resource implementations

pub mod common;
pub mod component;
pub mod connection;
pub mod port;
pub mod router;

pub use component::{FirewallResource, GlobalIpAddressSetResource, NatResource};
pub use connection::ConnectionResource;
pub use port::PortResource;
pub use router::RouterResource;
