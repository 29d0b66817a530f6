pub mod resource_port;

pub use resource_port::PortResource;
