pub mod resource_router;

pub use resource_router::RouterResource;
