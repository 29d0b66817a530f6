pub mod data_source_switch;

pub use data_source_switch::SwitchDataSource;
