//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_configuration_store;
mod json_file_configuration_store;

pub use in_memory_configuration_store::InMemoryConfigurationStore;
pub use json_file_configuration_store::JsonFileConfigurationStore;
