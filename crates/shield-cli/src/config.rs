//! Layered run configuration: command-line flags, then `-S` overrides, then the TOML
//! file, then built-in defaults.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;
