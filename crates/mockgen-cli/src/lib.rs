//! # mockgen-cli
//!
//! Command line front end of openapi-mockgen: writes the config file, lists
//! endpoint groups and generates mock modules plus `manifest.json`.

mod commands;
pub mod writer;

pub use commands::{generate, init, list, select_endpoints, GenerateOptions, InitOptions};
