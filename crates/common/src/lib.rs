//! reqforge Common Library
//!
//! Shared types, naming rules and configuration for the requirement-to-artifact
//! compiler.

pub mod config;
pub mod error;
pub mod naming;
pub mod types;

// Re-export commonly used types
pub use config::{AndKeyword, ReqforgeConfig};
pub use error::{Error, Result};
pub use types::*;

/// Default configuration file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "reqforge.toml";

/// Default configuration path
pub fn default_config_path() -> std::path::PathBuf {
    std::path::PathBuf::from(DEFAULT_CONFIG_FILE)
}
