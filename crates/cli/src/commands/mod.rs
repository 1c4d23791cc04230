//! CLI Commands

pub mod config;
pub mod corpus;
pub mod generate;
pub mod parse;
pub mod validate;

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use reqforge_common::ReqforgeConfig;

/// Load the configuration file, or defaults when it does not exist
pub fn load_config(path: &Path) -> anyhow::Result<ReqforgeConfig> {
    debug!("Loading config from {}", path.display());
    ReqforgeConfig::load(path).with_context(|| format!("loading config from {}", path.display()))
}

/// Shorten a hex digest for table output
pub fn short_hash(hash: &str) -> String {
    hash.chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("reqforge.toml")).unwrap();
        assert_eq!(config, ReqforgeConfig::default());
    }

    #[test]
    fn test_load_config_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reqforge.toml");
        std::fs::write(&path, "[similarity\nreuse_threshold = ").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("reqforge.toml"));
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_hash("abc"), "abc");
    }
}
