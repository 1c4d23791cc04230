//! Config Commands

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Subcommand;

use reqforge_common::ReqforgeConfig;
use reqforge_compiler::TemplateRegistry;

use super::load_config;
use crate::output::{print_document, print_info, print_success, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a configuration file with every default spelled out
    Init {
        /// Destination, instead of the global --config path
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

pub fn execute(cmd: ConfigCommands, config_path: &Path, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommands::Init { path, force } => {
            let path = path.unwrap_or_else(|| config_path.to_path_buf());
            if path.exists() && !force {
                bail!("{} already exists; pass --force to overwrite", path.display());
            }
            ReqforgeConfig::default().save(&path)?;
            print_success(&format!("Wrote {}", path.display()));
        }

        ConfigCommands::Show => {
            let config = load_config(config_path)?;
            if format.is_structured() {
                print_document(&config, format)?;
            } else {
                if !config_path.exists() {
                    print_info(&format!("{} not found; showing defaults", config_path.display()));
                }
                print!("{}", toml::to_string_pretty(&config)?);
                print_info(&format!("Domain templates: {}", template_names(&config).join(", ")));
            }
        }
    }

    Ok(())
}

/// Built-in domains plus any configured in `[[domains]]`
fn template_names(config: &ReqforgeConfig) -> Vec<String> {
    TemplateRegistry::with_overrides(&config.domains)
        .names()
        .into_iter()
        .map(str::to_string)
        .collect()
}
