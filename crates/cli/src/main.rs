//! reqforge CLI - Main Entry Point
//!
//! Compiles requirement documents into feature files, step definitions and
//! page objects, and inspects the pieces along the way.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reqforge_cli::commands::{self, config, corpus, generate, parse, validate};
use reqforge_cli::output::OutputFormat;

/// reqforge - requirement-to-artifact compiler
#[derive(Parser)]
#[command(name = "reqforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "REQFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate feature, step definitions and page object from a requirement
    Generate(generate::GenerateArgs),

    /// Parse a requirement and print the intermediate representation
    Parse(parse::ParseArgs),

    /// Check existing artifacts against each other
    Validate(validate::ValidateArgs),

    /// Inspect a page-object corpus
    #[command(subcommand)]
    Corpus(corpus::CorpusCommands),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(reqforge_common::default_config_path);

    match cli.command {
        Commands::Generate(args) => {
            let config = commands::load_config(&config_path)?;
            generate::execute(args, config, cli.format)?
        }
        Commands::Parse(args) => parse::execute(args, cli.format)?,
        Commands::Validate(args) => {
            let config = commands::load_config(&config_path)?;
            validate::execute(args, &config, cli.format)?
        }
        Commands::Corpus(cmd) => {
            let config = commands::load_config(&config_path)?;
            corpus::execute(cmd, &config, cli.format)?
        }
        Commands::Config(cmd) => config::execute(cmd, &config_path, cli.format)?,
    }

    Ok(())
}
