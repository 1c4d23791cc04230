//! Validate Command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use reqforge_common::types::DEFAULT_DOMAIN;
use reqforge_common::ReqforgeConfig;
use reqforge_compiler::{validate, TemplateRegistry};

use crate::output::{print_document, print_success, print_warning, OutputFormat};

#[derive(Args)]
pub struct ValidateArgs {
    /// Feature file
    #[arg(long)]
    pub feature: PathBuf,

    /// Step definition file
    #[arg(long)]
    pub steps: PathBuf,

    /// Page object file
    #[arg(long)]
    pub page: PathBuf,

    /// Domain whose template supplies the mandatory tags
    #[arg(long, default_value = DEFAULT_DOMAIN)]
    pub domain: String,
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn execute(args: ValidateArgs, config: &ReqforgeConfig, format: OutputFormat) -> Result<()> {
    let feature = read(&args.feature)?;
    let steps = read(&args.steps)?;
    let page = read(&args.page)?;

    let registry = TemplateRegistry::with_overrides(&config.domains);
    let template = registry.lookup(&args.domain);
    let report = validate(&feature, &steps, &page, &template.tags);

    if format.is_structured() {
        print_document(&report, format)?;
    } else {
        let methods = &report.methods_validation;
        println!(
            "{} {} called, {} defined, {} missing",
            "Methods:".bold(),
            methods.steps_methods.len(),
            methods.page_methods.len(),
            methods.missing_methods.len()
        );
        if report.is_compliant {
            print_success("Artifacts are consistent");
        } else {
            print_warning(&format!("{} compliance issue(s)", report.issues.len()));
            for issue in &report.issues {
                println!("  {} {}", "-".yellow(), issue);
            }
        }
    }

    if !report.is_compliant {
        std::process::exit(1);
    }
    Ok(())
}
