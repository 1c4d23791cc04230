//! Generate Command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use reqforge_common::types::{GeneratedFile, GenerationOutcome};
use reqforge_common::ReqforgeConfig;
use reqforge_compiler::{GenerateOptions, Generator};

use super::short_hash;
use crate::output::{
    print_document, print_error, print_list, print_success, print_warning, OutputFormat,
    TableDisplay,
};

#[derive(Args)]
pub struct GenerateArgs {
    /// Requirement document (template or Gherkin)
    pub input: PathBuf,

    /// Base name for the generated files, instead of the slugged title
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output root, overriding `output.root`
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Corpus directory, overriding `corpus.root`
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Render and validate without writing files
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
pub struct FileDisplay {
    pub artifact: String,
    pub path: String,
    pub written: bool,
    pub sha256: String,
}

impl FileDisplay {
    fn new(artifact: &str, file: &GeneratedFile) -> Self {
        Self {
            artifact: artifact.to_string(),
            path: file.path.display().to_string(),
            written: file.written,
            sha256: file.sha256.clone(),
        }
    }
}

impl TableDisplay for FileDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Artifact", "Path", "Written", "SHA256"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.artifact.clone(),
            self.path.clone(),
            if self.written { "yes".to_string() } else { "no".to_string() },
            short_hash(&self.sha256),
        ]
    }
}

pub fn execute(args: GenerateArgs, mut config: ReqforgeConfig, format: OutputFormat) -> Result<()> {
    if let Some(output) = args.output {
        config.output.root = output;
    }
    if let Some(corpus) = args.corpus {
        config.corpus.root = Some(corpus);
    }

    let generator = Generator::from_config(config)?;
    let options = GenerateOptions {
        name: args.name,
        dry_run: args.dry_run,
    };
    let outcome = generator.generate_file(&args.input, &options);

    if format.is_structured() {
        print_document(&outcome, format)?;
    } else {
        print_summary(&outcome, args.dry_run, format)?;
    }

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(outcome: &GenerationOutcome, dry_run: bool, format: OutputFormat) -> Result<()> {
    if let Some(generated) = &outcome.generated {
        let files: Vec<FileDisplay> = ["feature", "steps", "page"]
            .iter()
            .zip(generated.files())
            .map(|(artifact, file)| FileDisplay::new(artifact, file))
            .collect();
        print_list(&files, format)?;
    }

    if let Some(validation) = &outcome.validation {
        if validation.is_compliant {
            print_success("Artifacts are consistent");
        } else {
            print_warning(&format!(
                "{} compliance issue(s)",
                validation.issues.len()
            ));
            for issue in &validation.issues {
                println!("  {} {}", "-".yellow(), issue);
            }
        }
    }

    match &outcome.error {
        Some(error) => print_error(error),
        None if dry_run => print_success("Dry run complete; nothing written"),
        None => print_success("Generation complete"),
    }
    Ok(())
}
