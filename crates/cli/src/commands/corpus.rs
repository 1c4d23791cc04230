//! Corpus Commands

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Subcommand;
use serde::Serialize;

use reqforge_common::ReqforgeConfig;
use reqforge_compiler::corpus::CorpusStats;
use reqforge_compiler::{CorpusIndex, MethodContext, SimilarityEngine};

use crate::output::{print_info, print_item, print_list, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum CorpusCommands {
    /// Index a corpus and print counts and fingerprint
    Stats {
        /// Corpus directory, overriding `corpus.root`
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Rank corpus methods against a target method
    Search {
        /// Target method name (camelCase)
        method: String,

        /// Step phrase the method implements
        #[arg(long, default_value = "")]
        step: String,

        /// Corpus directory, overriding `corpus.root`
        #[arg(long)]
        corpus: Option<PathBuf>,
    },
}

impl TableDisplay for CorpusStats {
    fn headers() -> Vec<&'static str> {
        vec![
            "Root",
            "Files scanned",
            "Files skipped",
            "Methods",
            "Locators",
            "Method keys",
            "Locator keys",
            "Fingerprint",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.root
                .as_ref()
                .map(|r| r.display().to_string())
                .unwrap_or_default(),
            self.files_scanned.to_string(),
            self.files_skipped.to_string(),
            self.methods.to_string(),
            self.locators.to_string(),
            self.method_keys.to_string(),
            self.locator_keys.to_string(),
            self.fingerprint.clone(),
        ]
    }
}

/// One ranked candidate
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDisplay {
    pub rank: usize,
    pub name: String,
    pub source_file: String,
    pub score: f64,
    pub name_similarity: f64,
    pub reusable: bool,
}

impl TableDisplay for CandidateDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["#", "Method", "Source", "Score", "Name sim.", "Reusable"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.rank.to_string(),
            self.name.clone(),
            self.source_file.clone(),
            format!("{:.3}", self.score),
            format!("{:.3}", self.name_similarity),
            if self.reusable { "yes".to_string() } else { "no".to_string() },
        ]
    }
}

fn build_index(corpus: Option<PathBuf>, config: &ReqforgeConfig) -> Result<CorpusIndex> {
    let root = corpus
        .or_else(|| config.corpus.root.clone())
        .ok_or_else(|| anyhow!("no corpus directory; pass --corpus or set corpus.root"))?;
    Ok(CorpusIndex::build(&root, &config.corpus)?)
}

pub fn execute(cmd: CorpusCommands, config: &ReqforgeConfig, format: OutputFormat) -> Result<()> {
    match cmd {
        CorpusCommands::Stats { corpus } => {
            let index = build_index(corpus, config)?;
            print_item(&index.stats(), format)?;
        }

        CorpusCommands::Search {
            method,
            step,
            corpus,
        } => {
            let index = build_index(corpus, config)?;
            let engine = SimilarityEngine::new(Arc::new(index), config.similarity.clone());
            let ctx = MethodContext::new(&method, &step);
            let result = engine.query(&ctx);

            let threshold = engine.config().reuse_threshold;
            let candidates: Vec<CandidateDisplay> = result
                .methods
                .iter()
                .enumerate()
                .map(|(i, c)| CandidateDisplay {
                    rank: i + 1,
                    name: c.method.name.clone(),
                    source_file: c.method.source_file.display().to_string(),
                    score: c.score,
                    name_similarity: c.name_similarity,
                    reusable: c.name_similarity >= threshold,
                })
                .collect();
            print_list(&candidates, format)?;

            if !format.is_structured() && !result.locators.is_empty() {
                let names: Vec<&str> = result.locators.iter().map(|l| l.name.as_str()).collect();
                print_info(&format!("Related locators: {}", names.join(", ")));
            }
        }
    }

    Ok(())
}
