//! Parse Command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use reqforge_common::types::ParsedRequirement;
use reqforge_compiler::parser::{self, RequirementDocument};

use crate::output::{print_document, print_item, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ParseArgs {
    /// Requirement document (template or Gherkin)
    pub input: PathBuf,
}

/// Requirement summary for table output
#[derive(Serialize)]
pub struct RequirementDisplay {
    pub title: String,
    pub format: String,
    pub domain: String,
    pub persona: String,
    pub tags: String,
    pub scenarios: usize,
    pub steps: usize,
}

impl From<&ParsedRequirement> for RequirementDisplay {
    fn from(req: &ParsedRequirement) -> Self {
        Self {
            title: req.title.clone(),
            format: req.format.to_string(),
            domain: req.business_context.domain.clone(),
            persona: req.user_story.as_a.clone(),
            tags: req.tags.join(" "),
            scenarios: req.scenarios.len(),
            steps: req.step_count(),
        }
    }
}

impl TableDisplay for RequirementDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Title", "Format", "Domain", "Persona", "Tags", "Scenarios", "Steps"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.format.clone(),
            self.domain.clone(),
            self.persona.clone(),
            self.tags.clone(),
            self.scenarios.to_string(),
            self.steps.to_string(),
        ]
    }
}

#[derive(Serialize)]
pub struct StepDisplay {
    pub scenario: String,
    pub keyword: String,
    pub text: String,
    pub method: String,
}

impl TableDisplay for StepDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Keyword", "Text", "Method"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.scenario.clone(),
            self.keyword.clone(),
            self.text.clone(),
            self.method.clone(),
        ]
    }
}

pub fn execute(args: ParseArgs, format: OutputFormat) -> Result<()> {
    let doc = RequirementDocument::read(&args.input)?;
    let req = parser::parse(&doc);

    if format.is_structured() {
        return print_document(&req, format);
    }

    print_item(&RequirementDisplay::from(&req), format)?;
    let steps: Vec<StepDisplay> = req
        .scenarios
        .iter()
        .flat_map(|scenario| {
            scenario.steps.iter().map(move |step| StepDisplay {
                scenario: scenario.name.clone(),
                keyword: step.kind.to_string(),
                text: step.text.clone(),
                method: step.method_name.clone(),
            })
        })
        .collect();
    println!();
    print_list(&steps, format)
}
