//! Feature emitter: renders the Gherkin scenario script from the IR

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use reqforge_common::config::DomainTemplateConfig;
use reqforge_common::naming::file_slug;
use reqforge_common::types::{ParsedRequirement, StepKind, DEFAULT_DOMAIN};

use crate::steps::is_clause_line;

const STRUCTURAL_KEYWORDS: &[&str] = &[
    "Feature:",
    "Background:",
    "Scenario",
    "Examples:",
    "Rule:",
    "@",
    "|",
    "\"\"\"",
];

/// Mandatory structure every feature of a domain carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTemplate {
    pub name: String,
    pub tags: Vec<String>,
    /// Preconditions, rendered as comments under `Background:`
    pub background: Vec<String>,
}

impl DomainTemplate {
    fn builtin(name: &str, tags: &[&str], background: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            background: background.iter().map(|b| b.to_string()).collect(),
        }
    }
}

impl From<&DomainTemplateConfig> for DomainTemplate {
    fn from(config: &DomainTemplateConfig) -> Self {
        Self {
            name: config.name.to_lowercase(),
            tags: config
                .tags
                .iter()
                .map(|t| format!("@{}", t.trim_start_matches('@')))
                .collect(),
            background: config.background.clone(),
        }
    }
}

/// Domain templates keyed by domain name, with a `general` fallback
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, DomainTemplate>,
    fallback: DomainTemplate,
}

impl TemplateRegistry {
    pub fn builtin() -> Self {
        let base = ["@generated", "@regression"];
        let with = |extra: &'static str| -> Vec<&'static str> {
            let mut tags = base.to_vec();
            tags.push(extra);
            tags
        };

        let fallback = DomainTemplate::builtin(
            DEFAULT_DOMAIN,
            &base,
            &["the application is reachable", "a fresh browser context is opened"],
        );
        let templates = [
            fallback.clone(),
            DomainTemplate::builtin(
                "authentication",
                &with("@authentication"),
                &["the login page is reachable", "no user session is active"],
            ),
            DomainTemplate::builtin(
                "search",
                &with("@search"),
                &["the application is reachable", "the search index is available"],
            ),
            DomainTemplate::builtin(
                "ecommerce",
                &with("@ecommerce"),
                &["the product catalog is available", "the shopping cart is empty"],
            ),
            DomainTemplate::builtin(
                "navigation",
                &with("@navigation"),
                &["the application is reachable", "the site navigation is rendered"],
            ),
            DomainTemplate::builtin(
                "forms",
                &with("@forms"),
                &["the form page is reachable", "all fields start empty"],
            ),
        ];

        Self {
            templates: templates
                .into_iter()
                .map(|t| (t.name.clone(), t))
                .collect(),
            fallback,
        }
    }

    /// Built-in templates plus configured ones; configured names override.
    pub fn with_overrides(overrides: &[DomainTemplateConfig]) -> Self {
        let mut registry = Self::builtin();
        for config in overrides {
            let template = DomainTemplate::from(config);
            debug!("Registering domain template '{}'", template.name);
            if template.name == DEFAULT_DOMAIN {
                registry.fallback = template.clone();
            }
            registry.templates.insert(template.name.clone(), template);
        }
        registry
    }

    /// Template for a domain, falling back to `general`
    pub fn lookup(&self, domain: &str) -> &DomainTemplate {
        self.templates
            .get(&domain.to_lowercase())
            .unwrap_or(&self.fallback)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Rendered scenario script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureArtifact {
    pub text: String,
    pub file_name: String,
    /// Base name shared by the three artifacts
    pub base_name: String,
    /// Template the feature was rendered against
    pub template: DomainTemplate,
}

pub struct FeatureEmitter<'a> {
    templates: &'a TemplateRegistry,
}

impl<'a> FeatureEmitter<'a> {
    pub fn new(templates: &'a TemplateRegistry) -> Self {
        Self { templates }
    }

    pub fn emit(&self, req: &ParsedRequirement, name_override: Option<&str>) -> FeatureArtifact {
        let template = self.templates.lookup(&req.business_context.domain);
        let base_name = file_slug(name_override.unwrap_or(&req.title));

        let mut out = String::new();

        let mut tags: Vec<&str> = template.tags.iter().map(String::as_str).collect();
        for tag in &req.tags {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag);
            }
        }
        out.push_str(&tags.join(" "));
        out.push('\n');

        out.push_str(&format!("Feature: {}\n", req.title));
        out.push_str(&format!("  As a {}\n", req.user_story.as_a));
        out.push_str(&format!("  I want {}\n", with_to(&req.user_story.want)));
        out.push_str(&format!("  So that {}\n", req.user_story.so_that));
        if !req.description.is_empty() {
            out.push('\n');
            for line in req.description.lines().map(str::trim).filter(|l| !l.is_empty()) {
                out.push_str(&description_line(line));
            }
        }

        out.push_str("\n  Background:\n");
        for line in &template.background {
            out.push_str(&format!("    # {}\n", line));
        }

        for scenario in &req.scenarios {
            out.push_str(&format!("\n  Scenario: {}\n", scenario.name));
            for kind in StepKind::ORDER {
                for step in scenario.steps_of(kind) {
                    out.push_str(&format!("    {} {}\n", kind.keyword(), step.text));
                }
            }
        }

        debug!(
            "Rendered feature '{}' with template '{}' ({} scenario(s))",
            req.title,
            template.name,
            req.scenarios.len()
        );

        FeatureArtifact {
            text: out,
            file_name: format!("{}.feature", base_name),
            base_name,
            template: template.clone(),
        }
    }
}

/// Free-text line under the narrative; lines a runner would parse become comments
fn description_line(line: &str) -> String {
    if is_clause_line(line) || STRUCTURAL_KEYWORDS.iter().any(|k| line.starts_with(k)) {
        format!("  # {}\n", line)
    } else {
        format!("  {}\n", line)
    }
}

fn with_to(want: &str) -> String {
    if want.to_lowercase().starts_with("to ") {
        want.to_string()
    } else {
        format!("to {}", want)
    }
}
