//! Core data types: the requirement IR, generated artifacts and compliance reports

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::naming::method_name;

// ============================================================================
// Requirement IR
// ============================================================================

/// Grammar a requirement document was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DocumentFormat {
    /// Loosely structured template with labeled sections
    #[default]
    Template,
    /// Gherkin-style document with `Feature:` and `Scenario:` headers
    ScenarioScript,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Template => write!(f, "template"),
            DocumentFormat::ScenarioScript => write!(f, "scenario-script"),
        }
    }
}

/// Clause type of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    Given,
    When,
    Then,
    And,
}

impl StepKind {
    /// Rendering order inside a scenario block
    pub const ORDER: [StepKind; 4] = [StepKind::Given, StepKind::When, StepKind::Then, StepKind::And];

    pub fn keyword(&self) -> &'static str {
        match self {
            StepKind::Given => "Given",
            StepKind::When => "When",
            StepKind::Then => "Then",
            StepKind::And => "And",
        }
    }

    /// Parse a clause keyword. `But` folds into `And`.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "given" => Some(StepKind::Given),
            "when" => Some(StepKind::When),
            "then" => Some(StepKind::Then),
            "and" | "but" => Some(StepKind::And),
            _ => None,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One behavior clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub text: String,
    pub method_name: String,
}

impl Step {
    /// Build a step; the method name is always derived from the text.
    pub fn new(kind: StepKind, text: impl Into<String>) -> Self {
        let text = text.into();
        let method_name = method_name(&text);
        Self {
            kind,
            text,
            method_name,
        }
    }
}

/// One behavior unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: StepKind, text: impl Into<String>) {
        self.steps.push(Step::new(kind, text));
    }

    /// Steps of a single clause type, in source order
    pub fn steps_of(&self, kind: StepKind) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(move |s| s.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStory {
    #[serde(rename = "as")]
    pub as_a: String,
    pub want: String,
    #[serde(rename = "so")]
    pub so_that: String,
}

impl Default for UserStory {
    fn default() -> Self {
        Self {
            as_a: DEFAULT_PERSONA.to_string(),
            want: DEFAULT_WANT.to_string(),
            so_that: DEFAULT_SO_THAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessContext {
    pub domain: String,
    pub entities: Vec<String>,
    pub actions: Vec<String>,
}

impl Default for BusinessContext {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            entities: Vec::new(),
            actions: Vec::new(),
        }
    }
}

pub const DEFAULT_TITLE: &str = "Generated Feature";
pub const DEFAULT_PERSONA: &str = "user";
pub const DEFAULT_WANT: &str = "use the feature";
pub const DEFAULT_SO_THAT: &str = "the expected outcome is achieved";
pub const DEFAULT_DOMAIN: &str = "general";

/// Normalized requirement (the IR shared by every emitter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRequirement {
    pub title: String,
    pub description: String,
    pub business_context: BusinessContext,
    pub user_story: UserStory,
    pub tags: Vec<String>,
    pub scenarios: Vec<Scenario>,
    pub format: DocumentFormat,
}

impl Default for ParsedRequirement {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: String::new(),
            business_context: BusinessContext::default(),
            user_story: UserStory::default(),
            tags: Vec::new(),
            scenarios: Vec::new(),
            format: DocumentFormat::default(),
        }
    }
}

impl ParsedRequirement {
    pub fn step_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.steps.len()).sum()
    }

    /// Title, description and every step text joined for keyword matching
    pub fn searchable_text(&self) -> String {
        let mut text = format!("{}\n{}", self.title, self.description);
        for scenario in &self.scenarios {
            text.push('\n');
            text.push_str(&scenario.name);
            for step in &scenario.steps {
                text.push('\n');
                text.push_str(&step.text);
            }
        }
        text
    }
}

// ============================================================================
// Generated artifacts
// ============================================================================

/// One generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
    pub file_name: String,
    /// Whether the file reached disk
    pub written: bool,
    pub sha256: String,
}

impl GeneratedFile {
    pub fn new(path: PathBuf, file_name: impl Into<String>, content: String) -> Self {
        let sha256 = hex::encode(Sha256::digest(content.as_bytes()));
        Self {
            path,
            content,
            file_name: file_name.into(),
            written: false,
            sha256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifactSet {
    pub feature: GeneratedFile,
    pub steps: GeneratedFile,
    pub page: GeneratedFile,
}

impl GeneratedArtifactSet {
    pub fn files(&self) -> [&GeneratedFile; 3] {
        [&self.feature, &self.steps, &self.page]
    }

    pub fn files_mut(&mut self) -> [&mut GeneratedFile; 3] {
        [&mut self.feature, &mut self.steps, &mut self.page]
    }

    /// True once every file is on disk
    pub fn fully_written(&self) -> bool {
        self.files().iter().all(|f| f.written)
    }
}

// ============================================================================
// Compliance report
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodsValidation {
    pub steps_methods: Vec<String>,
    pub page_methods: Vec<String>,
    pub missing_methods: Vec<String>,
}

/// Advisory result of the consistency check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub is_compliant: bool,
    pub issues: Vec<String>,
    pub methods_validation: MethodsValidation,
}

// ============================================================================
// Pipeline outcome
// ============================================================================

/// Result of a generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<GeneratedArtifactSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ComplianceReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl GenerationOutcome {
    pub fn succeeded(generated: GeneratedArtifactSet, validation: ComplianceReport) -> Self {
        Self {
            success: true,
            generated: Some(generated),
            validation: Some(validation),
            error: None,
            generated_at: Utc::now(),
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            success: false,
            generated: None,
            validation: None,
            error: Some(error.to_string()),
            generated_at: Utc::now(),
        }
    }

    /// A failure that happened after some artifacts were produced
    pub fn partial(
        error: impl fmt::Display,
        generated: GeneratedArtifactSet,
        validation: ComplianceReport,
    ) -> Self {
        Self {
            success: false,
            generated: Some(generated),
            validation: Some(validation),
            error: Some(error.to_string()),
            generated_at: Utc::now(),
        }
    }
}
