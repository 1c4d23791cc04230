//! Requirement parser
//!
//! Turns a raw requirement document into a [`ParsedRequirement`]. Two grammars
//! are supported:
//!
//! - **scenario-script**: a Gherkin document (both a `Feature:` header and a
//!   `Scenario:` header are present)
//! - **template**: anything else, read as a loosely structured template with
//!   labeled sections and labeled Given/When/Then lines
//!
//! Each grammar keeps an ordered list of field patterns per field; the first
//! pattern that yields a usable value wins. Missing fields fall back to the
//! defaults in [`reqforge_common::types`]. Parsing never fails once the text
//! is in memory; only reading the file can.

pub mod context;
pub mod filter;
mod gherkin;
mod template;

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use reqforge_common::types::{
    BusinessContext, DocumentFormat, ParsedRequirement, Scenario, StepKind, UserStory,
    DEFAULT_PERSONA, DEFAULT_SO_THAT, DEFAULT_TITLE, DEFAULT_WANT,
};
use reqforge_common::{Error, Result};

pub use filter::is_valid_step_text;

/// A requirement document read into memory
#[derive(Debug, Clone)]
pub struct RequirementDocument {
    pub text: String,
    pub format: DocumentFormat,
    pub source: Option<PathBuf>,
}

impl RequirementDocument {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let format = detect_format(&text);
        Self {
            text,
            format,
            source: None,
        }
    }

    /// Read a document from disk. This is the only fallible parser step.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::DocumentUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut doc = Self::from_text(text);
        doc.source = Some(path.to_path_buf());
        Ok(doc)
    }
}

static FEATURE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*Feature:").expect("valid regex"));
static SCENARIO_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*Scenario(?: Outline| Template)?:").expect("valid regex"));

/// Classify a document's grammar
pub fn detect_format(text: &str) -> DocumentFormat {
    if FEATURE_HEADER.is_match(text) && SCENARIO_HEADER.is_match(text) {
        DocumentFormat::ScenarioScript
    } else {
        DocumentFormat::Template
    }
}

/// Parse an in-memory document
pub fn parse(doc: &RequirementDocument) -> ParsedRequirement {
    let parsed = match doc.format {
        DocumentFormat::ScenarioScript => gherkin::parse(&doc.text),
        DocumentFormat::Template => template::parse(&doc.text),
    };
    info!(
        "Parsed {} document '{}': {} scenario(s), {} step(s), domain {}",
        doc.format,
        parsed.title,
        parsed.scenarios.len(),
        parsed.step_count(),
        parsed.business_context.domain
    );
    parsed
}

pub fn parse_str(text: &str) -> ParsedRequirement {
    parse(&RequirementDocument::from_text(text))
}

pub fn parse_file(path: &Path) -> Result<ParsedRequirement> {
    let doc = RequirementDocument::read(path)?;
    Ok(parse(&doc))
}

// ============================================================================
// Field patterns
// ============================================================================

/// One way of finding a field's value in a document
pub(crate) enum FieldPattern {
    /// Value captured on the matching line (group 1)
    Inline(Regex),
    /// Value is the paragraph following a matching heading line
    Section(Regex),
}

impl FieldPattern {
    pub(crate) fn inline(pattern: &str) -> Self {
        FieldPattern::Inline(Regex::new(pattern).expect("valid field regex"))
    }

    pub(crate) fn section(pattern: &str) -> Self {
        FieldPattern::Section(Regex::new(pattern).expect("valid field regex"))
    }

    fn extract(&self, text: &str) -> Option<String> {
        match self {
            FieldPattern::Inline(re) => re
                .captures_iter(text)
                .filter_map(|caps| caps.get(1).and_then(|m| clean_value(m.as_str())))
                .next(),
            FieldPattern::Section(re) => {
                let heading = re.find(text)?;
                let mut paragraph = Vec::new();
                for line in text[heading.end()..].lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        if paragraph.is_empty() {
                            continue;
                        }
                        break;
                    }
                    if line.starts_with('#') {
                        break;
                    }
                    paragraph.push(line);
                }
                clean_value(&paragraph.join(" "))
            }
        }
    }
}

/// Labeled field regex: `Label: value`, tolerating list bullets and quotes
pub(crate) fn labeled(labels: &str) -> String {
    format!(r"(?mi)^[\t >*+-]*(?:{})\s*:\s*(.+?)\s*$", labels)
}

/// First usable value across patterns in priority order
pub(crate) fn first_match(patterns: &[FieldPattern], text: &str) -> Option<String> {
    patterns.iter().find_map(|p| p.extract(text))
}

/// Strip markdown emphasis and reject template placeholders
pub(crate) fn clean_value(raw: &str) -> Option<String> {
    let value = raw
        .replace("**", "")
        .replace("__", "")
        .replace('`', "");
    let value = value.trim().trim_end_matches(',').trim();
    if value.is_empty() {
        return None;
    }
    let placeholder = (value.starts_with('[') && value.ends_with(']'))
        || (value.starts_with('<') && value.ends_with('>'))
        || (value.starts_with('{') && value.ends_with('}'));
    if placeholder {
        return None;
    }
    Some(value.to_string())
}

/// Emphasis-free copy of the text used for field extraction
pub(crate) fn normalize_markup(text: &str) -> String {
    text.replace("**", "").replace("__", "").replace('\r', "")
}

// ============================================================================
// Shared grammar pieces
// ============================================================================

static STORY_COMBINED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)\bAs\s+(?:an?|the)\s+(.+?),?\s+I\s+(?:want|would like|need)\s+(?:to\s+)?(.+?),?\s+so\s+that\s+(.+?)\.?\s*$",
    )
    .expect("valid regex")
});

static STORY_AS: Lazy<Vec<FieldPattern>> = Lazy::new(|| {
    vec![
        FieldPattern::inline(r"(?mi)^[\t >*+-]*(?:user\s+story\s*:\s*)?As\s+(?:an?|the)\s+(.+?)[,.]?\s*$"),
        FieldPattern::inline(&labeled("persona|actor|role")),
    ]
});

static STORY_WANT: Lazy<Vec<FieldPattern>> = Lazy::new(|| {
    vec![
        FieldPattern::inline(r"(?mi)^[\t >*+-]*I\s+(?:want|would like|need)\s+(?:to\s+)?(.+?)[,.]?\s*$"),
        FieldPattern::inline(&labeled("goal|i want")),
    ]
});

static STORY_SO: Lazy<Vec<FieldPattern>> = Lazy::new(|| {
    vec![
        FieldPattern::inline(r"(?mi)^[\t >*+-]*So\s+that\s+(.+?)\.?\s*$"),
        FieldPattern::inline(&labeled("benefit|so that")),
    ]
});

static CLAUSE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\t >*+-]*(?:\d+[.)]\s*)?(given|when|then|and|but)\b\s*:?\s*(.*?)\s*$")
        .expect("valid regex")
});

/// Recognize a labeled clause line and return its type and text
pub(crate) fn match_clause(line: &str) -> Option<(StepKind, String)> {
    let caps = CLAUSE_LINE.captures(line)?;
    let kind = StepKind::from_keyword(caps.get(1)?.as_str())?;
    let text = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    Some((kind, text.trim().to_string()))
}

/// Apply the denylist and push the step when it passes
pub(crate) fn push_step(scenario: &mut Scenario, kind: StepKind, text: &str) -> bool {
    if is_valid_step_text(text) {
        scenario.push(kind, text);
        true
    } else {
        debug!("Dropped clause line ({}): {:?}", kind, text);
        false
    }
}

/// Fields collected by a grammar before defaults are applied
#[derive(Debug, Default)]
pub(crate) struct Draft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub persona: Option<String>,
    pub want: Option<String>,
    pub so_that: Option<String>,
    pub domain: Option<String>,
    pub tags: Vec<String>,
    pub scenarios: Vec<Scenario>,
}

impl Draft {
    /// Fill the user story from the text, combined form first
    pub(crate) fn extract_user_story(&mut self, text: &str) {
        if let Some(caps) = STORY_COMBINED.captures(text) {
            self.persona = caps.get(1).and_then(|m| clean_value(m.as_str()));
            self.want = caps.get(2).and_then(|m| clean_value(m.as_str()));
            self.so_that = caps.get(3).and_then(|m| clean_value(m.as_str()));
            return;
        }
        self.persona = first_match(&STORY_AS, text);
        self.want = first_match(&STORY_WANT, text);
        self.so_that = first_match(&STORY_SO, text);
    }

    /// Apply defaults and derive the business context
    pub(crate) fn finish(self, full_text: &str, format: DocumentFormat) -> ParsedRequirement {
        let step_texts: Vec<&str> = self
            .scenarios
            .iter()
            .flat_map(|s| s.steps.iter().map(|st| st.text.as_str()))
            .collect();

        let domain = match self.domain.as_deref() {
            Some(label) => context::canonical_domain(label),
            None => context::domain_from_tags(&self.tags)
                .unwrap_or_else(|| context::infer_domain(full_text)),
        };

        let business_context = BusinessContext {
            domain,
            entities: context::extract_entities(full_text),
            actions: context::extract_actions(step_texts),
        };

        ParsedRequirement {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: self.description.unwrap_or_default(),
            business_context,
            user_story: UserStory {
                as_a: self.persona.unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
                want: self.want.unwrap_or_else(|| DEFAULT_WANT.to_string()),
                so_that: self.so_that.unwrap_or_else(|| DEFAULT_SO_THAT.to_string()),
            },
            tags: self.tags,
            scenarios: self.scenarios,
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        let gherkin = "Feature: Login\n  Scenario: ok\n    Given x";
        assert_eq!(detect_format(gherkin), DocumentFormat::ScenarioScript);

        let feature_only = "Feature: Login\nGiven user is on login page";
        assert_eq!(detect_format(feature_only), DocumentFormat::Template);

        assert_eq!(detect_format("Title: Login"), DocumentFormat::Template);
    }

    #[test]
    fn test_unreadable_document_errors() {
        let err = parse_file(Path::new("/definitely/not/here.md")).unwrap_err();
        assert!(matches!(err, Error::DocumentUnreadable { .. }));
    }

    #[test]
    fn test_match_clause() {
        assert_eq!(
            match_clause("  - Given: user is on login page"),
            Some((StepKind::Given, "user is on login page".to_string()))
        );
        assert_eq!(
            match_clause("3. But the error is hidden"),
            Some((StepKind::And, "the error is hidden".to_string()))
        );
        assert_eq!(match_clause("Andrew logs in"), None);
        assert_eq!(match_clause("Description: something"), None);
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value(" **User Login** "), Some("User Login".to_string()));
        assert_eq!(clean_value("[Feature title]"), None);
        assert_eq!(clean_value("<title>"), None);
        assert_eq!(clean_value("   "), None);
    }

    #[test]
    fn test_combined_user_story() {
        let mut draft = Draft::default();
        draft.extract_user_story(
            "As a registered shopper, I want to save my cart so that I can buy later.",
        );
        assert_eq!(draft.persona.as_deref(), Some("registered shopper"));
        assert_eq!(draft.want.as_deref(), Some("save my cart"));
        assert_eq!(draft.so_that.as_deref(), Some("I can buy later"));
    }
}
