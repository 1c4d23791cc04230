//! Scenario-script (Gherkin) grammar

use once_cell::sync::Lazy;
use regex::Regex;

use reqforge_common::types::{DocumentFormat, ParsedRequirement, Scenario, Step, StepKind, DEFAULT_TITLE};

use super::context::{merge_tags, parse_tags};
use super::{clean_value, first_match, labeled, match_clause, normalize_markup, push_step, Draft, FieldPattern};

static DOMAIN_PATTERNS: Lazy<Vec<FieldPattern>> = Lazy::new(|| {
    vec![
        FieldPattern::inline(r"(?mi)^\s*#\s*(?:domain|business domain)\s*:\s*(.+?)\s*$"),
        FieldPattern::inline(&labeled("domain|business domain")),
    ]
});

static STORY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:as\s+(?:an?|the)\s|i\s+(?:want|would like|need)\s|so\s+that\s|in\s+order\s+to\s)")
        .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Description,
    Background,
    Scenario,
    Examples,
    Rule,
}

const SCENARIO_KEYWORDS: &[&str] = &["Scenario Outline:", "Scenario Template:", "Scenario:", "Example:"];
const EXAMPLES_KEYWORDS: &[&str] = &["Examples:", "Scenarios:"];

pub(super) fn parse(text: &str) -> ParsedRequirement {
    let normalized = normalize_markup(text);
    let mut draft = Draft {
        domain: first_match(&DOMAIN_PATTERNS, &normalized),
        ..Draft::default()
    };

    let mut section = Section::Preamble;
    let mut in_docstring = false;
    let mut description: Vec<&str> = Vec::new();
    let mut background = Scenario::new("Background");

    for raw in normalized.lines() {
        let line = raw.trim();

        if in_docstring {
            if line.starts_with("\"\"\"") || line.starts_with("```") {
                in_docstring = false;
            }
            continue;
        }
        if line.starts_with("\"\"\"") || line.starts_with("```") {
            in_docstring = true;
            continue;
        }
        if line.is_empty() || line.starts_with('#') || line.starts_with('|') {
            continue;
        }
        if line.starts_with('@') {
            merge_tags(&mut draft.tags, parse_tags(line));
            continue;
        }

        if let Some(rest) = line.strip_prefix("Feature:") {
            draft.title = clean_value(rest);
            section = Section::Description;
            continue;
        }
        if line.starts_with("Background:") {
            section = Section::Background;
            continue;
        }
        if let Some(name) = strip_any(line, SCENARIO_KEYWORDS) {
            let name = clean_value(name)
                .unwrap_or_else(|| format!("Scenario {}", draft.scenarios.len() + 1));
            draft.scenarios.push(Scenario::new(name));
            section = Section::Scenario;
            continue;
        }
        if strip_any(line, EXAMPLES_KEYWORDS).is_some() {
            section = Section::Examples;
            continue;
        }
        if line.starts_with("Rule:") {
            section = Section::Rule;
            continue;
        }

        let clause = match_clause(line).or_else(|| {
            // Gherkin bullet steps
            line.strip_prefix("* ")
                .filter(|_| matches!(section, Section::Background | Section::Scenario))
                .map(|rest| (StepKind::And, rest.trim().to_string()))
        });

        match (section, clause) {
            (Section::Examples, _) => {}
            (Section::Background, Some((kind, text))) => {
                push_step(&mut background, kind, &text);
            }
            (Section::Scenario, Some((kind, text))) => {
                if let Some(current) = draft.scenarios.last_mut() {
                    push_step(current, kind, &text);
                }
            }
            (Section::Description | Section::Preamble | Section::Rule, Some((kind, text))) => {
                // steps outside any scenario open one named after the feature
                let name = draft.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string());
                draft.scenarios.push(Scenario::new(name));
                section = Section::Scenario;
                if let Some(current) = draft.scenarios.last_mut() {
                    push_step(current, kind, &text);
                }
            }
            (Section::Description, None) => description.push(line),
            _ => {}
        }
    }

    let story_text = description.join("\n");
    draft.extract_user_story(&story_text);

    let prose: Vec<&str> = description
        .iter()
        .copied()
        .filter(|l| !STORY_LINE.is_match(l))
        .collect();
    if !prose.is_empty() {
        draft.description = Some(prose.join(" "));
    }

    if !background.steps.is_empty() {
        for scenario in &mut draft.scenarios {
            let mut steps: Vec<Step> = background.steps.clone();
            steps.append(&mut scenario.steps);
            scenario.steps = steps;
        }
    }

    draft.finish(text, DocumentFormat::ScenarioScript)
}

fn strip_any<'a>(line: &'a str, keywords: &[&str]) -> Option<&'a str> {
    keywords.iter().find_map(|k| line.strip_prefix(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURE: &str = r#"# domain: Search
@catalog @smoke
Feature: Product Search
  As a shopper
  I want to search the catalog
  So that I find products quickly

  Results are ranked by relevance.

  Background:
    Given the catalog is loaded

  @happy
  Scenario: Search by keyword
    When the shopper searches for "shoes"
    Then the results should contain "shoes"
    And a result count is shown

  Scenario Outline: Search with filters
    When the shopper filters by <category>
    Then only <category> products are listed
    * the filter chip is visible

    Examples:
      | category |
      | boots    |

  Scenario: Docstring step
    Given the following query
      """
      Given this is not a step
      """
    Then nothing breaks
"#;

    #[test]
    fn test_feature_header_and_story() {
        let req = parse(FEATURE);
        assert_eq!(req.title, "Product Search");
        assert_eq!(req.user_story.as_a, "shopper");
        assert_eq!(req.user_story.want, "search the catalog");
        assert_eq!(req.user_story.so_that, "I find products quickly");
        assert_eq!(req.description, "Results are ranked by relevance.");
        assert_eq!(req.business_context.domain, "search");
        assert_eq!(req.tags, vec!["@catalog", "@smoke", "@happy"]);
        assert_eq!(req.format, DocumentFormat::ScenarioScript);
    }

    #[test]
    fn test_scenarios_get_background_steps() {
        let req = parse(FEATURE);
        assert_eq!(req.scenarios.len(), 3);

        let first = &req.scenarios[0];
        assert_eq!(first.name, "Search by keyword");
        assert_eq!(first.steps.len(), 4);
        assert_eq!(first.steps[0].text, "the catalog is loaded");
        assert_eq!(first.steps[0].kind, StepKind::Given);

        let outline = &req.scenarios[1];
        assert_eq!(outline.steps.len(), 4);
        assert_eq!(outline.steps[3].kind, StepKind::And);
        assert_eq!(outline.steps[3].text, "the filter chip is visible");

        let docstring = &req.scenarios[2];
        let texts: Vec<&str> = docstring.steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["the catalog is loaded", "the following query", "nothing breaks"]);
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(parse(FEATURE), parse(FEATURE));
    }
}
