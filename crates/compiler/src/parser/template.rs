//! Loosely structured template grammar

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use reqforge_common::types::{DocumentFormat, ParsedRequirement, Scenario};

use super::context::{merge_tags, parse_tags};
use super::{first_match, labeled, match_clause, normalize_markup, push_step, Draft, FieldPattern};

static TITLE_PATTERNS: Lazy<Vec<FieldPattern>> = Lazy::new(|| {
    vec![
        FieldPattern::inline(&labeled(
            "title|feature title|feature name|story title|requirement title",
        )),
        FieldPattern::inline(&labeled("requirement|feature|story")),
        FieldPattern::inline(r"(?m)^#\s+(.+?)\s*#*\s*$"),
    ]
});

static DESCRIPTION_PATTERNS: Lazy<Vec<FieldPattern>> = Lazy::new(|| {
    vec![
        FieldPattern::inline(&labeled("description|summary|overview")),
        FieldPattern::section(r"(?mi)^#{1,6}\s*(?:description|summary|overview)\s*:?\s*$"),
    ]
});

static DOMAIN_PATTERNS: Lazy<Vec<FieldPattern>> = Lazy::new(|| {
    vec![FieldPattern::inline(&labeled(
        "business domain|domain|module|area|component",
    ))]
});

static TAG_PATTERNS: Lazy<Vec<FieldPattern>> =
    Lazy::new(|| vec![FieldPattern::inline(&labeled("tags|labels"))]);

static TAG_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(@[\w-]+(?:\s+@[\w-]+)*)\s*$").expect("valid regex"));

static SCENARIO_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[\t >*+-]*(?:#{1,6}\s*)?(?:scenario\s+outline|scenario|test\s+case|tc[-_ ]?\d+)\s*(?:#?\d+)?\s*[:.)\x{2013}-]\s*(.*?)\s*$",
    )
    .expect("valid regex")
});

pub(super) fn parse(text: &str) -> ParsedRequirement {
    let normalized = normalize_markup(text);
    let mut draft = Draft {
        title: first_match(&TITLE_PATTERNS, &normalized),
        description: first_match(&DESCRIPTION_PATTERNS, &normalized),
        domain: first_match(&DOMAIN_PATTERNS, &normalized),
        ..Draft::default()
    };
    draft.extract_user_story(&normalized);

    if let Some(value) = first_match(&TAG_PATTERNS, &normalized) {
        merge_tags(&mut draft.tags, parse_tags(&value));
    }
    for caps in TAG_LINE.captures_iter(&normalized) {
        merge_tags(&mut draft.tags, parse_tags(&caps[1]));
    }

    draft.scenarios = extract_scenarios(&normalized, draft.title.as_deref());
    draft.finish(text, DocumentFormat::Template)
}

fn extract_scenarios(text: &str, title: Option<&str>) -> Vec<Scenario> {
    let mut scenarios: Vec<Scenario> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = SCENARIO_LINE.captures(line) {
            let name = caps
                .get(1)
                .map(|m| m.as_str().trim_matches(|c: char| c == '"' || c == '\'').trim())
                .filter(|n| !n.is_empty() && !n.starts_with('['))
                .map(str::to_string)
                .unwrap_or_else(|| format!("Scenario {}", scenarios.len() + 1));
            debug!("Template scenario header: {}", name);
            scenarios.push(Scenario::new(name));
            continue;
        }

        let Some((kind, clause)) = match_clause(line) else {
            continue;
        };
        if scenarios.is_empty() {
            let name = title.unwrap_or(reqforge_common::types::DEFAULT_TITLE);
            scenarios.push(Scenario::new(name));
        }
        if let Some(current) = scenarios.last_mut() {
            push_step(current, kind, &clause);
        }
    }

    // headers that collected nothing are scaffolding
    scenarios.retain(|s| !s.steps.is_empty());
    scenarios
}
