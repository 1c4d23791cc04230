//! Step-binding emitter
//!
//! Bindings are derived from the rendered feature text, not from the IR, so
//! every clause the runner will see gets exactly one binding even when the
//! feature renderer reshapes the scenarios.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use reqforge_common::config::AndKeyword;
use reqforge_common::naming::{method_name, variable_name};
use reqforge_common::types::StepKind;

use crate::js::{cucumber_expression, quoted};
use crate::parser::context::contains_word;

static FEATURE_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(Given|When|Then|And|But)\s+(.+?)\s*$").expect("valid regex")
});

/// Words that turn a binding into an assertion on the method's result.
/// The page rule table gates its verification rules on the same list.
pub const ASSERTION_CUES: &[&str] = &[
    "should", "verify", "verifies", "see", "sees", "displayed", "visible", "shown", "appears",
    "appear", "contain", "contains", "expect", "expected",
];

/// One unique phrase bound to a page-object method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepBinding {
    /// Keyword the binding is registered under
    pub keyword: StepKind,
    /// Keyword as written in the feature
    pub source_keyword: StepKind,
    pub phrase: String,
    pub method_name: String,
    pub asserts: bool,
}

/// Rendered step-definition file plus its bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepsArtifact {
    pub text: String,
    pub file_name: String,
    pub bindings: Vec<StepBinding>,
    pub page_class: String,
}

impl StepsArtifact {
    /// Method names in binding order; unique phrases may share a name
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            if !names.contains(&binding.method_name) {
                names.push(binding.method_name.clone());
            }
        }
        names
    }
}

pub struct StepsEmitter {
    and_keyword: AndKeyword,
    page_import_prefix: String,
}

impl StepsEmitter {
    pub fn new(and_keyword: AndKeyword, page_import_prefix: impl Into<String>) -> Self {
        Self {
            and_keyword,
            page_import_prefix: page_import_prefix.into(),
        }
    }

    /// Bind every unique clause of `feature_text` to a method on `page_class`
    pub fn emit(&self, feature_text: &str, base_name: &str, page_class: &str) -> StepsArtifact {
        let bindings = self.collect_bindings(feature_text);
        let page_var = variable_name(page_class);

        let mut out = String::new();
        out.push_str(&format!(
            r#"const {{ Given, When, Then, Before }} = require('@cucumber/cucumber');
const {{ expect }} = require('@playwright/test');
const {class} = require({module});

Before(async function (scenario) {{
  this.scenarioName = scenario.pickle.name;
  this.scenarioStartedAt = Date.now();
}});
"#,
            class = page_class,
            module = quoted(&format!("{}{}", self.page_import_prefix, page_class)),
        ));

        for binding in &bindings {
            out.push_str(&render_binding(binding, page_class, &page_var));
        }

        debug!(
            "Rendered {} binding(s) for page object {}",
            bindings.len(),
            page_class
        );

        StepsArtifact {
            text: out,
            file_name: format!("{}.steps.js", base_name),
            bindings,
            page_class: page_class.to_string(),
        }
    }

    fn collect_bindings(&self, feature_text: &str) -> Vec<StepBinding> {
        let mut bindings: Vec<StepBinding> = Vec::new();
        let mut continued = StepKind::Given;
        // Clauses only count inside a scenario or background block
        let mut in_block = false;

        for line in feature_text.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                continue;
            }
            if trimmed.starts_with("Scenario") || trimmed.starts_with("Background:") {
                continued = StepKind::Given;
                in_block = true;
                continue;
            }
            if !in_block {
                continue;
            }
            let Some(caps) = FEATURE_CLAUSE.captures(line) else {
                continue;
            };
            let Some(source_keyword) = StepKind::from_keyword(&caps[1]) else {
                continue;
            };
            if source_keyword != StepKind::And {
                continued = source_keyword;
            }

            let phrase = caps[2].to_string();
            if bindings.iter().any(|b| b.phrase == phrase) {
                debug!("Duplicate phrase skipped: {}", phrase);
                continue;
            }

            let keyword = match (source_keyword, self.and_keyword) {
                (StepKind::And, AndKeyword::Then) => StepKind::Then,
                (StepKind::And, AndKeyword::Inherit) => continued,
                (kind, _) => kind,
            };
            bindings.push(StepBinding {
                keyword,
                source_keyword,
                method_name: method_name(&phrase),
                asserts: has_assertion_cue(&phrase),
                phrase,
            });
        }

        bindings
    }
}

/// True when a runner would parse the line as a step clause
pub fn is_clause_line(line: &str) -> bool {
    FEATURE_CLAUSE.is_match(line)
}

/// True when the phrase reads as an expectation
pub fn has_assertion_cue(phrase: &str) -> bool {
    let lower = phrase.to_lowercase();
    ASSERTION_CUES.iter().any(|cue| contains_word(&lower, cue))
}

fn render_binding(binding: &StepBinding, page_class: &str, page_var: &str) -> String {
    let call = if binding.asserts {
        format!(
            "  const result = await {var}.{method}();\n  expect(result, {message}).toBeTruthy();\n",
            var = page_var,
            method = binding.method_name,
            message = quoted(&binding.phrase),
        )
    } else {
        format!("  await {}.{}();\n", page_var, binding.method_name)
    };

    format!(
        "\n{keyword}({expr}, async function () {{\n  const {var} = new {class}(this.page);\n{call}}});\n",
        keyword = binding.keyword.keyword(),
        expr = cucumber_expression(&binding.phrase),
        var = page_var,
        class = page_class,
        call = call,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURE: &str = r#"@generated @regression @authentication
Feature: User Login
  As a user
  I want to log in
  So that I reach my dashboard

  Background:
    # Given the login page is reachable

  Scenario: Login
    Given user is on login page
    When user submits valid credentials
    Then user sees the dashboard

  Scenario: Remember me
    Given user is on login page
    When user ticks remember me
    And user submits valid credentials
    Then the session cookie should persist
"#;

    fn emit(and_keyword: AndKeyword) -> StepsArtifact {
        StepsEmitter::new(and_keyword, "../../pages/").emit(FEATURE, "user-login", "UserLoginPage")
    }

    #[test]
    fn test_unique_phrases_in_first_seen_order() {
        let artifact = emit(AndKeyword::Then);
        let phrases: Vec<&str> = artifact.bindings.iter().map(|b| b.phrase.as_str()).collect();
        assert_eq!(
            phrases,
            vec![
                "user is on login page",
                "user submits valid credentials",
                "user sees the dashboard",
                "user ticks remember me",
                "the session cookie should persist",
            ]
        );
        assert_eq!(artifact.file_name, "user-login.steps.js");
    }

    #[test]
    fn test_comment_lines_are_not_bound() {
        let artifact = emit(AndKeyword::Then);
        assert!(!artifact.text.contains("the login page is reachable"));
    }

    #[test]
    fn test_and_becomes_then_by_default() {
        let feature = "  Scenario: A\n    Given a thing exists\n    And another thing exists\n";
        let artifact = StepsEmitter::new(AndKeyword::Then, "./").emit(feature, "a", "APage");
        assert_eq!(artifact.bindings[1].keyword, StepKind::Then);
        assert_eq!(artifact.bindings[1].source_keyword, StepKind::And);
        assert!(artifact.text.contains("\nThen('another thing exists'"));
    }

    #[test]
    fn test_and_inherits_when_configured() {
        let feature = "  Scenario: A\n    Given a thing exists\n    And another thing exists\n  Scenario: B\n    And a third thing exists\n";
        let artifact = StepsEmitter::new(AndKeyword::Inherit, "./").emit(feature, "a", "APage");
        assert_eq!(artifact.bindings[1].keyword, StepKind::Given);
        assert_eq!(artifact.bindings[2].keyword, StepKind::Given);
    }

    #[test]
    fn test_binding_uses_fresh_page_object() {
        let artifact = emit(AndKeyword::Then);
        assert!(artifact.text.contains(
            "Given('user is on login page', async function () {\n  const userLoginPage = new UserLoginPage(this.page);\n  await userLoginPage.userIsOnLoginPage();\n});"
        ));
        assert!(artifact
            .text
            .contains("const UserLoginPage = require('../../pages/UserLoginPage');"));
        assert!(!artifact.text.contains("let "));
    }

    #[test]
    fn test_assertion_cue_adds_expect() {
        let artifact = emit(AndKeyword::Then);
        let sees = artifact
            .bindings
            .iter()
            .find(|b| b.phrase == "user sees the dashboard")
            .unwrap();
        assert!(sees.asserts);
        assert!(artifact.text.contains(
            "  const result = await userLoginPage.userSeesTheDashboard();\n  expect(result, 'user sees the dashboard').toBeTruthy();\n"
        ));
    }

    #[test]
    fn test_assertion_cues_are_whole_words() {
        assert!(has_assertion_cue("the banner is Visible"));
        assert!(has_assertion_cue("I verify the total"));
        assert!(!has_assertion_cue("user seeds the database"));
        assert!(!has_assertion_cue("user clicks login"));
    }

    #[test]
    fn test_clauses_outside_blocks_are_not_bound() {
        let feature = "Feature: Login\n  When users sign in they land on the dashboard\n\n  Background:\n\n  Scenario: A\n    Given user is on login page\n";
        let artifact = StepsEmitter::new(AndKeyword::Then, "./").emit(feature, "a", "APage");
        assert_eq!(artifact.bindings.len(), 1);
        assert_eq!(artifact.bindings[0].phrase, "user is on login page");
    }

    #[test]
    fn test_method_names_are_unique() {
        let feature = "  Scenario: A\n    Given user logs in!\n    When user logs in\n";
        let artifact = StepsEmitter::new(AndKeyword::Then, "./").emit(feature, "a", "APage");
        assert_eq!(artifact.bindings.len(), 2);
        assert_eq!(artifact.method_names(), vec!["userLogsIn"]);
    }
}
