//! Consistency validator
//!
//! Checks the three rendered artifacts against each other. Everything here
//! works on text so that hand-edited or externally produced files can be
//! checked too; the report is advisory and never stops a write.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use reqforge_common::types::{ComplianceReport, MethodsValidation};

static CUCUMBER_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"require\(\s*['"]@cucumber/cucumber['"]\s*\)"#).expect("valid regex")
});

static PLAYWRIGHT_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"require\(\s*['"]@playwright/test['"]\s*\)"#).expect("valid regex")
});

static ANY_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex"));

static SHARED_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:let|var)\s+([A-Za-z_$][\w$]*)\s*(?:;|=\s*null\b)").expect("valid regex")
});

static SHARED_PAGE_ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"this\.([A-Za-z_$][\w$]*Page)\s*=[^=]").expect("valid regex"));

static MEMBER_ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"this\.([A-Za-z_$][\w$]*)\s*=[^=>]").expect("valid regex"));

static CALL_SITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"await\s+([A-Za-z_$][\w$]*)\.([A-Za-z_$][\w$]*)\s*\(").expect("valid regex")
});

static DEFINITION_SITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"async\s+([A-Za-z_$][\w$]*)\s*\(").expect("valid regex"));

const FRAMEWORK_MODULES: &[&str] = &["@cucumber/cucumber", "@playwright/test"];

/// Method sets as the emitters recorded them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmittedMethods {
    pub steps_methods: Vec<String>,
    pub page_methods: Vec<String>,
}

/// Page-object methods the step definitions call, first-seen order
pub fn called_methods(steps_text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in CALL_SITE.captures_iter(steps_text) {
        if &caps[1] == "this" {
            continue;
        }
        let name = caps[2].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Methods the page object defines, first-seen order
pub fn defined_methods(page_text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in DEFINITION_SITE.captures_iter(page_text) {
        let name = caps[1].to_string();
        if name != "function" && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Methods the page object also assigns as instance properties
pub fn shadowed_methods(page_text: &str) -> Vec<String> {
    let defined = defined_methods(page_text);
    let mut names: Vec<String> = Vec::new();
    for caps in MEMBER_ASSIGNMENT.captures_iter(page_text) {
        let name = caps[1].to_string();
        if defined.contains(&name) && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Check the rendered artifacts; `mandatory_tags` come from the domain template.
pub fn validate(feature: &str, steps: &str, page: &str, mandatory_tags: &[String]) -> ComplianceReport {
    let mut issues: Vec<String> = Vec::new();

    // feature structure
    if !feature.contains("Feature:") {
        issues.push("Feature file has no 'Feature:' header".to_string());
    }
    if !feature.contains("Background:") {
        issues.push("Feature file has no 'Background:' block".to_string());
    }
    let feature_tags: Vec<&str> = feature
        .lines()
        .filter(|l| l.trim_start().starts_with('@'))
        .flat_map(str::split_whitespace)
        .collect();
    let missing_tags: Vec<&str> = mandatory_tags
        .iter()
        .map(String::as_str)
        .filter(|tag| !feature_tags.contains(tag))
        .collect();
    if !missing_tags.is_empty() {
        issues.push(format!(
            "Feature file is missing mandatory tag(s): {}",
            missing_tags.join(", ")
        ));
    }

    // step definitions
    if !CUCUMBER_IMPORT.is_match(steps) {
        issues.push("Step definitions do not import @cucumber/cucumber".to_string());
    }
    if !PLAYWRIGHT_IMPORT.is_match(steps) {
        issues.push("Step definitions do not import @playwright/test".to_string());
    }
    let imports_page = ANY_REQUIRE
        .captures_iter(steps)
        .any(|caps| !FRAMEWORK_MODULES.contains(&&caps[1]));
    if !imports_page {
        issues.push("Step definitions do not require the page object module".to_string());
    }
    for caps in SHARED_DECLARATION.captures_iter(steps) {
        issues.push(format!(
            "Step definitions declare shared module-level state '{}'",
            &caps[1]
        ));
    }
    for caps in SHARED_PAGE_ASSIGNMENT.captures_iter(steps) {
        issues.push(format!(
            "Step definitions keep a page object on the world as 'this.{}'",
            &caps[1]
        ));
    }

    // page object
    for (needle, issue) in [
        ("extends BasePage", "Page object does not extend BasePage"),
        ("constructor(page)", "Page object has no constructor(page)"),
        ("super(page)", "Page object constructor does not call super(page)"),
    ] {
        if !page.contains(needle) {
            issues.push(issue.to_string());
        }
    }
    let shadowed = shadowed_methods(page);
    if !shadowed.is_empty() {
        issues.push(format!(
            "Page object method(s) shadowed by an instance property: {}",
            shadowed.join(", ")
        ));
    }

    // every call site needs a definition
    let steps_methods = called_methods(steps);
    let page_methods = defined_methods(page);
    let missing_methods: Vec<String> = steps_methods
        .iter()
        .filter(|name| !page_methods.contains(name))
        .cloned()
        .collect();
    if !missing_methods.is_empty() {
        issues.push(format!(
            "Page object is missing {} method(s) called by the step definitions: {}",
            missing_methods.len(),
            missing_methods.join(", ")
        ));
    }

    for issue in &issues {
        warn!("Compliance: {}", issue);
    }

    ComplianceReport {
        is_compliant: issues.is_empty(),
        issues,
        methods_validation: MethodsValidation {
            steps_methods,
            page_methods,
            missing_methods,
        },
    }
}

/// [`validate`], plus drift between the emitters' metadata and the text
pub fn validate_with_metadata(
    feature: &str,
    steps: &str,
    page: &str,
    mandatory_tags: &[String],
    emitted: &EmittedMethods,
) -> ComplianceReport {
    let mut report = validate(feature, steps, page, mandatory_tags);

    let drift = [
        ("step", &emitted.steps_methods, &report.methods_validation.steps_methods),
        ("page", &emitted.page_methods, &report.methods_validation.page_methods),
    ];
    let mut extra: Vec<String> = Vec::new();
    for (artifact, recorded, derived) in drift {
        let absent: Vec<&str> = recorded
            .iter()
            .filter(|name| !derived.contains(name))
            .map(String::as_str)
            .collect();
        if !absent.is_empty() {
            extra.push(format!(
                "Emitted {} metadata lists method(s) absent from the text: {}",
                artifact,
                absent.join(", ")
            ));
        }
        let unrecorded: Vec<&str> = derived
            .iter()
            .filter(|name| !recorded.contains(name))
            .map(String::as_str)
            .collect();
        if !unrecorded.is_empty() {
            extra.push(format!(
                "Rendered {} text has method(s) missing from the metadata: {}",
                artifact,
                unrecorded.join(", ")
            ));
        }
    }

    for issue in &extra {
        warn!("Compliance: {}", issue);
    }
    report.issues.extend(extra);
    report.is_compliant = report.issues.is_empty();
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURE: &str = "@generated @regression\nFeature: Demo\n\n  Background:\n    # ready\n\n  Scenario: A\n    Given a thing\n";

    const STEPS: &str = "const { Given, When, Then, Before } = require('@cucumber/cucumber');\nconst { expect } = require('@playwright/test');\nconst DemoPage = require('../../pages/DemoPage');\n\nGiven('a thing', async function () {\n  const demoPage = new DemoPage(this.page);\n  await demoPage.aThing();\n});\n";

    const PAGE: &str = "const BasePage = require('./BasePage');\nclass DemoPage extends BasePage {\n  constructor(page) {\n    super(page);\n  }\n\n  async aThing() {\n    await this.page.goto('/');\n  }\n}\n";

    fn tags() -> Vec<String> {
        vec!["@generated".to_string(), "@regression".to_string()]
    }

    #[test]
    fn test_consistent_artifacts_are_compliant() {
        let report = validate(FEATURE, STEPS, PAGE, &tags());
        assert!(report.is_compliant, "{:?}", report.issues);
        assert_eq!(report.methods_validation.steps_methods, vec!["aThing"]);
        assert_eq!(report.methods_validation.page_methods, vec!["aThing"]);
    }

    #[test]
    fn test_missing_method_is_listed() {
        let page = PAGE.replace("async aThing()", "async somethingElse()");
        let report = validate(FEATURE, STEPS, &page, &tags());
        assert!(!report.is_compliant);
        assert_eq!(report.methods_validation.missing_methods, vec!["aThing"]);
        assert!(report.issues.iter().any(|i| i.contains("aThing")));
    }

    #[test]
    fn test_structural_failures() {
        let report = validate("Feature: Demo\n", "", "class DemoPage {}", &tags());
        assert!(!report.is_compliant);
        let joined = report.issues.join("\n");
        assert!(joined.contains("Background"));
        assert!(joined.contains("@generated, @regression"));
        assert!(joined.contains("@cucumber/cucumber"));
        assert!(joined.contains("require the page object"));
        assert!(joined.contains("extend BasePage"));
        assert!(joined.contains("super(page)"));
    }

    #[test]
    fn test_shared_state_detected() {
        let steps = format!("let demoPage;\nvar other = null;\n{}\nBefore(function () {{ this.demoPage = new DemoPage(this.page); }});\n", STEPS);
        let report = validate(FEATURE, &steps, PAGE, &tags());
        let shared: Vec<&String> = report.issues.iter().filter(|i| i.contains("shared") || i.contains("this.demoPage")).collect();
        assert_eq!(shared.len(), 3);
    }

    #[test]
    fn test_property_shadowing_a_method_is_flagged() {
        let page = PAGE.replace(
            "    super(page);\n",
            "    super(page);\n    this.aThing = page.locator('.thing');\n    this.ready = page.locator('main');\n",
        );
        let report = validate(FEATURE, STEPS, &page, &tags());
        assert!(!report.is_compliant);
        assert_eq!(shadowed_methods(&page), vec!["aThing"]);
        assert!(report.issues.iter().any(|i| i.contains("shadowed") && i.contains("aThing")));
        assert!(report.methods_validation.missing_methods.is_empty());
    }

    #[test]
    fn test_metadata_drift_reported() {
        let emitted = EmittedMethods {
            steps_methods: vec!["aThing".to_string()],
            page_methods: vec!["aThing".to_string(), "ghost".to_string()],
        };
        let report = validate_with_metadata(FEATURE, STEPS, PAGE, &tags(), &emitted);
        assert!(!report.is_compliant);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("ghost"));
    }
}
