//! End-to-end generation runs

use std::path::PathBuf;

use reqforge_common::config::ReqforgeConfig;
use reqforge_compiler::page::MethodOrigin;
use reqforge_compiler::{parse_str, GenerateOptions, Generator, RequirementDocument};

const LOGIN: &str = "\
Feature: User Login
  As a registered user
  I want to log in
  So that I can reach my dashboard

  Scenario: Login
    Given user is on login page
    When user submits valid credentials
    Then user sees the dashboard
";

fn generator_into(root: PathBuf) -> Generator {
    let mut config = ReqforgeConfig::default();
    config.output.root = root;
    Generator::new(config)
}

#[test]
fn test_login_round_trip() {
    let generator = Generator::new(ReqforgeConfig::default());
    let compilation = generator.compile(parse_str(LOGIN), None);

    assert!(compilation.feature.text.contains("  Scenario: Login\n"));
    assert!(compilation
        .feature
        .text
        .contains("    Given user is on login page\n    When user submits valid credentials\n    Then user sees the dashboard\n"));

    assert_eq!(compilation.steps.bindings.len(), 3);
    assert_eq!(
        compilation.steps.method_names(),
        vec!["userIsOnLoginPage", "userSubmitsValidCredentials", "userSeesTheDashboard"]
    );
    assert!(compilation
        .steps
        .text
        .contains("const UserLoginPage = require('../../pages/UserLoginPage');"));

    let defined: Vec<&str> = compilation
        .page
        .methods
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(
        defined,
        vec!["userIsOnLoginPage", "userSubmitsValidCredentials", "userSeesTheDashboard"]
    );
    assert!(compilation
        .page
        .methods
        .iter()
        .all(|m| matches!(m.origin, MethodOrigin::Rule { .. })));

    assert!(compilation.report.is_compliant, "{:?}", compilation.report.issues);
    assert!(compilation.report.methods_validation.missing_methods.is_empty());
}

#[test]
fn test_every_called_method_is_defined() {
    let text = "\
Title: Product Search
Given the shopper is on the homepage
When the shopper searches for \"shoes\"
And the shopper filters by size
Then matching products are listed
And the result count is shown
";
    let generator = Generator::new(ReqforgeConfig::default());
    let compilation = generator.compile(parse_str(text), None);

    let defined = compilation.page.method_names();
    for called in &compilation.report.methods_validation.steps_methods {
        assert!(defined.contains(called), "{} is not defined", called);
    }
    assert!(compilation.report.is_compliant, "{:?}", compilation.report.issues);
}

#[test]
fn test_zero_scenarios_emit_scaffold() {
    let generator = Generator::new(ReqforgeConfig::default());
    let compilation = generator.compile(parse_str("Title: Empty Feature\n"), None);

    assert!(compilation.requirement.scenarios.is_empty());
    assert!(compilation.steps.bindings.is_empty());
    assert!(compilation.page.is_scaffold());
    let names: Vec<&str> = compilation
        .page
        .methods
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["navigate", "isLoaded", "isDisplayed"]);
}

#[test]
fn test_slug_is_stable_across_spellings() {
    let generator = Generator::new(ReqforgeConfig::default());
    let messy = generator.compile(parse_str("Title: User   Login!!\nGiven the app is open"), None);
    let clean = generator.compile(parse_str("Title: user-login\nGiven the app is open"), None);

    assert_eq!(messy.feature.base_name, "user-login");
    assert_eq!(clean.feature.base_name, "user-login");
    assert_eq!(messy.artifacts.steps.file_name, "user-login.steps.js");
    assert_eq!(messy.page.class_name, clean.page.class_name);
}

#[test]
fn test_name_override_wins() {
    let generator = Generator::new(ReqforgeConfig::default());
    let compilation = generator.compile(parse_str(LOGIN), Some("Sign In"));
    assert_eq!(compilation.feature.file_name, "sign-in.feature");
    assert_eq!(compilation.page.class_name, "SignInPage");
}

#[test]
fn test_generate_writes_all_three_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("login.feature.txt");
    std::fs::write(&input, LOGIN).unwrap();

    let generator = generator_into(dir.path().join("out"));
    let outcome = generator.generate_file(&input, &GenerateOptions::default());

    assert!(outcome.success, "{:?}", outcome.error);
    let generated = outcome.generated.unwrap();
    assert!(generated.fully_written());
    for file in generated.files() {
        let on_disk = std::fs::read_to_string(&file.path).unwrap();
        assert_eq!(on_disk, file.content);
    }
    assert!(dir.path().join("out/pages/UserLoginPage.js").is_file());
    assert!(dir
        .path()
        .join("out/features/step_definitions/user-login.steps.js")
        .is_file());
}

#[test]
fn test_dry_run_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let generator = generator_into(dir.path().join("out"));
    let options = GenerateOptions {
        name: None,
        dry_run: true,
    };

    let outcome = generator.generate(&RequirementDocument::from_text(LOGIN), &options);

    assert!(outcome.success);
    let generated = outcome.generated.unwrap();
    assert!(!generated.feature.written);
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_unreadable_input_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let generator = generator_into(dir.path().to_path_buf());

    let outcome = generator.generate_file(&dir.path().join("missing.txt"), &GenerateOptions::default());

    assert!(!outcome.success);
    assert!(outcome.error.is_some());
    assert!(outcome.generated.is_none());
}

#[test]
fn test_generation_is_deterministic() {
    let generator = Generator::new(ReqforgeConfig::default());
    let first = generator.compile(parse_str(LOGIN), None);
    let second = generator.compile(parse_str(LOGIN), None);

    for (a, b) in first.artifacts.files().iter().zip(second.artifacts.files()) {
        assert_eq!(a.content, b.content);
        assert_eq!(a.sha256, b.sha256);
    }
}

#[test]
fn test_description_starting_with_a_keyword_is_not_bound() {
    let text = "\
Title: Login
Description: When users sign in they land on the dashboard
Given user is on login page
Then user sees the dashboard
";
    let generator = Generator::new(ReqforgeConfig::default());
    let compilation = generator.compile(parse_str(text), None);

    assert!(!compilation.feature.text.contains("\n  When users sign in"));
    assert!(compilation
        .feature
        .text
        .contains("  # When users sign in they land on the dashboard\n"));
    assert_eq!(compilation.steps.bindings.len(), 2);
    assert_eq!(
        compilation.steps.method_names(),
        vec!["userIsOnLoginPage", "userSeesTheDashboard"]
    );
    assert_eq!(compilation.page.methods.len(), 2);
    assert!(compilation.report.is_compliant, "{:?}", compilation.report.issues);
}

#[test]
fn test_step_named_like_a_locator_stays_callable() {
    let text = "\
Title: Search
Given user is on the home page
Then search results
";
    let generator = Generator::new(ReqforgeConfig::default());
    let compilation = generator.compile(parse_str(text), None);

    assert!(compilation.page.text.contains("  async searchResults() {\n"));
    assert!(!compilation.page.text.contains("this.searchResults ="));
    assert!(compilation.page.text.contains("this.searchResultsLocator = "));
    assert!(compilation.report.is_compliant, "{:?}", compilation.report.issues);
}
