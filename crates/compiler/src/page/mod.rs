//! Page-object emitter
//!
//! Each requested method is sourced, in order, from an adapted corpus
//! method, the rule table, or the generic visibility fallback. A request list
//! with nothing in it yields the scaffold methods instead.

pub mod locators;
pub mod rules;

use std::collections::HashMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use reqforge_common::types::ParsedRequirement;

use crate::similarity::{LocatorDecl, MethodContext, SimilarityEngine};
use crate::steps::has_assertion_cue;

use self::rules::{RuleInput, FALLBACK_TEMPLATE, SCAFFOLD_METHODS};

/// Module every generated page object extends
pub const BASE_PAGE_MODULE: &str = "./BasePage";

/// Utility every generated page object carries
pub const READY_UTILITY: &str = "waitForPageReady";

const READY_UTILITY_BODY: &str = "await this.page.waitForLoadState('domcontentloaded');
await this.mainContent.waitFor({ state: 'visible', timeout: 10000 });";

static MEMBER_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"this\.([A-Za-z_$][\w$]*)(\s*\()?").expect("valid regex"));

/// Where a method body came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MethodOrigin {
    Corpus { source: PathBuf },
    Rule { id: String },
    Fallback,
    Scaffold,
}

/// A method the page object needs, with the phrase that asked for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRequest {
    pub name: String,
    pub phrase: String,
}

impl MethodRequest {
    pub fn new(name: impl Into<String>, phrase: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phrase: phrase.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMethod {
    pub name: String,
    pub origin: MethodOrigin,
    /// Complete method text, indented for the class body
    pub source: String,
}

/// Rendered page object plus what went into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageArtifact {
    pub text: String,
    pub file_name: String,
    pub class_name: String,
    pub locators: Vec<LocatorDecl>,
    pub methods: Vec<PageMethod>,
}

impl PageArtifact {
    /// Defined method names, utility included
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.iter().map(|m| m.name.clone()).collect();
        if !names.iter().any(|n| n == READY_UTILITY) {
            names.push(READY_UTILITY.to_string());
        }
        names
    }

    pub fn is_scaffold(&self) -> bool {
        self.methods.iter().all(|m| m.origin == MethodOrigin::Scaffold)
    }
}

pub struct PageEmitter<'a> {
    engine: Option<&'a SimilarityEngine>,
}

impl<'a> PageEmitter<'a> {
    pub fn new(engine: Option<&'a SimilarityEngine>) -> Self {
        Self { engine }
    }

    pub fn emit(&self, req: &ParsedRequirement, class_name: &str, requests: &[MethodRequest]) -> PageArtifact {
        let mut context_text = req.searchable_text();
        for request in requests {
            context_text.push('\n');
            context_text.push_str(&request.phrase);
        }
        let mut locators = locators::locators_for(&context_text);

        let mut methods: Vec<PageMethod> = Vec::new();
        if requests.is_empty() {
            warn!(
                "No step methods for {}; emitting scaffold methods",
                class_name
            );
            for (name, body) in SCAFFOLD_METHODS {
                methods.push(PageMethod {
                    name: name.to_string(),
                    origin: MethodOrigin::Scaffold,
                    source: render_method(name, body),
                });
            }
        }

        for request in requests {
            if methods.iter().any(|m| m.name == request.name) {
                continue;
            }
            let method = self.build_method(req, class_name, request, &mut locators);
            debug!("{}.{} <- {:?}", class_name, method.name, method.origin);
            methods.push(method);
        }

        // A constructor property would hide a prototype method of the same name
        let renames = rename_shadowing_locators(&mut locators, &methods);
        if !renames.is_empty() {
            for method in &mut methods {
                method.source = rename_members(&method.source, &renames);
            }
        }

        let text = rename_members(&render_class(req, class_name, &locators, &methods), &renames);
        info!(
            "Rendered page object {} ({} method(s), {} locator(s))",
            class_name,
            methods.len(),
            locators.len()
        );

        PageArtifact {
            text,
            file_name: format!("{}.js", class_name),
            class_name: class_name.to_string(),
            locators,
            methods,
        }
    }

    fn build_method(
        &self,
        req: &ParsedRequirement,
        class_name: &str,
        request: &MethodRequest,
        locators: &mut Vec<LocatorDecl>,
    ) -> PageMethod {
        if let Some(engine) = self.engine {
            let ctx = MethodContext::new(&request.name, &request.phrase).with_titles(class_name, &req.title);
            if let Some(candidate) = engine.best_match(&ctx) {
                let adapted = engine.adapt(candidate.method, &ctx, locators);
                if has_assertion_cue(&request.phrase) && !adapted.body.contains("return") {
                    debug!(
                        "{} asserts on its result; corpus method {} returns nothing",
                        request.name, candidate.method.name
                    );
                    return rule_method(request);
                }
                for decl in adapted.synthesized {
                    if !locators.iter().any(|l| l.name == decl.name) {
                        locators.push(decl);
                    }
                }
                return PageMethod {
                    name: request.name.clone(),
                    origin: MethodOrigin::Corpus {
                        source: adapted.source_file,
                    },
                    source: reindent(&adapted.body),
                };
            }
        }

        rule_method(request)
    }
}

/// Rule-table body, or the visibility fallback when no rule fires
fn rule_method(request: &MethodRequest) -> PageMethod {
    let input = RuleInput::new(&request.name, &request.phrase);
        match rules::resolve(&input) {
            Some(rule) => PageMethod {
                name: request.name.clone(),
                origin: MethodOrigin::Rule {
                    id: rule.id.to_string(),
                },
                source: render_method(&request.name, &rule.render(&input)),
            },
            None => PageMethod {
                name: request.name.clone(),
                origin: MethodOrigin::Fallback,
                source: render_method(&request.name, FALLBACK_TEMPLATE),
            },
        }
}

/// Give every locator named like a method a `Locator` suffix; returns old to new names
fn rename_shadowing_locators(locators: &mut [LocatorDecl], methods: &[PageMethod]) -> HashMap<String, String> {
    let mut taken: Vec<String> = methods.iter().map(|m| m.name.clone()).collect();
    taken.push(READY_UTILITY.to_string());
    taken.extend(locators.iter().map(|l| l.name.clone()));

    let mut renames = HashMap::new();
    for locator in locators.iter_mut() {
        if !methods.iter().any(|m| m.name == locator.name) && locator.name != READY_UTILITY {
            continue;
        }
        let base = format!("{}Locator", locator.name);
        let mut renamed = base.clone();
        let mut n = 2;
        while taken.contains(&renamed) {
            renamed = format!("{}{}", base, n);
            n += 1;
        }
        debug!("Locator {} renamed to {}; a method has that name", locator.name, renamed);
        taken.push(renamed.clone());
        renames.insert(locator.name.clone(), renamed.clone());
        locator.name = renamed;
    }
    renames
}

/// Rewrite `this.<old>` property reads and writes; method calls keep their name
fn rename_members(text: &str, renames: &HashMap<String, String>) -> String {
    if renames.is_empty() {
        return text.to_string();
    }
    MEMBER_REFERENCE
        .replace_all(text, |caps: &Captures| {
            if caps.get(2).is_some() {
                return caps[0].to_string();
            }
            match renames.get(&caps[1]) {
                Some(renamed) => format!("this.{}", renamed),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// `async name() { ... }` indented for a class body
fn render_method(name: &str, body: &str) -> String {
    let mut out = format!("  async {}() {{\n", name);
    for line in body.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str("  }\n");
    out
}

/// Shift a corpus method so its closing brace sits at class-body depth
fn reindent(body: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let base = lines
        .last()
        .map(|l| l.len() - l.trim_start().len())
        .unwrap_or(0);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            out.push('\n');
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        let relative = if i == 0 { 0 } else { indent.saturating_sub(base) };
        out.push_str("  ");
        out.push_str(&" ".repeat(relative));
        out.push_str(line.trim_start());
        out.push('\n');
    }
    out
}

fn render_class(req: &ParsedRequirement, class_name: &str, locators: &[LocatorDecl], methods: &[PageMethod]) -> String {
    let mut out = format!(
        "const BasePage = require('{module}');\n\n/**\n * Page object for {title}\n */\nclass {class} extends BasePage {{\n  constructor(page) {{\n    super(page);\n",
        module = BASE_PAGE_MODULE,
        title = req.title.replace("*/", "* /"),
        class = class_name,
    );
    for locator in locators {
        out.push_str(&format!("    this.{} = {};\n", locator.name, locator.definition));
    }
    out.push_str("  }\n");

    for method in methods {
        out.push('\n');
        out.push_str(&method.source);
    }
    if !methods.iter().any(|m| m.name == READY_UTILITY) {
        out.push('\n');
        out.push_str(&render_method(READY_UTILITY, READY_UTILITY_BODY));
    }

    out.push_str(&format!("}}\n\nmodule.exports = {};\n", class_name));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use reqforge_common::config::SimilarityConfig;

    use crate::corpus::{CorpusIndex, CorpusMethod};

    fn requirement() -> ParsedRequirement {
        ParsedRequirement {
            title: "User Login".to_string(),
            ..ParsedRequirement::default()
        }
    }

    fn login_requests() -> Vec<MethodRequest> {
        vec![
            MethodRequest::new("userIsOnLoginPage", "user is on login page"),
            MethodRequest::new("userSubmitsValidCredentials", "user submits valid credentials"),
            MethodRequest::new("userSeesTheDashboard", "user sees the dashboard"),
        ]
    }

    #[test]
    fn test_rule_methods_and_class_shape() {
        let page = PageEmitter::new(None).emit(&requirement(), "UserLoginPage", &login_requests());

        let origins: Vec<&MethodOrigin> = page.methods.iter().map(|m| &m.origin).collect();
        assert_eq!(
            origins,
            vec![
                &MethodOrigin::Rule { id: "navigate".to_string() },
                &MethodOrigin::Rule { id: "login".to_string() },
                &MethodOrigin::Rule { id: "verify-visible".to_string() },
            ]
        );
        assert!(page.text.starts_with("const BasePage = require('./BasePage');"));
        assert!(page.text.contains("class UserLoginPage extends BasePage {\n  constructor(page) {\n    super(page);\n"));
        assert!(page.text.contains("    this.usernameInput = page.getByLabel(/user ?name|email/i);\n"));
        assert!(page.text.contains("  async userSeesTheDashboard() {\n"));
        assert!(page.text.contains("  async waitForPageReady() {\n"));
        assert!(page.text.ends_with("}\n\nmodule.exports = UserLoginPage;\n"));
        assert_eq!(page.file_name, "UserLoginPage.js");
        assert_eq!(page.method_names().len(), 4);
    }

    #[test]
    fn test_empty_requests_scaffold() {
        let page = PageEmitter::new(None).emit(&requirement(), "UserLoginPage", &[]);
        let names: Vec<&str> = page.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["navigate", "isLoaded", "isDisplayed"]);
        assert!(page.is_scaffold());
    }

    #[test]
    fn test_scenario_text_selects_locator_families() {
        let mut req = requirement();
        let mut scenario = reqforge_common::types::Scenario::new("Find shoes");
        scenario.push(reqforge_common::types::StepKind::When, "the shopper searches for shoes");
        req.scenarios.push(scenario);

        let page = PageEmitter::new(None).emit(&req, "UserLoginPage", &[]);
        assert!(page.locators.iter().any(|l| l.name == "searchInput"));
    }

    #[test]
    fn test_fallback_when_no_rule_fires() {
        let requests = vec![MethodRequest::new("nothingHappensHere", "nothing happens here")];
        let page = PageEmitter::new(None).emit(&requirement(), "APage", &requests);
        assert_eq!(page.methods[0].origin, MethodOrigin::Fallback);
        assert!(page.methods[0].source.contains("this.mainContent.waitFor"));
    }

    #[test]
    fn test_duplicate_requests_emit_once() {
        let requests = vec![
            MethodRequest::new("userLogsIn", "user logs in"),
            MethodRequest::new("userLogsIn", "user logs in!"),
        ];
        let page = PageEmitter::new(None).emit(&requirement(), "APage", &requests);
        assert_eq!(page.methods.len(), 1);
        assert_eq!(page.text.matches("async userLogsIn(").count(), 1);
    }

    #[test]
    fn test_corpus_method_is_adapted() {
        let corpus = CorpusIndex::from_records(
            vec![CorpusMethod {
                name: "userSeesDashboard".to_string(),
                params: String::new(),
                body: "async userSeesDashboard() {\n      await this.dashboardPanel.waitFor();\n      return await this.dashboardPanel.isVisible();\n    }".to_string(),
                source_file: PathBuf::from("pages/DashboardPage.js"),
            }],
            vec![],
        );
        let engine = SimilarityEngine::new(Arc::new(corpus), SimilarityConfig::default());
        let page = PageEmitter::new(Some(&engine)).emit(&requirement(), "UserLoginPage", &login_requests());

        let method = page.methods.iter().find(|m| m.name == "userSeesTheDashboard").unwrap();
        assert_eq!(
            method.origin,
            MethodOrigin::Corpus {
                source: PathBuf::from("pages/DashboardPage.js")
            }
        );
        assert_eq!(
            method.source,
            "  async userSeesTheDashboard() {\n    await this.userSeesTheDashboardElement.waitFor();\n    return await this.userSeesTheDashboardElement.isVisible();\n  }\n"
        );
        assert!(page
            .text
            .contains("    this.userSeesTheDashboardElement = page.locator('[data-testid=\"dashboard-panel\"]');\n"));
    }

    #[test]
    fn test_locator_named_like_a_method_is_renamed() {
        let requests = vec![MethodRequest::new("searchResults", "search results")];
        let page = PageEmitter::new(None).emit(&requirement(), "SearchPage", &requests);

        assert!(page.locators.iter().any(|l| l.name == "searchResultsLocator"));
        assert!(!page.locators.iter().any(|l| l.name == "searchResults"));
        assert!(!page.text.contains("this.searchResults ="));
        assert!(page.text.contains("    this.searchResultsLocator = "));
        assert!(page.text.contains("  async searchResults() {\n"));
        assert!(crate::validator::validate("Feature: x\nBackground:\n", "", &page.text, &[])
            .issues
            .iter()
            .all(|i| !i.contains("shadowed")));
    }

    #[test]
    fn test_rename_members_keeps_method_calls() {
        let renames = HashMap::from([("results".to_string(), "resultsLocator".to_string())]);
        let body = "await this.results.waitFor();\nreturn this.results();\nthis.resultsCount = 1;";
        assert_eq!(
            rename_members(body, &renames),
            "await this.resultsLocator.waitFor();\nreturn this.results();\nthis.resultsCount = 1;"
        );
    }

    #[test]
    fn test_corpus_method_without_result_is_not_used_for_assertions() {
        let corpus = CorpusIndex::from_records(
            vec![CorpusMethod {
                name: "userSeesDashboard".to_string(),
                params: String::new(),
                body: "async userSeesDashboard() {\n      await this.dashboardPanel.waitFor();\n    }".to_string(),
                source_file: PathBuf::from("pages/DashboardPage.js"),
            }],
            vec![],
        );
        let engine = SimilarityEngine::new(Arc::new(corpus), SimilarityConfig::default());
        let page = PageEmitter::new(Some(&engine)).emit(&requirement(), "UserLoginPage", &login_requests());

        let method = page.methods.iter().find(|m| m.name == "userSeesTheDashboard").unwrap();
        assert_eq!(method.origin, MethodOrigin::Rule { id: "verify-visible".to_string() });
        assert!(method.source.contains("return "));
    }

    #[test]
    fn test_reindent_preserves_relative_depth() {
        let body = "async a() {\n        if (x) {\n          y();\n        }\n      }";
        assert_eq!(reindent(body), "  async a() {\n    if (x) {\n      y();\n    }\n  }\n");
    }
}
