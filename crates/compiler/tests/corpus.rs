//! Corpus indexing and reuse against a real directory tree

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqforge_common::config::{CorpusConfig, ReqforgeConfig};
use reqforge_compiler::page::MethodOrigin;
use reqforge_compiler::{parse_str, CorpusIndex, Generator, MethodContext, SimilarityEngine};

const LOGIN_PAGE: &str = r#"const BasePage = require('./BasePage');

class LoginPage extends BasePage {
  constructor(page) {
    super(page);
    this.emailField = page.locator('#email');
    this.secretField = page.locator('#password');
    this.signInButton = page.locator('button[type="submit"]');
  }

  async userSubmitsValidCredentials() {
    await this.emailField.fill('qa@example.com');
    await this.secretField.fill('s3cret!');
    await this.signInButton.click();
  }

  async userLogsOut() {
    // `}` inside a comment must not close the method
    await this.page.click('text=Log out');
  }
}

module.exports = LoginPage;
"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn corpus_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pages/LoginPage.js", LOGIN_PAGE);
    write(dir.path(), "pages/login.spec.js", "test('x', async () => {});\n");
    write(dir.path(), "utils/helpers.js", "async function helper() {}\n");
    write(
        dir.path(),
        "exports/shared.corpus.json",
        r#"[{"kind": "method", "name": "openSettings", "body": "async openSettings() {\n  await this.settingsLink.click();\n}", "source": "legacy/SettingsPage.js"}]"#,
    );
    dir
}

#[test]
fn test_build_indexes_sources_and_exports() {
    let dir = corpus_tree();
    let index = CorpusIndex::build(dir.path(), &CorpusConfig::default()).unwrap();

    let names: Vec<&str> = index.methods().iter().map(|m| m.name.as_str()).collect();
    assert!(names.contains(&"userSubmitsValidCredentials"));
    assert!(names.contains(&"userLogsOut"));
    assert!(names.contains(&"openSettings"));
    assert!(!names.contains(&"helper"));
    assert_eq!(index.locators().len(), 3);

    let logout = index.methods().iter().find(|m| m.name == "userLogsOut").unwrap();
    assert!(logout.body.trim_end().ends_with('}'));
    assert!(logout.body.contains("Log out"));

    let stats = index.stats();
    assert_eq!(stats.methods, 3);
    assert_eq!(stats.fingerprint.len(), 64);
}

#[test]
fn test_build_rejects_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    assert!(CorpusIndex::build(&dir.path().join("nope"), &CorpusConfig::default()).is_err());
}

#[test]
fn test_fingerprint_is_stable_across_builds() {
    let dir = corpus_tree();
    let first = CorpusIndex::build(dir.path(), &CorpusConfig::default()).unwrap();
    let second = CorpusIndex::build(dir.path(), &CorpusConfig::default()).unwrap();
    assert_eq!(first.stats().fingerprint, second.stats().fingerprint);
}

#[test]
fn test_query_ranks_exact_name_first() {
    let dir = corpus_tree();
    let index = Arc::new(CorpusIndex::build(dir.path(), &CorpusConfig::default()).unwrap());
    let engine = SimilarityEngine::new(index, Default::default());

    let ctx = MethodContext::new("userSubmitsValidCredentials", "user submits valid credentials");
    let best = engine.best_match(&ctx).unwrap();
    assert_eq!(best.method.name, "userSubmitsValidCredentials");
    assert!((best.name_similarity - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_generation_reuses_corpus_method() {
    let dir = corpus_tree();
    let index = Arc::new(CorpusIndex::build(dir.path(), &CorpusConfig::default()).unwrap());
    let generator = Generator::new(ReqforgeConfig::default()).with_corpus(index);

    let req = parse_str(
        "Title: User Login\nGiven user is on login page\nWhen user submits valid credentials\nThen user sees the dashboard",
    );
    let compilation = generator.compile(req, None);

    let reused = compilation
        .page
        .methods
        .iter()
        .find(|m| m.name == "userSubmitsValidCredentials")
        .unwrap();
    assert_eq!(
        reused.origin,
        MethodOrigin::Corpus {
            source: PathBuf::from("pages/LoginPage.js")
        }
    );
    assert!(reused.source.contains(".fill('qa@example.com')"));
    assert!(compilation.report.is_compliant, "{:?}", compilation.report.issues);
}
