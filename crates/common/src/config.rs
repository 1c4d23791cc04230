//! reqforge configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration, usually loaded from `reqforge.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReqforgeConfig {
    /// Reference corpus configuration
    pub corpus: CorpusConfig,

    /// Similarity engine tuning
    pub similarity: SimilarityConfig,

    /// Where generated artifacts go
    pub output: OutputConfig,

    /// Step-binding emission options
    pub steps: StepsConfig,

    /// Extra or overriding domain templates
    pub domains: Vec<DomainTemplateConfig>,
}

/// Reference corpus of exemplar page objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Root directory; no corpus is indexed when unset
    pub root: Option<PathBuf>,

    /// File extensions considered page-object sources
    pub extensions: Vec<String>,

    /// Files larger than this are skipped
    pub max_file_bytes: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: None,
            extensions: vec!["js".to_string(), "ts".to_string()],
            max_file_bytes: 1024 * 1024,
        }
    }
}

/// Similarity engine thresholds and result sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Minimum name similarity for a corpus method to be reused
    pub reuse_threshold: f64,

    /// Minimum similarity for a target locator to replace a corpus locator
    pub locator_threshold: f64,

    pub max_method_candidates: usize,

    pub max_locator_candidates: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            reuse_threshold: 0.7,
            locator_threshold: 0.6,
            max_method_candidates: 5,
            max_locator_candidates: 10,
        }
    }
}

/// Output roots for the three artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base directory every other path is joined onto
    pub root: PathBuf,

    pub features_dir: PathBuf,

    pub steps_dir: PathBuf,

    pub pages_dir: PathBuf,

    /// Module prefix the step file uses to `require` the page object
    pub page_import_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            features_dir: PathBuf::from("features"),
            steps_dir: PathBuf::from("features/step_definitions"),
            pages_dir: PathBuf::from("pages"),
            page_import_prefix: "../../pages/".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn features_path(&self) -> PathBuf {
        self.root.join(&self.features_dir)
    }

    pub fn steps_path(&self) -> PathBuf {
        self.root.join(&self.steps_dir)
    }

    pub fn pages_path(&self) -> PathBuf {
        self.root.join(&self.pages_dir)
    }
}

/// How `And` clauses are keyed in the binding file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AndKeyword {
    /// Rewrite `And` to `Then`
    #[default]
    Then,
    /// Bind `And` under the keyword of the clause it continues
    Inherit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepsConfig {
    pub and_keyword: AndKeyword,
}

/// Mandatory feature structure for one business domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTemplateConfig {
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub background: Vec<String>,
}

impl ReqforgeConfig {
    /// Load configuration from file, falling back to defaults when missing
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("similarity.reuse_threshold", self.similarity.reuse_threshold),
            ("similarity.locator_threshold", self.similarity.locator_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be within 0.0..=1.0, got {}",
                    name, value
                )));
            }
        }
        if let Some(domain) = self.domains.iter().find(|d| d.name.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "domain template with empty name (tags: {:?})",
                domain.tags
            )));
        }
        Ok(())
    }
}
