//! Reference corpus of exemplar page objects
//!
//! The index is built once, either by walking a directory of page-object
//! sources or from in-memory records, and is immutable afterwards. Share it
//! between generators as `Arc<CorpusIndex>`.

pub mod index;
pub mod scanner;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use reqforge_common::config::CorpusConfig;
use reqforge_common::{Error, Result};

use self::index::{keywords, KeywordIndex};

/// Suffix of structured corpus exports
pub const RECORD_FILE_SUFFIX: &str = ".corpus.json";

const PAGE_DIRECTORIES: &[&str] = &["pages", "page-objects", "page_objects", "pageobjects"];

/// A method lifted from an exemplar page object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusMethod {
    pub name: String,
    #[serde(default)]
    pub params: String,
    /// Full method text, signature included
    pub body: String,
    pub source_file: PathBuf,
}

/// A locator declared in an exemplar constructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusLocator {
    pub name: String,
    /// Factory call rooted at `page.`, e.g. `page.getByRole('button')`
    pub definition: String,
    pub source_file: PathBuf,
}

/// One entry of a `*.corpus.json` export
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CorpusRecord {
    Method {
        name: String,
        body: String,
        #[serde(default)]
        params: String,
        #[serde(default)]
        source: Option<PathBuf>,
    },
    Locator {
        name: String,
        definition: String,
        #[serde(default)]
        source: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusStats {
    pub root: Option<PathBuf>,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub methods: usize,
    pub locators: usize,
    pub method_keys: usize,
    pub locator_keys: usize,
    /// SHA-256 over every indexed entry, in index order
    pub fingerprint: String,
}

#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    root: Option<PathBuf>,
    methods: Vec<CorpusMethod>,
    locators: Vec<CorpusLocator>,
    method_index: KeywordIndex,
    locator_index: KeywordIndex,
    files_scanned: usize,
    files_skipped: usize,
}

impl CorpusIndex {
    /// An index with nothing in it; every query comes back empty
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(methods: Vec<CorpusMethod>, locators: Vec<CorpusLocator>) -> Self {
        let mut builder = Builder::default();
        for method in methods {
            builder.add_method(method);
        }
        for locator in locators {
            builder.add_locator(locator);
        }
        builder.finish(None)
    }

    /// Walk `root` and index every page-object source and corpus export.
    ///
    /// Files that cannot be read or parsed are logged and skipped; only an
    /// unusable root is an error.
    pub fn build(root: &Path, config: &CorpusConfig) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::Corpus(format!(
                "corpus root {} is not a directory",
                root.display()
            )));
        }

        info!("Indexing corpus at {}", root.display());
        let mut builder = Builder::default();

        for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable corpus entry: {}", e);
                    builder.files_skipped += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let outcome = if is_record_file(path) {
                builder.load_records(path, relative)
            } else if is_page_object_file(relative, &config.extensions) {
                builder.load_source(path, relative, config.max_file_bytes)
            } else {
                continue;
            };

            match outcome {
                Ok(()) => builder.files_scanned += 1,
                Err(e) => {
                    warn!("Skipping corpus file {}: {}", path.display(), e);
                    builder.files_skipped += 1;
                }
            }
        }

        let index = builder.finish(Some(root.to_path_buf()));
        info!(
            "Indexed {} method(s) and {} locator(s) from {} file(s) ({} skipped)",
            index.methods.len(),
            index.locators.len(),
            index.files_scanned,
            index.files_skipped
        );
        Ok(index)
    }

    pub fn methods(&self) -> &[CorpusMethod] {
        &self.methods
    }

    pub fn locators(&self) -> &[CorpusLocator] {
        &self.locators
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.locators.is_empty()
    }

    /// Methods posted under any of `keys`, in index order
    pub fn method_candidates(&self, keys: &[String]) -> Vec<&CorpusMethod> {
        self.method_index
            .lookup(keys)
            .into_iter()
            .filter_map(|id| self.methods.get(id))
            .collect()
    }

    /// Locators posted under any of `keys`, in index order
    pub fn locator_candidates(&self, keys: &[String]) -> Vec<&CorpusLocator> {
        self.locator_index
            .lookup(keys)
            .into_iter()
            .filter_map(|id| self.locators.get(id))
            .collect()
    }

    /// Locators declared in one source file
    pub fn locators_in<'a>(&'a self, source: &'a Path) -> impl Iterator<Item = &'a CorpusLocator> + 'a {
        self.locators.iter().filter(move |l| l.source_file == source)
    }

    pub fn stats(&self) -> CorpusStats {
        let mut hasher = Sha256::new();
        for method in &self.methods {
            hasher.update(b"method\0");
            hasher.update(method.source_file.to_string_lossy().as_bytes());
            hasher.update(b"\0");
            hasher.update(method.name.as_bytes());
            hasher.update(b"\0");
            hasher.update(method.body.as_bytes());
            hasher.update(b"\n");
        }
        for locator in &self.locators {
            hasher.update(b"locator\0");
            hasher.update(locator.source_file.to_string_lossy().as_bytes());
            hasher.update(b"\0");
            hasher.update(locator.name.as_bytes());
            hasher.update(b"\0");
            hasher.update(locator.definition.as_bytes());
            hasher.update(b"\n");
        }

        CorpusStats {
            root: self.root.clone(),
            files_scanned: self.files_scanned,
            files_skipped: self.files_skipped,
            methods: self.methods.len(),
            locators: self.locators.len(),
            method_keys: self.method_index.len(),
            locator_keys: self.locator_index.len(),
            fingerprint: hex::encode(hasher.finalize()),
        }
    }
}

#[derive(Default)]
struct Builder {
    methods: Vec<CorpusMethod>,
    locators: Vec<CorpusLocator>,
    files_scanned: usize,
    files_skipped: usize,
}

impl Builder {
    fn add_method(&mut self, method: CorpusMethod) {
        self.methods.push(method);
    }

    fn add_locator(&mut self, locator: CorpusLocator) {
        let duplicate = self
            .locators
            .iter()
            .any(|l| l.name == locator.name && l.source_file == locator.source_file);
        if !duplicate {
            self.locators.push(locator);
        }
    }

    fn load_source(&mut self, path: &Path, relative: &Path, max_bytes: u64) -> Result<()> {
        let size = std::fs::metadata(path)?.len();
        if size > max_bytes {
            return Err(Error::Corpus(format!(
                "{} bytes exceeds the {} byte limit",
                size, max_bytes
            )));
        }
        let source = std::fs::read_to_string(path)?;

        let methods = scanner::scan_methods(&source);
        let locators = scanner::scan_locators(&source);
        debug!(
            "{}: {} method(s), {} locator(s)",
            relative.display(),
            methods.len(),
            locators.len()
        );

        for method in methods {
            self.add_method(CorpusMethod {
                name: method.name,
                params: method.params,
                body: method.body,
                source_file: relative.to_path_buf(),
            });
        }
        for locator in locators {
            self.add_locator(CorpusLocator {
                name: locator.name,
                definition: locator.definition,
                source_file: relative.to_path_buf(),
            });
        }
        Ok(())
    }

    fn load_records(&mut self, path: &Path, relative: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<CorpusRecord> = serde_json::from_str(&content)?;
        debug!("{}: {} record(s)", relative.display(), records.len());

        for record in records {
            match record {
                CorpusRecord::Method {
                    name,
                    body,
                    params,
                    source,
                } => self.add_method(CorpusMethod {
                    name,
                    params,
                    body,
                    source_file: source.unwrap_or_else(|| relative.to_path_buf()),
                }),
                CorpusRecord::Locator {
                    name,
                    definition,
                    source,
                } => self.add_locator(CorpusLocator {
                    name,
                    definition,
                    source_file: source.unwrap_or_else(|| relative.to_path_buf()),
                }),
            }
        }
        Ok(())
    }

    fn finish(self, root: Option<PathBuf>) -> CorpusIndex {
        let mut method_index = KeywordIndex::default();
        for (id, method) in self.methods.iter().enumerate() {
            method_index.insert(id, &keywords(&method.name));
        }
        let mut locator_index = KeywordIndex::default();
        for (id, locator) in self.locators.iter().enumerate() {
            locator_index.insert(id, &keywords(&locator.name));
        }

        CorpusIndex {
            root,
            methods: self.methods,
            locators: self.locators,
            method_index,
            locator_index,
            files_scanned: self.files_scanned,
            files_skipped: self.files_skipped,
        }
    }
}

fn is_record_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(RECORD_FILE_SUFFIX))
        .unwrap_or(false)
}

/// Whether a corpus-relative path looks like a page-object source
pub fn is_page_object_file(relative: &Path, extensions: &[String]) -> bool {
    let has_extension = relative
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.trim_start_matches('.') == e))
        .unwrap_or(false);
    if !has_extension {
        return false;
    }

    let Some(file_name) = relative.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = file_name.to_lowercase();
    if lower.contains(".spec.") || lower.contains(".test.") {
        return false;
    }

    let stem = file_name.split('.').next().unwrap_or(file_name);
    if stem.ends_with("Page") || lower.contains(".page.") || lower.contains("-page.") || lower.contains("_page.") {
        return true;
    }

    relative
        .parent()
        .map(|parent| {
            parent.components().any(|c| {
                let dir = c.as_os_str().to_string_lossy().to_lowercase();
                PAGE_DIRECTORIES.contains(&dir.as_str())
            })
        })
        .unwrap_or(false)
}
