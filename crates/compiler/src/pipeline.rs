//! Generation pipeline: document -> IR -> three artifacts -> report -> disk

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use reqforge_common::config::ReqforgeConfig;
use reqforge_common::naming::page_class_name;
use reqforge_common::types::{
    ComplianceReport, GeneratedArtifactSet, GeneratedFile, GenerationOutcome, ParsedRequirement,
};
use reqforge_common::{Error, Result};

use crate::corpus::CorpusIndex;
use crate::feature::{FeatureArtifact, FeatureEmitter, TemplateRegistry};
use crate::page::{MethodRequest, PageArtifact, PageEmitter};
use crate::parser::{self, RequirementDocument};
use crate::similarity::SimilarityEngine;
use crate::steps::{StepsArtifact, StepsEmitter};
use crate::validator::{self, EmittedMethods};

/// Options for one generation run
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Base name overriding the slugged title
    pub name: Option<String>,
    /// Render and validate without touching disk
    pub dry_run: bool,
}

/// Everything one compile produced, before anything is written
#[derive(Debug, Clone)]
pub struct Compilation {
    pub requirement: ParsedRequirement,
    pub feature: FeatureArtifact,
    pub steps: StepsArtifact,
    pub page: PageArtifact,
    pub artifacts: GeneratedArtifactSet,
    pub report: ComplianceReport,
}

pub struct Generator {
    config: ReqforgeConfig,
    templates: TemplateRegistry,
    engine: Option<SimilarityEngine>,
}

impl Generator {
    /// A generator without a corpus; page methods come from the rule table
    pub fn new(config: ReqforgeConfig) -> Self {
        let templates = TemplateRegistry::with_overrides(&config.domains);
        Self {
            config,
            templates,
            engine: None,
        }
    }

    /// Build the corpus named in the configuration, if any
    pub fn from_config(config: ReqforgeConfig) -> Result<Self> {
        let corpus = match &config.corpus.root {
            Some(root) => Some(Arc::new(CorpusIndex::build(root, &config.corpus)?)),
            None => None,
        };
        let generator = Self::new(config);
        Ok(match corpus {
            Some(corpus) => generator.with_corpus(corpus),
            None => generator,
        })
    }

    /// Reuse corpus methods from a shared index
    pub fn with_corpus(mut self, corpus: Arc<CorpusIndex>) -> Self {
        self.engine = Some(SimilarityEngine::new(corpus, self.config.similarity.clone()));
        self
    }

    pub fn config(&self) -> &ReqforgeConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn engine(&self) -> Option<&SimilarityEngine> {
        self.engine.as_ref()
    }

    /// Render and validate all three artifacts in memory
    pub fn compile(&self, req: ParsedRequirement, name: Option<&str>) -> Compilation {
        let feature = FeatureEmitter::new(&self.templates).emit(&req, name);
        info!("Rendered {}", feature.file_name);

        let page_class = page_class_name(&feature.base_name);
        let steps = StepsEmitter::new(self.config.steps.and_keyword, &self.config.output.page_import_prefix)
            .emit(&feature.text, &feature.base_name, &page_class);
        info!("Rendered {} ({} binding(s))", steps.file_name, steps.bindings.len());

        let mut requests: Vec<MethodRequest> = Vec::new();
        for binding in &steps.bindings {
            if !requests.iter().any(|r| r.name == binding.method_name) {
                requests.push(MethodRequest::new(&binding.method_name, &binding.phrase));
            }
        }
        let page = PageEmitter::new(self.engine.as_ref()).emit(&req, &page_class, &requests);

        let emitted = EmittedMethods {
            steps_methods: steps.method_names(),
            page_methods: page.method_names(),
        };
        let report = validator::validate_with_metadata(
            &feature.text,
            &steps.text,
            &page.text,
            &feature.template.tags,
            &emitted,
        );
        if report.is_compliant {
            info!("Artifacts are consistent");
        } else {
            warn!("{} compliance issue(s) found", report.issues.len());
        }

        let output = &self.config.output;
        let artifacts = GeneratedArtifactSet {
            feature: GeneratedFile::new(
                output.features_path().join(&feature.file_name),
                feature.file_name.clone(),
                feature.text.clone(),
            ),
            steps: GeneratedFile::new(
                output.steps_path().join(&steps.file_name),
                steps.file_name.clone(),
                steps.text.clone(),
            ),
            page: GeneratedFile::new(
                output.pages_path().join(&page.file_name),
                page.file_name.clone(),
                page.text.clone(),
            ),
        };

        Compilation {
            requirement: req,
            feature,
            steps,
            page,
            artifacts,
            report,
        }
    }

    /// Full run over a document already in memory
    pub fn generate(&self, doc: &RequirementDocument, options: &GenerateOptions) -> GenerationOutcome {
        let req = parser::parse(doc);
        let compilation = self.compile(req, options.name.as_deref());
        let Compilation {
            mut artifacts, report, ..
        } = compilation;

        if options.dry_run {
            info!("Dry run; nothing written");
            return GenerationOutcome::succeeded(artifacts, report);
        }

        match write_artifacts(&mut artifacts) {
            Ok(()) => GenerationOutcome::succeeded(artifacts, report),
            Err(e) => {
                warn!("Generation stopped after a failed write: {}", e);
                GenerationOutcome::partial(e, artifacts, report)
            }
        }
    }

    /// Full run over a file; an unreadable input is reported, not raised
    pub fn generate_file(&self, path: &Path, options: &GenerateOptions) -> GenerationOutcome {
        match RequirementDocument::read(path) {
            Ok(doc) => self.generate(&doc, options),
            Err(e) => {
                warn!("Cannot generate from {}: {}", path.display(), e);
                GenerationOutcome::failed(e)
            }
        }
    }
}

/// Write files in order, marking each one that lands
pub fn write_artifacts(artifacts: &mut GeneratedArtifactSet) -> Result<()> {
    for file in artifacts.files_mut() {
        write_file(&file.path, &file.content)?;
        file.written = true;
        info!("Wrote {}", file.path.display());
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Error::output(parent, e))?;
        }
    }
    std::fs::write(path, content).map_err(|e| Error::output(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_compile_in_memory() {
        let generator = Generator::new(ReqforgeConfig::default());
        let req = parser::parse_str("Title: Cart\nGiven a product is in the cart\nWhen the shopper opens the cart\nThen the cart total is shown");
        let compilation = generator.compile(req, None);

        assert_eq!(compilation.artifacts.feature.path, PathBuf::from("./features/cart.feature"));
        assert_eq!(
            compilation.artifacts.steps.path,
            PathBuf::from("./features/step_definitions/cart.steps.js")
        );
        assert_eq!(compilation.artifacts.page.path, PathBuf::from("./pages/CartPage.js"));
        assert!(compilation.report.is_compliant, "{:?}", compilation.report.issues);
        assert!(!compilation.artifacts.fully_written());
    }

    #[test]
    fn test_write_failure_marks_partial() {
        let dir = tempfile::tempdir().unwrap();
        // a file where the features directory should be
        std::fs::write(dir.path().join("features"), "occupied").unwrap();

        let mut config = ReqforgeConfig::default();
        config.output.root = dir.path().to_path_buf();
        let generator = Generator::new(config);
        let doc = RequirementDocument::from_text("Title: Blocked\nGiven the app is open\nThen the home screen is shown");

        let outcome = generator.generate(&doc, &GenerateOptions::default());
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        let generated = outcome.generated.unwrap();
        assert!(!generated.feature.written);
        assert!(!generated.page.written);
    }
}
