//! Method similarity engine
//!
//! Ranks corpus methods against a target method by edit distance on names
//! plus a few behavioral hints in the body, and adapts a chosen method to
//! the target page's locators.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use reqforge_common::config::SimilarityConfig;
use reqforge_common::naming::{kebab_case, method_name};

use crate::corpus::index::keywords;
use crate::corpus::scanner::mask;
use crate::corpus::{CorpusIndex, CorpusLocator, CorpusMethod};
use crate::js::quoted;

static THIS_MEMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"this\.([A-Za-z_$][\w$]*)").expect("valid regex"));

/// Body hints worth a bonus, each counted once
const BODY_BONUSES: &[&[&str]] = &[
    &[".click("],
    &["isVisible(", "toBeVisible("],
    &[".fill("],
    &["waitFor"],
];

const BONUS: f64 = 0.25;
const NAME_WEIGHT: f64 = 3.0;
const STEP_WEIGHT: f64 = 2.0;

/// Edit distance between two strings, counted in chars
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Case-insensitive similarity in `0.0..=1.0`; two empty strings are identical
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(&a, &b) as f64 / longest as f64
}

/// What the target page needs a method for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodContext {
    pub method_name: String,
    pub step_text: String,
    pub page_title: String,
    pub feature_title: String,
}

impl MethodContext {
    pub fn new(method_name: impl Into<String>, step_text: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            step_text: step_text.into(),
            ..Self::default()
        }
    }

    pub fn with_titles(mut self, page_title: impl Into<String>, feature_title: impl Into<String>) -> Self {
        self.page_title = page_title.into();
        self.feature_title = feature_title.into();
        self
    }

    fn step_camel(&self) -> String {
        method_name(&self.step_text)
    }
}

/// A scored corpus method
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCandidate<'a> {
    pub method: &'a CorpusMethod,
    pub score: f64,
    /// Similarity of the corpus name to the target method name
    pub name_similarity: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimilarityResult<'a> {
    pub methods: Vec<MethodCandidate<'a>>,
    pub locators: Vec<&'a CorpusLocator>,
}

/// A locator declaration on the page being generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorDecl {
    pub name: String,
    pub definition: String,
}

impl LocatorDecl {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }
}

/// A corpus method rewritten for the target page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedMethod {
    pub body: String,
    pub source_file: PathBuf,
    /// Corpus member -> target member
    pub substitutions: Vec<(String, String)>,
    /// Locators the target page must declare for this body
    pub synthesized: Vec<LocatorDecl>,
}

#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    corpus: Arc<CorpusIndex>,
    config: SimilarityConfig,
}

impl SimilarityEngine {
    pub fn new(corpus: Arc<CorpusIndex>, config: SimilarityConfig) -> Self {
        Self { corpus, config }
    }

    pub fn corpus(&self) -> &CorpusIndex {
        &self.corpus
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Ranked method candidates and keyword-matched locators for `ctx`
    pub fn query(&self, ctx: &MethodContext) -> SimilarityResult<'_> {
        let step_camel = ctx.step_camel();
        let mut keys = keywords(&ctx.method_name);
        for key in keywords(&step_camel) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        let mut methods: Vec<MethodCandidate<'_>> = self
            .corpus
            .method_candidates(&keys)
            .into_iter()
            .map(|method| {
                let name_similarity = similarity(&method.name, &ctx.method_name);
                let score = NAME_WEIGHT * name_similarity
                    + STEP_WEIGHT * similarity(&method.name, &step_camel)
                    + body_bonus(&method.body);
                MethodCandidate {
                    method,
                    score,
                    name_similarity,
                }
            })
            .collect();
        methods.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.method.name.cmp(&b.method.name))
        });
        methods.truncate(self.config.max_method_candidates);

        let mut locator_keys = keys;
        for key in keywords(&ctx.page_title)
            .into_iter()
            .chain(keywords(&ctx.feature_title))
        {
            if !locator_keys.contains(&key) {
                locator_keys.push(key);
            }
        }
        let mut locators = self.corpus.locator_candidates(&locator_keys);
        locators.truncate(self.config.max_locator_candidates);

        debug!(
            "Similarity query '{}': {} method candidate(s), {} locator candidate(s)",
            ctx.method_name,
            methods.len(),
            locators.len()
        );
        SimilarityResult { methods, locators }
    }

    /// Top candidate when its name is close enough to reuse
    pub fn best_match(&self, ctx: &MethodContext) -> Option<MethodCandidate<'_>> {
        self.query(ctx)
            .methods
            .into_iter()
            .next()
            .filter(|c| c.name_similarity >= self.config.reuse_threshold)
    }

    /// Rename `method` to the target and point its members at target locators.
    ///
    /// Each `this.<id>` that is neither a call nor `this.page` is replaced by
    /// the closest target locator at or above the locator threshold, or by a
    /// fresh `<methodName>Element` declaration.
    pub fn adapt(&self, method: &CorpusMethod, ctx: &MethodContext, targets: &[LocatorDecl]) -> AdaptedMethod {
        let body = rename_signature(&method.body, &method.name, &ctx.method_name);
        let masked = mask(&body);

        let mut substitutions: Vec<(String, String)> = Vec::new();
        let mut synthesized: Vec<LocatorDecl> = Vec::new();
        let mut replacements: Vec<(usize, usize, String)> = Vec::new();

        for caps in THIS_MEMBER.captures_iter(&masked) {
            let Some(member) = caps.get(1) else {
                continue;
            };
            let id = member.as_str();
            let followed_by_call = masked[member.end()..].trim_start().starts_with('(');
            if id == "page" || followed_by_call {
                continue;
            }

            let target = match substitutions.iter().find(|(from, _)| from == id) {
                Some((_, to)) => to.clone(),
                None => {
                    let to = match self.closest_locator(id, targets) {
                        Some(found) => found.name.clone(),
                        None => {
                            let decl = self.synthesize_locator(id, method, ctx, synthesized.len());
                            let name = decl.name.clone();
                            synthesized.push(decl);
                            name
                        }
                    };
                    substitutions.push((id.to_string(), to.clone()));
                    to
                }
            };
            replacements.push((member.start(), member.end(), target));
        }

        let mut adapted = String::with_capacity(body.len());
        let mut cursor = 0;
        for (start, end, target) in replacements {
            adapted.push_str(&body[cursor..start]);
            adapted.push_str(&target);
            cursor = end;
        }
        adapted.push_str(&body[cursor..]);

        debug!(
            "Adapted {} from {} ({} substitution(s), {} new locator(s))",
            ctx.method_name,
            method.source_file.display(),
            substitutions.len(),
            synthesized.len()
        );

        AdaptedMethod {
            body: adapted,
            source_file: method.source_file.clone(),
            substitutions,
            synthesized,
        }
    }

    fn closest_locator<'t>(&self, id: &str, targets: &'t [LocatorDecl]) -> Option<&'t LocatorDecl> {
        targets
            .iter()
            .map(|t| (t, similarity(id, &t.name)))
            .filter(|(_, score)| *score >= self.config.locator_threshold)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .map(|(t, _)| t)
    }

    fn synthesize_locator(&self, id: &str, method: &CorpusMethod, ctx: &MethodContext, existing: usize) -> LocatorDecl {
        let name = match existing {
            0 => format!("{}Element", ctx.method_name),
            n => format!("{}Element{}", ctx.method_name, n + 1),
        };
        // keep the exemplar's selector when its file declares one
        let definition = self
            .corpus
            .locators_in(&method.source_file)
            .find(|l| l.name == id)
            .map(|l| l.definition.clone())
            .unwrap_or_else(|| {
                format!(
                    "page.locator({})",
                    quoted(&format!("[data-testid=\"{}\"]", kebab_case(id)))
                )
            });
        LocatorDecl { name, definition }
    }
}

fn body_bonus(body: &str) -> f64 {
    BODY_BONUSES
        .iter()
        .filter(|alternatives| alternatives.iter().any(|hint| body.contains(hint)))
        .count() as f64
        * BONUS
}

fn rename_signature(body: &str, from: &str, to: &str) -> String {
    let pattern = format!(r"^(\s*(?:static\s+)?async\s+){}(\s*\()", regex::escape(from));
    match Regex::new(&pattern) {
        Ok(signature) => signature
            .replace(body, |caps: &regex::Captures| format!("{}{}{}", &caps[1], to, &caps[2]))
            .into_owned(),
        Err(_) => body.to_string(),
    }
}
