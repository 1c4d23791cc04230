//! reqforge compiler
//!
//! Compiles a natural-language requirement document into three coupled test
//! artifacts:
//!
//! - a Gherkin feature file ([`feature`])
//! - Cucumber-JS step definitions bound to that feature ([`steps`])
//! - a Playwright page object implementing every method the bindings call
//!   ([`page`]), reusing methods from an existing corpus when one is
//!   configured ([`corpus`], [`similarity`])
//!
//! [`validator`] cross-checks the three and [`pipeline`] drives a full run.

pub mod corpus;
pub mod feature;
pub mod js;
pub mod page;
pub mod parser;
pub mod pipeline;
pub mod similarity;
pub mod steps;
pub mod validator;

pub use corpus::{CorpusIndex, CorpusStats};
pub use feature::{FeatureEmitter, TemplateRegistry};
pub use page::{MethodOrigin, PageEmitter};
pub use parser::{parse, parse_file, parse_str, RequirementDocument};
pub use pipeline::{Compilation, GenerateOptions, Generator};
pub use similarity::{MethodContext, SimilarityEngine};
pub use steps::StepsEmitter;
pub use validator::validate;
