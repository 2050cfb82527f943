//! # promote-core
//!
//! Core library for promote providing:
//! - Version sources (image label or environment entry)
//! - Version normalization (strict clean or loose coerce)
//! - Input parsing and the immutable promotion [`Request`]
//! - The per-repository promotion policy and its execution
//! - Concurrent orchestration across repositories with failure aggregation
//! - CI output sinks

pub mod error;
pub mod inputs;
pub mod orchestrator;
pub mod output;
pub mod promotion;
pub mod request;
pub mod version;
pub mod version_source;

pub use error::{Error, Result};
pub use inputs::Inputs;
pub use orchestrator::{run, RunSummary};
pub use output::{error_annotation, GithubOutput, MemoryOutput, OutputSink, StdoutOutput};
pub use promotion::{decide, promote_repository, Decision, PromotionOutcome};
pub use request::{PromotionOptions, Request};
pub use version::NormalizeMode;
pub use version_source::VersionSource;
