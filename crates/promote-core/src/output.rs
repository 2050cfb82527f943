//! CI output reporting
//!
//! Outputs are key/value pairs handed back to the invoking workflow. Under
//! GitHub Actions they are appended to the file named by `GITHUB_OUTPUT`.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Output names
pub const OUTPUT_LATEST_VERSION: &str = "latest-version";
pub const OUTPUT_CANDIDATE_VERSION: &str = "candidate-version";
pub const OUTPUT_UPDATED: &str = "updated";

/// Destination for CI output values
pub trait OutputSink: Send + Sync {
    /// Record one output value
    fn set_output(&self, name: &str, value: &str) -> Result<()>;
}

/// Appends outputs to a GitHub Actions output file
#[derive(Debug, Clone)]
pub struct GithubOutput {
    path: PathBuf,
}

impl GithubOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use the file named by `GITHUB_OUTPUT`, if set
    pub fn from_env() -> Option<Self> {
        std::env::var_os("GITHUB_OUTPUT")
            .filter(|path| !path.is_empty())
            .map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for GithubOutput {
    fn set_output(&self, name: &str, value: &str) -> Result<()> {
        let entry = if value.contains('\n') {
            let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
            format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
        } else {
            format!("{}={}\n", name, value)
        };

        let to_error = |source| Error::Output {
            name: name.to_string(),
            source,
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(to_error)?;
        file.write_all(entry.as_bytes()).map_err(to_error)
    }
}

/// Prints outputs as `name=value` lines for local runs
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutOutput;

impl OutputSink for StdoutOutput {
    fn set_output(&self, name: &str, value: &str) -> Result<()> {
        println!("{}={}", name, value);
        Ok(())
    }
}

/// Keeps outputs in memory, in the order they were set
#[derive(Debug, Default)]
pub struct MemoryOutput {
    entries: Mutex<Vec<(String, String)>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded outputs in order
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Most recent value recorded under a name
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

impl OutputSink for MemoryOutput {
    fn set_output(&self, name: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((name.to_string(), value.to_string()));
        Ok(())
    }
}

/// Format a GitHub Actions `::error::` workflow command
pub fn error_annotation(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{}", escaped)
}
