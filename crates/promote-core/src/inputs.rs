//! Invocation inputs as supplied by the CI environment
//!
//! Inputs arrive as raw strings. This module owns the conversion rules for
//! boolean-like tokens and multi-line lists.

use crate::error::{Error, Result};

/// Input names as exposed to the invoking environment
pub const INPUT_REPOSITORY: &str = "repository";
pub const INPUT_CANDIDATE_TAG: &str = "candidate-tag";
pub const INPUT_LATEST_TAG: &str = "latest-tag";
pub const INPUT_VERSION_SOURCE: &str = "version-source";
pub const INPUT_PROMOTE_PRERELEASE: &str = "promote-prerelease";
pub const INPUT_COERCE_SEMVER: &str = "coerce-semver";
pub const INPUT_MANIFEST_PLATFORM: &str = "manifest-platform";

const TRUE_TOKENS: [&str; 6] = ["true", "enable", "enabled", "yes", "on", "1"];
const FALSE_TOKENS: [&str; 6] = ["false", "disable", "disabled", "no", "off", "0"];

/// Raw, unvalidated input values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    pub repository: String,
    pub candidate_tag: String,
    pub latest_tag: String,
    pub version_source: String,
    pub promote_prerelease: String,
    pub coerce_semver: String,
    pub manifest_platform: String,
}

/// Parse a boolean-like token (case-sensitive)
pub fn parse_bool_input(field: &str, raw: &str) -> Result<bool> {
    let token = raw.trim();
    if TRUE_TOKENS.contains(&token) {
        Ok(true)
    } else if FALSE_TOKENS.contains(&token) {
        Ok(false)
    } else {
        Err(Error::invalid_boolean(field, raw))
    }
}

/// Split a multi-line input into entries
///
/// Trailing `#` comments are stripped, entries are trimmed, and empty
/// entries are dropped. Order is preserved.
pub fn parse_multiline_input(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| line.split_once('#').map_or(line, |(value, _)| value).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fetch a required single-line input, trimmed
pub fn required_input<'a>(field: &str, raw: &'a str) -> Result<&'a str> {
    let value = raw.trim();
    if value.is_empty() {
        Err(Error::missing_input(field))
    } else {
        Ok(value)
    }
}
