//! The resolved set of promotion parameters for one invocation

use crate::error::{Error, Result};
use crate::inputs::{
    parse_bool_input, parse_multiline_input, required_input, Inputs, INPUT_CANDIDATE_TAG,
    INPUT_COERCE_SEMVER, INPUT_LATEST_TAG, INPUT_MANIFEST_PLATFORM, INPUT_PROMOTE_PRERELEASE,
    INPUT_REPOSITORY, INPUT_VERSION_SOURCE,
};
use crate::version::NormalizeMode;
use crate::version_source::VersionSource;
use promote_registry::Platform;
use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").expect("tag regex is valid")
});

/// Behavioral flags shared by every repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionOptions {
    /// Allow a prerelease candidate to replace a non-prerelease latest
    pub promote_prerelease: bool,
    /// Coerce loose version strings instead of cleaning strictly
    pub coerce_semver: bool,
    /// Platform used to pick a child manifest from an index
    pub manifest_platform: Platform,
}

impl PromotionOptions {
    pub fn normalize_mode(&self) -> NormalizeMode {
        NormalizeMode::from_coerce(self.coerce_semver)
    }
}

/// Immutable promotion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Repository specs; the first one is designated for output reporting
    pub repositories: Vec<String>,
    pub candidate_tag: String,
    pub latest_tag: String,
    pub version_source: VersionSource,
    pub options: PromotionOptions,
}

impl Request {
    /// Validate raw inputs into a request
    pub fn from_inputs(inputs: &Inputs) -> Result<Self> {
        let repositories = parse_multiline_input(&inputs.repository);
        if repositories.is_empty() {
            return Err(Error::missing_input(INPUT_REPOSITORY));
        }

        let candidate_tag = parse_tag(INPUT_CANDIDATE_TAG, &inputs.candidate_tag)?;
        let latest_tag = parse_tag(INPUT_LATEST_TAG, &inputs.latest_tag)?;
        if candidate_tag == latest_tag {
            return Err(Error::invalid_input(
                INPUT_LATEST_TAG,
                latest_tag,
                "must differ from candidate-tag",
            ));
        }

        let version_source: VersionSource =
            required_input(INPUT_VERSION_SOURCE, &inputs.version_source)?.parse()?;

        let promote_prerelease = parse_bool_input(
            INPUT_PROMOTE_PRERELEASE,
            required_input(INPUT_PROMOTE_PRERELEASE, &inputs.promote_prerelease)?,
        )?;
        let coerce_semver = parse_bool_input(
            INPUT_COERCE_SEMVER,
            required_input(INPUT_COERCE_SEMVER, &inputs.coerce_semver)?,
        )?;
        let manifest_platform = Platform::parse(required_input(
            INPUT_MANIFEST_PLATFORM,
            &inputs.manifest_platform,
        )?)
        .map_err(Error::InvalidPlatform)?;

        Ok(Self {
            repositories,
            candidate_tag,
            latest_tag,
            version_source,
            options: PromotionOptions {
                promote_prerelease,
                coerce_semver,
                manifest_platform,
            },
        })
    }
}

/// Tags are literal names, never digests
fn parse_tag(field: &str, raw: &str) -> Result<String> {
    let tag = required_input(field, raw)?;
    if TAG_RE.is_match(tag) {
        Ok(tag.to_string())
    } else {
        Err(Error::invalid_input(field, tag, "not a valid tag name"))
    }
}
