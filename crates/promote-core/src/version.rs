//! Version normalization and comparison helpers
//!
//! Raw version strings read from image configs are turned into strict
//! semantic versions either by cleaning (strict) or coercing (loose).

use crate::error::{Error, Result};
use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;
use std::sync::LazyLock;

/// First run of up to three numeric components not preceded by a digit
static COERCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(\d{1,16})(?:\.(\d{1,16}))?(?:\.(\d{1,16}))?(?:$|[^\d])")
        .expect("coerce regex is valid")
});

/// How a raw version string is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    /// Strict: the string must be a semantic version, optionally `v`/`=` prefixed
    Clean,
    /// Loose: the first version-like substring is extracted
    Coerce,
}

impl NormalizeMode {
    pub fn from_coerce(coerce: bool) -> Self {
        if coerce {
            Self::Coerce
        } else {
            Self::Clean
        }
    }
}

impl fmt::Display for NormalizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Coerce => write!(f, "coerce"),
        }
    }
}

/// Strictly parse a version after trimming whitespace and leading `=`/`v`
///
/// Build metadata is dropped so it never takes part in comparisons.
pub fn clean(raw: &str) -> Option<Version> {
    let trimmed = raw.trim().trim_start_matches(['=', 'v']);
    let mut version = Version::parse(trimmed).ok()?;
    version.build = BuildMetadata::EMPTY;
    Some(version)
}

/// Extract `major[.minor[.patch]]` from anywhere in the string
///
/// Missing components default to zero; prerelease and build are dropped.
pub fn coerce(raw: &str) -> Option<Version> {
    let caps = COERCE_RE.captures(raw)?;
    let component = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    Some(Version {
        major: component(1)?,
        minor: component(2)?,
        patch: component(3)?,
        pre: Prerelease::EMPTY,
        build: BuildMetadata::EMPTY,
    })
}

/// Normalize a raw version string with the given mode
pub fn normalize(raw: &str, mode: NormalizeMode) -> Result<Version> {
    let version = match mode {
        NormalizeMode::Clean => clean(raw),
        NormalizeMode::Coerce => coerce(raw),
    };
    version.ok_or_else(|| Error::invalid_version(raw, mode))
}

/// Whether a version carries a prerelease component
pub fn is_prerelease(version: &Version) -> bool {
    !version.pre.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean("1.2.3"), Some(v("1.2.3")));
        assert_eq!(clean("  v1.2.3  "), Some(v("1.2.3")));
        assert_eq!(clean("=v1.2.3"), Some(v("1.2.3")));
        assert_eq!(clean("2.0.0-beta.1"), Some(v("2.0.0-beta.1")));
        assert_eq!(clean("1.2.3+build.5"), Some(v("1.2.3")));
    }

    #[test]
    fn test_clean_rejects_loose_versions() {
        for raw in ["1.2", "release-1.2.3", "01.2.3", "latest", "", "1.2.3.4"] {
            assert_eq!(clean(raw), None, "{:?} should not clean", raw);
        }
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("1.2.3"), Some(v("1.2.3")));
        assert_eq!(coerce("v2"), Some(v("2.0.0")));
        assert_eq!(coerce("3.1"), Some(v("3.1.0")));
        assert_eq!(coerce("release-1.2.3-rc.1"), Some(v("1.2.3")));
        assert_eq!(coerce("1.2.3.4"), Some(v("1.2.3")));
        assert_eq!(coerce("build 42 (nightly)"), Some(v("42.0.0")));
        assert_eq!(coerce("no digits here"), None);
        assert_eq!(coerce("12345678901234567"), None);
    }

    #[test]
    fn test_normalize_reports_mode() {
        let err = normalize("latest", NormalizeMode::Clean).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not clean `latest` into a valid semver version"
        );

        let err = normalize("latest", NormalizeMode::Coerce).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidVersion {
                mode: NormalizeMode::Coerce,
                ..
            }
        ));
    }

    #[test]
    fn test_ordering_and_prerelease() {
        assert!(v("2.0.0") > v("1.9.0"));
        assert!(v("2.0.0") > v("2.0.0-rc.1"));
        assert!(v("2.0.0-rc.2") > v("2.0.0-rc.1"));
        assert!(v("1.10.0") > v("1.9.9"));
        assert!(is_prerelease(&v("2.0.0-beta")));
        assert!(!is_prerelease(&v("2.0.0")));
    }
}
