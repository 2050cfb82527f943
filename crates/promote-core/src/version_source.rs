//! Where a version string lives inside an image configuration document

use crate::error::{Error, Result};
use promote_registry::ImageConfig;
use std::fmt;
use std::str::FromStr;

/// Location of the version string within an image config
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// Value of an image label
    Label(String),
    /// Value of a `NAME=value` environment entry
    EnvVar(String),
}

impl VersionSource {
    /// Extract the raw version string from an image config
    pub fn read_version(&self, config: &ImageConfig) -> Option<String> {
        match self {
            Self::Label(name) => config.labels()?.get(name).cloned(),
            Self::EnvVar(name) => {
                let prefix = format!("{}=", name);
                config
                    .env()?
                    .iter()
                    .find_map(|entry| entry.strip_prefix(&prefix))
                    .map(str::to_string)
            }
        }
    }
}

impl FromStr for VersionSource {
    type Err = Error;

    /// Parse `label:<name>` or `env:<name>`
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some(("label", name)) if !name.is_empty() => Ok(Self::Label(name.to_string())),
            Some(("env", name)) if !name.is_empty() => Ok(Self::EnvVar(name.to_string())),
            _ => Err(Error::invalid_version_source(s)),
        }
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(name) => write!(f, "{} label", name),
            Self::EnvVar(name) => write!(f, "{} env var", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promote_registry::ContainerConfig;
    use std::collections::HashMap;

    fn config(labels: Option<&[(&str, &str)]>, env: Option<&[&str]>) -> ImageConfig {
        ImageConfig {
            config: Some(ContainerConfig {
                labels: labels.map(|l| {
                    l.iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<HashMap<_, _>>()
                }),
                env: env.map(|e| e.iter().map(|s| s.to_string()).collect()),
            }),
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "label:org.opencontainers.image.version".parse::<VersionSource>().unwrap(),
            VersionSource::Label("org.opencontainers.image.version".to_string())
        );
        assert_eq!(
            "env:APP_VERSION".parse::<VersionSource>().unwrap(),
            VersionSource::EnvVar("APP_VERSION".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        for input in ["annotation:version", "label", "version", "", "env:", "Label:x"] {
            let err = input.parse::<VersionSource>().unwrap_err();
            assert!(
                err.to_string().contains(&format!("`{}`", input)),
                "error should name the input: {}",
                err
            );
        }
    }

    #[test]
    fn test_label_lookup() {
        let source = VersionSource::Label("version".to_string());
        assert_eq!(
            source.read_version(&config(Some(&[("version", "1.2.3")]), None)),
            Some("1.2.3".to_string())
        );
        assert_eq!(
            source.read_version(&config(Some(&[("other", "1.2.3")]), None)),
            None
        );
        assert_eq!(source.read_version(&config(None, None)), None);
        assert_eq!(source.read_version(&ImageConfig::default()), None);
    }

    #[test]
    fn test_env_lookup_first_match() {
        let source = VersionSource::EnvVar("BAR".to_string());
        let cfg = config(
            None,
            Some(&["BARN=0.0.1", "PATH=/bin", "BAR=1.0.0=x", "BAR=2.0.0"]),
        );
        assert_eq!(source.read_version(&cfg), Some("1.0.0=x".to_string()));
        assert_eq!(
            source.read_version(&config(None, Some(&["FOO=1"]))),
            None
        );
        assert_eq!(source.read_version(&config(None, None)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            VersionSource::Label("version".to_string()).to_string(),
            "version label"
        );
        assert_eq!(
            VersionSource::EnvVar("APP_VERSION".to_string()).to_string(),
            "APP_VERSION env var"
        );
    }
}
