//! Promotion decision and execution for a single repository

use crate::error::{Error, Result};
use crate::output::{
    OutputSink, OUTPUT_CANDIDATE_VERSION, OUTPUT_LATEST_VERSION, OUTPUT_UPDATED,
};
use crate::request::Request;
use crate::version::{is_prerelease, normalize};
use promote_registry::{ImageReference, Registry, Repository};
use semver::Version;
use std::fmt;
use tracing::{debug, info, warn};

/// Result of applying the promotion policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Candidate is a prerelease while latest is not, and prereleases may not promote
    PrereleaseBlocked,
    /// Candidate is not strictly newer than latest
    NotNewer,
    /// Candidate replaces latest
    Promote,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrereleaseBlocked => write!(f, "not promoted (prerelease blocked)"),
            Self::NotNewer => write!(f, "not promoted (not newer)"),
            Self::Promote => write!(f, "promoted"),
        }
    }
}

/// Apply the promotion policy to two normalized versions
///
/// The prerelease rule is checked first, so a blocked prerelease is never
/// promoted regardless of ordering.
pub fn decide(candidate: &Version, latest: &Version, promote_prerelease: bool) -> Decision {
    if !promote_prerelease && is_prerelease(candidate) && !is_prerelease(latest) {
        Decision::PrereleaseBlocked
    } else if candidate <= latest {
        Decision::NotNewer
    } else {
        Decision::Promote
    }
}

/// Per-repository promotion outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionOutcome {
    pub decision: Decision,
    pub candidate: Version,
    pub latest: Version,
}

impl PromotionOutcome {
    /// Whether the latest tag now points at the candidate
    pub fn promoted(&self) -> bool {
        self.decision == Decision::Promote
    }
}

/// Which of the two compared tags a step is working on
#[derive(Debug, Clone, Copy)]
enum TagRole {
    Latest,
    Candidate,
}

impl TagRole {
    fn output_name(self) -> &'static str {
        match self {
            Self::Latest => OUTPUT_LATEST_VERSION,
            Self::Candidate => OUTPUT_CANDIDATE_VERSION,
        }
    }
}

/// Promote one repository's candidate tag over its latest tag if warranted
///
/// `outputs` is only supplied for the designated repository; every value is
/// reported as soon as it is known.
pub async fn promote_repository(
    registry: &dyn Registry,
    request: &Request,
    spec: &str,
    outputs: Option<&dyn OutputSink>,
) -> Result<PromotionOutcome> {
    let repository = Repository::parse(spec).map_err(|source| Error::InvalidRepository {
        spec: spec.to_string(),
        source,
    })?;

    let latest_ref = repository.tag(&request.latest_tag);
    let candidate_ref = repository.tag(&request.candidate_tag);

    let latest = read_tag_version(registry, request, &latest_ref, TagRole::Latest, outputs).await?;
    let candidate =
        read_tag_version(registry, request, &candidate_ref, TagRole::Candidate, outputs).await?;

    let decision = decide(&candidate, &latest, request.options.promote_prerelease);
    match decision {
        Decision::PrereleaseBlocked => {
            warn!(
                "Not promoting {}: {} is a prerelease and {} is not",
                repository, candidate, latest
            );
        }
        Decision::NotNewer => {
            info!(
                "Not promoting {}: {} is not newer than {}",
                repository, candidate, latest
            );
        }
        Decision::Promote => {
            info!(
                "Promoting {} to {} ({} > {})",
                candidate_ref, request.latest_tag, candidate, latest
            );
            registry.copy_manifest(&candidate_ref, &latest_ref).await?;
        }
    }

    if let Some(outputs) = outputs {
        let updated = if decision == Decision::Promote {
            "true"
        } else {
            "false"
        };
        outputs.set_output(OUTPUT_UPDATED, updated)?;
    }

    Ok(PromotionOutcome {
        decision,
        candidate,
        latest,
    })
}

/// Fetch, extract, report, and normalize the version behind one tag
async fn read_tag_version(
    registry: &dyn Registry,
    request: &Request,
    reference: &ImageReference,
    role: TagRole,
    outputs: Option<&dyn OutputSink>,
) -> Result<Version> {
    let config = registry
        .image_config(reference, &request.options.manifest_platform)
        .await?;

    let raw = request
        .version_source
        .read_version(&config)
        .ok_or_else(|| {
            Error::version_not_found(reference.to_string(), request.version_source.to_string())
        })?;

    debug!("{} has version {:?}", reference, raw);

    if let Some(outputs) = outputs {
        outputs.set_output(role.output_name(), &raw)?;
    }

    normalize(&raw, request.options.normalize_mode())
}
