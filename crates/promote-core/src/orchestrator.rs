//! Fan-out of promotions across every configured repository

use crate::error::{Error, Result};
use crate::output::OutputSink;
use crate::promotion::{promote_repository, PromotionOutcome};
use crate::request::Request;
use futures::future::join_all;
use promote_registry::Registry;
use tracing::{error, info, info_span, Instrument};

/// Outcome for every repository of a fully successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// (repository spec, outcome) in configured order
    pub outcomes: Vec<(String, PromotionOutcome)>,
}

impl RunSummary {
    /// Number of repositories whose latest tag was moved
    pub fn promoted_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.promoted()).count()
    }
}

/// Promote every repository in the request concurrently
///
/// All repositories are attempted regardless of sibling failures. A single
/// failure is returned unchanged; several failures are logged one by one and
/// replaced by an aggregate error.
pub async fn run(
    registry: &dyn Registry,
    request: &Request,
    outputs: &dyn OutputSink,
) -> Result<RunSummary> {
    let total = request.repositories.len();
    info!(
        "Promoting {} to {} in {} repositories",
        request.candidate_tag, request.latest_tag, total
    );

    let futures: Vec<_> = request
        .repositories
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let designated = (index == 0).then_some(outputs);
            promote_repository(registry, request, spec, designated)
                .instrument(info_span!("promote", repository = %spec))
        })
        .collect();

    let results = join_all(futures).await;

    let mut outcomes = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (spec, result) in request.repositories.iter().zip(results) {
        match result {
            Ok(outcome) => {
                info!("{}: {}", spec, outcome.decision);
                outcomes.push((spec.clone(), outcome));
            }
            Err(e) => failures.push((spec, e)),
        }
    }

    match failures.len() {
        0 => {
            let summary = RunSummary { outcomes };
            info!(
                "Promoted {}/{} repositories",
                summary.promoted_count(),
                total
            );
            Ok(summary)
        }
        1 => {
            let (_, e) = failures.remove(0);
            Err(e)
        }
        failed => {
            for (spec, e) in &failures {
                error!("Failed to update {}: {}", spec, e);
            }
            Err(Error::Aggregate { failed, total })
        }
    }
}
