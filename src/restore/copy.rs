// s3-rewind/src/restore/copy.rs
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{info, warn};

use super::plan::{PlannedRestore, RestorePlan};
use super::report::RunReport;
use crate::errors::Result;
use crate::scheduler;
use crate::store::ObjectStore;

/// Result of one copy attempt. Failures are data, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub key: String,
    pub version_id: String,
    pub error: Option<String>,
}

impl CopyOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Copies every planned version over its key in `destination_bucket`.
///
/// After the first failed copy no new copy is started. Copies already in
/// flight finish and are counted individually; the planned restores that
/// were never started are counted as skipped.
pub async fn execute_copy_plan(
    store: Arc<dyn ObjectStore>,
    source_bucket: &str,
    destination_bucket: &str,
    plan: &RestorePlan,
    max_workers: NonZeroUsize,
) -> Result<RunReport> {
    let source: Arc<str> = Arc::from(source_bucket);
    let destination: Arc<str> = Arc::from(destination_bucket);

    let drained = scheduler::run_bounded_fail_fast(
        plan.ready.clone(),
        max_workers,
        move |planned: PlannedRestore| {
            let store = Arc::clone(&store);
            let source = Arc::clone(&source);
            let destination = Arc::clone(&destination);
            async move {
                let error = store
                    .copy_version(&source, &planned.key, &planned.version_id, &destination)
                    .await
                    .err()
                    .map(|e| e.to_string());
                CopyOutcome {
                    key: planned.key,
                    version_id: planned.version_id,
                    error,
                }
            }
        },
        |outcome: &CopyOutcome| !outcome.succeeded(),
    )
    .await?;

    let mut report = RunReport::default();
    for outcome in &drained.results {
        match &outcome.error {
            None => {
                report.restored += 1;
                info!(key = %outcome.key, version_id = %outcome.version_id, "restored");
            }
            Some(message) => {
                report.failed += 1;
                warn!(key = %outcome.key, error = %message, "failed to restore");
            }
        }
    }

    report.skipped = plan.ready.len() - drained.dequeued;
    if report.skipped > 0 {
        warn!(
            skipped = report.skipped,
            "stopped starting new restores after a failure"
        );
    }
    Ok(report)
}
