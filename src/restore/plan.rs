// s3-rewind/src/restore/plan.rs
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

use crate::errors::Result;
use crate::scheduler;
use crate::store::ObjectStore;
use crate::versions::{SelectionPolicy, VersionEntry, VersionHistory};

/// The version chosen for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRestore {
    pub key: String,
    pub version_id: String,
}

/// Every candidate key lands in exactly one of the two lists. Both keep the
/// order in which the keys were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestorePlan {
    pub ready: Vec<PlannedRestore>,
    pub insufficient_keys: Vec<String>,
}

impl RestorePlan {
    pub fn candidate_count(&self) -> usize {
        self.ready.len() + self.insufficient_keys.len()
    }
}

/// Fetches every key's history concurrently and selects a version for it.
///
/// # Arguments
/// * `store` - Object store used for the history reads.
/// * `bucket` - Bucket the keys live in.
/// * `keys` - Candidate keys, typically from `ObjectStore::list_candidate_keys`.
/// * `policy` - How to choose the version for each key.
/// * `max_workers` - Ceiling on concurrent history fetches.
///
/// # Returns
/// The partitioned plan. A failed history fetch or a history entry that
/// cannot be ordered fails the whole plan: nothing has been modified yet.
pub async fn build_restore_plan(
    store: Arc<dyn ObjectStore>,
    bucket: &str,
    keys: Vec<String>,
    policy: SelectionPolicy,
    max_workers: NonZeroUsize,
) -> Result<RestorePlan> {
    let bucket: Arc<str> = Arc::from(bucket);
    let backlog: Vec<(usize, String)> = keys.into_iter().enumerate().collect();

    // The first failed fetch stops further history reads.
    let drained = scheduler::run_bounded_fail_fast(
        backlog,
        max_workers,
        move |(index, key)| {
            let store = Arc::clone(&store);
            let bucket = Arc::clone(&bucket);
            async move {
                let selected: Result<Option<VersionEntry>> = store
                    .list_object_versions(&bucket, &key)
                    .await
                    .map(|entries| policy.select(VersionHistory::new(entries)));
                (index, key, selected)
            }
        },
        |(_, _, selected): &(usize, String, Result<Option<VersionEntry>>)| selected.is_err(),
    )
    .await?;
    let mut selections = drained.results;
    selections.sort_by_key(|(index, _, _)| *index);

    let mut plan = RestorePlan::default();
    for (_, key, selected) in selections {
        match selected? {
            Some(entry) => {
                debug!(key = %key, version_id = %entry.version_id, "selected version");
                plan.ready.push(PlannedRestore {
                    key,
                    version_id: entry.version_id,
                });
            }
            None => {
                debug!(key = %key, "insufficient history");
                plan.insufficient_keys.push(key);
            }
        }
    }
    Ok(plan)
}
