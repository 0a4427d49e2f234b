// s3-rewind/src/store/memory.rs
//! In-memory versioned buckets with fault and latency injection.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{Duration, sleep};

use super::ObjectStore;
use crate::errors::{RestoreError, Result};
use crate::target::{TargetMode, TargetSpec};
use crate::versions::VersionEntry;

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: String,
    last_modified: DateTime<Utc>,
    body: Option<String>,
}

#[derive(Debug, Default)]
struct Bucket {
    versioning: Option<String>,
    objects: BTreeMap<String, Vec<StoredVersion>>,
}

#[derive(Debug, Default)]
struct State {
    buckets: HashMap<String, Bucket>,
    tick: i64,
    next_version: u64,
    failing_copies: HashSet<String>,
    corrupt_histories: HashSet<String>,
    copy_calls: Vec<(String, String)>,
    copy_delays: HashMap<String, Duration>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
    copies_in_flight: AtomicUsize,
    max_copies_in_flight: AtomicUsize,
    history_fetches: AtomicUsize,
}

fn clock_origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 19, 0, 0, 0).unwrap()
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn create_versioned_bucket(&self, bucket: &str) {
        self.state().buckets.insert(
            bucket.to_string(),
            Bucket {
                versioning: Some("Enabled".to_string()),
                ..Bucket::default()
            },
        );
    }

    pub(crate) fn create_unversioned_bucket(&self, bucket: &str) {
        self.state().buckets.insert(bucket.to_string(), Bucket::default());
    }

    /// Writes a new version one simulated second after the previous write.
    pub(crate) fn put(&self, bucket: &str, key: &str, body: &str) -> String {
        let mut state = self.state();
        state.tick += 1;
        let at = clock_origin() + ChronoDuration::seconds(state.tick);
        Self::append(&mut state, bucket, key, Some(body.to_string()), at)
    }

    /// Writes a new version with an explicit timestamp.
    pub(crate) fn put_at(&self, bucket: &str, key: &str, body: &str, at: DateTime<Utc>) -> String {
        let mut state = self.state();
        Self::append(&mut state, bucket, key, Some(body.to_string()), at)
    }

    /// Places a delete marker on top of the key.
    pub(crate) fn delete(&self, bucket: &str, key: &str) -> String {
        let mut state = self.state();
        state.tick += 1;
        let at = clock_origin() + ChronoDuration::seconds(state.tick);
        Self::append(&mut state, bucket, key, None, at)
    }

    fn append(
        state: &mut State,
        bucket: &str,
        key: &str,
        body: Option<String>,
        at: DateTime<Utc>,
    ) -> String {
        state.next_version += 1;
        let version_id = format!("ver-{:04}", state.next_version);
        state
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .objects
            .entry(key.to_string())
            .or_default()
            .push(StoredVersion {
                version_id: version_id.clone(),
                last_modified: at,
                body,
            });
        version_id
    }

    pub(crate) fn fail_copies_for(&self, key: &str) {
        self.state().failing_copies.insert(key.to_string());
    }

    pub(crate) fn corrupt_history_for(&self, key: &str) {
        self.state().corrupt_histories.insert(key.to_string());
    }

    pub(crate) fn delay_copies_for(&self, key: &str, delay: Duration) {
        self.state().copy_delays.insert(key.to_string(), delay);
    }

    /// Body of the newest version, or `None` when missing or deleted.
    pub(crate) fn current_body(&self, bucket: &str, key: &str) -> Option<String> {
        let state = self.state();
        state
            .buckets
            .get(bucket)?
            .objects
            .get(key)?
            .last()
            .and_then(|v| v.body.clone())
    }

    pub(crate) fn has_bucket(&self, bucket: &str) -> bool {
        self.state().buckets.contains_key(bucket)
    }

    /// `(key, version_id)` of every copy attempted, in start order.
    pub(crate) fn copy_calls(&self) -> Vec<(String, String)> {
        self.state().copy_calls.clone()
    }

    pub(crate) fn max_copies_in_flight(&self) -> usize {
        self.max_copies_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn history_fetches(&self) -> usize {
        self.history_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn versioning_status(&self, bucket: &str) -> Result<Option<String>> {
        let state = self.state();
        let found = state
            .buckets
            .get(bucket)
            .ok_or_else(|| RestoreError::S3Sdk(format!("NoSuchBucket: {}", bucket)))?;
        Ok(found.versioning.clone())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.has_bucket(bucket))
    }

    async fn create_bucket(&self, bucket: &str, _region: Option<&str>) -> Result<()> {
        self.create_versioned_bucket(bucket);
        Ok(())
    }

    async fn list_candidate_keys(&self, target: &TargetSpec) -> Result<Vec<String>> {
        if target.mode == TargetMode::Exact {
            return Ok(target.key.iter().cloned().collect());
        }
        let state = self.state();
        let Some(bucket) = state.buckets.get(&target.bucket) else {
            return Err(RestoreError::S3Sdk(format!("NoSuchBucket: {}", target.bucket)));
        };
        Ok(bucket
            .objects
            .iter()
            .filter(|(key, versions)| {
                key.starts_with(target.listing_prefix())
                    && versions.last().is_some_and(|v| v.body.is_some())
            })
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn list_object_versions(&self, bucket: &str, key: &str) -> Result<Vec<VersionEntry>> {
        self.history_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        let versions = state
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .cloned()
            .unwrap_or_default();
        let corrupt = state.corrupt_histories.contains(key);
        drop(state);

        let newest = versions.len().saturating_sub(1);
        // Delivered newest-last, the reverse of canonical order.
        versions
            .iter()
            .enumerate()
            .map(|(idx, v)| {
                let last_modified = if corrupt && idx == 0 { None } else { Some(v.last_modified) };
                VersionEntry::from_listing(
                    key,
                    &v.version_id,
                    last_modified,
                    v.body.is_none(),
                    idx == newest,
                )
            })
            .collect()
    }

    async fn copy_version(
        &self,
        source_bucket: &str,
        key: &str,
        version_id: &str,
        destination_bucket: &str,
    ) -> Result<()> {
        let now = self.copies_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_copies_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = {
            let mut state = self.state();
            state.copy_calls.push((key.to_string(), version_id.to_string()));
            state.copy_delays.get(key).copied()
        };
        sleep(delay.unwrap_or(Duration::from_millis(1))).await;

        let outcome = self.finish_copy(source_bucket, key, version_id, destination_bucket);
        self.copies_in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

impl MemoryStore {
    fn finish_copy(
        &self,
        source_bucket: &str,
        key: &str,
        version_id: &str,
        destination_bucket: &str,
    ) -> Result<()> {
        let mut state = self.state();
        if state.failing_copies.contains(key) {
            return Err(RestoreError::S3Sdk(format!("AccessDenied: copy of '{}' refused", key)));
        }
        let source = state
            .buckets
            .get(source_bucket)
            .and_then(|b| b.objects.get(key))
            .and_then(|versions| versions.iter().find(|v| v.version_id == version_id))
            .cloned()
            .ok_or_else(|| RestoreError::S3Sdk(format!("NoSuchVersion: {}@{}", key, version_id)))?;
        let Some(body) = source.body else {
            return Err(RestoreError::S3Sdk(format!(
                "InvalidRequest: '{}@{}' is a delete marker",
                key, version_id
            )));
        };
        if !state.buckets.contains_key(destination_bucket) {
            return Err(RestoreError::S3Sdk(format!("NoSuchBucket: {}", destination_bucket)));
        }
        state.tick += 1;
        let at = clock_origin() + ChronoDuration::seconds(state.tick);
        Self::append(&mut state, destination_bucket, key, Some(body), at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_makes_old_version_current() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.create_versioned_bucket("b");
        let old = store.put("b", "k", "old");
        store.put("b", "k", "new");

        store.copy_version("b", "k", &old, "b").await?;

        assert_eq!(store.current_body("b", "k").as_deref(), Some("old"));
        assert_eq!(store.list_object_versions("b", "k").await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_keys_are_not_listed() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.create_versioned_bucket("b");
        store.put("b", "docs/a", "1");
        store.put("b", "docs/b", "1");
        store.delete("b", "docs/b");
        store.put("b", "other", "1");

        let keys = store.list_candidate_keys(&TargetSpec::prefix("b", "docs/")).await?;
        assert_eq!(keys, vec!["docs/a".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_copying_a_delete_marker_fails() {
        let store = MemoryStore::new();
        store.create_versioned_bucket("b");
        store.put("b", "k", "1");
        let marker = store.delete("b", "k");
        assert!(store.copy_version("b", "k", &marker, "b").await.is_err());
    }
}
