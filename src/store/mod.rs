// s3-rewind/src/store/mod.rs
pub(crate) mod s3; // AWS SDK backed store
#[cfg(test)]
pub(crate) mod memory; // In-memory versioned buckets for tests

use async_trait::async_trait;

use crate::errors::Result;
use crate::target::TargetSpec;
use crate::versions::VersionEntry;

/// The remote object store as seen by the restore pipeline.
///
/// Implementations handle pagination and transport; timeouts and retries
/// are theirs to decide.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Raw versioning status of the bucket (`Some("Enabled")` when on).
    async fn versioning_status(&self, bucket: &str) -> Result<Option<String>>;

    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Creates `bucket`. `region` of `None` means the store's default.
    async fn create_bucket(&self, bucket: &str, region: Option<&str>) -> Result<()>;

    /// Concrete keys addressed by the target.
    async fn list_candidate_keys(&self, target: &TargetSpec) -> Result<Vec<String>>;

    /// Full version and delete-marker history of one key, in no particular order.
    async fn list_object_versions(&self, bucket: &str, key: &str) -> Result<Vec<VersionEntry>>;

    /// Copies `key@version_id` from `source_bucket` over `key` in `destination_bucket`.
    async fn copy_version(
        &self,
        source_bucket: &str,
        key: &str,
        version_id: &str,
        destination_bucket: &str,
    ) -> Result<()>;
}
