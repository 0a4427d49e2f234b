// s3-rewind/src/target/mod.rs
use url::Url;

use crate::errors::{RestoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    Exact,
    Prefix,
    BucketAll,
}

/// Which keys of which bucket a run addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub bucket: String,
    pub mode: TargetMode,
    pub key: Option<String>,
    pub prefix: Option<String>,
}

impl TargetSpec {
    pub fn exact(bucket: &str, key: &str) -> Self {
        TargetSpec {
            bucket: bucket.to_string(),
            mode: TargetMode::Exact,
            key: Some(key.to_string()),
            prefix: None,
        }
    }

    pub fn prefix(bucket: &str, prefix: &str) -> Self {
        TargetSpec {
            bucket: bucket.to_string(),
            mode: TargetMode::Prefix,
            key: None,
            prefix: Some(prefix.to_string()),
        }
    }

    pub fn bucket_all(bucket: &str) -> Self {
        TargetSpec {
            bucket: bucket.to_string(),
            mode: TargetMode::BucketAll,
            key: None,
            prefix: Some(String::new()),
        }
    }

    /// Listing prefix for PREFIX and BUCKET_ALL targets.
    pub fn listing_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }
}

/// Parses `s3://bucket[/path]` into a target.
///
/// `*` is only accepted as the whole path or as a trailing `/*`.
pub fn parse_s3_url(raw_url: &str) -> Result<TargetSpec> {
    let invalid = |reason: &str| RestoreError::InvalidTarget {
        url: raw_url.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw_url.trim();
    let parsed = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if parsed.scheme() != "s3" {
        return Err(invalid("scheme must be 's3://'"));
    }

    let bucket = parsed.host_str().map(str::trim).unwrap_or_default();
    if bucket.is_empty() {
        return Err(invalid("bucket is required"));
    }

    // Url percent-encodes the path, so the key comes from the raw text, minus
    // any query or fragment.
    let remainder = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    let raw_path = remainder
        .find(['/', '?', '#'])
        .map(|start| &remainder[start..])
        .unwrap_or_default();
    let path = raw_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('/');
    if path.is_empty() || path == "*" {
        return Ok(TargetSpec::bucket_all(bucket));
    }
    if let Some(prefix) = path.strip_suffix('*') {
        if prefix.ends_with('/') && !prefix.contains('*') {
            return Ok(TargetSpec::prefix(bucket, prefix));
        }
    }
    if path.contains('*') {
        return Err(invalid("'*' is only supported as a trailing wildcard"));
    }

    Ok(TargetSpec::exact(bucket, path))
}
