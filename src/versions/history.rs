// s3-rewind/src/versions/history.rs
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::errors::{RestoreError, Result};

/// One historical state of a key: an object version or a delete marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub version_id: String,
    pub last_modified: DateTime<Utc>,
    pub is_delete_marker: bool,
    pub is_latest: bool,
}

impl VersionEntry {
    /// Builds an entry from raw listing fields.
    ///
    /// A listing item without a timestamp cannot be ordered against its
    /// siblings, so it is rejected instead of being guessed into place.
    pub fn from_listing(
        key: &str,
        version_id: &str,
        last_modified: Option<DateTime<Utc>>,
        is_delete_marker: bool,
        is_latest: bool,
    ) -> Result<Self> {
        let last_modified = last_modified.ok_or_else(|| RestoreError::MalformedHistory {
            key: key.to_string(),
            detail: format!("version '{}' has no valid LastModified timestamp", version_id),
        })?;
        Ok(VersionEntry {
            version_id: version_id.to_string(),
            last_modified,
            is_delete_marker,
            is_latest,
        })
    }
}

/// Newest first; on equal timestamps the `is_latest` entry wins.
pub fn canonical_order(a: &VersionEntry, b: &VersionEntry) -> Ordering {
    (b.last_modified, b.is_latest).cmp(&(a.last_modified, a.is_latest))
}

/// A key's version history held in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionHistory {
    entries: Vec<VersionEntry>,
}

impl VersionHistory {
    /// Sorts the listing as delivered by the store into canonical order.
    pub fn new(mut entries: Vec<VersionEntry>) -> Self {
        entries.sort_by(canonical_order);
        VersionHistory { entries }
    }

    /// Removes delete markers from the sequence when asked to.
    ///
    /// Filtering happens before selection, so it shifts which entry sits at
    /// a given depth.
    pub fn filtered(self, ignore_delete_markers: bool) -> Self {
        if !ignore_delete_markers {
            return self;
        }
        VersionHistory {
            entries: self
                .entries
                .into_iter()
                .filter(|entry| !entry.is_delete_marker)
                .collect(),
        }
    }

    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }
}
