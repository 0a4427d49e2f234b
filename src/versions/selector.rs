// s3-rewind/src/versions/selector.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use super::history::{VersionEntry, VersionHistory};
use crate::errors::{RestoreError, Result};

/// Which historical entry to pick. Exactly one mode is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Zero-based distance from the current head (0 = head, 1 = previous).
    ByDepth { steps_back: usize },
    /// Newest entry at or before the instant.
    AsOf { timestamp: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub mode: SelectionMode,
    pub ignore_delete_markers: bool,
}

impl SelectionPolicy {
    pub fn by_depth(steps_back: usize, ignore_delete_markers: bool) -> Self {
        SelectionPolicy {
            mode: SelectionMode::ByDepth { steps_back },
            ignore_delete_markers,
        }
    }

    pub fn as_of(timestamp: DateTime<Utc>, ignore_delete_markers: bool) -> Self {
        SelectionPolicy {
            mode: SelectionMode::AsOf { timestamp },
            ignore_delete_markers,
        }
    }

    /// Filters the history and applies the active mode.
    ///
    /// Returns `None` when the key does not have enough history.
    pub fn select(&self, history: VersionHistory) -> Option<VersionEntry> {
        let history = history.filtered(self.ignore_delete_markers);
        let selected = match self.mode {
            SelectionMode::ByDepth { steps_back } => select_by_depth(history.entries(), steps_back),
            SelectionMode::AsOf { timestamp } => select_as_of(history.entries(), timestamp),
        };
        selected.cloned()
    }

    /// Operator-facing description of the policy.
    pub fn describe(&self) -> String {
        let marker_mode = if self.ignore_delete_markers {
            "excluding delete markers"
        } else {
            "including delete markers"
        };
        match self.mode {
            SelectionMode::AsOf { timestamp } => format!(
                "as-of timestamp {} ({})",
                timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false),
                marker_mode
            ),
            SelectionMode::ByDepth { steps_back } => {
                format!("{} step(s) back from head ({})", steps_back, marker_mode)
            }
        }
    }
}

/// Entry at index `steps_back` of a canonically ordered sequence.
pub fn select_by_depth(entries: &[VersionEntry], steps_back: usize) -> Option<&VersionEntry> {
    entries.get(steps_back)
}

/// First entry, in canonical order, whose timestamp is not after `as_of`.
pub fn select_as_of(entries: &[VersionEntry], as_of: DateTime<Utc>) -> Option<&VersionEntry> {
    entries.iter().find(|entry| entry.last_modified <= as_of)
}

/// Parses an ISO-8601 instant. Values without an offset are taken as UTC.
pub fn parse_as_of_timestamp(raw_value: &str) -> Result<DateTime<Utc>> {
    let value = raw_value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(RestoreError::InvalidTimestamp(raw_value.to_string()))
}
