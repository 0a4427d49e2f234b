// s3-rewind/src/restore/report.rs
use serde::Serialize;
use std::fmt;
use std::ops::AddAssign;

/// Per-run counters. Each phase returns its own partial report and the
/// orchestration sums them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub restored: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.restored + self.skipped + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// One-line JSON summary printed in `--json` mode.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl AddAssign for RunReport {
    fn add_assign(&mut self, other: RunReport) {
        self.restored += other.restored;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Restored={}, Skipped={}, Failed={}",
            self.restored, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_reports_sum() {
        let mut report = RunReport {
            skipped: 2,
            ..RunReport::default()
        };
        report += RunReport {
            restored: 5,
            skipped: 1,
            failed: 1,
        };
        assert_eq!(report, RunReport { restored: 5, skipped: 3, failed: 1 });
        assert_eq!(report.total(), 9);
        assert!(report.has_failures());
        assert_eq!(report.to_string(), "Restored=5, Skipped=3, Failed=1");
    }

    #[test]
    fn test_json_summary_carries_every_counter() -> anyhow::Result<()> {
        let report = RunReport { restored: 2, skipped: 1, failed: 1 };
        let summary: serde_json::Value = serde_json::from_str(&report.to_json()?)?;
        assert_eq!(
            summary,
            serde_json::json!({ "restored": 2, "skipped": 1, "failed": 1 })
        );
        Ok(())
    }
}
