//! Secondary destinations for weekly reports.

use std::path::PathBuf;

use async_trait::async_trait;
use cadence_core::WeeklyReport;
use tracing::debug;

/// Archive errors.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Somewhere reports are mirrored after being persisted. Callers treat a
/// failure as non-fatal.
#[async_trait]
pub trait ReportArchive: Send + Sync {
    /// Mirror one report.
    async fn archive(&self, report: &WeeklyReport) -> Result<(), ArchiveError>;
}

/// Archive that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopArchive;

#[async_trait]
impl ReportArchive for NoopArchive {
    async fn archive(&self, _report: &WeeklyReport) -> Result<(), ArchiveError> {
        Ok(())
    }
}

/// One pretty-printed JSON file per report.
#[derive(Debug, Clone)]
pub struct JsonArchive {
    dir: PathBuf,
}

impl JsonArchive {
    /// Archive into `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, report: &WeeklyReport) -> PathBuf {
        self.dir.join(format!(
            "report-{}-{}.json",
            report.week_end.format("%Y-%m-%d"),
            report.id
        ))
    }
}

#[async_trait]
impl ReportArchive for JsonArchive {
    async fn archive(&self, report: &WeeklyReport) -> Result<(), ArchiveError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(report);
        let json = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&path, json).await?;
        debug!("Archived report {} to {:?}", report.id, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{ReportId, Trend};

    fn sample() -> WeeklyReport {
        let now = chrono::Utc::now();
        WeeklyReport {
            id: ReportId::new(),
            week_start: now - chrono::Duration::days(7),
            week_end: now,
            total_posts: 4,
            avg_score: 42.5,
            last_week_avg: 40.0,
            best_type: None,
            worst_type: None,
            platform_breakdown: Default::default(),
            trend: Trend::Stable,
            generated_at: now,
        }
    }

    #[tokio::test]
    async fn test_json_archive_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let archive = JsonArchive::new(dir.path().join("reports"));
        let report = sample();

        archive.archive(&report).await.unwrap();

        let mut entries = std::fs::read_dir(dir.path().join("reports")).unwrap();
        let entry = entries.next().unwrap().unwrap();
        let bytes = std::fs::read(entry.path()).unwrap();
        let loaded: WeeklyReport = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(loaded, report);
        assert!(entries.next().is_none());
    }
}
