//! Run counters and the persisted run report.

use crate::error::IndexError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Result of indexing one scanned file.
#[derive(Debug)]
pub enum DocumentOutcome {
    Indexed { id: String },
    Skipped { size: u64 },
    Failed { error: String },
}

/// Counters owned by the pipeline driver for the duration of one run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub processed: u64,
    pub skipped: u64,
    pub errors: u64,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::start()
    }
}

impl RunStats {
    pub fn start() -> Self {
        Self {
            processed: 0,
            skipped: 0,
            errors: 0,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn record(&mut self, outcome: &DocumentOutcome) {
        match outcome {
            DocumentOutcome::Indexed { .. } => self.processed += 1,
            DocumentOutcome::Skipped { .. } => self.skipped += 1,
            DocumentOutcome::Failed { .. } => self.errors += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.processed + self.skipped + self.errors
    }

    pub fn finish(self) -> RunReport {
        let elapsed = self.started.elapsed();
        self.finish_with(elapsed)
    }

    pub fn finish_with(self, elapsed: Duration) -> RunReport {
        RunReport {
            run_id: Uuid::new_v4(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            processed: self.processed,
            skipped: self.skipped,
            errors: self.errors,
            duration_ms: elapsed,
            duration_human: format_duration(elapsed),
            documents_per_second: throughput(self.processed, elapsed),
        }
    }
}

/// Documents per second, rounded to two decimals. Zero when no time elapsed.
pub fn throughput(processed: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        return 0.0;
    }
    ((processed as f64 / seconds) * 100.0).round() / 100.0
}

pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}m {}s", total / 60, total % 60)
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub processed: u64,
    pub skipped: u64,
    pub errors: u64,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub duration_ms: Duration,
    pub duration_human: String,
    pub documents_per_second: f64,
}

impl RunReport {
    pub async fn persist(&self, path: &Path) -> Result<(), IndexError> {
        let body = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, body).await?;
        Ok(())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Indexing summary")?;
        writeln!(f, "  processed:  {}", self.processed)?;
        writeln!(f, "  skipped:    {}", self.skipped)?;
        writeln!(f, "  errors:     {}", self.errors)?;
        writeln!(f, "  duration:   {}", self.duration_human)?;
        write!(f, "  throughput: {} docs/s", self.documents_per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn throughput_divides_by_elapsed_seconds() {
        assert_eq!(throughput(100, Duration::from_secs(10)), 10.0);
        assert_eq!(throughput(1, Duration::from_secs(3)), 0.33);
    }

    #[test]
    fn zero_elapsed_reports_zero_throughput() {
        assert_eq!(throughput(100, Duration::ZERO), 0.0);
        assert_eq!(throughput(0, Duration::ZERO), 0.0);
    }

    #[test]
    fn each_outcome_increments_one_counter() {
        let mut stats = RunStats::start();
        stats.record(&DocumentOutcome::Indexed { id: "a".to_string() });
        stats.record(&DocumentOutcome::Indexed { id: "b".to_string() });
        stats.record(&DocumentOutcome::Skipped { size: 1 });
        stats.record(&DocumentOutcome::Failed {
            error: "boom".to_string(),
        });

        assert_eq!((stats.processed, stats.skipped, stats.errors), (2, 1, 1));
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn duration_is_formatted_in_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::from_millis(125_400)), "2m 5s");
        assert_eq!(format_duration(Duration::ZERO), "0m 0s");
    }

    #[tokio::test]
    async fn report_is_persisted_with_millisecond_duration() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let mut stats = RunStats::start();
        for index in 0..100 {
            stats.record(&DocumentOutcome::Indexed {
                id: index.to_string(),
            });
        }
        let report = stats.finish_with(Duration::from_secs(10));
        let path = dir.path().join("stats.json");
        report.persist(&path).await?;

        let value: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
        assert_eq!(value["duration_ms"], 10_000);
        assert_eq!(value["documents_per_second"], 10.0);
        assert_eq!(value["processed"], 100);

        let parsed: RunReport = serde_json::from_value(value)?;
        assert_eq!(parsed, report);
        Ok(())
    }

    #[test]
    fn summary_lists_all_counters() {
        let report = RunStats::start().finish_with(Duration::from_secs(61));
        let rendered = report.to_string();
        assert!(rendered.contains("processed:  0"));
        assert!(rendered.contains("1m 1s"));
    }
}
