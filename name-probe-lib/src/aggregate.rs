//! Result aggregation and persistence.
//!
//! The aggregator drains a [`ProbeRun`] in completion order, keeps a
//! per-status tally and the list of available names, and hands back a
//! [`RunSummary`] at the end. It only observes; workers never wait on it.

use crate::checker::ProbeRun;
use crate::error::ProbeError;
use crate::types::{CheckResult, CheckStatus};
use futures::StreamExt;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Count of results per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub available: usize,
    pub taken: usize,
    pub rate_limited: usize,
    pub error: usize,
}

impl StatusTally {
    pub fn record(&mut self, status: CheckStatus) {
        match status {
            CheckStatus::Available => self.available += 1,
            CheckStatus::Taken => self.taken += 1,
            CheckStatus::RateLimited => self.rate_limited += 1,
            CheckStatus::Error => self.error += 1,
        }
    }

    pub fn get(&self, status: CheckStatus) -> usize {
        match status {
            CheckStatus::Available => self.available,
            CheckStatus::Taken => self.taken,
            CheckStatus::RateLimited => self.rate_limited,
            CheckStatus::Error => self.error,
        }
    }

    pub fn total(&self) -> usize {
        self.available + self.taken + self.rate_limited + self.error
    }
}

/// Final report for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub tally: StatusTally,
    pub available: Vec<String>,
    pub expected: usize,
    pub received: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
}

impl RunSummary {
    /// Whether every submitted candidate was accounted for.
    pub fn is_complete(&self) -> bool {
        self.received == self.expected
    }
}

fn serialize_secs<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(duration.as_secs_f64())
}

/// Consumes results as they complete.
#[derive(Debug)]
pub struct ResultAggregator {
    tally: StatusTally,
    available: Vec<String>,
    expected: usize,
    received: usize,
    started: Instant,
}

impl ResultAggregator {
    pub fn new(expected: usize) -> Self {
        Self {
            tally: StatusTally::default(),
            available: Vec::new(),
            expected,
            received: 0,
            started: Instant::now(),
        }
    }

    pub fn record(&mut self, result: &CheckResult) {
        self.received += 1;
        self.tally.record(result.status);
        if result.is_available() {
            self.available.push(result.name.clone());
        }
    }

    /// Drain `run` until every expected result has arrived or the stream ends.
    ///
    /// `on_result` sees each result together with the running count, which
    /// is what progress counters like `[3/8]` need.
    pub async fn drain<F>(&mut self, run: &mut ProbeRun, mut on_result: F)
    where
        F: FnMut(&CheckResult, usize, usize),
    {
        while self.received < self.expected {
            let Some(result) = run.next().await else {
                break;
            };
            self.record(&result);
            on_result(&result, self.received, self.expected);
        }
    }

    pub fn tally(&self) -> &StatusTally {
        &self.tally
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn finish(self) -> RunSummary {
        let summary = RunSummary {
            tally: self.tally,
            available: self.available,
            expected: self.expected,
            received: self.received,
            duration: self.started.elapsed(),
        };
        info!(
            received = summary.received,
            available = summary.tally.available,
            taken = summary.tally.taken,
            rate_limited = summary.tally.rate_limited,
            errors = summary.tally.error,
            "Probe run finished"
        );
        summary
    }
}

/// Append names to the result log, one per line.
///
/// Creates the file if needed and never truncates it. Returns how many names
/// were written; an empty slice leaves the file untouched.
pub fn append_available<P: AsRef<Path>>(path: P, names: &[String]) -> Result<usize, ProbeError> {
    let path = path.as_ref();
    if names.is_empty() {
        return Ok(0);
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ProbeError::file_error(path.to_string_lossy(), format!("Failed to open: {}", e))
        })?;

    let mut buffer = String::new();
    for name in names {
        buffer.push_str(name);
        buffer.push('\n');
    }

    file.write_all(buffer.as_bytes()).map_err(|e| {
        ProbeError::file_error(path.to_string_lossy(), format!("Failed to write: {}", e))
    })?;

    Ok(names.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_tally_counts_each_status() {
        let mut aggregator = ResultAggregator::new(5);
        aggregator.record(&CheckResult::available("a1"));
        aggregator.record(&CheckResult::taken("b2"));
        aggregator.record(&CheckResult::taken("c3"));
        aggregator.record(&CheckResult::rate_limited("d4", 1.0));
        aggregator.record(&CheckResult::error("e5", "HTTP 500"));

        let tally = *aggregator.tally();
        assert_eq!(tally.get(CheckStatus::Available), 1);
        assert_eq!(tally.get(CheckStatus::Taken), 2);
        assert_eq!(tally.get(CheckStatus::RateLimited), 1);
        assert_eq!(tally.get(CheckStatus::Error), 1);
        assert_eq!(tally.total(), 5);
        assert_eq!(aggregator.available(), ["a1".to_string()]);

        let summary = aggregator.finish();
        assert!(summary.is_complete());
    }

    #[test]
    fn test_append_never_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("valid_usernames.txt");

        assert_eq!(
            append_available(&path, &["first".to_string()]).unwrap(),
            1
        );
        assert_eq!(
            append_available(&path, &["second".to_string(), "third".to_string()]).unwrap(),
            2
        );

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\nthird\n");
    }

    #[test]
    fn test_append_empty_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("none.txt");
        assert_eq!(append_available(&path, &[]).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_append_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        let err = append_available(&path, &["x".to_string()]).unwrap_err();
        assert!(matches!(err, ProbeError::FileError { .. }));
    }

    #[test]
    fn test_summary_serializes_duration_as_seconds() {
        let summary = RunSummary {
            tally: StatusTally::default(),
            available: vec![],
            expected: 0,
            received: 0,
            duration: Duration::from_millis(1500),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["duration"], 1.5);
    }
}
