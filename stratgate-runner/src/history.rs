//! Report sinks: where finished reports go.
//!
//! The validator never persists anything itself; callers hand reports to a
//! [`ReportSink`]. [`JsonlReportSink`] appends one JSON report per line, which
//! tolerates partial writes and is easy to stream back with
//! [`JsonlReportSink::read_all`].

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::ValidationReport;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("report sink I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination for finished validation reports.
pub trait ReportSink {
    /// Returns `Ok(true)` if the report was stored, `Ok(false)` if filtered out.
    fn publish(&mut self, report: &ValidationReport) -> Result<bool, SinkError>;
}

/// Which reports a sink keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkFilter {
    #[default]
    All,
    ApprovedOnly,
    RejectedOnly,
}

impl SinkFilter {
    pub fn accepts(self, report: &ValidationReport) -> bool {
        match self {
            SinkFilter::All => true,
            SinkFilter::ApprovedOnly => report.overall_passed,
            SinkFilter::RejectedOnly => !report.overall_passed,
        }
    }
}

// ─── JSONL file ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JsonlReportSink {
    path: PathBuf,
    filter: SinkFilter,
}

impl JsonlReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filter: SinkFilter::All,
        }
    }

    pub fn with_filter(mut self, filter: SinkFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every report back. Missing file → empty; malformed lines skipped.
    pub fn read_all(&self) -> Result<Vec<ValidationReport>, SinkError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = io::BufReader::new(fs::File::open(&self.path)?);
        let mut reports = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(report) = serde_json::from_str::<ValidationReport>(&line) {
                reports.push(report);
            }
        }
        Ok(reports)
    }
}

impl ReportSink for JsonlReportSink {
    fn publish(&mut self, report: &ValidationReport) -> Result<bool, SinkError> {
        if !self.filter.accepts(report) {
            return Ok(false);
        }
        let json = serde_json::to_string(report)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(true)
    }
}

// ─── In memory ───────────────────────────────────────────────────────

/// Keeps reports in a `Vec`; handy for embedding and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryReportSink {
    pub reports: Vec<ValidationReport>,
}

impl ReportSink for MemoryReportSink {
    fn publish(&mut self, report: &ValidationReport) -> Result<bool, SinkError> {
        self.reports.push(report.clone());
        Ok(true)
    }
}

// ─── Summaries ───────────────────────────────────────────────────────

/// Fraction of reports that were approved (0 for none).
pub fn approval_rate(reports: &[ValidationReport]) -> f64 {
    if reports.is_empty() {
        return 0.0;
    }
    reports.iter().filter(|r| r.overall_passed).count() as f64 / reports.len() as f64
}

/// How often each test failed across reports.
pub fn failure_counts(reports: &[ValidationReport]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for report in reports {
        for name in report.failed_tests() {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    counts
}
