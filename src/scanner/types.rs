use crate::rules::Severity;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Which test produced a log file
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TestIdentity {
    pub id: String,
    pub testcase: String,
    pub testopt: String,
}

/// Run phase a log file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Simulate,
    Compile,
}

impl LogKind {
    /// `simulate` when the file name mentions it, `compile` otherwise
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if name.contains("simulate") {
            LogKind::Simulate
        } else {
            LogKind::Compile
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Simulate => "simulate",
            LogKind::Compile => "compile",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line read from a log file
#[derive(Debug, Clone)]
pub struct RawLine {
    pub path: Arc<str>,
    /// 1-based
    pub line_number: usize,
    pub text: String,
}

/// A classified, normalized line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub severity: Severity,
    pub message: String,
    pub orig_message: String,
    pub line_number: usize,
    pub file_path: Arc<str>,
}

/// Grouping key for deduplication across files
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregateKey {
    pub testcase: String,
    pub testopt: String,
    pub severity: Severity,
    pub message: String,
    pub kind: LogKind,
}

/// Deduplicated count for one key, with its first-seen occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRecord {
    pub key: AggregateKey,
    pub count: usize,
    pub orig_message: String,
    pub file_path: Arc<str>,
    pub line_number: usize,
    pub id: String,
}

/// Total counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityTotals {
    pub error: usize,
    pub fatal: usize,
    pub warning: usize,
}

impl SeverityTotals {
    pub fn add(&mut self, severity: Severity, count: usize) {
        match severity {
            Severity::Error => self.error += count,
            Severity::Fatal => self.fatal += count,
            Severity::Warning => self.warning += count,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.error,
            Severity::Fatal => self.fatal,
            Severity::Warning => self.warning,
        }
    }

    pub fn total(&self) -> usize {
        self.error + self.fatal + self.warning
    }
}

/// A file that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}

/// Terminal state of a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanStatus {
    Completed,
    Cancelled,
    Failed { reason: String },
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStatus::Completed => f.write_str("completed"),
            ScanStatus::Cancelled => f.write_str("cancelled"),
            ScanStatus::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Counters collected while scanning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files_total: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub lines_processed: usize,
    pub lines_ignored: usize,
    pub lines_filtered: usize,
    pub scan_duration_ms: u64,
}

/// Everything a scan hands to the display layer
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Sorted by key
    pub records: Vec<AggregateRecord>,
    pub totals: SeverityTotals,
    pub stats: ScanStats,
    pub failures: Vec<FileFailure>,
    pub status: ScanStatus,
}

impl ScanResult {
    pub(crate) fn failed(reason: String, duration_ms: u64) -> Self {
        Self {
            records: Vec::new(),
            totals: SeverityTotals::default(),
            stats: ScanStats {
                scan_duration_ms: duration_ms,
                ..ScanStats::default()
            },
            failures: Vec::new(),
            status: ScanStatus::Failed { reason },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == ScanStatus::Completed
    }
}
