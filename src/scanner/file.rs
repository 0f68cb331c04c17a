use super::classify::{LineClassifier, LineOutcome};
use super::identity::PathMetadataExtractor;
use super::reader::LogReader;
use super::types::{LogKind, TestIdentity};
use crate::error::FileAccessError;
use crate::rules::Severity;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default marker identifying scoreboard comparison messages
pub const DEFAULT_SCOREBOARD_MARKER: &str = "sbd_compare";

/// Decides whether a classified message is counted at all
pub trait ContentFilter: Send + Sync {
    fn keep(&self, severity: Severity, message: &str) -> bool;
}

impl<F> ContentFilter for F
where
    F: Fn(Severity, &str) -> bool + Send + Sync,
{
    fn keep(&self, severity: Severity, message: &str) -> bool {
        self(severity, message)
    }
}

/// Drops scoreboard comparison messages unless they are explicitly included
#[derive(Debug, Clone)]
pub struct ScoreboardFilter {
    marker: String,
    include: bool,
}

impl ScoreboardFilter {
    pub fn new(marker: &str, include: bool) -> Self {
        Self {
            marker: marker.to_lowercase(),
            include,
        }
    }
}

impl ContentFilter for ScoreboardFilter {
    fn keep(&self, _severity: Severity, message: &str) -> bool {
        self.include || self.marker.is_empty() || !message.to_lowercase().contains(&self.marker)
    }
}

/// One locally deduplicated entry of a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountEntry {
    pub severity: Severity,
    pub message: String,
    pub orig_message: String,
    pub line_number: usize,
    pub count: usize,
}

/// Everything a worker learned about one file
#[derive(Debug, Clone)]
pub struct PerFileCounts {
    pub path: PathBuf,
    pub display_path: Arc<str>,
    pub identity: TestIdentity,
    pub kind: LogKind,
    /// In first-seen order
    pub entries: Vec<CountEntry>,
    pub lines_read: usize,
    pub lines_ignored: usize,
    pub lines_filtered: usize,
    pub path_hint: Option<String>,
}

impl PerFileCounts {
    /// Number of classified lines that were counted
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
}

/// Runs the line classifier over one file
pub struct FileProcessor {
    classifier: LineClassifier,
    filter: Arc<dyn ContentFilter>,
    extractor: PathMetadataExtractor,
    path_hint_prefix: String,
}

impl FileProcessor {
    pub fn new(
        classifier: LineClassifier,
        filter: Arc<dyn ContentFilter>,
        extractor: PathMetadataExtractor,
        path_hint_prefix: impl Into<String>,
    ) -> Self {
        Self {
            classifier,
            filter,
            extractor,
            path_hint_prefix: path_hint_prefix.into(),
        }
    }

    pub fn process(&self, path: &Path) -> Result<PerFileCounts, FileAccessError> {
        tracing::debug!("Processing {}", path.display());

        let stream = LogReader::open(path)?;
        let display_path = stream.display_path();

        let mut index: HashMap<(Severity, String, String, usize), usize> = HashMap::new();
        let mut entries: Vec<CountEntry> = Vec::new();
        let mut lines_read = 0;
        let mut lines_ignored = 0;
        let mut lines_filtered = 0;
        let mut path_hint: Option<String> = None;
        let mut hint_anchored = false;

        for line in stream {
            let line = line?;
            lines_read += 1;

            // Keep looking until a hint follows the regression layout
            if !hint_anchored && !self.path_hint_prefix.is_empty() {
                if let Some(hint) = self.path_hint(&line.text) {
                    hint_anchored = self.extractor.has_anchor(&hint);
                    if hint_anchored || path_hint.is_none() {
                        path_hint = Some(hint);
                    }
                }
            }

            let occurrence = match self.classifier.classify(&line.text) {
                LineOutcome::Classified(classified) => classified.into_occurrence(&line),
                LineOutcome::Ignored => {
                    lines_ignored += 1;
                    continue;
                }
                LineOutcome::Unclassified => continue,
            };

            if !self.filter.keep(occurrence.severity, &occurrence.message) {
                lines_filtered += 1;
                continue;
            }

            let key = (
                occurrence.severity,
                occurrence.message,
                occurrence.orig_message,
                occurrence.line_number,
            );
            match index.get(&key) {
                Some(&i) => entries[i].count += 1,
                None => {
                    index.insert(key.clone(), entries.len());
                    entries.push(CountEntry {
                        severity: key.0,
                        message: key.1,
                        orig_message: key.2,
                        line_number: key.3,
                        count: 1,
                    });
                }
            }
        }

        let identity = self.extractor.resolve(path, path_hint.as_deref());
        let kind = LogKind::from_path(path);

        tracing::debug!(
            "Finished {}: {} lines, {} counted, {} ignored",
            path.display(),
            lines_read,
            entries.len(),
            lines_ignored
        );

        Ok(PerFileCounts {
            path: path.to_path_buf(),
            display_path,
            identity,
            kind,
            entries,
            lines_read,
            lines_ignored,
            lines_filtered,
            path_hint,
        })
    }

    /// Text after the hint prefix, wherever it appears in the line
    fn path_hint(&self, text: &str) -> Option<String> {
        let start = text.find(&self.path_hint_prefix)? + self.path_hint_prefix.len();
        let hint = text[start..].trim();
        (!hint.is_empty()).then(|| hint.to_string())
    }
}
