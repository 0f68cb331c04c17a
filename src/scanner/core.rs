use super::aggregate::Aggregator;
use super::classify::LineClassifier;
use super::directory::FileDiscovery;
use super::file::{DEFAULT_SCOREBOARD_MARKER, FileProcessor, ScoreboardFilter};
use super::identity::{DEFAULT_ANCHOR, PathMetadataExtractor};
use super::normalize::MessageNormalizer;
use super::progress::{CancellationToken, ScanEvent, ScanReporter};
use super::types::{FileFailure, LogKind, ScanResult, ScanStats, ScanStatus};
use crate::error::ScanError;
use crate::parallel::ExecutionStrategy;
use crate::rules::{IgnoreSet, RuleSet};
use crossbeam::channel::Receiver;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Instant;

/// Default header prefix carrying the original path of a copied log
pub const DEFAULT_PATH_HINT_PREFIX: &str = "LOG PATH:";

/// Per-scan switches
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub include_simulate: bool,
    pub include_compile: bool,
    pub include_scoreboard: bool,
    pub scoreboard_marker: String,
    pub collapse_integers: bool,
    pub strategy: ExecutionStrategy,
    /// Distinct-key count that triggers a memory pressure event (0 = never)
    pub memory_warning_keys: usize,
    pub anchor: String,
    pub path_hint_prefix: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_simulate: true,
            include_compile: true,
            include_scoreboard: false,
            scoreboard_marker: DEFAULT_SCOREBOARD_MARKER.to_string(),
            collapse_integers: false,
            strategy: ExecutionStrategy::Sequential,
            memory_warning_keys: 0,
            anchor: DEFAULT_ANCHOR.to_string(),
            path_hint_prefix: DEFAULT_PATH_HINT_PREFIX.to_string(),
        }
    }
}

/// What to scan and how
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Files taken as given
    pub files: Vec<PathBuf>,
    /// Directories searched recursively for log files
    pub roots: Vec<PathBuf>,
    pub rules: Arc<RuleSet>,
    pub ignore: Arc<IgnoreSet>,
    pub discovery: FileDiscovery,
    pub options: ScanOptions,
    pub cancel: CancellationToken,
}

impl ScanRequest {
    pub fn new(rules: Arc<RuleSet>, ignore: Arc<IgnoreSet>) -> Self {
        Self {
            files: Vec::new(),
            roots: Vec::new(),
            rules,
            ignore,
            discovery: FileDiscovery::default(),
            options: ScanOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_discovery(mut self, discovery: FileDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Coordinator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Completed,
    Cancelled,
    Failed,
}

impl From<&ScanStatus> for ScanState {
    fn from(status: &ScanStatus) -> Self {
        match status {
            ScanStatus::Completed => ScanState::Completed,
            ScanStatus::Cancelled => ScanState::Cancelled,
            ScanStatus::Failed { .. } => ScanState::Failed,
        }
    }
}

/// A scan running on its own thread
pub struct ScanHandle {
    events: Receiver<ScanEvent>,
    cancel: CancellationToken,
    handle: JoinHandle<Result<ScanResult, ScanError>>,
}

impl ScanHandle {
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the scan to finish
    pub fn join(self) -> Result<ScanResult, ScanError> {
        self.handle.join().map_err(|_| ScanError::WorkerPanic)?
    }
}

/// Drives one scan at a time: enumerate, dispatch, merge, report
#[derive(Debug)]
pub struct ScanCoordinator {
    state: Mutex<ScanState>,
}

impl Default for ScanCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Leaves the coordinator in a terminal state even if the scan unwinds
struct StateGuard<'a> {
    coordinator: &'a ScanCoordinator,
    outcome: ScanState,
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        *self.coordinator.lock_state() = self.outcome;
    }
}

impl ScanCoordinator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScanState::Idle),
        }
    }

    pub fn state(&self) -> ScanState {
        *self.lock_state()
    }

    /// Run a scan on the calling thread
    pub fn run(&self, request: ScanRequest, reporter: &ScanReporter) -> Result<ScanResult, ScanError> {
        self.begin()?;
        self.execute(request, reporter)
    }

    /// Run a scan on a background thread. Events are delivered through the
    /// returned handle; the reentrancy check happens before this returns.
    pub fn spawn(self: &Arc<Self>, request: ScanRequest) -> Result<ScanHandle, ScanError> {
        self.begin()?;

        let (reporter, events) = ScanReporter::channel();
        let cancel = request.cancel.clone();
        let coordinator = Arc::clone(self);

        let spawned = std::thread::Builder::new()
            .name("logtriage-scan".to_string())
            .spawn(move || coordinator.execute(request, &reporter));

        match spawned {
            Ok(handle) => Ok(ScanHandle {
                events,
                cancel,
                handle,
            }),
            Err(e) => {
                *self.lock_state() = ScanState::Idle;
                Err(ScanError::Spawn(e))
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self) -> Result<(), ScanError> {
        let mut state = self.lock_state();
        if *state == ScanState::Scanning {
            return Err(ScanError::AlreadyScanning);
        }
        *state = ScanState::Scanning;
        Ok(())
    }

    fn execute(&self, request: ScanRequest, reporter: &ScanReporter) -> Result<ScanResult, ScanError> {
        let mut guard = StateGuard {
            coordinator: self,
            outcome: ScanState::Failed,
        };

        let result = Self::scan(request, reporter)?;
        guard.outcome = ScanState::from(&result.status);
        Ok(result)
    }

    fn scan(request: ScanRequest, reporter: &ScanReporter) -> Result<ScanResult, ScanError> {
        let start_time = Instant::now();
        let options = &request.options;

        let files = match Self::enumerate(&request) {
            Ok(files) => files,
            Err(reason) => {
                tracing::warn!("Scan failed: {}", reason);
                let result = ScanResult::failed(reason, start_time.elapsed().as_millis() as u64);
                reporter.report(ScanEvent::Finished {
                    status: result.status.clone(),
                });
                return Ok(result);
            }
        };

        let total = files.len();
        tracing::info!(
            "Scanning {} log files ({} worker{})",
            total,
            options.strategy.workers(),
            if options.strategy.workers() == 1 { "" } else { "s" }
        );
        reporter.report(ScanEvent::Started { total });

        let classifier = LineClassifier::new(
            request.rules.clone(),
            request.ignore.clone(),
            MessageNormalizer::new(options.collapse_integers),
        );
        let processor = FileProcessor::new(
            classifier,
            Arc::new(ScoreboardFilter::new(
                &options.scoreboard_marker,
                options.include_scoreboard,
            )),
            PathMetadataExtractor::new(options.anchor.clone()),
            options.path_hint_prefix.clone(),
        );

        let mut aggregator = Aggregator::new().with_memory_warning(options.memory_warning_keys);
        let mut stats = ScanStats {
            files_total: total,
            ..ScanStats::default()
        };
        let mut failures = Vec::new();
        let cancel = &request.cancel;

        let dispatched = options.strategy.execute(
            files,
            |path, _worker_id| processor.process(path),
            || !cancel.is_cancelled(),
            |index, result| {
                let path = match result {
                    Ok(counts) => {
                        stats.files_processed += 1;
                        stats.lines_processed += counts.lines_read;
                        stats.lines_ignored += counts.lines_ignored;
                        stats.lines_filtered += counts.lines_filtered;
                        if let Some(distinct_keys) =
                            aggregator.merge(&counts, &counts.identity, counts.kind)
                        {
                            reporter.report(ScanEvent::MemoryPressure { distinct_keys });
                        }
                        counts.display_path.to_string()
                    }
                    Err(e) => {
                        tracing::warn!("{}", e);
                        let path = e.path().display().to_string();
                        stats.files_failed += 1;
                        failures.push(FileFailure {
                            path: path.clone(),
                            error: e.to_string(),
                        });
                        reporter.report(ScanEvent::FileFailed {
                            path: path.clone(),
                            error: e.to_string(),
                        });
                        path
                    }
                };
                reporter.report(ScanEvent::FileFinished {
                    current: index + 1,
                    total,
                    path,
                });
            },
        )?;

        let status = if dispatched < total {
            tracing::info!("Scan cancelled after {} of {} files", dispatched, total);
            ScanStatus::Cancelled
        } else {
            ScanStatus::Completed
        };

        let (records, totals) = aggregator.finish();
        stats.scan_duration_ms = start_time.elapsed().as_millis() as u64;

        tracing::info!(
            "Scan {} in {}ms: {} files, {} records, {} failures",
            status,
            stats.scan_duration_ms,
            stats.files_processed,
            records.len(),
            failures.len()
        );
        reporter.report(ScanEvent::Finished {
            status: status.clone(),
        });

        Ok(ScanResult {
            records,
            totals,
            stats,
            failures,
            status,
        })
    }

    /// Explicit files first (filtered by kind and exclusions), then each
    /// root's discovered files
    fn enumerate(request: &ScanRequest) -> Result<Vec<PathBuf>, String> {
        let options = &request.options;
        let discovery = request
            .discovery
            .clone()
            .with_kinds(options.include_simulate, options.include_compile);

        let mut files = Vec::new();
        for file in &request.files {
            if discovery.includes(LogKind::from_path(file)) && !discovery.is_excluded(file) {
                files.push(file.clone());
            } else {
                tracing::debug!("Skipping {}", file.display());
            }
        }

        for root in &request.roots {
            let found = discovery
                .discover(root)
                .map_err(|e| format!("cannot enumerate {}: {}", root.display(), e))?;
            files.extend(found);
        }

        Ok(files)
    }
}
