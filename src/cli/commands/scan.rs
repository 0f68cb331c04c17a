use crate::cli::Output;
use crate::cli::output::{write_csv, write_json, write_summary_csv, write_summary_text, write_text};
use crate::config::TriageConfig;
use crate::error::ScanError;
use crate::report::{self, CountFilter, RowFilter, TestSummary, TriageRow};
use crate::rules::Severity;
use crate::scanner::{
    FileFailure, ScanCoordinator, ScanEvent, ScanHandle, ScanRequest, ScanResult, ScanStats,
    ScanStatus, SeverityTotals,
};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::ProgressBar;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Args, Default)]
pub struct ScanArgs {
    /// Log files or directories to scan (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Classification rule file (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Ignore pattern file (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub ignore: Option<PathBuf>,

    /// Skip simulation logs
    #[arg(long)]
    pub no_simulate: bool,

    /// Skip compile logs
    #[arg(long)]
    pub no_compile: bool,

    /// Keep scoreboard comparison messages
    #[arg(long)]
    pub scoreboard: bool,

    /// Worker threads (1 = sequential, 0 = based on CPU count)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Replace standalone integers in messages with a placeholder
    #[arg(long)]
    pub collapse_integers: bool,

    /// Only report these severities (repeatable)
    #[arg(long = "severity", value_name = "SEVERITY")]
    pub severities: Vec<Severity>,

    /// Count filter: N, ==N, >N, >=N, <N, <=N or A-B
    #[arg(long, value_name = "EXPR")]
    pub count: Option<CountFilter>,

    /// Print a per-test summary instead of individual messages
    #[arg(long)]
    pub summary: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl ScanArgs {
    /// Command-line flags override the loaded configuration
    pub fn apply_overrides(&self, config: &mut TriageConfig) {
        if let Some(rules) = &self.rules {
            config.rules.file = Some(rules.clone());
        }
        if let Some(ignore) = &self.ignore {
            config.rules.ignore_file = Some(ignore.clone());
        }
        if self.no_simulate {
            config.scan.include_simulate = false;
        }
        if self.no_compile {
            config.scan.include_compile = false;
        }
        if self.scoreboard {
            config.scan.include_scoreboard = true;
        }
        if let Some(workers) = self.workers {
            config.scan.workers = workers;
        }
        if self.collapse_integers {
            config.scan.collapse_integers = true;
        }
    }

    fn row_filter(&self) -> RowFilter {
        RowFilter {
            severities: self.severities.clone(),
            count: self.count.unwrap_or_default(),
        }
    }
}

/// Split inputs: existing files are scanned as given, everything else is a
/// discovery root (a missing root fails the scan).
fn build_request(
    paths: &[PathBuf],
    config: &TriageConfig,
) -> Result<ScanRequest> {
    let rules = config.load_rules().context("Failed to load classification rules")?;
    let ignore = config.load_ignore().context("Failed to load ignore patterns")?;
    let discovery = config.file_discovery()?;

    let default_root = [PathBuf::from(".")];
    let inputs = if paths.is_empty() { &default_root[..] } else { paths };

    let (files, roots): (Vec<PathBuf>, Vec<PathBuf>) =
        inputs.iter().cloned().partition(|p| p.is_file());

    let request = roots.into_iter().fold(
        ScanRequest::new(Arc::new(rules), Arc::new(ignore))
            .with_files(files)
            .with_discovery(discovery)
            .with_options(config.scan_options()),
        |request, root| request.with_root(root),
    );
    Ok(request)
}

pub async fn execute(args: ScanArgs, output: &Output, custom_config: Option<&Path>) -> Result<ExitCode> {
    let mut config = TriageConfig::load(custom_config)?;
    args.apply_overrides(&mut config);
    tracing::debug!("Effective scan config: {:?}", config.scan);

    let request = build_request(&args.paths, &config)?;

    let coordinator = Arc::new(ScanCoordinator::new());
    let handle = coordinator.spawn(request)?;

    // Ctrl-C stops dispatch at the next file boundary; the partial result is still reported
    let cancel = handle.cancellation();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling scan");
            cancel.cancel();
        }
    });

    let show_progress = args.progress;
    let progress_output = *output;
    let result = tokio::task::spawn_blocking(move || wait_for_scan(handle, progress_output, show_progress))
        .await
        .context("Scan task failed")??;
    signal_task.abort();

    if let ScanStatus::Failed { reason } = &result.status {
        output.error(&format!("Scan failed: {reason}"));
        return Ok(ExitCode::from(2));
    }

    let rows = args.row_filter().apply(report::rows(&result.records));
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.summary {
        let summary = report::summarize(&rows);
        match args.format {
            OutputFormat::Text => write_summary_text(&mut out, &summary)?,
            OutputFormat::Csv => write_summary_csv(&mut out, &summary)?,
            OutputFormat::Json => write_json(&mut out, &JsonReport::new(&result, None, Some(summary.as_slice())))?,
        }
    } else {
        let mut rows = rows;
        report::sort_by_count(&mut rows);
        match args.format {
            OutputFormat::Text => write_text(&mut out, &rows)?,
            OutputFormat::Csv => write_csv(&mut out, &rows)?,
            OutputFormat::Json => write_json(&mut out, &JsonReport::new(&result, Some(rows.as_slice()), None))?,
        }
        if rows.is_empty() && args.format == OutputFormat::Text {
            output.info("No matching errors, fatals or warnings");
        }
    }
    out.flush()?;

    report_outcome(&result, output);
    Ok(ExitCode::SUCCESS)
}

/// Drain scan events on a blocking thread, then join the scan
fn wait_for_scan(handle: ScanHandle, output: Output, show_progress: bool) -> Result<ScanResult, ScanError> {
    let mut bar: Option<ProgressBar> = None;

    for event in handle.events().iter() {
        match event {
            ScanEvent::Started { total } if show_progress => {
                bar = Some(output.progress_bar(total as u64));
            }
            ScanEvent::FileFinished { current, path, .. } => {
                if let Some(pb) = &bar {
                    pb.set_position(current as u64);
                    pb.set_message(path);
                }
            }
            ScanEvent::MemoryPressure { distinct_keys } => {
                let message = format!("{distinct_keys} distinct messages held in memory");
                match &bar {
                    Some(pb) => pb.suspend(|| output.warning(&message)),
                    None => output.warning(&message),
                }
            }
            ScanEvent::Finished { .. } => {
                if let Some(pb) = bar.take() {
                    pb.finish_and_clear();
                }
            }
            _ => {}
        }
    }

    handle.join()
}

fn report_outcome(result: &ScanResult, output: &Output) {
    if !result.failures.is_empty() {
        output.warning(&format!(
            "{} file{} could not be read",
            result.failures.len(),
            if result.failures.len() == 1 { "" } else { "s" }
        ));
        for failure in &result.failures {
            output.verbose(&format!("{}: {}", failure.path, failure.error));
        }
    }

    if result.status == ScanStatus::Cancelled {
        output.warning(&format!(
            "Scan cancelled; results cover {} of {} files",
            result.stats.files_processed + result.stats.files_failed,
            result.stats.files_total
        ));
    }

    output.scan_summary(&result.totals, &result.stats);
    if result.is_complete() && result.failures.is_empty() {
        output.success("Scan complete");
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    status: &'a ScanStatus,
    totals: &'a SeverityTotals,
    stats: &'a ScanStats,
    failures: &'a [FileFailure],
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<&'a [TriageRow]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a [TestSummary]>,
}

impl<'a> JsonReport<'a> {
    fn new(
        result: &'a ScanResult,
        rows: Option<&'a [TriageRow]>,
        summary: Option<&'a [TestSummary]>,
    ) -> Self {
        Self {
            status: &result.status,
            totals: &result.totals,
            stats: &result.stats,
            failures: &result.failures,
            rows,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config() {
        let args = ScanArgs {
            rules: Some(PathBuf::from("rules.json")),
            no_compile: true,
            scoreboard: true,
            workers: Some(8),
            collapse_integers: true,
            ..ScanArgs::default()
        };
        let mut config = TriageConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.rules.file, Some(PathBuf::from("rules.json")));
        assert!(config.rules.ignore_file.is_none());
        assert!(config.scan.include_simulate);
        assert!(!config.scan.include_compile);
        assert!(config.scan.include_scoreboard);
        assert_eq!(config.scan.workers, 8);
        assert!(config.scan.collapse_integers);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = TriageConfig::default();
        config.scan.workers = 3;
        ScanArgs::default().apply_overrides(&mut config);
        assert_eq!(config, {
            let mut expected = TriageConfig::default();
            expected.scan.workers = 3;
            expected
        });
    }

    #[test]
    fn test_request_splits_files_and_roots() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("simulate.log");
        fs::write(&file, "").unwrap();
        let missing = temp_dir.path().join("missing");

        let request = build_request(
            &[file.clone(), temp_dir.path().to_path_buf(), missing.clone()],
            &TriageConfig::default(),
        )
        .unwrap();

        assert_eq!(request.files, vec![file]);
        assert_eq!(request.roots, vec![temp_dir.path().to_path_buf(), missing]);
    }

    #[test]
    fn test_json_report_flattens_status() {
        let result = ScanResult {
            records: Vec::new(),
            totals: SeverityTotals::default(),
            stats: ScanStats::default(),
            failures: Vec::new(),
            status: ScanStatus::Cancelled,
        };
        let value = serde_json::to_value(JsonReport::new(&result, Some(&[][..]), None)).unwrap();
        assert_eq!(value["status"], "cancelled");
        assert!(value["rows"].as_array().unwrap().is_empty());
        assert!(value.get("summary").is_none());
    }
}
