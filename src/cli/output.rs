//! Terminal output for logtriage
//!
//! Status lines go to stderr so that stdout carries only report data
//! (text table, JSON or CSV) and can be piped.

use crate::report::{TestSummary, TriageRow};
use crate::rules::Severity;
use crate::scanner::{ScanStats, SeverityTotals};
use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};

/// Output handler for consistent CLI formatting
#[derive(Debug, Clone, Copy)]
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("✔").green(), message);
        }
    }

    /// Errors are always shown, even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Progress bar over files, drawn on stderr
    pub fn progress_bar(&self, len: u64) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("#>-"));
        }
        pb
    }

    /// Per-severity totals and file counts
    pub fn scan_summary(&self, totals: &SeverityTotals, stats: &ScanStats) {
        if self.quiet {
            return;
        }
        eprintln!(
            "{} {} {}  {} {}  {} {}  {}",
            style("❯").cyan(),
            severity_style(Severity::Error).apply_to("ERROR"),
            style(totals.error).bold(),
            severity_style(Severity::Fatal).apply_to("FATAL"),
            style(totals.fatal).bold(),
            severity_style(Severity::Warning).apply_to("WARNING"),
            style(totals.warning).bold(),
            style(format!(
                "({}/{} files, {} lines, {:.2}s)",
                stats.files_processed,
                stats.files_total,
                stats.lines_processed,
                stats.scan_duration_ms as f64 / 1000.0
            ))
            .dim()
        );
    }
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Error => Style::new().red().bold(),
        Severity::Fatal => Style::new().magenta().bold(),
        Severity::Warning => Style::new().yellow().bold(),
    }
}

/// Plain text table of rows
pub fn write_text(out: &mut impl Write, rows: &[TriageRow]) -> io::Result<()> {
    for row in rows {
        let test = if row.testopt.is_empty() {
            row.testcase.clone()
        } else {
            format!("{}-{}", row.testcase, row.testopt)
        };
        writeln!(
            out,
            "{:>7}  {:<9} {:<8} {:<24} {}",
            row.count,
            severity_style(row.severity).apply_to(row.severity.as_str()),
            row.logtype.as_str(),
            test,
            row.message
        )?;
        writeln!(
            out,
            "         {}",
            style(format!("{}:{}", row.logfilepath, row.linenumber)).dim()
        )?;
    }
    Ok(())
}

pub fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// One CSV row per aggregate record; the header comes from the row's field names
pub fn write_csv(out: &mut impl Write, rows: &[TriageRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_summary_text(out: &mut impl Write, summary: &[TestSummary]) -> io::Result<()> {
    writeln!(
        out,
        "{:<24} {:<16} {:>7} {:>6} {:>7} {:>6} {:>7} {:>6}  {:<7} {:<8}",
        "testcase", "testopt", "ERROR", "uniq", "FATAL", "uniq", "WARNING", "uniq", "compile", "simulate"
    )?;
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    for test in summary {
        writeln!(
            out,
            "{:<24} {:<16} {:>7} {:>6} {:>7} {:>6} {:>7} {:>6}  {:<7} {:<8}",
            test.testcase,
            test.testopt,
            test.error.total,
            test.error.unique,
            test.fatal.total,
            test.fatal.unique,
            test.warning.total,
            test.warning.unique,
            yes_no(test.has_compile),
            yes_no(test.has_simulate)
        )?;
    }
    Ok(())
}

/// Flat summary row; csv cannot serialize the nested per-severity counts
#[derive(Serialize)]
struct SummaryCsvRow<'a> {
    testcase: &'a str,
    testopt: &'a str,
    error: usize,
    error_unique: usize,
    fatal: usize,
    fatal_unique: usize,
    warning: usize,
    warning_unique: usize,
    compile: bool,
    simulate: bool,
}

impl<'a> From<&'a TestSummary> for SummaryCsvRow<'a> {
    fn from(test: &'a TestSummary) -> Self {
        Self {
            testcase: &test.testcase,
            testopt: &test.testopt,
            error: test.error.total,
            error_unique: test.error.unique,
            fatal: test.fatal.total,
            fatal_unique: test.fatal.unique,
            warning: test.warning.total,
            warning_unique: test.warning.unique,
            compile: test.has_compile,
            simulate: test.has_simulate,
        }
    }
}

pub fn write_summary_csv(out: &mut impl Write, summary: &[TestSummary]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for test in summary {
        wtr.serialize(SummaryCsvRow::from(test))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::LogKind;

    fn row(message: &str) -> TriageRow {
        TriageRow {
            id: "7".to_string(),
            testcase: "tc".to_string(),
            testopt: "opt".to_string(),
            severity: Severity::Error,
            count: 2,
            message: message.to_string(),
            orig_message: message.to_string(),
            logtype: LogKind::Simulate,
            logfilepath: "/r/max/tc-opt-ID7/simulate.log".to_string(),
            linenumber: 12,
        }
    }

    #[test]
    fn test_csv_quotes_special_fields() {
        let mut out = Vec::new();
        write_csv(&mut out, &[row("a, \"b\"")]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,testcase,testopt,type,count,message,orig_message,logtype,logfilepath,linenumber"
        );
        assert_eq!(
            lines.next().unwrap(),
            "7,tc,opt,ERROR,2,\"a, \"\"b\"\"\",\"a, \"\"b\"\"\",simulate,/r/max/tc-opt-ID7/simulate.log,12"
        );
    }

    #[test]
    fn test_summary_csv_is_flat() {
        use crate::report::{SeverityCount, TestSummary};

        let summary = TestSummary {
            testcase: "alu".to_string(),
            testopt: "fast".to_string(),
            error: SeverityCount { total: 3, unique: 2 },
            fatal: SeverityCount::default(),
            warning: SeverityCount { total: 1, unique: 1 },
            has_compile: true,
            has_simulate: false,
        };
        let mut out = Vec::new();
        write_summary_csv(&mut out, &[summary]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "testcase,testopt,error,error_unique,fatal,fatal_unique,warning,warning_unique,compile,simulate\n\
             alu,fast,3,2,0,0,1,1,true,false\n"
        );
    }

    #[test]
    fn test_json_rows() {
        let mut out = Vec::new();
        write_json(&mut out, &vec![row("m")]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["testcase"], "tc");
        assert_eq!(value[0]["linenumber"], 12);
    }
}
