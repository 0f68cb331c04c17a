//! Row projection and summaries handed to display collaborators

use crate::rules::Severity;
use crate::scanner::{AggregateRecord, LogKind};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One output row per aggregate record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageRow {
    pub id: String,
    pub testcase: String,
    pub testopt: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub count: usize,
    pub message: String,
    pub orig_message: String,
    pub logtype: LogKind,
    pub logfilepath: String,
    pub linenumber: usize,
}

impl From<&AggregateRecord> for TriageRow {
    fn from(record: &AggregateRecord) -> Self {
        Self {
            id: record.id.clone(),
            testcase: record.key.testcase.clone(),
            testopt: record.key.testopt.clone(),
            severity: record.key.severity,
            count: record.count,
            message: record.key.message.clone(),
            orig_message: record.orig_message.clone(),
            logtype: record.key.kind,
            logfilepath: record.file_path.to_string(),
            linenumber: record.line_number,
        }
    }
}

pub fn rows(records: &[AggregateRecord]) -> Vec<TriageRow> {
    records.iter().map(TriageRow::from).collect()
}

/// Most frequent first; ties keep key order
pub fn sort_by_count(rows: &mut [TriageRow]) {
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.testcase.cmp(&b.testcase))
            .then_with(|| a.testopt.cmp(&b.testopt))
            .then_with(|| a.severity.cmp(&b.severity))
            .then_with(|| a.message.cmp(&b.message))
            .then_with(|| a.logtype.cmp(&b.logtype))
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid count filter '{0}' (expected N, ==N, >N, >=N, <N, <=N or A-B)")]
pub struct CountFilterError(String);

/// Count filter expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountFilter {
    #[default]
    Any,
    Eq(usize),
    Gt(usize),
    Ge(usize),
    Lt(usize),
    Le(usize),
    Range(usize, usize),
}

impl CountFilter {
    pub fn matches(&self, count: usize) -> bool {
        match *self {
            CountFilter::Any => true,
            CountFilter::Eq(n) => count == n,
            CountFilter::Gt(n) => count > n,
            CountFilter::Ge(n) => count >= n,
            CountFilter::Lt(n) => count < n,
            CountFilter::Le(n) => count <= n,
            CountFilter::Range(lo, hi) => lo <= count && count <= hi,
        }
    }
}

impl FromStr for CountFilter {
    type Err = CountFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim();
        let err = || CountFilterError(s.to_string());
        let num = |v: &str| v.trim().parse::<usize>().map_err(|_| err());

        if expr.is_empty() {
            return Ok(CountFilter::Any);
        }

        // Two-character operators first
        if let Some(rest) = expr.strip_prefix(">=") {
            Ok(CountFilter::Ge(num(rest)?))
        } else if let Some(rest) = expr.strip_prefix("<=") {
            Ok(CountFilter::Le(num(rest)?))
        } else if let Some(rest) = expr.strip_prefix("==") {
            Ok(CountFilter::Eq(num(rest)?))
        } else if let Some(rest) = expr.strip_prefix('>') {
            Ok(CountFilter::Gt(num(rest)?))
        } else if let Some(rest) = expr.strip_prefix('<') {
            Ok(CountFilter::Lt(num(rest)?))
        } else if let Some((lo, hi)) = expr.split_once('-') {
            Ok(CountFilter::Range(num(lo)?, num(hi)?))
        } else {
            Ok(CountFilter::Eq(num(expr)?))
        }
    }
}

impl fmt::Display for CountFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountFilter::Any => Ok(()),
            CountFilter::Eq(n) => write!(f, "=={n}"),
            CountFilter::Gt(n) => write!(f, ">{n}"),
            CountFilter::Ge(n) => write!(f, ">={n}"),
            CountFilter::Lt(n) => write!(f, "<{n}"),
            CountFilter::Le(n) => write!(f, "<={n}"),
            CountFilter::Range(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

/// Row selection applied before display
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    /// Empty keeps every severity
    pub severities: Vec<Severity>,
    pub count: CountFilter,
}

impl RowFilter {
    pub fn matches(&self, row: &TriageRow) -> bool {
        (self.severities.is_empty() || self.severities.contains(&row.severity))
            && self.count.matches(row.count)
    }

    pub fn apply(&self, rows: Vec<TriageRow>) -> Vec<TriageRow> {
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Total and unique message counts for one severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCount {
    pub total: usize,
    pub unique: usize,
}

/// Per (testcase, testopt) rollup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSummary {
    pub testcase: String,
    pub testopt: String,
    pub error: SeverityCount,
    pub fatal: SeverityCount,
    pub warning: SeverityCount,
    pub has_compile: bool,
    pub has_simulate: bool,
}

impl TestSummary {
    pub fn get(&self, severity: Severity) -> SeverityCount {
        match severity {
            Severity::Error => self.error,
            Severity::Fatal => self.fatal,
            Severity::Warning => self.warning,
        }
    }
}

#[derive(Default)]
struct SummaryAcc {
    totals: BTreeMap<Severity, usize>,
    unique: BTreeMap<Severity, BTreeSet<String>>,
    kinds: BTreeSet<LogKind>,
}

/// Summarize rows per test, sorted by testcase then testopt.
/// Rows without both a testcase and a testopt are skipped, as are tests
/// whose counts are all zero.
pub fn summarize(rows: &[TriageRow]) -> Vec<TestSummary> {
    let mut by_test: BTreeMap<(String, String), SummaryAcc> = BTreeMap::new();

    for row in rows {
        if row.testcase.is_empty() || row.testopt.is_empty() {
            continue;
        }
        let acc = by_test
            .entry((row.testcase.clone(), row.testopt.clone()))
            .or_default();
        *acc.totals.entry(row.severity).or_default() += row.count;
        acc.unique
            .entry(row.severity)
            .or_default()
            .insert(row.message.clone());
        acc.kinds.insert(row.logtype);
    }

    by_test
        .into_iter()
        .filter(|(_, acc)| acc.totals.values().any(|&n| n > 0))
        .map(|((testcase, testopt), acc)| {
            let count = |severity: Severity| SeverityCount {
                total: acc.totals.get(&severity).copied().unwrap_or(0),
                unique: acc.unique.get(&severity).map_or(0, BTreeSet::len),
            };
            TestSummary {
                error: count(Severity::Error),
                fatal: count(Severity::Fatal),
                warning: count(Severity::Warning),
                has_compile: acc.kinds.contains(&LogKind::Compile),
                has_simulate: acc.kinds.contains(&LogKind::Simulate),
                testcase,
                testopt,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(testcase: &str, testopt: &str, severity: Severity, message: &str, count: usize) -> TriageRow {
        TriageRow {
            id: String::new(),
            testcase: testcase.to_string(),
            testopt: testopt.to_string(),
            severity,
            count,
            message: message.to_string(),
            orig_message: message.to_string(),
            logtype: LogKind::Simulate,
            logfilepath: "/x/simulate.log".to_string(),
            linenumber: 1,
        }
    }

    #[test]
    fn test_count_filter_expressions() {
        let cases = [
            ("", 7, true),
            ("5", 5, true),
            ("==5", 4, false),
            (">3", 4, true),
            (">3", 3, false),
            (">=3", 3, true),
            ("<3", 3, false),
            ("<=3", 3, true),
            ("2-4", 4, true),
            ("2-4", 5, false),
            (" >= 10 ", 10, true),
        ];
        for (expr, value, expected) in cases {
            let filter: CountFilter = expr.parse().unwrap();
            assert_eq!(filter.matches(value), expected, "{expr:?} on {value}");
        }
    }

    #[test]
    fn test_malformed_count_filter() {
        for expr in ["abc", ">x", "1-", "-3", "1-2-3"] {
            assert!(expr.parse::<CountFilter>().is_err(), "{expr:?}");
        }
    }

    #[test]
    fn test_row_serializes_with_stable_field_names() {
        let json = serde_json::to_value(row("tc", "opt", Severity::Fatal, "boom", 2)).unwrap();
        assert_eq!(json["type"], "FATAL");
        assert_eq!(json["logtype"], "simulate");
        assert_eq!(json["count"], 2);
        assert!(json.get("orig_message").is_some());
    }

    #[test]
    fn test_sort_by_count_descending() {
        let mut rows = vec![
            row("a", "o", Severity::Error, "x", 1),
            row("b", "o", Severity::Error, "y", 5),
            row("a", "o", Severity::Warning, "z", 5),
        ];
        sort_by_count(&mut rows);
        assert_eq!(rows[0].testcase, "a");
        assert_eq!(rows[0].count, 5);
        assert_eq!(rows[1].testcase, "b");
        assert_eq!(rows[2].count, 1);
    }

    #[test]
    fn test_row_filter_by_severity_and_count() {
        let filter = RowFilter {
            severities: vec![Severity::Error],
            count: ">1".parse().unwrap(),
        };
        let kept = filter.apply(vec![
            row("a", "o", Severity::Error, "x", 2),
            row("a", "o", Severity::Error, "y", 1),
            row("a", "o", Severity::Warning, "z", 9),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].message, "x");
    }

    #[test]
    fn test_summary_totals_and_unique_counts() {
        let mut compile = row("tc", "o1", Severity::Warning, "w", 4);
        compile.logtype = LogKind::Compile;
        let rows = vec![
            row("tc", "o1", Severity::Error, "e1", 2),
            row("tc", "o1", Severity::Error, "e2", 3),
            compile,
            row("tc", "", Severity::Error, "skipped", 9),
            row("ab", "o2", Severity::Fatal, "f", 1),
        ];

        let summary = summarize(&rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].testcase, "ab");
        assert_eq!(summary[1].error, SeverityCount { total: 5, unique: 2 });
        assert_eq!(summary[1].warning.total, 4);
        assert!(summary[1].has_compile && summary[1].has_simulate);
        assert!(!summary[0].has_compile);
    }
}
