use super::normalize::MessageNormalizer;
use super::types::{Occurrence, RawLine};
use crate::rules::{IgnoreSet, RuleSet, Severity};
use std::sync::Arc;

/// A line that matched a classification rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub severity: Severity,
    /// Normalized message used for grouping
    pub message: String,
    /// Message as extracted from the line, before normalization
    pub orig_message: String,
}

impl ClassifiedLine {
    /// Attach the source position of the line
    pub fn into_occurrence(self, line: &RawLine) -> Occurrence {
        Occurrence {
            severity: self.severity,
            message: self.message,
            orig_message: self.orig_message,
            line_number: line.line_number,
            file_path: line.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Ignored,
    Unclassified,
    Classified(ClassifiedLine),
}

/// Ignore check, rule matching and normalization for a single line
#[derive(Debug, Clone)]
pub struct LineClassifier {
    rules: Arc<RuleSet>,
    ignore: Arc<IgnoreSet>,
    normalizer: MessageNormalizer,
}

impl LineClassifier {
    pub fn new(rules: Arc<RuleSet>, ignore: Arc<IgnoreSet>, normalizer: MessageNormalizer) -> Self {
        Self {
            rules,
            ignore,
            normalizer,
        }
    }

    pub fn classify(&self, raw: &str) -> LineOutcome {
        let line = raw.trim();

        if self.ignore.is_ignored(line) {
            return LineOutcome::Ignored;
        }

        match self.rules.classify(line) {
            Some(matched) => LineOutcome::Classified(ClassifiedLine {
                severity: matched.severity,
                message: self.normalizer.normalize(&matched.message),
                orig_message: matched.message,
            }),
            None => LineOutcome::Unclassified,
        }
    }
}
