use super::Severity;
use super::loader::{RuleEntry, read_entries};
use crate::error::ConfigError;
use regex::Regex;
use std::path::Path;

/// One ordered classification rule
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub severity: Severity,
    pub matcher: Regex,
    /// Removes the vendor prefix from the line to form the message
    pub strip: Option<Regex>,
}

impl ClassificationRule {
    pub fn new(severity: Severity, matcher: &str, strip: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            severity,
            matcher: compile(matcher)?,
            strip: strip.map(compile).transpose()?,
        })
    }

    /// Extract the message from a trimmed line this rule matches
    fn message_for(&self, line: &str, start: usize, end: usize) -> String {
        if let Some(strip) = &self.strip {
            return strip.replacen(line, 1, "").into_owned();
        }

        if start == 0 {
            line[end..]
                .trim_start_matches([':', ' ', '\t'])
                .to_string()
        } else {
            line.to_string()
        }
    }
}

/// Result of running a line through the rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub severity: Severity,
    pub message: String,
}

/// Ordered list of classification rules; the first match wins
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ClassificationRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// Load rules from a JSON or YAML file, preserving file order
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let entries: Vec<RuleEntry> = read_entries(path)?;
        let mut rules = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let (kind, regex, strip) = match entry {
                RuleEntry::Table { kind, regex, strip } => {
                    let kind = kind.ok_or_else(|| ConfigError::MissingField {
                        path: path.to_path_buf(),
                        index,
                        field: "Type",
                    })?;
                    let regex = regex.ok_or_else(|| ConfigError::MissingField {
                        path: path.to_path_buf(),
                        index,
                        field: "Regex",
                    })?;
                    (kind, regex, strip)
                }
                RuleEntry::Pair(pair) => {
                    let [kind, regex]: [String; 2] =
                        pair.try_into().map_err(|p: Vec<String>| ConfigError::MalformedEntry {
                            path: path.to_path_buf(),
                            index,
                            reason: format!("expected [Type, Regex], got {} elements", p.len()),
                        })?;
                    (kind, regex, None)
                }
            };

            let severity: Severity = kind.parse()?;
            rules.push(ClassificationRule::new(severity, &regex, strip.as_deref())?);
        }

        tracing::debug!("Loaded {} classification rules from {}", rules.len(), path.display());
        Ok(Self { rules })
    }

    /// Load from a file when one is configured, otherwise use the built-in set
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    /// Built-in rules for the common simulator and elaborator formats.
    /// Vendor-specific rules come first; the generic fallbacks are last.
    pub fn builtin() -> Result<Self, ConfigError> {
        use Severity::{Error, Fatal, Warning};

        let table: &[(Severity, &str, &str)] = &[
            // UVM
            (Error, r"UVM_ERROR", r"^.*?UVM_ERROR\s*:?\s?"),
            (Warning, r"UVM_WARNING", r"^.*?UVM_WARNING\s*:?\s?"),
            (Fatal, r"UVM_FATAL", r"^.*?UVM_FATAL\s*:?\s?"),
            // Questa / ModelSim
            (Error, r"^\*\* Error", r"^\*\* Error[^:]*:\s*"),
            (Warning, r"^\*\* Warning", r"^\*\* Warning[^:]*:\s*"),
            (Fatal, r"^\*\* Fatal", r"^\*\* Fatal[^:]*:\s*"),
            // VCS
            (Error, r"^Error-\[[^\]]*\]", r"^Error-\[[^\]]*\]\s*"),
            (Warning, r"^Warning-\[[^\]]*\]", r"^Warning-\[[^\]]*\]\s*"),
            (Fatal, r"^Fatal:", r"^Fatal:\s*"),
            // Xcelium
            (Error, r"ncvlog: \*E,", r"^.*?ncvlog: \*E,[^:]*:?\s*"),
            (Warning, r"ncvlog: \*W,", r"^.*?ncvlog: \*W,[^:]*:?\s*"),
            (Fatal, r"ncsim: \*F,", r"^.*?ncsim: \*F,[^:]*:?\s*"),
            // xmelab
            (Error, r"xmelab: \*E,", r"^.*?xmelab: \*E,[^:]*:?\s*"),
            (Warning, r"xmelab: \*W,", r"^.*?xmelab: \*W,[^:]*:?\s*"),
            // -E- / -F- / -W-
            (Error, r"^-E-", r"^-E-\s*"),
            (Fatal, r"^-F-", r"^-F-\s*"),
            (Warning, r"^-W-", r"^-W-\s*"),
            // *E / *F / *W
            (Error, r"^\*E", r"^\*E\s*"),
            (Fatal, r"^\*F", r"^\*F\s*"),
            (Warning, r"^\*W", r"^\*W\s*"),
            // Generic, case-insensitive
            (Error, r"(?i)\berror\b", r"(?i)^.*?\berror\b\s*:?\s?"),
            (Warning, r"(?i)\bwarning\b", r"(?i)^.*?\bwarning\b\s*:?\s?"),
            (Fatal, r"(?i)\bfatal\b", r"(?i)^.*?\bfatal\b\s*:?\s?"),
        ];

        let rules = table
            .iter()
            .map(|(severity, matcher, strip)| ClassificationRule::new(*severity, matcher, Some(*strip)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Classify a trimmed line. Rules are evaluated in order and evaluation
    /// stops at the first rule whose matcher matches.
    pub fn classify(&self, line: &str) -> Option<RuleMatch> {
        self.rules.iter().find_map(|rule| {
            rule.matcher.find(line).map(|m| RuleMatch {
                severity: rule.severity,
                message: rule.message_for(line, m.start(), m.end()),
            })
        })
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rule(severity: Severity, pattern: &str) -> ClassificationRule {
        ClassificationRule::new(severity, pattern, None).unwrap()
    }

    #[test]
    fn test_match_at_start_strips_prefix_and_separators() {
        let rules = RuleSet::new(vec![rule(Severity::Error, "UVM_ERROR")]);
        let m = rules.classify("UVM_ERROR : \tMismatch at 0x1A2B").unwrap();
        assert_eq!(m.severity, Severity::Error);
        assert_eq!(m.message, "Mismatch at 0x1A2B");
    }

    #[test]
    fn test_match_mid_line_keeps_whole_line() {
        let rules = RuleSet::new(vec![rule(Severity::Error, "UVM_ERROR")]);
        let line = "tb.sv(12) UVM_ERROR bad thing";
        assert_eq!(rules.classify(line).unwrap().message, line);
    }

    #[test]
    fn test_strip_pattern_overrides_offset_rule() {
        let rules = RuleSet::new(vec![
            ClassificationRule::new(Severity::Error, "UVM_ERROR", Some(r"^.*?UVM_ERROR\s*:?\s?"))
                .unwrap(),
        ]);
        let m = rules.classify("tb.sv(12) UVM_ERROR @ 5: bad thing").unwrap();
        assert_eq!(m.message, "@ 5: bad thing");
    }

    #[test]
    fn test_first_match_wins_and_order_matters() {
        let line = "** Warning: possible error in block";
        let vendor = rule(Severity::Warning, r"^\*\* Warning:");
        let generic = rule(Severity::Error, r"(?i)\berror\b");

        let ordered = RuleSet::new(vec![vendor.clone(), generic.clone()]);
        assert_eq!(ordered.classify(line).unwrap().severity, Severity::Warning);

        let swapped = RuleSet::new(vec![generic, vendor]);
        assert_eq!(swapped.classify(line).unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_unmatched_line_is_discarded() {
        let rules = RuleSet::new(vec![rule(Severity::Error, "UVM_ERROR")]);
        assert!(rules.classify("UVM_INFO all good").is_none());
    }

    #[test]
    fn test_builtin_rules_cover_vendor_formats() {
        let rules = RuleSet::builtin().unwrap();
        let cases = [
            ("UVM_ERROR tb.sv(3) @ 10: scoreboard mismatch", Severity::Error),
            ("** Fatal: (vsim-3421) out of range", Severity::Fatal),
            ("Error-[SE] Syntax error", Severity::Error),
            ("xmelab: *W,CUVWSP: port not connected", Severity::Warning),
            ("-F- clock stopped", Severity::Fatal),
            ("Something produced a Warning here", Severity::Warning),
        ];
        for (line, expected) in cases {
            assert_eq!(rules.classify(line).unwrap().severity, expected, "line: {}", line);
        }
        let vcs = rules.classify("Error-[SE] Syntax error").unwrap();
        assert_eq!(vcs.message, "Syntax error");
    }

    #[test]
    fn test_load_rules_from_json_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("patterns.json");
        fs::write(
            &file,
            r#"[{"Type": "ERROR", "Regex": "ERROR: (.+)"}, ["WARNING", "WARNING: (.+)"]]"#,
        )
        .unwrap();

        let rules = RuleSet::from_file(&file).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules()[0].severity, Severity::Error);
        assert_eq!(rules.rules()[1].severity, Severity::Warning);
    }

    #[test]
    fn test_missing_type_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("missing.json");
        fs::write(&file, r#"[{"Regex": "ERROR: (.+)"}]"#).unwrap();

        let err = RuleSet::from_file(&file).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "Type", index: 0, .. }));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("bad.json");
        fs::write(&file, r#"[["ERROR", "[unclosed"]]"#).unwrap();

        assert!(matches!(
            RuleSet::from_file(&file).unwrap_err(),
            ConfigError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_wrong_pair_length_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("bad.yaml");
        fs::write(&file, "- [ERROR, 'a', 'b']\n").unwrap();

        assert!(matches!(
            RuleSet::from_file(&file).unwrap_err(),
            ConfigError::MalformedEntry { index: 0, .. }
        ));
    }

    #[test]
    fn test_non_json_file_is_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("notjson.txt");
        fs::write(&file, "not json").unwrap();

        assert!(matches!(
            RuleSet::from_file(&file).unwrap_err(),
            ConfigError::UnsupportedFormat { .. }
        ));
    }
}
