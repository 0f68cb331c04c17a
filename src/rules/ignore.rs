use super::loader::{IgnoreEntry, read_entries};
use crate::error::ConfigError;
use regex::{Regex, RegexSet};
use std::path::Path;

/// A suppression pattern; a matching line is dropped before classification
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub pattern: Regex,
}

/// Unordered set of suppression rules (logical OR)
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    rules: Vec<IgnoreRule>,
    matcher: RegexSet,
}

impl IgnoreSet {
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            rules.push(IgnoreRule { pattern: regex });
        }

        let matcher = RegexSet::new(rules.iter().map(|r| r.pattern.as_str())).map_err(|source| {
            ConfigError::InvalidPattern {
                pattern: "<ignore set>".to_string(),
                source,
            }
        })?;

        Ok(Self { rules, matcher })
    }

    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            matcher: RegexSet::empty(),
        }
    }

    /// Load ignore patterns from a JSON or YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let entries: Vec<IgnoreEntry> = read_entries(path)?;
        let mut patterns = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let pattern = match entry {
                IgnoreEntry::Pattern(pattern) => pattern,
                IgnoreEntry::Table { regex } => regex.ok_or_else(|| ConfigError::MissingField {
                    path: path.to_path_buf(),
                    index,
                    field: "Regex",
                })?,
            };
            patterns.push(pattern);
        }

        tracing::debug!("Loaded {} ignore patterns from {}", patterns.len(), path.display());
        Self::new(patterns)
    }

    /// Load from a file when one is configured, otherwise ignore nothing
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::empty()),
        }
    }

    pub fn is_ignored(&self, line: &str) -> bool {
        self.matcher.is_match(line)
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_any_pattern_suppresses() {
        let ignore = IgnoreSet::new(["something happened", r"^\*\* Note"]).unwrap();
        assert!(ignore.is_ignored("** Warning: something happened"));
        assert!(ignore.is_ignored("** Note: fine"));
        assert!(!ignore.is_ignored("** Warning: other"));
    }

    #[test]
    fn test_empty_set_ignores_nothing() {
        assert!(!IgnoreSet::empty().is_ignored("anything"));
    }

    #[test]
    fn test_load_ignore_patterns_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("ignore.json");
        fs::write(&file, r#"[{"Regex": "Ignored message"}, "Another ignore"]"#).unwrap();

        let ignore = IgnoreSet::from_file(&file).unwrap();
        assert_eq!(ignore.len(), 2);
        assert!(ignore.is_ignored("an Another ignore line"));
    }

    #[test]
    fn test_non_json_ignore_file_is_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("ignore.txt");
        fs::write(&file, "some pattern").unwrap();

        assert!(matches!(
            IgnoreSet::from_file(&file).unwrap_err(),
            ConfigError::UnsupportedFormat { .. }
        ));
    }
}
