//! Rule file decoding
//!
//! Rule files are sequences. Each classification entry is either a table
//! `{Type, Regex, Strip?}` or a `[Type, Regex]` pair; each ignore entry is
//! either `{Regex}` or a bare pattern string.

use crate::error::ConfigError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RuleEntry {
    // Listed first: derived struct impls also accept sequences.
    Pair(Vec<String>),
    Table {
        #[serde(rename = "Type", alias = "type")]
        kind: Option<String>,
        #[serde(rename = "Regex", alias = "regex")]
        regex: Option<String>,
        #[serde(rename = "Strip", alias = "strip", default)]
        strip: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum IgnoreEntry {
    Table {
        #[serde(rename = "Regex", alias = "regex")]
        regex: Option<String>,
    },
    Pattern(String),
}

/// Supported rule file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("json") => Ok(Format::Json),
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Read a rule file into a sequence of raw entries
pub(crate) fn read_entries<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ConfigError> {
    let format = detect_format(path)?;

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_entries(path, &content, format)
}

fn parse_entries<T: DeserializeOwned>(
    path: &Path,
    content: &str,
    format: Format,
) -> Result<Vec<T>, ConfigError> {
    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match format {
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Yaml => serde_yml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}
