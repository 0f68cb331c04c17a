use super::types::TestIdentity;
use std::path::Path;

/// Default directory segment that precedes the test directory
pub const DEFAULT_ANCHOR: &str = "max";

/// Derives a [`TestIdentity`] from the regression directory layout
/// `.../<anchor>/<testcase>-<testopt>[-ID<digits>...]/<logfile>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMetadataExtractor {
    anchor: String,
}

impl Default for PathMetadataExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR)
    }
}

impl PathMetadataExtractor {
    pub fn new(anchor: impl Into<String>) -> Self {
        Self {
            anchor: anchor.into(),
        }
    }

    /// Extract identity from a path string. Pure string inspection.
    pub fn extract(&self, path: &str) -> TestIdentity {
        let path = path.replace('\\', "/");

        match self.segment_after_anchor(&path) {
            Some(segment) => Self::from_segment(segment.trim_matches('*')),
            None => TestIdentity {
                testcase: parent_name(&path).to_string(),
                ..TestIdentity::default()
            },
        }
    }

    pub fn extract_path(&self, path: &Path) -> TestIdentity {
        self.extract(&path.to_string_lossy())
    }

    /// Whether a path contains the anchor segment
    pub fn has_anchor(&self, path: &str) -> bool {
        self.segment_after_anchor(&path.replace('\\', "/")).is_some()
    }

    /// Identity for a file, preferring an embedded path hint when it
    /// follows the regression layout
    pub fn resolve(&self, path: &Path, hint: Option<&str>) -> TestIdentity {
        match hint {
            Some(hint) if self.has_anchor(hint) => self.extract(hint),
            _ => self.extract_path(path),
        }
    }

    fn segment_after_anchor<'p>(&self, path: &'p str) -> Option<&'p str> {
        let marker = format!("/{}/", self.anchor);
        let start = path.find(&marker)? + marker.len();
        path[start..].split('/').next().filter(|s| !s.is_empty())
    }

    fn from_segment(segment: &str) -> TestIdentity {
        let parts: Vec<&str> = segment.split('-').collect();

        let id = parts
            .iter()
            .find_map(|p| p.strip_prefix("ID"))
            .map(|rest| rest.chars().take_while(|c| c.is_ascii_digit()).collect())
            .unwrap_or_default();

        TestIdentity {
            id,
            testcase: parts.first().copied().unwrap_or_default().to_string(),
            testopt: parts.get(1).copied().unwrap_or_default().to_string(),
        }
    }
}

fn parent_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    let parent = match trimmed.rfind('/') {
        Some(idx) => &trimmed[..idx],
        None => return "",
    };
    parent.rsplit('/').next().unwrap_or_default()
}
