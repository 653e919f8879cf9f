//! Flat textual import scanning of the caller's source file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::MadResult;
use crate::models::ImportLine;

/// Names this tool is imported under; lines mentioning any of them are not
/// logged.
pub const SELF_NAMES: &[&str] = &["MAD", "_mad_core"];

/// Which lines count as imports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportFilter {
    /// Substring every import line contains.
    pub keyword: String,
    /// Lines starting with this are comments.
    pub comment_marker: String,
    /// Lines containing any of these are dropped, so the tool does not log
    /// its own import.
    pub exclude: Vec<String>,
}

impl Default for ImportFilter {
    fn default() -> Self {
        Self::python()
    }
}

impl ImportFilter {
    pub fn python() -> Self {
        Self {
            keyword: "import ".to_string(),
            comment_marker: "#".to_string(),
            exclude: SELF_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn rust() -> Self {
        Self {
            keyword: "use ".to_string(),
            comment_marker: "//".to_string(),
            exclude: vec!["mad_core".to_string()],
        }
    }

    pub fn exclude(mut self, names: Vec<String>) -> Self {
        self.exclude = names;
        self
    }

    pub fn matches(&self, line: &str) -> bool {
        if !line.contains(self.keyword.as_str()) {
            return false;
        }
        if !self.comment_marker.is_empty() && line.starts_with(self.comment_marker.as_str()) {
            return false;
        }
        !self
            .exclude
            .iter()
            .any(|name| !name.is_empty() && line.contains(name.as_str()))
    }
}

/// Filter import lines out of in-memory source text, in file order.
pub fn scan_import_source(source: &str, filter: &ImportFilter) -> Vec<ImportLine> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| filter.matches(line))
        .map(|(idx, line)| ImportLine {
            line_number: idx + 1,
            text: line.to_string(),
        })
        .collect()
}

/// Read `path` and return its import lines. An unreadable file is an error.
pub fn scan_imports(path: &Path, filter: &ImportFilter) -> MadResult<Vec<ImportLine>> {
    let source = std::fs::read_to_string(path)?;
    let imports = scan_import_source(&source, filter);
    debug!(path = %path.display(), count = imports.len(), "scanned imports");
    Ok(imports)
}
