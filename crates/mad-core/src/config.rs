//! Report configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::environment::imports::ImportFilter;
use crate::errors::MadResult;
use crate::model::differ::DifferOptions;

pub const DEFAULT_FILE_NAME: &str = "model_data.txt";
pub const DEFAULT_OUTPUT_DIR: &str = "model_logs";

/// Which optional sections are written. The model section is always
/// written. The aliases are the keyword names the Python API accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sections {
    #[serde(alias = "py_version")]
    pub interpreter_version: bool,
    #[serde(alias = "pip_requirements")]
    pub dependency_manifest: bool,
    pub imports: bool,
    #[serde(alias = "capture_notes")]
    pub notes: bool,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            interpreter_version: true,
            dependency_manifest: true,
            imports: true,
            notes: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Report file name; the last four characters are its extension.
    pub file_name: String,
    pub extra_notes: String,
    pub add_timestamp: bool,
    /// Relative paths resolve against the working directory.
    pub output_dir: PathBuf,
    pub sections: Sections,
    pub differ: DifferOptions,
    pub imports: ImportFilter,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            extra_notes: String::new(),
            add_timestamp: true,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            sections: Sections::default(),
            differ: DifferOptions::default(),
            imports: ImportFilter::default(),
        }
    }
}

impl ReportOptions {
    pub fn from_json_str(json: &str) -> MadResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn extra_notes(mut self, notes: impl Into<String>) -> Self {
        self.extra_notes = notes.into();
        self
    }

    pub fn add_timestamp(mut self, enabled: bool) -> Self {
        self.add_timestamp = enabled;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn sections(mut self, sections: Sections) -> Self {
        self.sections = sections;
        self
    }

    pub fn differ(mut self, differ: DifferOptions) -> Self {
        self.differ = differ;
        self
    }

    pub fn imports(mut self, filter: ImportFilter) -> Self {
        self.imports = filter;
        self
    }
}
