//! A Python interpreter queried through subprocesses: its version string and
//! its `pip freeze` listing.

use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::environment::packages::PackageRegistry;
use crate::errors::{MadError, MadResult};
use crate::models::InstalledPackage;

// `name==version`, ignoring any trailing environment marker.
static PINNED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)==([^\s;]+)").unwrap());

/// Keep the `name==version` lines of `pip freeze` output. Editable installs,
/// direct references (`name @ url`) and comments are skipped.
pub fn parse_freeze_output(output: &str) -> Vec<InstalledPackage> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let caps = PINNED_RE.captures(line)?;
            Some(InstalledPackage::new(&caps[1], &caps[2]))
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct PythonEnvironment {
    executable: PathBuf,
}

impl Default for PythonEnvironment {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl PythonEnvironment {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn run(&self, args: &[&str]) -> MadResult<String> {
        let output = Command::new(&self.executable).args(args).output()?;
        if !output.status.success() {
            return Err(MadError::Registry(format!(
                "`{} {}` exited with {}: {}",
                self.executable.display(),
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// First line of the interpreter's `sys.version`.
    pub fn version(&self) -> MadResult<String> {
        let out = self.run(&["-c", "import sys; print(sys.version)"])?;
        Ok(out.lines().next().unwrap_or_default().to_string())
    }
}

impl PackageRegistry for PythonEnvironment {
    fn installed_packages(&self) -> MadResult<Vec<InstalledPackage>> {
        let out = self
            .run(&["-m", "pip", "freeze"])
            .map_err(|e| match e {
                MadError::Io(io) => MadError::Registry(format!(
                    "could not run {}: {io}",
                    self.executable.display()
                )),
                other => other,
            })?;
        let packages = parse_freeze_output(&out);
        debug!(count = packages.len(), "listed installed packages");
        Ok(packages)
    }
}
