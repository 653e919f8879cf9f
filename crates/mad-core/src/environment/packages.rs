//! Installed-package registries.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::MadResult;
use crate::models::InstalledPackage;

/// Source of the `(name, version)` pairs installed in the current
/// environment. Iteration order must be deterministic.
pub trait PackageRegistry {
    fn installed_packages(&self) -> MadResult<Vec<InstalledPackage>>;
}

impl<R: PackageRegistry + ?Sized> PackageRegistry for &R {
    fn installed_packages(&self) -> MadResult<Vec<InstalledPackage>> {
        (**self).installed_packages()
    }
}

/// A fixed package list.
#[derive(Clone, Debug, Default)]
pub struct StaticRegistry {
    packages: Vec<InstalledPackage>,
}

impl StaticRegistry {
    pub fn new(packages: Vec<InstalledPackage>) -> Self {
        Self { packages }
    }
}

impl FromIterator<InstalledPackage> for StaticRegistry {
    fn from_iter<I: IntoIterator<Item = InstalledPackage>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl PackageRegistry for StaticRegistry {
    fn installed_packages(&self) -> MadResult<Vec<InstalledPackage>> {
        Ok(self.packages.clone())
    }
}

// ---------------------------------------------------------------------------
// Cargo.lock
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LockFile {
    #[serde(default)]
    package: Vec<LockPackage>,
}

#[derive(Deserialize)]
struct LockPackage {
    name: String,
    version: String,
}

/// Packages pinned in a `Cargo.lock`, in lock-file order.
#[derive(Clone, Debug)]
pub struct CargoLockRegistry {
    path: PathBuf,
}

impl CargoLockRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse the `[[package]]` tables of a lock file.
pub fn parse_cargo_lock(content: &str) -> MadResult<Vec<InstalledPackage>> {
    let lock: LockFile = toml::from_str(content)?;
    Ok(lock
        .package
        .into_iter()
        .map(|p| InstalledPackage::new(p.name, p.version))
        .collect())
}

impl PackageRegistry for CargoLockRegistry {
    fn installed_packages(&self) -> MadResult<Vec<InstalledPackage>> {
        let content = std::fs::read_to_string(&self.path)?;
        parse_cargo_lock(&content)
    }
}
