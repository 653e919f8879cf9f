//! Cross-reference of locally bound modules against installed packages.

use indexmap::IndexMap;
use tracing::debug;

use crate::environment::packages::PackageRegistry;
use crate::errors::MadResult;
use crate::models::{DependencyRow, InstalledPackage, LocalBindings};

/// Module name -> aliases it is bound under, in binding order.
fn bound_modules(bindings: &LocalBindings) -> IndexMap<&str, Vec<String>> {
    let mut modules: IndexMap<&str, Vec<String>> = IndexMap::new();
    for (alias, name) in bindings.modules() {
        modules.entry(name).or_default().push(alias.to_string());
    }
    modules
}

/// Inner-join bound modules with `packages` on exact name equality. Rows
/// follow package order; each package appears at most once.
pub fn join_packages(bindings: &LocalBindings, packages: &[InstalledPackage]) -> Vec<DependencyRow> {
    let modules = bound_modules(bindings);
    let mut seen = std::collections::HashSet::new();
    packages
        .iter()
        .filter_map(|pkg| {
            let aliases = modules.get(pkg.name.as_str())?;
            if !seen.insert(pkg.name.as_str()) {
                return None;
            }
            Some(DependencyRow {
                name: pkg.name.clone(),
                version: pkg.version.clone(),
                aliases: aliases.clone(),
            })
        })
        .collect()
}

/// Build the dependency manifest for `bindings` from `registry`.
pub fn cross_reference(
    bindings: &LocalBindings,
    registry: &dyn PackageRegistry,
) -> MadResult<Vec<DependencyRow>> {
    let packages = registry.installed_packages()?;
    let rows = join_packages(bindings, &packages);
    debug!(
        bound = bindings.len(),
        installed = packages.len(),
        matched = rows.len(),
        "cross-referenced dependencies"
    );
    Ok(rows)
}
