//! Python bindings for the `_mad_core` extension module.
//!
//! The caller passes its own source file and a dict of the names it wants
//! considered (typically `globals()`); nothing is read from the interpreter's
//! call frames. Default instances are built by calling the model's class with
//! no arguments.

use std::path::PathBuf;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule, PyType};
use tracing::debug;

use crate::config::{ReportOptions, Sections};
use crate::environment::imports::{scan_imports, ImportFilter};
use crate::environment::packages::PackageRegistry;
use crate::errors::{DerivationError, MadError, MadResult};
use crate::model::canonical::{normalize_canonical, type_name};
use crate::model::defaults::DefaultRegistry;
use crate::model::differ::ParameterDiffer;
use crate::models::{Binding, CanonicalRepr, InstalledPackage, LocalBindings, Model};
use crate::report::assembler::{ReportContext, ReportInputs};
use crate::report::generate_report;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Register `type(model)()` as the default factory for the model's type name.
fn register_reflected_default(defaults: &mut DefaultRegistry, model: &Bound<'_, PyAny>, repr: &str) {
    let name = type_name(&normalize_canonical(repr)).to_string();
    let cls: Py<PyType> = model.get_type().unbind();
    let factory_name = name.clone();
    defaults.register_with(name, move || {
        Python::with_gil(|py| {
            let construction = |e: PyErr| DerivationError::Construction {
                type_name: factory_name.clone(),
                message: e.to_string(),
            };
            let instance = cls.bind(py).call0().map_err(construction)?;
            let repr = instance.str().map_err(construction)?.to_string();
            Ok(Box::new(CanonicalRepr::new(repr)) as Box<dyn Model>)
        })
    });
}

fn snapshot_bindings(bindings: &Bound<'_, PyDict>) -> PyResult<LocalBindings> {
    let mut snapshot = LocalBindings::new();
    for (key, value) in bindings.iter() {
        let alias = key.str()?.to_string();
        let binding = if value.is_instance_of::<PyModule>() {
            Binding::Module {
                name: value.getattr("__name__")?.extract()?,
            }
        } else {
            Binding::Value
        };
        snapshot.insert(alias, binding);
    }
    Ok(snapshot)
}

fn interpreter_version(py: Python<'_>) -> PyResult<String> {
    let version: String = py.import("sys")?.getattr("version")?.extract()?;
    Ok(version.lines().next().unwrap_or_default().to_string())
}

/// Installed distributions as reported by `importlib.metadata`.
struct ImportlibMetadata<'py> {
    py: Python<'py>,
}

impl ImportlibMetadata<'_> {
    fn list(&self) -> PyResult<Vec<InstalledPackage>> {
        let metadata = self.py.import("importlib.metadata")?;
        let mut packages = Vec::new();
        for dist in metadata.call_method0("distributions")?.try_iter()? {
            let dist = dist?;
            let name = dist
                .getattr("metadata")
                .and_then(|m| m.get_item("Name"))
                .and_then(|n| n.extract::<String>());
            let version = dist.getattr("version").and_then(|v| v.extract::<String>());
            match (name, version) {
                (Ok(name), Ok(version)) => packages.push(InstalledPackage::new(name, version)),
                _ => debug!("skipping distribution without name or version"),
            }
        }
        Ok(packages)
    }
}

impl PackageRegistry for ImportlibMetadata<'_> {
    fn installed_packages(&self) -> MadResult<Vec<InstalledPackage>> {
        self.list().map_err(|e| MadError::Registry(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Python functions
// ---------------------------------------------------------------------------

/// Write a model report and return its path.
#[pyfunction]
#[pyo3(signature = (
    model,
    source_file,
    bindings,
    file_name="model_data.txt",
    extra_notes="",
    add_time_stamp=true,
    py_version=true,
    pip_requirements=true,
    imports=true,
    capture_notes=true,
))]
#[allow(clippy::too_many_arguments)]
pub fn log_model(
    py: Python<'_>,
    model: &Bound<'_, PyAny>,
    source_file: PathBuf,
    bindings: &Bound<'_, PyDict>,
    file_name: &str,
    extra_notes: &str,
    add_time_stamp: bool,
    py_version: bool,
    pip_requirements: bool,
    imports: bool,
    capture_notes: bool,
) -> PyResult<String> {
    let canonical = CanonicalRepr::new(model.str()?.to_string());
    let mut defaults = DefaultRegistry::new();
    register_reflected_default(&mut defaults, model, &canonical.0);

    let local_bindings = snapshot_bindings(bindings)?;
    let version = interpreter_version(py)?;
    let packages = ImportlibMetadata { py };

    let options = ReportOptions::default()
        .file_name(file_name)
        .extra_notes(extra_notes)
        .add_timestamp(add_time_stamp)
        .sections(Sections {
            interpreter_version: py_version,
            dependency_manifest: pip_requirements,
            imports,
            notes: capture_notes,
        });
    let inputs = ReportInputs {
        model: &canonical,
        source_file: &source_file,
        bindings: &local_bindings,
    };
    let ctx = ReportContext {
        defaults: &defaults,
        packages: &packages,
        interpreter_version: &version,
    };

    let path = generate_report(&inputs, &ctx, &options)?;
    Ok(path.to_string_lossy().into_owned())
}

/// The model line of a report: the type name with its non-default parameters.
#[pyfunction]
pub fn non_default_params(model: &Bound<'_, PyAny>) -> PyResult<String> {
    let canonical = CanonicalRepr::new(model.str()?.to_string());
    let mut defaults = DefaultRegistry::new();
    register_reflected_default(&mut defaults, model, &canonical.0);
    let info = ParameterDiffer::new(&defaults)
        .diff_params(&canonical)
        .map_err(MadError::from)?;
    Ok(info.render())
}

/// Import lines of a Python source file.
#[pyfunction]
#[pyo3(name = "scan_imports")]
pub fn py_scan_imports(path: PathBuf) -> PyResult<Vec<String>> {
    let lines = scan_imports(&path, &ImportFilter::python())?;
    Ok(lines.into_iter().map(|l| l.text).collect())
}
