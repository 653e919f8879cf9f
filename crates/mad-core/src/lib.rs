//! MAD core library: "Model And Dependencies" reports for experiment runs.
//!
//! Given a model, the script that built it, and the script's bound names, this
//! crate writes a text report with the model's non-default parameters, the
//! interpreter version, the installed packages behind the bound modules, the
//! script's import lines, and free-form notes. With the `python` feature it
//! compiles to the `_mad_core` Python extension module.

pub mod config;
pub mod environment;
pub mod errors;
pub mod model;
pub mod models;
pub mod report;

#[cfg(feature = "python")]
pub mod python;

pub use config::{ReportOptions, Sections};
pub use errors::{DerivationError, MadError, MadResult};
pub use model::defaults::DefaultRegistry;
pub use model::differ::{ModelInfo, ParameterDiffer};
pub use models::{CanonicalRepr, LocalBindings, Model};
pub use report::assembler::{Report, ReportContext, ReportInputs};
pub use report::generate_report;

#[cfg(feature = "python")]
use pyo3::prelude::*;

// ---------------------------------------------------------------------------
// Top-level Python module: _mad_core
// ---------------------------------------------------------------------------

#[cfg(feature = "python")]
#[pymodule]
fn _mad_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("DEFAULT_FILE_NAME", config::DEFAULT_FILE_NAME)?;
    m.add("DEFAULT_OUTPUT_DIR", config::DEFAULT_OUTPUT_DIR)?;
    m.add("TIMESTAMP_FORMAT", report::filename::TIMESTAMP_FORMAT)?;
    m.add(
        "DEFAULT_COMPOSITE_MARKER",
        model::differ::DEFAULT_COMPOSITE_MARKER,
    )?;

    m.add_function(wrap_pyfunction!(python::log_model, m)?)?;
    m.add_function(wrap_pyfunction!(python::non_default_params, m)?)?;
    m.add_function(wrap_pyfunction!(python::py_scan_imports, m)?)?;

    Ok(())
}
