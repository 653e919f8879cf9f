//! Assembles the report sections in memory.

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::ReportOptions;
use crate::environment::dependencies::cross_reference;
use crate::environment::imports::scan_imports;
use crate::environment::packages::PackageRegistry;
use crate::errors::{DerivationError, MadResult};
use crate::model::canonical::{normalize_canonical, type_name};
use crate::model::defaults::DefaultRegistry;
use crate::model::differ::{constructor_imports, ModelInfo, ParameterDiffer};
use crate::models::{DependencyRow, ImportLine, LocalBindings, Model};

pub const MODEL_HEADING: &str = "# Model and parameters:";
pub const VERSION_HEADING: &str = "# python version:";
pub const REQUIREMENTS_HEADING: &str = "# pip requirements:";
pub const IMPORTS_HEADING: &str = "# Necessary Imports:";
pub const NOTES_HEADING: &str = "# Extra Notes:";

/// What the caller hands over about itself.
pub struct ReportInputs<'a> {
    pub model: &'a dyn Model,
    /// The caller's own source file.
    pub source_file: &'a Path,
    pub bindings: &'a LocalBindings,
}

/// Collaborators the assembler queries.
pub struct ReportContext<'a> {
    pub defaults: &'a DefaultRegistry,
    pub packages: &'a dyn PackageRegistry,
    pub interpreter_version: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelSection {
    Derived(ModelInfo),
    Failed {
        canonical: String,
        reason: DerivationError,
        constructor_imports: Vec<ImportLine>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Section {
    Model(ModelSection),
    InterpreterVersion(String),
    /// `Err` carries the reason the registry could not be listed.
    Dependencies(Result<Vec<DependencyRow>, String>),
    Imports(Vec<ImportLine>),
    Notes(String),
}

impl Section {
    fn write_to(&self, out: &mut impl fmt::Write) -> fmt::Result {
        match self {
            Section::Model(ModelSection::Derived(info)) => {
                writeln!(out, "{MODEL_HEADING}\n\t{}", info.render())
            }
            Section::Model(ModelSection::Failed {
                canonical,
                reason,
                constructor_imports,
            }) => {
                writeln!(out, "{MODEL_HEADING}\n\t{canonical}")?;
                writeln!(out, "\t# default parameters unavailable: {reason}")?;
                for line in constructor_imports {
                    writeln!(out, "\t# constructor import: {line}")?;
                }
                Ok(())
            }
            Section::InterpreterVersion(version) => {
                writeln!(out, "\n{VERSION_HEADING}\n{version}")
            }
            Section::Dependencies(Ok(rows)) => {
                writeln!(out, "\n{REQUIREMENTS_HEADING}")?;
                for row in rows {
                    writeln!(out, "{row}")?;
                }
                Ok(())
            }
            Section::Dependencies(Err(reason)) => {
                writeln!(out, "\n{REQUIREMENTS_HEADING}\n# unavailable: {reason}")
            }
            Section::Imports(lines) => {
                writeln!(out, "\n{IMPORTS_HEADING}")?;
                for line in lines {
                    writeln!(out, "{line}")?;
                }
                Ok(())
            }
            Section::Notes(notes) => write!(out, "\n{NOTES_HEADING}\n{notes}"),
        }
    }
}

/// A fully materialized report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub sections: Vec<Section>,
}

impl Report {
    /// Run every enabled derivation and collect the sections in order.
    ///
    /// An unreadable source file is fatal. A derivation failure and an
    /// unavailable package registry degrade their own section instead.
    pub fn assemble(
        inputs: &ReportInputs<'_>,
        ctx: &ReportContext<'_>,
        options: &ReportOptions,
    ) -> MadResult<Report> {
        let imports = scan_imports(inputs.source_file, &options.imports)?;
        let mut sections = vec![Section::Model(model_section(
            inputs.model,
            ctx.defaults,
            options,
            &imports,
        ))];

        if options.sections.interpreter_version {
            sections.push(Section::InterpreterVersion(
                ctx.interpreter_version.to_string(),
            ));
        }
        if options.sections.dependency_manifest {
            let rows = cross_reference(inputs.bindings, ctx.packages).map_err(|e| {
                warn!(error = %e, "dependency manifest unavailable");
                e.to_string()
            });
            sections.push(Section::Dependencies(rows));
        }
        if options.sections.imports {
            sections.push(Section::Imports(imports));
        }
        if options.sections.notes {
            sections.push(Section::Notes(options.extra_notes.clone()));
        }

        debug!(sections = sections.len(), "assembled report");
        Ok(Report { sections })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            let _ = section.write_to(&mut out);
        }
        out
    }
}

fn model_section(
    model: &dyn Model,
    defaults: &DefaultRegistry,
    options: &ReportOptions,
    imports: &[ImportLine],
) -> ModelSection {
    let differ = ParameterDiffer::with_options(defaults, options.differ.clone());
    match differ.diff_params(model) {
        Ok(info) => ModelSection::Derived(info),
        Err(reason) => {
            let canonical = normalize_canonical(&model.canonical_repr());
            warn!(error = %reason, "could not derive default parameters");
            let constructor_imports = constructor_imports(imports, type_name(&canonical))
                .into_iter()
                .cloned()
                .collect();
            ModelSection::Failed {
                canonical,
                reason,
                constructor_imports,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Sections;
    use crate::environment::packages::StaticRegistry;
    use crate::errors::{MadError, MadResult};
    use crate::models::{CanonicalRepr, InstalledPackage};

    const SCRIPT: &str = "\
from sklearn.linear_model import LinearRegression
import numpy as np
# import seaborn
from ToolKit import MAD

model = LinearRegression(normalize=True, copy_X=False)
";

    struct BrokenRegistry;

    impl PackageRegistry for BrokenRegistry {
        fn installed_packages(&self) -> MadResult<Vec<InstalledPackage>> {
            Err(MadError::Registry("pip unavailable".to_string()))
        }
    }

    fn defaults() -> DefaultRegistry {
        let mut registry = DefaultRegistry::new();
        registry.register_with("LinearRegression", || {
            Ok(Box::new(CanonicalRepr::new(
                "LinearRegression(copy_X=True, fit_intercept=True, n_jobs=None, normalize=False)",
            )) as Box<dyn Model>)
        });
        registry
    }

    fn script() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), SCRIPT).unwrap();
        file
    }

    #[test]
    fn test_full_report_text() {
        let file = script();
        let model = CanonicalRepr::new(
            "LinearRegression(copy_X=False, fit_intercept=True, n_jobs=None,\n                 normalize=True)",
        );
        let bindings = LocalBindings::new()
            .module("np", "numpy")
            .value("model");
        let packages = StaticRegistry::new(vec![
            InstalledPackage::new("numpy", "1.26.4"),
            InstalledPackage::new("scipy", "1.12.0"),
        ]);
        let defaults = defaults();
        let ctx = ReportContext {
            defaults: &defaults,
            packages: &packages,
            interpreter_version: "3.11.4 (main, Jun  7 2023, 00:00:00) [GCC 11.3.0]",
        };
        let inputs = ReportInputs {
            model: &model,
            source_file: file.path(),
            bindings: &bindings,
        };
        let options = ReportOptions::default().extra_notes("two non-default params");

        let report = Report::assemble(&inputs, &ctx, &options).unwrap();
        assert_eq!(
            report.render(),
            "# Model and parameters:\n\
             \tLinearRegression(\n\t\tcopy_X=False,\n\t\tnormalize=True)\n\
             \n# python version:\n\
             3.11.4 (main, Jun  7 2023, 00:00:00) [GCC 11.3.0]\n\
             \n# pip requirements:\n\
             numpy==1.26.4\n\
             \n# Necessary Imports:\n\
             from sklearn.linear_model import LinearRegression\n\
             import numpy as np\n\
             \n# Extra Notes:\n\
             two non-default params"
        );
    }

    #[test]
    fn test_disabled_sections_are_omitted() {
        let file = script();
        let model = CanonicalRepr::new("LinearRegression(copy_X=True)");
        let bindings = LocalBindings::new();
        let packages = StaticRegistry::default();
        let defaults = defaults();
        let ctx = ReportContext {
            defaults: &defaults,
            packages: &packages,
            interpreter_version: "3.11.4",
        };
        let inputs = ReportInputs {
            model: &model,
            source_file: file.path(),
            bindings: &bindings,
        };
        let options = ReportOptions::default().sections(Sections {
            interpreter_version: false,
            dependency_manifest: false,
            imports: false,
            notes: false,
        });

        let report = Report::assemble(&inputs, &ctx, &options).unwrap();
        assert_eq!(report.sections.len(), 1);
        assert_eq!(
            report.render(),
            "# Model and parameters:\n\tLinearRegression()\n"
        );
    }

    #[test]
    fn test_derivation_failure_renders_placeholder() {
        let file = script();
        let model = CanonicalRepr::new("LinearRegression(normalize=True)");
        let bindings = LocalBindings::new();
        let packages = StaticRegistry::default();
        let defaults = DefaultRegistry::new();
        let ctx = ReportContext {
            defaults: &defaults,
            packages: &packages,
            interpreter_version: "3.11.4",
        };
        let inputs = ReportInputs {
            model: &model,
            source_file: file.path(),
            bindings: &bindings,
        };
        let options = ReportOptions::default().sections(Sections {
            interpreter_version: false,
            dependency_manifest: false,
            imports: false,
            notes: false,
        });

        let report = Report::assemble(&inputs, &ctx, &options).unwrap();
        assert_eq!(
            report.render(),
            "# Model and parameters:\n\
             \tLinearRegression(normalize=True)\n\
             \t# default parameters unavailable: no default factory registered for `LinearRegression`\n\
             \t# constructor import: from sklearn.linear_model import LinearRegression\n"
        );
    }

    #[test]
    fn test_registry_failure_degrades_manifest() {
        let file = script();
        let model = CanonicalRepr::new("LinearRegression()");
        let bindings = LocalBindings::new().module("np", "numpy");
        let defaults = defaults();
        let ctx = ReportContext {
            defaults: &defaults,
            packages: &BrokenRegistry,
            interpreter_version: "3.11.4",
        };
        let inputs = ReportInputs {
            model: &model,
            source_file: file.path(),
            bindings: &bindings,
        };
        let report = Report::assemble(&inputs, &ctx, &ReportOptions::default()).unwrap();
        assert!(report.render().contains(
            "\n# pip requirements:\n# unavailable: Package registry error: pip unavailable\n"
        ));
        assert!(matches!(report.sections[2], Section::Dependencies(Err(_))));
    }

    #[test]
    fn test_missing_source_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("train.py");
        let model = CanonicalRepr::new("LinearRegression()");
        let bindings = LocalBindings::new();
        let packages = StaticRegistry::default();
        let defaults = defaults();
        let ctx = ReportContext {
            defaults: &defaults,
            packages: &packages,
            interpreter_version: "3.11.4",
        };
        let inputs = ReportInputs {
            model: &model,
            source_file: &missing,
            bindings: &bindings,
        };
        let err = Report::assemble(&inputs, &ctx, &ReportOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, MadError::Io(_)));
    }
}
