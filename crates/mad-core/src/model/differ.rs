//! Non-default parameter derivation.
//!
//! A model's canonical string is diffed against the canonical string of a
//! zero-argument instance of the same type. Composite models, whose
//! parameters are themselves constructor calls, are reported verbatim.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DerivationError;
use crate::model::canonical::{
    break_after_separators, normalize_canonical, split_parameters, type_name, SplitMode,
    PARAM_INDENT,
};
use crate::model::defaults::DefaultRegistry;
use crate::models::{ImportLine, Model, ParameterSet};

/// Substring that marks a canonical string as a composite model.
pub const DEFAULT_COMPOSITE_MARKER: &str = "Pipeline";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferOptions {
    pub composite_marker: String,
    pub split_mode: SplitMode,
}

impl Default for DifferOptions {
    fn default() -> Self {
        Self {
            composite_marker: DEFAULT_COMPOSITE_MARKER.to_string(),
            split_mode: SplitMode::Naive,
        }
    }
}

impl DifferOptions {
    pub fn composite_marker(mut self, marker: impl Into<String>) -> Self {
        self.composite_marker = marker.into();
        self
    }

    pub fn split_mode(mut self, mode: SplitMode) -> Self {
        self.split_mode = mode;
        self
    }
}

/// Result of diffing one model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelInfo {
    /// Parameters that differ from the type's zero-argument instance.
    NonDefault {
        type_name: String,
        params: ParameterSet,
    },
    /// A composite model, already broken over lines.
    Composite { rendered: String },
}

impl ModelInfo {
    /// The model line as it appears in the report.
    pub fn render(&self) -> String {
        match self {
            ModelInfo::Composite { rendered } => rendered.clone(),
            ModelInfo::NonDefault { type_name, params } if params.is_empty() => {
                format!("{type_name}()")
            }
            ModelInfo::NonDefault { type_name, params } => {
                let sep = format!(",{PARAM_INDENT}");
                format!(
                    "{type_name}({PARAM_INDENT}{})",
                    params.tokens.join(sep.as_str())
                )
            }
        }
    }
}

pub struct ParameterDiffer<'a> {
    registry: &'a DefaultRegistry,
    options: DifferOptions,
}

impl<'a> ParameterDiffer<'a> {
    pub fn new(registry: &'a DefaultRegistry) -> Self {
        Self::with_options(registry, DifferOptions::default())
    }

    pub fn with_options(registry: &'a DefaultRegistry, options: DifferOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &DifferOptions {
        &self.options
    }

    /// Derive the non-default parameters of `model`.
    pub fn diff_params(&self, model: &dyn Model) -> Result<ModelInfo, DerivationError> {
        let normalized = normalize_canonical(&model.canonical_repr());

        if !self.options.composite_marker.is_empty()
            && normalized.contains(self.options.composite_marker.as_str())
        {
            debug!(marker = %self.options.composite_marker, "composite model, skipping diff");
            return Ok(ModelInfo::Composite {
                rendered: break_after_separators(&normalized, self.options.split_mode),
            });
        }

        let name = type_name(&normalized);
        if name.is_empty() {
            return Err(DerivationError::Malformed(normalized));
        }

        let default_model = self.registry.instantiate(name)?;
        let default_normalized = normalize_canonical(&default_model.canonical_repr());

        let params = split_parameters(&normalized, self.options.split_mode);
        let baseline = split_parameters(&default_normalized, self.options.split_mode);
        let non_default = params.difference(&baseline);
        debug!(
            type_name = name,
            total = params.len(),
            non_default = non_default.len(),
            "diffed model parameters"
        );

        Ok(ModelInfo::NonDefault {
            type_name: name.to_string(),
            params: non_default,
        })
    }
}

/// Import lines that mention `type_name`, i.e. the lines that bring its
/// constructor into scope.
pub fn constructor_imports<'i>(imports: &'i [ImportLine], type_name: &str) -> Vec<&'i ImportLine> {
    if type_name.is_empty() {
        return Vec::new();
    }
    imports
        .iter()
        .filter(|line| line.text.contains(type_name))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{canonical_call, CanonicalRepr};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct Regressor {
        a: i32,
        b: i32,
        c: i32,
    }

    impl Default for Regressor {
        fn default() -> Self {
            Self { a: 1, b: 0, c: 3 }
        }
    }

    impl Model for Regressor {
        fn canonical_repr(&self) -> String {
            canonical_call("Regressor", [("a", self.a), ("b", self.b), ("c", self.c)])
        }
    }

    fn registry() -> DefaultRegistry {
        let mut registry = DefaultRegistry::new();
        registry.register_default::<Regressor>();
        registry
    }

    #[test]
    fn test_default_instance_has_no_non_defaults() {
        let registry = registry();
        let info = ParameterDiffer::new(&registry)
            .diff_params(&Regressor::default())
            .unwrap();
        assert_eq!(
            info,
            ModelInfo::NonDefault {
                type_name: "Regressor".to_string(),
                params: ParameterSet::default(),
            }
        );
        assert_eq!(info.render(), "Regressor()");
    }

    #[test]
    fn test_only_changed_parameter_is_reported() {
        let registry = registry();
        let model = Regressor { a: 1, b: 2, c: 3 };
        let info = ParameterDiffer::new(&registry).diff_params(&model).unwrap();
        match &info {
            ModelInfo::NonDefault { params, .. } => assert_eq!(params.tokens, vec!["b=2"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(info.render(), "Regressor(\n\t\tb=2)");
    }

    #[test]
    fn test_render_keeps_instance_order() {
        let registry = registry();
        let model = Regressor { a: 7, b: 0, c: 9 };
        let info = ParameterDiffer::new(&registry).diff_params(&model).unwrap();
        assert_eq!(info.render(), "Regressor(\n\t\ta=7,\n\t\tc=9)");
    }

    #[test]
    fn test_whitespace_in_rendering_is_ignored() {
        let mut registry = DefaultRegistry::new();
        registry.register_with("LinearRegression", || {
            Ok(Box::new(CanonicalRepr::new(
                "LinearRegression(copy_X=True, fit_intercept=True,\n    normalize=False)",
            )) as Box<dyn Model>)
        });
        let model = CanonicalRepr::new(
            "LinearRegression(copy_X=False, fit_intercept=True,\n                 normalize=True)",
        );
        let info = ParameterDiffer::new(&registry).diff_params(&model).unwrap();
        assert_eq!(
            info.render(),
            "LinearRegression(\n\t\tcopy_X=False,\n\t\tnormalize=True)"
        );
    }

    #[test]
    fn test_composite_never_instantiates_default() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut registry = DefaultRegistry::new();
        registry.register_with("Pipeline", move || {
            counter.set(counter.get() + 1);
            Ok(Box::new(CanonicalRepr::new("Pipeline()")) as Box<dyn Model>)
        });

        let model = CanonicalRepr::new("Pipeline(steps=[('scale', StandardScaler()), ('clf', SVC())])");
        let info = ParameterDiffer::new(&registry).diff_params(&model).unwrap();

        assert_eq!(calls.get(), 0);
        assert_eq!(
            info.render(),
            "Pipeline(steps=[('scale',\n\t\tStandardScaler()),\n\t\t('clf',\n\t\tSVC())])"
        );
    }

    #[test]
    fn test_custom_composite_marker() {
        let registry = DefaultRegistry::new();
        let differ = ParameterDiffer::with_options(
            &registry,
            DifferOptions::default().composite_marker("Stacking"),
        );
        let info = differ
            .diff_params(&CanonicalRepr::new("StackingRegressor(estimators=[a,b])"))
            .unwrap();
        assert!(matches!(info, ModelInfo::Composite { .. }));
    }

    #[test]
    fn test_unregistered_type_fails_derivation() {
        let registry = DefaultRegistry::new();
        let err = ParameterDiffer::new(&registry)
            .diff_params(&CanonicalRepr::new("SVC(C=2.0)"))
            .err()
            .unwrap();
        assert!(matches!(err, DerivationError::Unregistered { .. }));
    }

    #[test]
    fn test_missing_type_name_is_malformed() {
        let registry = DefaultRegistry::new();
        let err = ParameterDiffer::new(&registry)
            .diff_params(&CanonicalRepr::new("(a=1)"))
            .err()
            .unwrap();
        assert_eq!(err, DerivationError::Malformed("(a=1)".to_string()));
    }

    #[test]
    fn test_nested_split_diffs_whole_sub_estimators() {
        let mut registry = DefaultRegistry::new();
        registry.register_with("Bagging", || {
            Ok(Box::new(CanonicalRepr::new("Bagging(base=Tree(depth=None,leaf=1),n=10)"))
                as Box<dyn Model>)
        });
        let model = CanonicalRepr::new("Bagging(base=Tree(depth=3,leaf=1),n=10)");
        let differ = ParameterDiffer::with_options(
            &registry,
            DifferOptions::default().split_mode(SplitMode::Nested),
        );
        let info = differ.diff_params(&model).unwrap();
        assert_eq!(info.render(), "Bagging(\n\t\tbase=Tree(depth=3,leaf=1))");
    }

    #[test]
    fn test_constructor_imports_match_type_name() {
        let imports = vec![
            ImportLine {
                line_number: 1,
                text: "import numpy as np".to_string(),
            },
            ImportLine {
                line_number: 2,
                text: "from sklearn.linear_model import LinearRegression".to_string(),
            },
        ];
        let found = constructor_imports(&imports, "LinearRegression");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line_number, 2);
        assert!(constructor_imports(&imports, "").is_empty());
    }
}
