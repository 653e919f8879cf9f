//! Shared typed models used across the differ, scanner, and report layers.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 1. Model handles
// ---------------------------------------------------------------------------

/// Anything that can render itself as a constructor call,
/// `Name(arg1=val1, arg2=val2, ...)`.
///
/// The rendering must be deterministic and list constructor arguments in a
/// stable order; the differ compares renderings token by token.
pub trait Model {
    fn canonical_repr(&self) -> String;
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn canonical_repr(&self) -> String {
        (**self).canonical_repr()
    }
}

impl<M: Model + ?Sized> Model for &M {
    fn canonical_repr(&self) -> String {
        (**self).canonical_repr()
    }
}

/// A model known only through an already-rendered canonical string, e.g. the
/// `str()` of a Python estimator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRepr(pub String);

impl CanonicalRepr {
    pub fn new(repr: impl Into<String>) -> Self {
        Self(repr.into())
    }
}

impl Model for CanonicalRepr {
    fn canonical_repr(&self) -> String {
        self.0.clone()
    }
}

/// Render `type_name(k1=v1, k2=v2)` from ordered key/value pairs.
pub fn canonical_call<K, V>(type_name: &str, params: impl IntoIterator<Item = (K, V)>) -> String
where
    K: fmt::Display,
    V: fmt::Display,
{
    let args: Vec<String> = params
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    format!("{type_name}({})", args.join(", "))
}

// ---------------------------------------------------------------------------
// 2. ParameterSet
// ---------------------------------------------------------------------------

/// Ordered `key=value` tokens split out of a canonical string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub tokens: Vec<String>,
}

impl ParameterSet {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Tokens of `self` absent from `baseline`, in `self`'s order. Duplicates
    /// in `self` are kept.
    pub fn difference(&self, baseline: &ParameterSet) -> ParameterSet {
        ParameterSet {
            tokens: self
                .tokens
                .iter()
                .filter(|t| !baseline.contains(t))
                .cloned()
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// 3. ImportLine
// ---------------------------------------------------------------------------

/// A source line that passed the import filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportLine {
    /// 1-based line number in the scanned file.
    pub line_number: usize,
    pub text: String,
}

impl fmt::Display for ImportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ---------------------------------------------------------------------------
// 4. Local bindings
// ---------------------------------------------------------------------------

/// The value a caller-side name is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Binding {
    /// A live module object with its declared dotted name.
    Module { name: String },
    /// Anything else. Only the name is kept.
    Value,
}

/// Snapshot of the caller's name -> value bindings, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalBindings {
    entries: IndexMap<String, Binding>,
}

impl LocalBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `alias` to the module declared as `module_name`.
    pub fn module(mut self, alias: impl Into<String>, module_name: impl Into<String>) -> Self {
        self.insert(
            alias,
            Binding::Module {
                name: module_name.into(),
            },
        );
        self
    }

    /// Bind `alias` to a non-module value.
    pub fn value(mut self, alias: impl Into<String>) -> Self {
        self.insert(alias, Binding::Value);
        self
    }

    pub fn insert(&mut self, alias: impl Into<String>, binding: Binding) {
        self.entries.insert(alias.into(), binding);
    }

    pub fn get(&self, alias: &str) -> Option<&Binding> {
        self.entries.get(alias)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `(alias, module name)` for every binding that is a module.
    pub fn modules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter_map(|(alias, binding)| match binding {
            Binding::Module { name } => Some((alias, name.as_str())),
            Binding::Value => None,
        })
    }
}

// ---------------------------------------------------------------------------
// 5. Packages and manifest rows
// ---------------------------------------------------------------------------

/// One entry of an installed-package registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
}

impl InstalledPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// An installed package matched to a module bound in the caller's scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRow {
    pub name: String,
    pub version: String,
    /// Local names the module was bound under.
    pub aliases: Vec<String>,
}

impl fmt::Display for DependencyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}
