//! Registry of zero-argument factories used to build default instances.

use std::panic::{self, AssertUnwindSafe};

use indexmap::IndexMap;
use tracing::debug;

use crate::errors::DerivationError;
use crate::model::canonical::{normalize_canonical, type_name};
use crate::models::Model;

/// Builds a default instance of one model type.
pub type DefaultFactory = Box<dyn Fn() -> Result<Box<dyn Model>, DerivationError>>;

/// Maps a type name, as it appears at the head of a canonical string, to a
/// factory for its zero-argument instance.
#[derive(Default)]
pub struct DefaultRegistry {
    factories: IndexMap<String, DefaultFactory>,
}

impl DefaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `M::default()`, keyed by the type name its canonical string
    /// reports.
    pub fn register_default<M>(&mut self) -> &mut Self
    where
        M: Model + Default + 'static,
    {
        let name = type_name(&normalize_canonical(&M::default().canonical_repr())).to_string();
        self.register_with(name, || Ok(Box::new(M::default()) as Box<dyn Model>))
    }

    /// Register an arbitrary factory under `type_name`. A later registration
    /// for the same name replaces the earlier one.
    pub fn register_with<F>(&mut self, type_name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn Model>, DerivationError> + 'static,
    {
        let type_name = type_name.into();
        debug!(type_name = %type_name, "registered default factory");
        self.factories.insert(type_name, Box::new(factory));
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build the default instance for `type_name`. Factory errors and panics
    /// both come back as [`DerivationError`].
    pub fn instantiate(&self, type_name: &str) -> Result<Box<dyn Model>, DerivationError> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| DerivationError::Unregistered {
                type_name: type_name.to_string(),
            })?;

        match panic::catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                Err(DerivationError::Panicked {
                    type_name: type_name.to_string(),
                    message,
                })
            }
        }
    }
}

impl std::fmt::Debug for DefaultRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
