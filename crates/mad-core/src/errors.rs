//! Error types for the MAD core library.

/// Failure to derive a model's default parameters.
///
/// These never abort a report; the assembler renders them as a placeholder
/// in the model section.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DerivationError {
    #[error("no default factory registered for `{type_name}`")]
    Unregistered { type_name: String },

    #[error("`{type_name}()` failed: {message}")]
    Construction { type_name: String, message: String },

    #[error("`{type_name}()` panicked: {message}")]
    Panicked { type_name: String, message: String },

    #[error("canonical string has no type name: {0:?}")]
    Malformed(String),
}

/// Top-level error enum for the MAD core library.
#[derive(Debug, thiserror::Error)]
pub enum MadError {
    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Package registry error: {0}")]
    Registry(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Persist error: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(feature = "python")]
impl From<MadError> for pyo3::PyErr {
    fn from(err: MadError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};

        match &err {
            MadError::Io(_) | MadError::Persist(_) => PyIOError::new_err(err.to_string()),
            MadError::Derivation(_) | MadError::Registry(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
            MadError::Config(_) | MadError::Json(_) | MadError::Toml(_) => {
                PyValueError::new_err(err.to_string())
            }
        }
    }
}

pub type MadResult<T> = Result<T, MadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_error_converts() {
        let err: MadError = DerivationError::Unregistered {
            type_name: "Ridge".to_string(),
        }
        .into();
        assert!(matches!(err, MadError::Derivation(_)));
        assert_eq!(
            err.to_string(),
            "Derivation error: no default factory registered for `Ridge`"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MadError = io.into();
        assert!(err.to_string().starts_with("IO error:"));
    }
}
