//! Error taxonomy shared by every stage of an optimisation run.

use thiserror::Error;

/// Errors that can occur while validating inputs or evaluating the models.
///
/// None of these are recoverable within a run: the engine reports them on the
/// event channel and returns without producing a result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DesignError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data error in {catalog} catalog, row {index} ('{name}'): {message}")]
    Data {
        catalog: &'static str,
        index: usize,
        name: String,
        message: String,
    },

    #[error("Numeric error: {0}")]
    Numeric(String),

    #[error("Optimisation aborted before iteration {iteration}")]
    Aborted { iteration: usize },
}

impl DesignError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        DesignError::Configuration(message.into())
    }

    pub(crate) fn numeric(message: impl Into<String>) -> Self {
        DesignError::Numeric(message.into())
    }
}

/// Reject a non-finite intermediate value before it reaches a comparison.
pub(crate) fn ensure_finite(value: f64, what: &str) -> Result<f64, DesignError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DesignError::numeric(format!("{} is not finite ({})", what, value)))
    }
}
