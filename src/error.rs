//! Error types for admittance assembly.

use thiserror::Error;

use crate::dense::MatBuilderError;

#[derive(Debug, Error)]
pub enum YbusError {
    /// The topology declares no reference bus, or it is not part of the
    /// collected bus set, or its phases are not all energized.
    #[error("reference bus error: {0}")]
    MissingReference(String),

    #[error("unknown bus {bus:?} referenced by {element}")]
    UnknownBus { element: String, bus: String },

    #[error("unknown circuit element {0:?}")]
    UnknownElement(String),

    #[error("singular matrix: {0}")]
    Singular(String),

    #[error("invalid shape for {element}: {reason}")]
    Shape { element: String, reason: String },

    #[error("inconsistent network model: {0}")]
    Inconsistent(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<MatBuilderError> for YbusError {
    fn from(err: MatBuilderError) -> Self {
        YbusError::Shape {
            element: "matrix".to_string(),
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, YbusError>;
