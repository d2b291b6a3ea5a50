//! CQL compiler error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for compilation operations
pub type Result<T> = std::result::Result<T, CqlError>;

/// Errors that can occur while compiling a CQL query
///
/// Compilation is atomic: any error aborts the whole compile, no partial
/// document is ever produced.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum CqlError {
    /// A clause could not be translated into the target expression tree
    #[error("translation failed: {message}")]
    Translate { message: String },

    /// A boolean connector ended up with a single operand
    #[error("unary expression not allowed: operator {operator}, operand {operand}")]
    UnaryExpression { operator: String, operand: String },

    /// A boolean or comparison operator has no translation table entry.
    /// Indicates a contract violation between parser and engine.
    #[error("unknown operator: {operator}")]
    UnknownOperator { operator: String },

    /// A renderer met an operator it cannot map to a document shape
    #[error("unable to translate operator while building {output}: {operator}")]
    Render { output: String, operator: String },

    /// A `within` comparison operand is not a two-part quoted phrase
    #[error("range within: unable to derive range from {value}")]
    InvalidRange { value: String },

    /// Compile configuration violates a precondition
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CqlError {
    /// Create a translation error
    pub fn translate(message: impl Into<String>) -> Self {
        Self::Translate {
            message: message.into(),
        }
    }

    /// Create a renderer error for an unmappable operator
    pub fn render(output: impl Into<String>, operator: impl ToString) -> Self {
        Self::Render {
            output: output.into(),
            operator: operator.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CqlError::render("elasticsearch query", "SORT");
        assert_eq!(
            err.to_string(),
            "unable to translate operator while building elasticsearch query: SORT"
        );
    }

    #[test]
    fn test_config_error() {
        let err = CqlError::config("global field must not be empty");
        assert!(matches!(err, CqlError::InvalidConfig { .. }));
    }
}
