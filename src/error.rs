use serde::Serialize;
use thiserror::Error;

/// Fatal translation failures. Unsupported constructs are not errors; they are
/// reported as [`Degradation`]s next to the generated code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("Internal inconsistency: {message}")]
    Internal { message: String },
}

impl TranslateError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// One placeholder emitted for a construct that has no translation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub kind: String,
    pub line: usize,
    /// `global` or the name of the enclosing function.
    pub scope: String,
}
