use thiserror::Error;

/// Errors raised while parsing or evaluating a path
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constant overflow: {0}")]
    ConstantOverflow(String),

    #[error("Unsupported expression: {0}")]
    UnsupportedExpr(String),

    #[error("Index {index} out of range for length {len}")]
    OutOfRange { index: u64, len: usize },

    #[error("Division by zero")]
    DivisionByZero,
}

impl PathError {
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        PathError::Parse {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        PathError::TypeMismatch(message.into())
    }

    pub(crate) fn overflow(message: impl Into<String>) -> Self {
        PathError::ConstantOverflow(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        PathError::UnsupportedExpr(message.into())
    }
}
