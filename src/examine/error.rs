//! Errors raised while examining memory in a chosen byte order.

use thiserror::Error;

use crate::core::memory::MemoryError;

/// Errors that abort a single `box` invocation
#[derive(Error, Debug)]
pub enum ExamineError {
    #[error("Invalid format argument '{token}': {reason}")]
    Format { token: String, reason: String },

    #[error("Missing address expression. Check `help box`.")]
    AddressExpressionMissing,

    #[error("Could not detect endianness")]
    EndiannessUnknown,

    #[error("Could not examine memory. {0}")]
    MemoryRead(#[from] MemoryError),

    #[error("Could not convert data at '{field}': {reason}")]
    Conversion { field: String, reason: String },
}

impl ExamineError {
    pub(crate) fn format(token: &str, reason: impl Into<String>) -> Self {
        Self::Format {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conversion(field: &str, reason: impl Into<String>) -> Self {
        Self::Conversion {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
