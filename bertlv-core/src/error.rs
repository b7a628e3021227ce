use thiserror::Error;

/// Main error type for BER-TLV operations
///
/// Decoding errors carry the absolute byte offset (within the buffer handed
/// to the decoder) at which the problem was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TlvError {
    #[error("Malformed tag at offset {offset}: {reason}")]
    MalformedTag { offset: usize, reason: String },

    #[error("Malformed length at offset {offset}: {reason}")]
    MalformedLength { offset: usize, reason: String },

    #[error("Truncated input at offset {offset}: need {needed} bytes, have {available}")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Trailing garbage at offset {offset}")]
    TrailingGarbage { offset: usize },

    #[error("Indefinite length starting at offset {offset} has no end-of-contents marker")]
    UnterminatedIndefiniteLength { offset: usize },

    #[error("Nesting deeper than {limit} levels at offset {offset}")]
    NestingTooDeep { offset: usize, limit: usize },

    #[error("Invalid construction: {0}")]
    InvalidConstruction(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl TlvError {
    /// Byte offset of a decoding error, `None` for construction and helper errors
    pub fn offset(&self) -> Option<usize> {
        match self {
            TlvError::MalformedTag { offset, .. }
            | TlvError::MalformedLength { offset, .. }
            | TlvError::TruncatedInput { offset, .. }
            | TlvError::TrailingGarbage { offset }
            | TlvError::UnterminatedIndefiniteLength { offset }
            | TlvError::NestingTooDeep { offset, .. } => Some(*offset),
            TlvError::InvalidConstruction(_)
            | TlvError::InvalidHex(_)
            | TlvError::InvalidValue(_) => None,
        }
    }

    pub(crate) fn truncated(offset: usize, needed: usize, data: &[u8]) -> Self {
        TlvError::TruncatedInput {
            offset,
            needed,
            available: data.len().saturating_sub(offset),
        }
    }
}

/// Result type alias for BER-TLV operations
pub type TlvResult<T> = Result<T, TlvError>;
