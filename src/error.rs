//! Error types for the CQL value codec

use std::fmt;
use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for decode/encode/type-descriptor operations
#[derive(Error, Debug)]
pub enum Error {
    /// Not enough bytes remained in the input to satisfy a read
    #[error("truncated input: needed {needed} byte(s), {available} available")]
    Truncated { needed: usize, available: usize },

    /// A length prefix disagreed with the bytes actually available for a fixed-width type
    #[error("length mismatch: {type_name} expects {expected} byte(s), got {actual}")]
    LengthMismatch {
        type_name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A type tag (or legacy marshal class name) did not match any known CQL type
    #[error("unknown type tag: {0}")]
    UnknownType(String),

    /// A numeric value fell outside the range its target representation can hold
    #[error("value out of range: {0}")]
    RangeError(String),

    /// Textual input (UTF-8 string, UUID literal, INET literal, decimal literal) was malformed
    #[error("malformed text: {0}")]
    MalformedText(String),

    /// An arithmetic operation (container/UDT nesting, length accumulation) overflowed
    #[error("overflow: {0}")]
    Overflow(String),
}

impl Error {
    pub fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }

    pub fn length_mismatch(type_name: &'static str, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            type_name,
            expected,
            actual,
        }
    }

    pub fn unknown_type(msg: impl Into<String>) -> Self {
        Self::UnknownType(msg.into())
    }

    pub fn range(msg: impl Into<String>) -> Self {
        Self::RangeError(msg.into())
    }

    pub fn malformed_text(msg: impl Into<String>) -> Self {
        Self::MalformedText(msg.into())
    }

    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::Overflow(msg.into())
    }

    /// Whether a caller could plausibly retry after addressing the input (vs. a structural bug)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Truncated { .. } => true,
            Error::LengthMismatch { .. } => false,
            Error::UnknownType(_) => true,
            Error::RangeError(_) => true,
            Error::MalformedText(_) => true,
            Error::Overflow(_) => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Truncated { .. } => ErrorCategory::Framing,
            Error::LengthMismatch { .. } => ErrorCategory::Framing,
            Error::UnknownType(_) => ErrorCategory::Schema,
            Error::RangeError(_) => ErrorCategory::Value,
            Error::MalformedText(_) => ErrorCategory::Value,
            Error::Overflow(_) => ErrorCategory::Value,
        }
    }
}

/// Error categories for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Byte-framing problems: truncation, length-prefix mismatches
    Framing,
    /// Type-descriptor / schema problems
    Schema,
    /// Problems with a decoded or to-be-encoded value itself
    Value,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Framing => "Framing",
            ErrorCategory::Schema => "Schema",
            ErrorCategory::Value => "Value",
        };
        write!(f, "{}", name)
    }
}
