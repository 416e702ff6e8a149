//! Common error types shared across crates.

use thiserror::Error;

/// Caller-facing error type for every encode/decode operation.
///
/// Variants fall into three groups:
/// - [`CodecError::ValueTooLong`] → caller-fixable, raised before any write
/// - envelope errors (`MalformedEnvelope`, `UnknownMode`, `CorruptCiphertext`)
///   → stored data does not match this codec (key mismatch, corruption, schema drift)
/// - value errors (`Format`, `Validation`, `Encoding`, `TypeMismatch`)
///   → the plaintext value is not legal for the declared field kind
/// - configuration errors (`InvalidFieldSpec`, `KeyUnavailable`)
///
/// None of these are transient; callers must not retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The value does not fit the declared field length or column capacity.
    #[error("value too long: {length} exceeds capacity {capacity}")]
    ValueTooLong { length: usize, capacity: usize },

    /// The stored text is not a recognisable envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The envelope carries a mode tag this codec does not implement.
    #[error("unknown cipher mode: {0}")]
    UnknownMode(String),

    /// The decoded payload is not a whole number of cipher blocks.
    #[error("corrupt ciphertext: {0}")]
    CorruptCiphertext(String),

    /// The plaintext does not follow the grammar for its kind.
    #[error("format error: {0}")]
    Format(String),

    /// The plaintext fails the semantic check for its subtype (email, phone, SSN).
    #[error("validation error: {0}")]
    Validation(String),

    /// The plaintext bytes are not valid UTF-8, or the text contains a NUL.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A value of one variant was handed to a field of another kind.
    #[error("type mismatch: field expects {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The field declaration cannot be satisfied (e.g. column too narrow).
    #[error("invalid field spec: {0}")]
    InvalidFieldSpec(String),

    /// The column key could not be derived from the configured secret.
    #[error("key unavailable: {0}")]
    KeyUnavailable(String),
}

impl CodecError {
    /// Short machine-readable code used in line-protocol error records.
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::ValueTooLong { .. } => "value_too_long",
            CodecError::MalformedEnvelope(_) => "malformed_envelope",
            CodecError::UnknownMode(_) => "unknown_mode",
            CodecError::CorruptCiphertext(_) => "corrupt_ciphertext",
            CodecError::Format(_) => "format_error",
            CodecError::Validation(_) => "validation_error",
            CodecError::Encoding(_) => "encoding_error",
            CodecError::TypeMismatch { .. } => "type_mismatch",
            CodecError::InvalidFieldSpec(_) => "invalid_field_spec",
            CodecError::KeyUnavailable(_) => "key_unavailable",
        }
    }

    /// Returns `true` when the failure stems from the caller's input rather
    /// than from stored data or configuration.
    pub fn is_caller_fixable(&self) -> bool {
        matches!(
            self,
            CodecError::ValueTooLong { .. }
                | CodecError::Format(_)
                | CodecError::Validation(_)
                | CodecError::Encoding(_)
                | CodecError::TypeMismatch { .. }
        )
    }
}
