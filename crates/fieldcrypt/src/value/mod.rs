//! Typed plaintext values and their canonical text forms.
//!
//! # Module invariants
//!
//! - **No cipher dependencies.** From `crate::crypto` only the padding
//!   terminator is used: [`TERMINATOR`](crate::crypto::padding::TERMINATOR)
//!   to reject text that contains it, and
//!   [`terminated`](crate::crypto::padding::terminated) to bound the Text
//!   grammar when parsing.
//! - Every grammar is self-terminating: a parser consumes only its own prefix
//!   and ignores whatever follows (the filler appended by the padding layer).
//! - Error messages never echo the plaintext.

pub mod serializer;
pub mod validate;

pub use serializer::{from_text, parse_exact, parse_prefix, to_text};

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use common::CodecError;
use thiserror::Error;

/// A typed application value, as handed to or returned from a field.
#[derive(Debug, Clone, PartialEq)]
pub enum PlainValue {
    Text(String),
    Integer(i64),
    BigInteger(i128),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl PlainValue {
    /// Variant name used in type-mismatch errors.
    pub fn variant_name(&self) -> &'static str {
        match self {
            PlainValue::Text(_) => "text",
            PlainValue::Integer(_) => "integer",
            PlainValue::BigInteger(_) => "big_integer",
            PlainValue::Float(_) => "float",
            PlainValue::Date(_) => "date",
            PlainValue::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for PlainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlainValue::Text(s) => f.write_str(s),
            PlainValue::Integer(v) => write!(f, "{v}"),
            PlainValue::BigInteger(v) => write!(f, "{v}"),
            PlainValue::Float(v) => write!(f, "{v:e}"),
            PlainValue::Date(d) => write!(f, "{}", d.format(serializer::DATE_FORMAT)),
            PlainValue::DateTime(dt) => write!(f, "{}", dt.format(serializer::DATETIME_FORMAT)),
        }
    }
}

impl From<&str> for PlainValue {
    fn from(s: &str) -> Self {
        PlainValue::Text(s.to_owned())
    }
}

impl From<String> for PlainValue {
    fn from(s: String) -> Self {
        PlainValue::Text(s)
    }
}

impl From<i64> for PlainValue {
    fn from(v: i64) -> Self {
        PlainValue::Integer(v)
    }
}

impl From<i128> for PlainValue {
    fn from(v: i128) -> Self {
        PlainValue::BigInteger(v)
    }
}

impl From<f64> for PlainValue {
    fn from(v: f64) -> Self {
        PlainValue::Float(v)
    }
}

impl From<NaiveDate> for PlainValue {
    fn from(d: NaiveDate) -> Self {
        PlainValue::Date(d)
    }
}

impl From<NaiveDateTime> for PlainValue {
    fn from(dt: NaiveDateTime) -> Self {
        PlainValue::DateTime(dt)
    }
}

/// Errors produced by the value layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Text does not follow the grammar for its kind.
    #[error("{0}")]
    Format(String),

    /// Text does not satisfy the subtype's pattern.
    #[error("{0}")]
    Validation(String),

    /// Bytes are not valid UTF-8, or text contains a NUL.
    #[error("{0}")]
    Encoding(String),

    /// Value variant does not match the field kind.
    #[error("field expects {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl From<ValueError> for CodecError {
    fn from(err: ValueError) -> Self {
        match err {
            ValueError::Format(m) => CodecError::Format(m),
            ValueError::Validation(m) => CodecError::Validation(m),
            ValueError::Encoding(m) => CodecError::Encoding(m),
            ValueError::TypeMismatch { expected, found } => {
                CodecError::TypeMismatch { expected, found }
            }
        }
    }
}
