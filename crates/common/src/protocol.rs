//! Field declarations and the line-protocol records emitted by `fieldctl`.
//!
//! Declarations are plain data: the persistence layer builds one
//! [`FieldSpec`] per encrypted column and hands it to the codec at
//! construction time.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field declarations
// ---------------------------------------------------------------------------

/// Declared semantic type of an encrypted column.
///
/// `Email`, `UsPhone` and `UsSsn` share the `Text` wire encoding; they only
/// add a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    UsPhone,
    UsSsn,
    Integer,
    BigInteger,
    Float,
    Date,
    #[serde(rename = "datetime", alias = "date_time")]
    DateTime,
}

/// Semantic subtype tag. Affects validation only, never the wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubType {
    Generic,
    Email,
    UsPhone,
    UsSsn,
}

impl FieldKind {
    /// Every kind, in declaration order.
    pub const ALL: [FieldKind; 9] = [
        FieldKind::Text,
        FieldKind::Email,
        FieldKind::UsPhone,
        FieldKind::UsSsn,
        FieldKind::Integer,
        FieldKind::BigInteger,
        FieldKind::Float,
        FieldKind::Date,
        FieldKind::DateTime,
    ];

    /// Lower-case name, matching the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::UsPhone => "us_phone",
            FieldKind::UsSsn => "us_ssn",
            FieldKind::Integer => "integer",
            FieldKind::BigInteger => "big_integer",
            FieldKind::Float => "float",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
        }
    }

    pub fn subtype(self) -> SubType {
        match self {
            FieldKind::Email => SubType::Email,
            FieldKind::UsPhone => SubType::UsPhone,
            FieldKind::UsSsn => SubType::UsSsn,
            _ => SubType::Generic,
        }
    }

    /// `true` for every kind carried as free-form text on the wire.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            FieldKind::Text | FieldKind::Email | FieldKind::UsPhone | FieldKind::UsSsn
        )
    }

    /// Maximum serialized length (in characters) when the declaration does
    /// not specify one. `None` means unbounded.
    ///
    /// - `Integer`: `-9223372036854775808` is 20 chars
    /// - `BigInteger`: `i128::MIN` is 40 chars
    /// - `Float`: `-2.2250738585072014e-308` is 24 chars
    /// - `DateTime`: `YYYY-MM-DD HH:MM:SS.ffffff` is 26 chars
    pub fn default_max_length(self) -> Option<usize> {
        match self {
            FieldKind::Text => None,
            FieldKind::Email => Some(255),
            FieldKind::UsPhone => Some(20),
            FieldKind::UsSsn => Some(11),
            FieldKind::Integer => Some(20),
            FieldKind::BigInteger => Some(40),
            FieldKind::Float => Some(24),
            FieldKind::Date => Some(10),
            FieldKind::DateTime => Some(26),
        }
    }
}

impl std::str::FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        FieldKind::ALL
            .into_iter()
            .find(|k| k.name() == lowered)
            .ok_or_else(|| format!("unknown field kind: {s}"))
    }
}

/// Block cipher mode used for a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMode {
    /// Independent per-block encryption, no IV. Envelope carries no mode tag.
    #[default]
    Ecb,
    /// Cipher block chaining with a fresh random IV per value.
    Cbc,
}

impl BlockMode {
    /// Mode tag written into the envelope; `None` for the default mode.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            BlockMode::Ecb => None,
            BlockMode::Cbc => Some("MODE_CBC"),
        }
    }

    /// Resolve an envelope mode tag. The explicit `MODE_ECB` tag is accepted
    /// even though it is never written.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "MODE_ECB" => Some(BlockMode::Ecb),
            "MODE_CBC" => Some(BlockMode::Cbc),
            _ => None,
        }
    }
}

/// Construction-time declaration of one encrypted column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Semantic type of the column.
    pub kind: FieldKind,
    /// Maximum plaintext length in characters. Falls back to
    /// [`FieldKind::default_max_length`].
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Cipher mode.
    #[serde(default)]
    pub mode: BlockMode,
    /// Width of the backing text column. Computed from `max_length` and
    /// `mode` when absent.
    #[serde(default)]
    pub column_capacity: Option<usize>,
}

impl FieldSpec {
    /// Declaration with defaults for everything but the kind.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            max_length: None,
            mode: BlockMode::default(),
            column_capacity: None,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_mode(mut self, mode: BlockMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_column_capacity(mut self, capacity: usize) -> Self {
        self.column_capacity = Some(capacity);
        self
    }

    /// Effective maximum plaintext length.
    pub fn effective_max_length(&self) -> Option<usize> {
        self.max_length.or_else(|| self.kind.default_max_length())
    }
}

// ---------------------------------------------------------------------------
// Line protocol
// ---------------------------------------------------------------------------

/// Successful output record: one per processed input line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueRecord {
    /// Envelope text (encode) or canonical plaintext (decode). `None` for a
    /// null input.
    pub value: Option<String>,
}

/// Failure record emitted in place of a [`ValueRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Short machine-readable error code (e.g. `"value_too_long"`).
    pub code: String,
    /// Human-readable description. Never contains plaintext.
    pub message: String,
}

impl ErrorRecord {
    /// Construct an [`ErrorRecord`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
