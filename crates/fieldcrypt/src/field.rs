//! [`FieldAdapter`]: the get/set contract the persistence layer calls on
//! column read and write.
//!
//! Save path: value → `to_text` → length check → pad → encrypt → envelope.
//! Load path: envelope → decrypt → `from_text` (trailing filler ignored) → value.

use std::sync::Arc;

use common::{CodecError, FieldSpec};
use tracing::{debug, warn};

use crate::crypto::{envelope_len, padding, BlockCipherCodec, Envelope, BLOCK_SIZE, MARKER};
use crate::value::{self, PlainValue};

/// Longest UTF-8 encoding of a single character.
const MAX_UTF8_CHAR_LEN: usize = 4;

/// One encrypted column: a declaration bound to a shared codec.
#[derive(Debug, Clone)]
pub struct FieldAdapter {
    spec: FieldSpec,
    max_length: Option<usize>,
    column_capacity: Option<usize>,
    codec: Arc<BlockCipherCodec>,
}

impl FieldAdapter {
    /// Bind `spec` to `codec`, sizing the column for the declared mode.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidFieldSpec`] if the declared max length is
    /// too large to size a column for, or if an explicit column capacity
    /// cannot hold the envelope of every maximum-length value in the declared
    /// mode.
    pub fn new(spec: FieldSpec, codec: Arc<BlockCipherCodec>) -> Result<Self, CodecError> {
        let max_length = spec.effective_max_length();
        let required = max_length
            .map(|n| {
                max_serialized_bytes(&spec, n)
                    .and_then(|bytes| envelope_len(bytes, spec.mode))
                    .ok_or_else(|| {
                        CodecError::InvalidFieldSpec(format!(
                            "max length {n} is too large for a {} column",
                            spec.kind.name()
                        ))
                    })
            })
            .transpose()?;

        let column_capacity = match (spec.column_capacity, required) {
            (Some(cap), Some(req)) if cap < req => {
                return Err(CodecError::InvalidFieldSpec(format!(
                    "column capacity {cap} is below the {req} characters a {}-character {} value needs in {:?} mode",
                    max_length.unwrap_or_default(),
                    spec.kind.name(),
                    spec.mode,
                )));
            }
            (Some(cap), _) => Some(cap),
            (None, req) => req,
        };

        debug!(
            kind = spec.kind.name(),
            mode = ?spec.mode,
            max_length,
            column_capacity,
            "field adapter ready"
        );

        Ok(Self {
            spec,
            max_length,
            column_capacity,
            codec,
        })
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Effective maximum plaintext length in characters; `None` if unbounded.
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Width the backing text column must have; `None` if unbounded.
    pub fn column_capacity(&self) -> Option<usize> {
        self.column_capacity
    }

    /// Returns `true` if `stored` carries the envelope marker.
    pub fn is_encrypted(stored: &str) -> bool {
        stored.starts_with(MARKER)
    }

    /// Called on every column write. `None` passes through unencrypted.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ValueTooLong`] before anything is encrypted if the
    /// value exceeds the declared length or the column capacity, and any value
    /// error raised by serialization.
    pub fn on_save(&self, value: Option<&PlainValue>) -> Result<Option<String>, CodecError> {
        value.map(|v| self.encode(v)).transpose()
    }

    /// Called on every column read. `None` passes through.
    ///
    /// # Errors
    ///
    /// Returns envelope errors for stored text this codec cannot read, and
    /// value errors if the decrypted text does not parse for the field kind.
    pub fn on_load(&self, stored: Option<&str>) -> Result<Option<PlainValue>, CodecError> {
        stored.map(|s| self.decode(s)).transpose()
    }

    /// Encrypt one non-null value into its envelope text.
    pub fn encode(&self, value: &PlainValue) -> Result<String, CodecError> {
        let text = value::to_text(self.spec.kind, value)?;
        self.check_length(&text)?;

        let padded = padding::pad(&text, BLOCK_SIZE);
        let envelope = self.codec.encrypt(&padded, self.spec.mode)?;
        let out = envelope.to_string_repr();

        debug!(
            kind = self.spec.kind.name(),
            mode = ?self.spec.mode,
            envelope_len = out.len(),
            "field encoded"
        );
        Ok(out)
    }

    /// Decrypt one non-null envelope back into a typed value.
    pub fn decode(&self, stored: &str) -> Result<PlainValue, CodecError> {
        let result = Envelope::parse(stored)
            .and_then(|env| self.codec.decrypt(&env))
            .map_err(CodecError::from)
            .and_then(|padded| value::from_text(self.spec.kind, &padded).map_err(CodecError::from));

        if let Err(e) = &result {
            warn!(kind = self.spec.kind.name(), code = e.code(), "field decode failed");
        }
        result
    }

    fn check_length(&self, text: &[u8]) -> Result<(), CodecError> {
        if let Some(max) = self.max_length {
            // `text` is valid UTF-8: count the bytes that start a character.
            let chars = text.iter().filter(|&&b| (b & 0xC0) != 0x80).count();
            if chars > max {
                return Err(CodecError::ValueTooLong {
                    length: chars,
                    capacity: max,
                });
            }
        }
        if let Some(capacity) = self.column_capacity {
            let len = envelope_len(text.len(), self.spec.mode).unwrap_or(usize::MAX);
            if len > capacity {
                return Err(CodecError::ValueTooLong {
                    length: len,
                    capacity,
                });
            }
        }
        Ok(())
    }
}

/// Byte length of the longest legal serialization of `max_chars` characters.
///
/// Textual kinds may hold any character; every other grammar is ASCII.
fn max_serialized_bytes(spec: &FieldSpec, max_chars: usize) -> Option<usize> {
    if spec.kind.is_textual() {
        max_chars.checked_mul(MAX_UTF8_CHAR_LEN)
    } else {
        Some(max_chars)
    }
}
