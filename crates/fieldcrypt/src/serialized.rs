//! [`SerializedField`]: an encrypted column holding any serde-serializable
//! value as JSON.
//!
//! Save path: value → JSON → pad → encrypt → envelope.
//! Load path: envelope → decrypt → JSON up to the terminator → value.
//!
//! JSON escapes every control character inside strings, so the serialized
//! form never contains the padding terminator.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use common::{BlockMode, CodecError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::crypto::{padding, BlockCipherCodec, Envelope, BLOCK_SIZE};

/// One encrypted column of structured values. The column is unbounded.
pub struct SerializedField<T> {
    mode: BlockMode,
    codec: Arc<BlockCipherCodec>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for SerializedField<T> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            codec: Arc::clone(&self.codec),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SerializedField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedField")
            .field("mode", &self.mode)
            .field("value", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T: Serialize + DeserializeOwned> SerializedField<T> {
    pub fn new(mode: BlockMode, codec: Arc<BlockCipherCodec>) -> Self {
        Self {
            mode,
            codec,
            _value: PhantomData,
        }
    }

    pub fn mode(&self) -> BlockMode {
        self.mode
    }

    /// Called on every column write. `None` passes through unencrypted.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encoding`] if the value cannot be represented as
    /// JSON (e.g. a map with non-string keys).
    pub fn on_save(&self, value: Option<&T>) -> Result<Option<String>, CodecError> {
        value.map(|v| self.encode(v)).transpose()
    }

    /// Called on every column read. `None` passes through.
    ///
    /// # Errors
    ///
    /// Returns envelope errors for stored text this codec cannot read, and
    /// [`CodecError::Format`] if the decrypted JSON does not match `T`.
    pub fn on_load(&self, stored: Option<&str>) -> Result<Option<T>, CodecError> {
        stored.map(|s| self.decode(s)).transpose()
    }

    fn encode(&self, value: &T) -> Result<String, CodecError> {
        let json = serde_json::to_vec(value)
            .map_err(|e| CodecError::Encoding(format!("value is not representable as JSON: {e}")))?;
        let padded = padding::pad(&json, BLOCK_SIZE);
        let out = self.codec.encrypt(&padded, self.mode)?.to_string_repr();

        debug!(mode = ?self.mode, envelope_len = out.len(), "serialized field encoded");
        Ok(out)
    }

    fn decode(&self, stored: &str) -> Result<T, CodecError> {
        let result = Envelope::parse(stored)
            .and_then(|env| self.codec.decrypt(&env))
            .map_err(CodecError::from)
            .and_then(|padded| {
                // serde_json error positions only; the message never carries input.
                serde_json::from_slice(padding::terminated(&padded)).map_err(|e| {
                    CodecError::Format(format!(
                        "stored JSON does not match the field type at line {} column {}",
                        e.line(),
                        e.column()
                    ))
                })
            });

        if let Err(e) = &result {
            warn!(code = e.code(), "serialized field decode failed");
        }
        result
    }
}
