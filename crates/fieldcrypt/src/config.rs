//! Codec configuration.
//!
//! The secret is handed to the codec once, at construction, through an
//! explicitly built [`CodecConfig`]. The caller owns the config for the
//! codec's whole lifetime; nothing here reads process-global state.

use thiserror::Error;

/// Minimum accepted secret length in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Errors produced while validating a [`CodecConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The secret is empty or whitespace only.
    #[error("secret is required and must not be empty")]
    EmptySecret,

    /// The secret is shorter than [`MIN_SECRET_LEN`].
    #[error("secret must be at least {MIN_SECRET_LEN} bytes, got {0}")]
    SecretTooShort(usize),
}

/// Immutable codec configuration.
#[derive(Clone)]
pub struct CodecConfig {
    /// Passphrase from which the column key is derived. **Required.**
    secret: String,
}

impl CodecConfig {
    /// Build a configuration from a secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort(self.secret.len()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
