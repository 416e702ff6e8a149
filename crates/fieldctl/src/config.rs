//! Configuration loading and validation for `fieldctl`.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use common::{BlockMode, FieldKind, FieldSpec};
use fieldcrypt::CodecConfig;
use serde::Deserialize;

/// Validated `fieldctl` configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Passphrase the column key is derived from. **Required.**
    pub field_secret: String,

    /// Declared kind of the column being processed.
    #[serde(default = "default_field_kind")]
    pub field_kind: FieldKind,

    /// Maximum plaintext length in characters. Defaults per kind.
    #[serde(default)]
    pub field_max_length: Option<usize>,

    /// Cipher mode: `ecb` or `cbc`.
    #[serde(default)]
    pub field_mode: BlockMode,

    /// Width of the backing column. Computed from the max length when absent.
    #[serde(default)]
    pub field_column_capacity: Option<usize>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_field_kind() -> FieldKind {
    FieldKind::Text
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build fieldctl configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise fieldctl configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Codec configuration carrying the secret.
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig::new(self.field_secret.clone())
    }

    /// Column declaration assembled from the `FIELD_*` variables.
    pub fn field_spec(&self) -> FieldSpec {
        FieldSpec {
            kind: self.field_kind,
            max_length: self.field_max_length,
            mode: self.field_mode,
            column_capacity: self.field_column_capacity,
        }
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        self.codec_config()
            .validate()
            .context("FIELD_SECRET is invalid")?;

        if self.field_max_length == Some(0) {
            anyhow::bail!("FIELD_MAX_LENGTH must be > 0");
        }
        if self.field_column_capacity == Some(0) {
            anyhow::bail!("FIELD_COLUMN_CAPACITY must be > 0");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("field_secret", &"[REDACTED]")
            .field("field_kind", &self.field_kind)
            .field("field_max_length", &self.field_max_length)
            .field("field_mode", &self.field_mode)
            .field("field_column_capacity", &self.field_column_capacity)
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            field_secret: "0123456789abcdef-test".into(),
            field_kind: default_field_kind(),
            field_max_length: Some(100),
            field_mode: BlockMode::default(),
            field_column_capacity: None,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults() {
        assert_eq!(default_field_kind(), FieldKind::Text);
        assert_eq!(default_log_level(), "info");
        assert_eq!(BlockMode::default(), BlockMode::Ecb);
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_secret() {
        let cfg = Config {
            field_secret: "short".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_lengths() {
        let cfg = Config {
            field_max_length: Some(0),
            ..valid()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            field_column_capacity: Some(0),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn field_spec_carries_settings() {
        let cfg = Config {
            field_kind: FieldKind::UsSsn,
            field_mode: BlockMode::Cbc,
            ..valid()
        };
        let spec = cfg.field_spec();
        assert_eq!(spec.kind, FieldKind::UsSsn);
        assert_eq!(spec.mode, BlockMode::Cbc);
        assert_eq!(spec.max_length, Some(100));
    }

    #[test]
    fn debug_redacts_secret() {
        let dbg = format!("{:?}", valid());
        assert!(!dbg.contains("0123456789abcdef"), "{dbg}");
    }
}
