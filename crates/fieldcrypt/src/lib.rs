//! `fieldcrypt`: transparent field-level encryption for fixed-width text columns.
//!
//! A typed value is serialized to canonical text, padded with random filler,
//! encrypted with AES-256, and rendered as a self-identifying envelope:
//!
//! ```text
//! $AES$<base64url>                 default (ECB) mode
//! $AES$MODE_CBC$<base64url>        chained mode, IV prepended to the ciphertext
//! ```
//!
//! Persistence layers interact only with [`FieldAdapter::on_save`] and
//! [`FieldAdapter::on_load`], or the same pair on [`SerializedField`] for
//! structured values stored as JSON.
//!
//! ```no_run
//! use std::sync::Arc;
//! use common::{FieldKind, FieldSpec};
//! use fieldcrypt::{BlockCipherCodec, CodecConfig, FieldAdapter, PlainValue};
//!
//! let codec = Arc::new(BlockCipherCodec::new(&CodecConfig::new("a long configured secret"))?);
//! let ssn = FieldAdapter::new(FieldSpec::new(FieldKind::UsSsn), codec)?;
//! let stored = ssn.on_save(Some(&PlainValue::from("123-45-6789")))?;
//! assert_eq!(ssn.on_load(stored.as_deref())?, Some(PlainValue::from("123-45-6789")));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod crypto;
pub mod field;
pub mod key;
pub mod serialized;
pub mod telemetry;
pub mod value;

pub use common::{BlockMode, CodecError, FieldKind, FieldSpec};
pub use config::CodecConfig;
pub use crypto::BlockCipherCodec;
pub use field::FieldAdapter;
pub use serialized::SerializedField;
pub use value::PlainValue;
