//! AES-256 field encryption primitives.
//!
//! This module knows nothing about value types. It pads serialized bytes,
//! encrypts them, and renders the envelope.
//!
//! # Envelope format
//!
//! ```text
//! $AES$<base64url-no-pad(ciphertext)>                  default mode
//! $AES$MODE_CBC$<base64url-no-pad(iv ‖ ciphertext)>    chained mode
//! ```
//!
//! The envelope is self-identifying: the mode is recovered from the tag alone,
//! so decoding needs nothing beyond the key.

pub mod cipher;
pub mod padding;

pub use cipher::{envelope_len, BlockCipherCodec, CipherError, Envelope, BLOCK_SIZE, KEY_LEN, MARKER};
