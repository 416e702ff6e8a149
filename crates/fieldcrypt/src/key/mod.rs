//! Column key derivation and caching.
//!
//! # Lifecycle
//!
//! 1. The caller builds a [`crate::config::CodecConfig`] holding the secret.
//! 2. [`KeyStore::new`] takes a copy of the secret; nothing is derived yet.
//! 3. The first encrypt or decrypt calls [`KeyStore::cipher`], which derives
//!    the AES-256 key once, expands it, and wipes the secret copy.
//!
//! # Security invariants
//!
//! - Neither the secret nor the derived key is ever logged or printed.
//! - The secret copy, the raw key and the key schedule are all zeroized.
//! - There is no rotation: one store, one key.

pub mod store;

pub use store::{KeyError, KeyStore};

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::crypto::KEY_LEN;

/// Derive the AES-256 column key from a configured secret (SHA-256).
pub fn derive_key(secret: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&Sha256::digest(secret));
    key
}
