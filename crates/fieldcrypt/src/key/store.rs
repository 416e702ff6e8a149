//! [`KeyStore`]: compute-once cache for the column cipher.

use std::sync::Mutex;

use aes::cipher::{generic_array::GenericArray, KeyInit};
use aes::Aes256;
use once_cell::sync::OnceCell;
use thiserror::Error;
use zeroize::Zeroizing;

use super::derive_key;

/// Errors produced by the key store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The secret was consumed by a derivation that never published a key.
    #[error("column key unavailable: secret already consumed")]
    Unavailable,
}

/// Holds the configured secret until first use, then the expanded AES-256
/// key schedule derived from it.
///
/// Derivation is published exactly once through a [`OnceCell`]: concurrent
/// first callers block until the single initialiser finishes, and every later
/// reader gets the same `&Aes256` without locking. The secret is taken out of
/// the store and wiped as part of that derivation. The key schedule itself is
/// wiped when the store is dropped.
pub struct KeyStore {
    secret: Mutex<Option<Zeroizing<Vec<u8>>>>,
    cipher: OnceCell<Aes256>,
}

impl KeyStore {
    /// Create a store for `secret`. No derivation happens yet.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: Mutex::new(Some(Zeroizing::new(secret.to_vec()))),
            cipher: OnceCell::new(),
        }
    }

    /// Returns `true` once the key has been derived.
    pub fn is_ready(&self) -> bool {
        self.cipher.get().is_some()
    }

    /// Borrow the column cipher, deriving the key on first call.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unavailable`] if an earlier derivation consumed the
    /// secret without publishing a key.
    pub fn cipher(&self) -> Result<&Aes256, KeyError> {
        self.cipher.get_or_try_init(|| {
            let secret = self
                .secret
                .lock()
                .map_err(|_| KeyError::Unavailable)?
                .take()
                .ok_or(KeyError::Unavailable)?;
            tracing::debug!("deriving column key");
            let key = derive_key(&secret);
            Ok(Aes256::new(GenericArray::from_slice(&key[..])))
        })
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockEncrypt;
    use aes::Block;
    use std::sync::Arc;

    fn encrypt_zero_block(cipher: &Aes256) -> [u8; 16] {
        let mut block = Block::default();
        cipher.encrypt_block(&mut block);
        let mut out = [0u8; 16];
        out.copy_from_slice(&block);
        out
    }

    #[test]
    fn derivation_is_lazy() {
        let store = KeyStore::new(b"correct horse battery staple");
        assert!(!store.is_ready());
        store.cipher().unwrap();
        assert!(store.is_ready());
    }

    #[test]
    fn secret_released_after_derivation() {
        let store = KeyStore::new(b"correct horse battery staple");
        assert!(store.secret.lock().unwrap().is_some());
        store.cipher().unwrap();
        assert!(store.secret.lock().unwrap().is_none());
        assert!(store.cipher().is_ok());
    }

    #[test]
    fn repeated_reads_return_same_cipher() {
        let store = KeyStore::new(b"correct horse battery staple");
        let first: *const Aes256 = store.cipher().unwrap();
        let second: *const Aes256 = store.cipher().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cipher_uses_derived_key() {
        let store = KeyStore::new(b"correct horse battery staple");
        let expected = Aes256::new(GenericArray::from_slice(&derive_key(b"correct horse battery staple")[..]));
        assert_eq!(
            encrypt_zero_block(store.cipher().unwrap()),
            encrypt_zero_block(&expected)
        );
    }

    #[test]
    fn concurrent_first_use_publishes_one_key() {
        let store = Arc::new(KeyStore::new(b"correct horse battery staple"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || encrypt_zero_block(store.cipher().unwrap()))
            })
            .collect();
        let blocks: Vec<[u8; 16]> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(blocks.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn store_debug_hides_secret() {
        let store = KeyStore::new(b"super-secret-value");
        let dbg = format!("{store:?}");
        assert!(!dbg.contains("super-secret-value"), "{dbg}");
    }
}
