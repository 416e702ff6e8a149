//! AES-256 block encryption of padded field plaintext, and the envelope format.
//!
//! **Mode choice:** the default mode encrypts every block independently, so it
//! needs no IV and produces the shortest envelope. The chained mode (CBC) draws
//! a fresh 16-byte IV per call and prefixes it to the ciphertext.
//!
//! This scheme is encrypt-only. There is no MAC: a wrong key or a flipped bit
//! decrypts to garbage, which the value parsers then reject.

use aes::cipher::{BlockDecrypt, BlockEncrypt};
use aes::Block;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use common::BlockMode;
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

use crate::config::{CodecConfig, ConfigError};
use crate::key::{KeyError, KeyStore};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Byte length of a CBC initialisation vector.
pub const IV_LEN: usize = BLOCK_SIZE;

/// Marker that opens every envelope.
pub const MARKER: &str = "$AES$";

const DELIMITER: char = '$';

/// A parsed envelope: the only representation ever persisted.
///
/// The string representation is `$AES$<b64(ciphertext)>` for the default
/// mode and `$AES$MODE_CBC$<b64(iv ‖ ciphertext)>` for the chained mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Mode recovered from (or written to) the envelope tag.
    pub mode: BlockMode,
    /// IV bytes; present exactly when `mode` is [`BlockMode::Cbc`].
    pub iv: Option<[u8; IV_LEN]>,
    /// Raw ciphertext, a whole number of blocks.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encode this value to its canonical string representation.
    pub fn to_string_repr(&self) -> String {
        let mut payload = Vec::with_capacity(IV_LEN + self.ciphertext.len());
        if let Some(iv) = &self.iv {
            payload.extend_from_slice(iv);
        }
        payload.extend_from_slice(&self.ciphertext);

        match self.mode.tag() {
            Some(tag) => format!("{MARKER}{tag}{DELIMITER}{}", URL_SAFE_NO_PAD.encode(&payload)),
            None => format!("{MARKER}{}", URL_SAFE_NO_PAD.encode(&payload)),
        }
    }

    /// Parse an envelope string back into an [`Envelope`].
    ///
    /// # Errors
    ///
    /// - [`CipherError::MalformedEnvelope`] if the marker is missing, the
    ///   segments do not parse, or the payload is not valid base64.
    /// - [`CipherError::UnknownMode`] if a mode tag is present but unknown.
    /// - [`CipherError::CorruptCiphertext`] if the payload is empty, not
    ///   block-aligned, or too short to hold the IV.
    pub fn parse(s: &str) -> Result<Self, CipherError> {
        let rest = s
            .strip_prefix(MARKER)
            .ok_or(CipherError::MalformedEnvelope("missing marker"))?;

        let (mode, encoded) = match rest.split_once(DELIMITER) {
            Some((tag, encoded)) => {
                if tag.is_empty() {
                    return Err(CipherError::MalformedEnvelope("empty mode segment"));
                }
                let mode = BlockMode::from_tag(tag)
                    .ok_or_else(|| CipherError::UnknownMode(tag.to_owned()))?;
                (mode, encoded)
            }
            None => (BlockMode::Ecb, rest),
        };
        if encoded.contains(DELIMITER) {
            return Err(CipherError::MalformedEnvelope("too many segments"));
        }

        let mut payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| CipherError::MalformedEnvelope("payload is not base64"))?;

        if payload.is_empty() {
            return Err(CipherError::CorruptCiphertext("empty payload"));
        }
        if payload.len() % BLOCK_SIZE != 0 {
            return Err(CipherError::CorruptCiphertext("payload is not block-aligned"));
        }

        let iv = match mode {
            BlockMode::Ecb => None,
            BlockMode::Cbc => {
                if payload.len() < IV_LEN + BLOCK_SIZE {
                    return Err(CipherError::CorruptCiphertext("payload shorter than IV + one block"));
                }
                let mut iv = [0u8; IV_LEN];
                iv.copy_from_slice(&payload[..IV_LEN]);
                payload.drain(..IV_LEN);
                Some(iv)
            }
        };

        Ok(Self {
            mode,
            iv,
            ciphertext: payload,
        })
    }
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The stored text does not have the envelope structure.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(&'static str),

    /// A mode tag is present but not recognised.
    #[error("unknown cipher mode: {0}")]
    UnknownMode(String),

    /// The ciphertext (or the plaintext handed to encrypt) is not block-aligned.
    #[error("corrupt ciphertext: {0}")]
    CorruptCiphertext(&'static str),

    /// The column key could not be derived.
    #[error(transparent)]
    Key(#[from] KeyError),
}

impl From<CipherError> for common::CodecError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::MalformedEnvelope(m) => common::CodecError::MalformedEnvelope(m.into()),
            CipherError::UnknownMode(tag) => common::CodecError::UnknownMode(tag),
            CipherError::CorruptCiphertext(m) => common::CodecError::CorruptCiphertext(m.into()),
            CipherError::Key(e) => common::CodecError::KeyUnavailable(e.to_string()),
        }
    }
}

/// Exact envelope length for a serialized plaintext of `plaintext_len` bytes.
///
/// Used to size columns per mode: the chained mode adds one IV block.
/// Returns `None` if the length does not fit in `usize`.
pub fn envelope_len(plaintext_len: usize, mode: BlockMode) -> Option<usize> {
    let mut payload = super::padding::padded_len(plaintext_len, BLOCK_SIZE)?;
    let mut prefix = MARKER.len();
    if let Some(tag) = mode.tag() {
        payload = payload.checked_add(IV_LEN)?;
        prefix += tag.len() + 1;
    }
    prefix.checked_add(base64::encoded_len(payload, false)?)
}

/// AES-256 codec bound to one derived key.
///
/// Cheap to share behind an `Arc`: the only state is the [`KeyStore`], which
/// is read-only after the first derivation.
#[derive(Debug)]
pub struct BlockCipherCodec {
    keys: KeyStore,
}

impl BlockCipherCodec {
    /// Build a codec from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration fails validation.
    pub fn new(config: &CodecConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            keys: KeyStore::new(config.secret().as_bytes()),
        })
    }

    /// Encrypt block-aligned padded plaintext under `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::CorruptCiphertext`] if `padded` is empty or not a
    /// multiple of [`BLOCK_SIZE`].
    pub fn encrypt(&self, padded: &[u8], mode: BlockMode) -> Result<Envelope, CipherError> {
        if padded.is_empty() || padded.len() % BLOCK_SIZE != 0 {
            return Err(CipherError::CorruptCiphertext("plaintext is not block-aligned"));
        }
        let cipher = self.keys.cipher()?;
        let mut ciphertext = Vec::with_capacity(padded.len());

        let iv = match mode {
            BlockMode::Ecb => {
                for chunk in padded.chunks_exact(BLOCK_SIZE) {
                    let mut block = Block::clone_from_slice(chunk);
                    cipher.encrypt_block(&mut block);
                    ciphertext.extend_from_slice(&block);
                }
                None
            }
            BlockMode::Cbc => {
                let mut iv = [0u8; IV_LEN];
                OsRng.fill_bytes(&mut iv);
                let mut prev = Block::clone_from_slice(&iv);
                for chunk in padded.chunks_exact(BLOCK_SIZE) {
                    let mut block = Block::clone_from_slice(chunk);
                    block.iter_mut().zip(prev.iter()).for_each(|(b, p)| *b ^= p);
                    cipher.encrypt_block(&mut block);
                    ciphertext.extend_from_slice(&block);
                    prev = block;
                }
                Some(iv)
            }
        };

        Ok(Envelope {
            mode,
            iv,
            ciphertext,
        })
    }

    /// Decrypt an [`Envelope`] back to padded plaintext bytes.
    ///
    /// The result still carries the terminator and filler; value parsers
    /// consume only their own grammar prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::CorruptCiphertext`] if the ciphertext is empty or
    /// not block-aligned, or if a chained envelope lacks its IV.
    pub fn decrypt(&self, envelope: &Envelope) -> Result<Vec<u8>, CipherError> {
        let ct = &envelope.ciphertext;
        if ct.is_empty() || ct.len() % BLOCK_SIZE != 0 {
            return Err(CipherError::CorruptCiphertext("ciphertext is not block-aligned"));
        }
        let cipher = self.keys.cipher()?;
        let mut plaintext = Vec::with_capacity(ct.len());

        match envelope.mode {
            BlockMode::Ecb => {
                for chunk in ct.chunks_exact(BLOCK_SIZE) {
                    let mut block = Block::clone_from_slice(chunk);
                    cipher.decrypt_block(&mut block);
                    plaintext.extend_from_slice(&block);
                }
            }
            BlockMode::Cbc => {
                let iv = envelope
                    .iv
                    .ok_or(CipherError::CorruptCiphertext("chained envelope without IV"))?;
                let mut prev = Block::clone_from_slice(&iv);
                for chunk in ct.chunks_exact(BLOCK_SIZE) {
                    let saved = Block::clone_from_slice(chunk);
                    let mut block = saved;
                    cipher.decrypt_block(&mut block);
                    block.iter_mut().zip(prev.iter()).for_each(|(b, p)| *b ^= p);
                    plaintext.extend_from_slice(&block);
                    prev = saved;
                }
            }
        }

        Ok(plaintext)
    }
}
