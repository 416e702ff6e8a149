//! Random-length filler that block-aligns serialized plaintext.
//!
//! The filler always starts with a NUL terminator followed by printable
//! characters. No serialized value grammar produces a NUL, so the value
//! parsers in [`crate::value`] stop at the terminator without any length
//! prefix being stored.

use rand::{rngs::OsRng, Rng};

/// Minimum number of filler bytes appended to every plaintext.
pub const MIN_PADDING: usize = 2;

/// Byte that opens every filler run.
pub const TERMINATOR: u8 = 0;

/// Filler alphabet: digits, ASCII letters, punctuation, whitespace (100 chars).
pub const FILLER_ALPHABET: &[u8] = b"0123456789\
abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ\
!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~ \t\n\r\x0b\x0c";

/// Number of filler bytes [`pad`] appends to a plaintext of `len` bytes.
///
/// The padded length is the smallest multiple of `block_size` that is at
/// least `len + MIN_PADDING`, so the result lies in
/// `MIN_PADDING..MIN_PADDING + block_size`.
pub fn padding_len(len: usize, block_size: usize) -> usize {
    let used = (len % block_size + MIN_PADDING) % block_size;
    (block_size - used) % block_size + MIN_PADDING
}

/// Total length after padding a plaintext of `len` bytes; `None` on overflow.
pub fn padded_len(len: usize, block_size: usize) -> Option<usize> {
    len.checked_add(padding_len(len, block_size))
}

/// Append a terminator and random printable filler to `plaintext`.
pub fn pad(plaintext: &[u8], block_size: usize) -> Vec<u8> {
    let filler = padding_len(plaintext.len(), block_size);
    let mut out = Vec::with_capacity(plaintext.len() + filler);
    out.extend_from_slice(plaintext);
    out.push(TERMINATOR);
    let mut rng = OsRng;
    out.extend((1..filler).map(|_| FILLER_ALPHABET[rng.gen_range(0..FILLER_ALPHABET.len())]));
    out
}

/// Bytes before the first terminator. Returns the whole slice when no
/// terminator is present.
pub fn terminated(padded: &[u8]) -> &[u8] {
    match padded.iter().position(|&b| b == TERMINATOR) {
        Some(end) => &padded[..end],
        None => padded,
    }
}
