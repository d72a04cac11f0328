//! Reversible transform between markup text and URL-safe tokens.
//!
//! A token is the markup compressed with raw deflate and written in the
//! rendering service's 6-bit alphabet (`0-9`, `A-Z`, `a-z`, `-`, `_`). The
//! compressed bytes are zero-padded to a multiple of three so that every
//! group encodes to four characters, which is what the service's reference
//! encoder produces. The padding is harmless on decode because inflation
//! stops at the end of the deflate stream.

use std::{io::Write, string::FromUtf8Error};

use base64::{
    Engine as _,
    alphabet::Alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use flate2::{Compression, Decompress, FlushDecompress, Status, write::DeflateEncoder};
use log::trace;
use thiserror::Error;

const TOKEN_SYMBOLS: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

const TOKEN_ALPHABET: Alphabet = match Alphabet::new(TOKEN_SYMBOLS) {
    Ok(alphabet) => alphabet,
    Err(_) => panic!("token alphabet must be 64 unique printable symbols"),
};

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &TOKEN_ALPHABET,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Upper bound on decoded markup size.
pub const MAX_MARKUP_BYTES: usize = 1024 * 1024;

/// Errors produced by the diagram codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("token is empty")]
    Empty,

    #[error("token is not valid: {0}")]
    InvalidToken(#[from] base64::DecodeError),

    #[error("compressed stream is corrupt: {0}")]
    CorruptStream(String),

    #[error("compressed stream ends before its final block")]
    Truncated,

    #[error("decoded markup exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("decoded markup is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("compression failed: {0}")]
    Compress(#[from] std::io::Error),
}

/// Encode markup into a rendering-service token.
///
/// # Errors
///
/// Returns [`CodecError::Compress`] if the compressor fails, which does not
/// happen for in-memory buffers in practice.
///
/// # Examples
///
/// ```
/// use modeller::codec::{decode, encode};
///
/// let token = encode("Bob -> Alice : hello").unwrap();
/// assert!(!token.contains(['+', '/', '=']));
/// assert_eq!(decode(&token).unwrap(), "Bob -> Alice : hello");
/// ```
pub fn encode(markup: &str) -> Result<String, CodecError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(markup.as_bytes())?;
    let mut compressed = encoder.finish()?;

    let padding = (3 - compressed.len() % 3) % 3;
    compressed.resize(compressed.len() + padding, 0);

    let token = TOKEN_ENGINE.encode(&compressed);
    trace!(markup_len = markup.len(), token_len = token.len(); "Encoded markup");
    Ok(token)
}

/// Decode a rendering-service token back into markup.
///
/// # Errors
///
/// Fails with a [`CodecError`] when the token is empty, contains symbols
/// outside the alphabet, does not hold a complete deflate stream, inflates
/// beyond [`MAX_MARKUP_BYTES`], or is not UTF-8. Partial output is never
/// returned.
pub fn decode(token: &str) -> Result<String, CodecError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CodecError::Empty);
    }

    let compressed = TOKEN_ENGINE.decode(token)?;
    let bytes = inflate(&compressed)?;
    Ok(String::from_utf8(bytes)?)
}

fn inflate(compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut inflater = Decompress::new(false);
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(4).max(64));

    loop {
        if out.len() == out.capacity() {
            if out.len() >= MAX_MARKUP_BYTES {
                return Err(CodecError::TooLarge {
                    limit: MAX_MARKUP_BYTES,
                });
            }
            out.reserve(out.capacity());
        }

        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&compressed[consumed..], &mut out, FlushDecompress::Finish)
            .map_err(|err| CodecError::CorruptStream(err.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let progressed =
                    inflater.total_in() as usize > consumed || inflater.total_out() > produced;
                if !progressed && out.len() < out.capacity() {
                    return Err(CodecError::Truncated);
                }
            }
        }
    }

    if out.len() > MAX_MARKUP_BYTES {
        return Err(CodecError::TooLarge {
            limit: MAX_MARKUP_BYTES,
        });
    }
    Ok(out)
}
