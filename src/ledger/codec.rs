// Versioned envelope for everything written to ledger state or the wire
//
// [ magic "HL" ][ format version: u8 ][ postcard body ]

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub const MAGIC: [u8; 2] = *b"HL";
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 3;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to encode: {0}")]
    EncodeError(String),

    #[error("Failed to decode: {0}")]
    DecodeError(String),

    #[error("Missing envelope header")]
    Truncated,

    #[error("Bad magic bytes")]
    BadMagic,

    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u8),
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    let body = postcard::to_allocvec(value).map_err(|e| CodecError::EncodeError(e.to_string()))?;
    out.extend_from_slice(&body);
    Ok(out)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated);
    }
    if bytes[..2] != MAGIC {
        return Err(CodecError::BadMagic);
    }
    if bytes[2] != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(bytes[2]));
    }
    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| CodecError::DecodeError(e.to_string()))
}
