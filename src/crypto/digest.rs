use crate::crypto::CryptoError;
use sha2::{Digest, Sha256, Sha512};

/// SHA-512 of `data`
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(data));
    out
}

/// SHA-256 of `data`
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Hex-encoded SHA-512, used for content addressing and ledger addresses
pub fn digest_hex(data: &[u8]) -> String {
    hex::encode(sha512(data))
}

/// Hex-encoded SHA-512 of the bytes a hex string decodes to
pub fn digest_hex_of_hex(hex_str: &str) -> Result<String, CryptoError> {
    let bytes = hex::decode(hex_str)?;
    Ok(digest_hex(&bytes))
}
