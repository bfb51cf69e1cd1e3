// Content encryption - AES-CTR with a fresh IV per call
//
// Stored layout: IV (16 bytes) || keystream-XORed plaintext.
// The content hash is the SHA-512 of that whole layout.

use crate::crypto::{digest_hex, CryptoError};
use aes::{Aes128, Aes192, Aes256};
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes192Ctr = ctr::Ctr128BE<Aes192>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// AES block size, also the CTR IV size
pub const IV_SIZE: usize = 16;

pub const SUPPORTED_KEY_BITS: [usize; 3] = [128, 192, 256];

/// Raw symmetric content key.
///
/// Never serialized; it only leaves the process wrapped under a public key.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey(Vec<u8>);

impl SymmetricKey {
    /// Draw a key of `bits` length from the OS CSPRNG
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        if !SUPPORTED_KEY_BITS.contains(&bits) {
            return Err(CryptoError::InvalidKeySize(bits));
        }
        let mut key = vec![0u8; bits / 8];
        OsRng
            .try_fill_bytes(&mut key)
            .map_err(|e| CryptoError::RandomFailure(e.to_string()))?;
        Ok(Self(key))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if !SUPPORTED_KEY_BITS.contains(&(bytes.len() * 8)) {
            return Err(CryptoError::InvalidKeySize(bytes.len() * 8));
        }
        Ok(Self(bytes.to_vec()))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bits(&self) -> usize {
        self.0.len() * 8
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey({} bits)", self.bits())
    }
}

fn apply_keystream(key: &SymmetricKey, iv: &[u8], buf: &mut [u8]) -> Result<(), CryptoError> {
    let invalid = |e: ctr::cipher::InvalidLength| CryptoError::MalformedCiphertext(e.to_string());
    match key.as_bytes().len() {
        16 => Aes128Ctr::new_from_slices(key.as_bytes(), iv)
            .map_err(invalid)?
            .apply_keystream(buf),
        24 => Aes192Ctr::new_from_slices(key.as_bytes(), iv)
            .map_err(invalid)?
            .apply_keystream(buf),
        32 => Aes256Ctr::new_from_slices(key.as_bytes(), iv)
            .map_err(invalid)?
            .apply_keystream(buf),
        other => return Err(CryptoError::InvalidKeySize(other * 8)),
    }
    Ok(())
}

/// Encrypt `plaintext`, returning `(content_hash, iv || ciphertext)`.
///
/// The IV is drawn inside this function on every call, so callers cannot
/// reuse one with the same key.
pub fn encrypt_content(plaintext: &[u8], key: &SymmetricKey) -> Result<(String, Vec<u8>), CryptoError> {
    let mut out = vec![0u8; IV_SIZE + plaintext.len()];
    OsRng
        .try_fill_bytes(&mut out[..IV_SIZE])
        .map_err(|e| CryptoError::RandomFailure(e.to_string()))?;
    out[IV_SIZE..].copy_from_slice(plaintext);

    let (iv, body) = out.split_at_mut(IV_SIZE);
    apply_keystream(key, iv, body)?;

    let hash = digest_hex(&out);
    Ok((hash, out))
}

/// Decrypt an `iv || ciphertext` buffer produced by [`encrypt_content`]
pub fn decrypt_content(data: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
    if data.len() < IV_SIZE {
        return Err(CryptoError::CiphertextTooShort {
            min: IV_SIZE,
            got: data.len(),
        });
    }
    let (iv, body) = data.split_at(IV_SIZE);
    let mut out = body.to_vec();
    apply_keystream(key, iv, &mut out)?;
    Ok(out)
}
