//! Per-recipient key wrapping (ECIES over secp256k1)
//!
//! To wrap a content key for a recipient:
//! 1. Generate an ephemeral secp256k1 keypair
//! 2. ECDH between the ephemeral secret and the recipient public key
//! 3. SHA-512 the shared secret: first half is the AES-256-CTR key, second
//!    half the HMAC-SHA256 key
//! 4. Encrypt the raw key bytes and MAC `ephemeral_pub || iv || ciphertext`
//!
//! # Wire Format
//!
//! ```text
//! [ ephemeral_pub: 33 ][ iv: 16 ][ ciphertext: n ][ mac: 32 ]
//! ```

use crate::crypto::{sha512, CryptoError, Keypair, PublicKey, SecretKey, IV_SIZE, PUBLIC_KEY_SIZE};
use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::ecdh::SharedSecret;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

const MAC_SIZE: usize = 32;

/// Bytes a wrapped key adds on top of the raw key length
pub const WRAP_OVERHEAD: usize = PUBLIC_KEY_SIZE + IV_SIZE + MAC_SIZE;

struct DerivedKeys {
    enc: [u8; 32],
    mac: [u8; 32],
}

fn derive(public: &PublicKey, secret: &SecretKey) -> DerivedKeys {
    let shared = SharedSecret::new(public.inner(), secret.inner());
    let expanded = sha512(&shared.secret_bytes());
    let mut enc = [0u8; 32];
    let mut mac = [0u8; 32];
    enc.copy_from_slice(&expanded[..32]);
    mac.copy_from_slice(&expanded[32..]);
    DerivedKeys { enc, mac }
}

fn new_mac(key: &[u8]) -> Result<HmacSha256, CryptoError> {
    <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))
}

/// Wrap a hex-encoded raw key under `recipient`'s public key
pub fn wrap_key(recipient: &PublicKey, raw_key_hex: &str) -> Result<Vec<u8>, CryptoError> {
    let raw = hex::decode(raw_key_hex)?;
    let ephemeral = Keypair::generate();
    let keys = derive(recipient, ephemeral.secret_key());

    let mut iv = [0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| CryptoError::RandomFailure(e.to_string()))?;

    let mut body = raw;
    Aes256Ctr::new_from_slices(&keys.enc, &iv)
        .map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))?
        .apply_keystream(&mut body);

    let mut out = Vec::with_capacity(WRAP_OVERHEAD + body.len());
    out.extend_from_slice(&ephemeral.public_key().to_bytes());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&body);

    let mut mac = new_mac(&keys.mac)?;
    mac.update(&out);
    out.extend_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Recover the hex-encoded raw key from a wrapped blob.
///
/// Fails with `AuthenticationFailed` when the blob was wrapped for a
/// different key or was tampered with.
pub fn unwrap_key(own: &SecretKey, wrapped: &[u8]) -> Result<String, CryptoError> {
    if wrapped.len() < WRAP_OVERHEAD {
        return Err(CryptoError::CiphertextTooShort {
            min: WRAP_OVERHEAD,
            got: wrapped.len(),
        });
    }
    let (signed, tag) = wrapped.split_at(wrapped.len() - MAC_SIZE);
    let ephemeral = PublicKey::from_bytes(&signed[..PUBLIC_KEY_SIZE])
        .map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))?;
    let keys = derive(&ephemeral, own);

    let mut mac = new_mac(&keys.mac)?;
    mac.update(signed);
    mac.verify_slice(tag)
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    let iv = &signed[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + IV_SIZE];
    let mut body = signed[PUBLIC_KEY_SIZE + IV_SIZE..].to_vec();
    Aes256Ctr::new_from_slices(&keys.enc, iv)
        .map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))?
        .apply_keystream(&mut body);

    Ok(hex::encode(body))
}
