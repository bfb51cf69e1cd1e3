// Crypto module - content encryption, key wrapping, digests and signing keys

mod cipher;
mod digest;
mod error;
mod keypair;
mod signer;
mod wrap;

pub use cipher::{decrypt_content, encrypt_content, SymmetricKey, IV_SIZE, SUPPORTED_KEY_BITS};
pub use digest::{digest_hex, digest_hex_of_hex, sha256, sha512};
pub use error::CryptoError;
pub use keypair::{Keypair, PublicKey, SecretKey, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE};
pub use signer::{Signature, Signer, SIGNATURE_SIZE};
pub use wrap::{unwrap_key, wrap_key, WRAP_OVERHEAD};
