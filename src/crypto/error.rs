use thiserror::Error;

/// Errors produced by the crypto engine.
///
/// Variants never carry key or plaintext material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid symmetric key size: {0} bits (expected 128, 192 or 256)")]
    InvalidKeySize(usize),

    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Ciphertext too short: need at least {min} bytes, got {got}")]
    CiphertextTooShort { min: usize, got: usize },

    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("Authentication failed: wrapped key was not produced for this recipient")]
    AuthenticationFailed,

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Random source failure: {0}")]
    RandomFailure(String),
}

impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::InvalidHex(err.to_string())
    }
}
