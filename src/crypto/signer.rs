use crate::crypto::keypair::context;
use crate::crypto::{sha256, CryptoError, Keypair, PublicKey};
use secp256k1::ecdsa::Signature as EcdsaSignature;
use secp256k1::Message;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Compact ECDSA signature size
pub const SIGNATURE_SIZE: usize = 64;

/// Compact secp256k1 ECDSA signature (64 bytes)
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; SIGNATURE_SIZE],
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct SignatureVisitor;

        impl<'de> Visitor<'de> for SignatureVisitor {
            type Value = Signature;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("64 bytes for a compact ECDSA signature")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Signature::from_bytes(v).map_err(|e| E::custom(e.to_string()))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut bytes = Vec::with_capacity(SIGNATURE_SIZE);
                while let Some(byte) = seq.next_element()? {
                    bytes.push(byte);
                }
                Signature::from_bytes(&bytes).map_err(|e| de::Error::custom(e.to_string()))
            }
        }

        deserializer.deserialize_bytes(SignatureVisitor)
    }
}

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_SIZE {
            return Err(CryptoError::InvalidLength {
                expected: SIGNATURE_SIZE,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; SIGNATURE_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Hex form, used as transaction and batch identifiers
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.bytes[..8]))
    }
}

/// Signing and verification operations.
///
/// Messages are hashed with SHA-256 before signing.
pub struct Signer;

impl Signer {
    pub fn sign(keypair: &Keypair, message: &[u8]) -> Signature {
        let msg = Message::from_digest(sha256(message));
        let sig = context().sign_ecdsa(&msg, keypair.secret_key().inner());
        Signature {
            bytes: sig.serialize_compact(),
        }
    }

    pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        let msg = Message::from_digest(sha256(message));
        match EcdsaSignature::from_compact(&signature.bytes) {
            Ok(sig) => context().verify_ecdsa(&msg, &sig, public_key.inner()).is_ok(),
            Err(_) => false,
        }
    }
}
