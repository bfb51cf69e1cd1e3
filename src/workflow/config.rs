// Workflow configuration

use std::time::Duration;

pub const DEFAULT_KEY_BITS: usize = 256;
pub const DEFAULT_THIRD_PARTY_EXPIRATION: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct WorkflowConfig {
    /// Size of each freshly generated content key
    pub key_bits: usize,
    /// Lifetime of ciphertext disclosed to a third party
    pub third_party_expiration: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            third_party_expiration: DEFAULT_THIRD_PARTY_EXPIRATION,
        }
    }
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_bits(mut self, bits: usize) -> Self {
        self.key_bits = bits;
        self
    }

    pub fn with_third_party_expiration(mut self, expiration: Duration) -> Self {
        self.third_party_expiration = expiration;
        self
    }

    pub(crate) fn third_party_expiration_secs(&self) -> i64 {
        i64::try_from(self.third_party_expiration.as_secs()).unwrap_or(i64::MAX)
    }
}
