//! Balance-proof sequence numbers.
use paychan_crypto::{DigestBuilder, ProofDigest};
use serde::*;
use std::fmt;

/// Sequence number of a participant's signed balance proof. Each participant's accepted nonce
/// only ever increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(pub u64);

impl Nonce {
    /// Whether a proof carrying this nonce supersedes one carrying `recorded`.
    pub fn supersedes(self, recorded: Nonce) -> bool {
        self > recorded
    }

    /// The raw sequence number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Nonce {
    fn from(n: u64) -> Self {
        Nonce(n)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ProofDigest for Nonce {
    fn digest(&self, builder: &mut DigestBuilder) {
        self.0.digest(builder);
    }
}
