//! This crate includes the identity and signature primitives used by two-party payment channels:
//! - 20-byte [`Address`]es derived from Ed25519 public keys, plus deterministic addresses for
//!   accounts that have no key (executor namespaces and channel escrows).
//! - [`Keypair`]s that sign off-chain channel messages, and [`ProofSignature`]s that carry the
//!   signer's public key so the signer's address can be recovered.
//! - Domain-separated SHA3-256 message digests built through the [`ProofDigest`] trait.

#![warn(missing_docs)]
#![warn(missing_copy_implementations, missing_debug_implementations)]
#![warn(unused_qualifications, unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(rustdoc::broken_intra_doc_links)]

pub mod address;
pub mod digest;
pub mod keys;
pub mod signature;

mod serde;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use crate::address::{Address, ADDRESS_LEN};
pub use crate::digest::{message_digest, DigestBuilder, MessageDigest, ProofDigest, SignedMessage};
pub use crate::keys::{Keypair, PublicKey};
pub use crate::serde::SerializeKey;
pub use crate::signature::{recover_address, ProofSignature};

use thiserror::*;

/// Error types that may arise from key handling and signature verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The public key bytes carried with a signature are not a valid Ed25519 point.
    #[error("invalid public key encoding")]
    InvalidPublicKey,
    /// The signature does not verify against the message and the carried public key.
    #[error("signature does not verify against the signer's public key")]
    InvalidSignature,
    /// An address string could not be parsed.
    #[error("malformed address {0:?}")]
    MalformedAddress(String),
}

/// The result of a verification of some property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the result of a verification should always be checked"]
pub enum Verification {
    /// A verification succeeded.
    Verified,
    /// A verification failed.
    Failed,
}

impl From<bool> for Verification {
    fn from(b: bool) -> Self {
        if b {
            Verification::Verified
        } else {
            Verification::Failed
        }
    }
}

impl Verification {
    /// Whether the verification succeeded.
    pub fn is_verified(self) -> bool {
        matches!(self, Verification::Verified)
    }
}

/// Trait synonym for a cryptographically secure random number generator. This trait is
/// blanket-implemented for all valid types and will never need to be implemented by-hand.
pub trait Rng: rand::CryptoRng + rand::RngCore {}
impl<T: rand::CryptoRng + rand::RngCore> Rng for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> impl Rng {
        rand::rngs::StdRng::from_seed(*b"DON'T USE THIS FOR ANYTHING REAL")
    }

    struct Note(u64);

    impl ProofDigest for Note {
        fn digest(&self, builder: &mut DigestBuilder) {
            self.0.digest(builder);
        }
    }

    impl SignedMessage for Note {
        const DOMAIN: &'static [u8] = b"paychan/test-note/v1";
    }

    #[test]
    fn signing_is_correct() {
        let kp = Keypair::new(&mut rng());
        let sig = kp.sign(&Note(7));
        assert!(
            kp.public_key().verify(&Note(7), &sig).is_verified(),
            "Signature didn't verify!! {:?}",
            kp.public_key()
        );
    }

    #[test]
    fn recovered_address_matches_signer() {
        let kp = Keypair::new(&mut rng());
        let sig = kp.sign(&Note(42));
        assert_eq!(recover_address(&Note(42), &sig), Ok(kp.address()));
    }

    #[test]
    fn altered_message_fails_recovery() {
        let kp = Keypair::new(&mut rng());
        let sig = kp.sign(&Note(42));
        assert_eq!(recover_address(&Note(43), &sig), Err(Error::InvalidSignature));
    }
}
