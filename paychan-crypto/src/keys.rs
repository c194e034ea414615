//! Ed25519 keys for channel participants.

use crate::{
    address::Address,
    digest::{message_digest, MessageDigest, SignedMessage},
    serde::SerializeKey,
    signature::ProofSignature,
    Rng, Verification,
};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::*;
use std::fmt;

/// A participant's public key.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "SerializeKey")] pub(crate) VerifyingKey);

#[cfg(feature = "sqlite")]
crate::impl_sqlx_for_bincode_ty!(PublicKey);

impl PublicKey {
    /// Decode a public key from its 32-byte compressed form.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, crate::Error> {
        VerifyingKey::from_bytes(bytes)
            .map(PublicKey)
            .map_err(|_| crate::Error::InvalidPublicKey)
    }

    /// The 32-byte compressed form of this key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// The address controlled by this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }

    /// Verify a signature on a message against this key, ignoring the key embedded in the
    /// signature.
    pub fn verify<M: SignedMessage + ?Sized>(&self, msg: &M, sig: &ProofSignature) -> Verification {
        self.verify_digest(&message_digest(msg), sig)
    }

    pub(crate) fn verify_digest(&self, digest: &MessageDigest, sig: &ProofSignature) -> Verification {
        self.0
            .verify(digest.as_bytes(), &sig.signature)
            .is_ok()
            .into()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_bytes()))
    }
}

/// A signing keypair held by a channel participant.
pub struct Keypair {
    signing_key: SigningKey,
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish()
    }
}

impl Keypair {
    /// Generate a new keypair.
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            signing_key: SigningKey::generate(rng),
        }
    }

    /// Rebuild a keypair from its 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The public half of this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// The address controlled by this keypair.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign a message. The resulting [`ProofSignature`] carries this keypair's public key.
    pub fn sign<M: SignedMessage + ?Sized>(&self, msg: &M) -> ProofSignature {
        self.sign_digest(&message_digest(msg))
    }

    /// Sign a precomputed message digest.
    pub fn sign_digest(&self, digest: &MessageDigest) -> ProofSignature {
        ProofSignature {
            public_key: self.public_key(),
            signature: self.signing_key.sign(digest.as_bytes()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn seeded_keys_are_stable() {
        let a = Keypair::from_seed(&[7; 32]);
        let b = Keypair::from_seed(&[7; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.address(), b.address());
        assert_ne!(a.address(), Keypair::from_seed(&[8; 32]).address());
    }

    #[test]
    fn public_key_bytes_work() {
        let kp = Keypair::from_seed(&[1; 32]);
        let pk = kp.public_key();
        assert_eq!(PublicKey::from_bytes(&pk.to_bytes()), Ok(pk));
    }
}
