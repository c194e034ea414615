//! Signatures that identify their signer.
//!
//! A [`ProofSignature`] travels with the public key that produced it. Trusting that key alone
//! would let anyone claim any identity, so the only way to learn the signer is
//! [`recover_address`]: the signature is verified against the message first, and the address is
//! derived from the key only once verification succeeds.

use crate::{
    address::Address,
    digest::{message_digest, SignedMessage},
    keys::PublicKey,
    serde::SerializeKey,
    Error, Verification,
};
use ed25519_dalek::Signature;
use serde::*;

/// An Ed25519 signature together with the public key that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSignature {
    pub(crate) public_key: PublicKey,
    #[serde(with = "SerializeKey")]
    pub(crate) signature: Signature,
}

impl ProofSignature {
    /// The public key this signature claims to come from. Not authenticated on its own; use
    /// [`recover_address`].
    pub fn claimed_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Raw 64-byte signature.
    pub fn signature_bytes(&self) -> [u8; 64] {
        self.signature.to_bytes()
    }

    /// Reassemble a signature from a public key and raw signature bytes.
    pub fn from_parts(public_key: PublicKey, signature: &[u8; 64]) -> Self {
        Self {
            public_key,
            signature: Signature::from_bytes(signature),
        }
    }
}

/// Verify `sig` over `msg` and return the address of the key that produced it.
pub fn recover_address<M: SignedMessage + ?Sized>(
    msg: &M,
    sig: &ProofSignature,
) -> Result<Address, Error> {
    match sig
        .public_key
        .verify_digest(&message_digest(msg), sig)
    {
        Verification::Verified => Ok(sig.public_key.address()),
        Verification::Failed => Err(Error::InvalidSignature),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{DigestBuilder, Keypair, ProofDigest};

    struct Claim(&'static str);

    impl ProofDigest for Claim {
        fn digest(&self, builder: &mut DigestBuilder) {
            self.0.digest(builder);
        }
    }

    impl SignedMessage for Claim {
        const DOMAIN: &'static [u8] = b"paychan/test-claim/v1";
    }

    #[test]
    fn swapped_key_is_rejected() {
        let alice = Keypair::from_seed(&[1; 32]);
        let mallory = Keypair::from_seed(&[2; 32]);
        let sig = alice.sign(&Claim("pay mallory"));

        // Mallory substitutes her key hoping to be recovered as the signer.
        let forged = ProofSignature::from_parts(mallory.public_key(), &sig.signature_bytes());
        assert_eq!(
            recover_address(&Claim("pay mallory"), &forged),
            Err(Error::InvalidSignature)
        );
        assert_eq!(
            recover_address(&Claim("pay mallory"), &sig),
            Ok(alice.address())
        );
    }
}
