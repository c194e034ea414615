//! Functionality for building the digests that off-chain messages are signed over.
//!
//! Every signed message type names a domain tag through [`SignedMessage`] and feeds its fields,
//! in a fixed order, into a [`DigestBuilder`] through [`ProofDigest`]. Integers are encoded
//! little-endian and variable-length fields are length-prefixed, so two different messages can
//! never produce the same byte stream.

use sha3::{Digest, Sha3_256};
use std::convert::TryFrom;

use crate::address::Address;

/// A trait implemented by types which can feed their signed components into a [`DigestBuilder`].
pub trait ProofDigest {
    /// Incorporate the components of this type into a [`DigestBuilder`].
    fn digest(&self, builder: &mut DigestBuilder);
}

/// A message that can be signed on its own. The domain tag keeps a signature over one message
/// type from verifying as a signature over another.
pub trait SignedMessage: ProofDigest {
    /// Domain separation tag prepended to the digest.
    const DOMAIN: &'static [u8];
}

impl<'a, T: ProofDigest + ?Sized> ProofDigest for &'a T {
    fn digest(&self, builder: &mut DigestBuilder) {
        (**self).digest(builder);
    }
}

impl ProofDigest for u64 {
    fn digest(&self, builder: &mut DigestBuilder) {
        builder.digest_bytes(self.to_le_bytes());
    }
}

impl ProofDigest for [u8] {
    fn digest(&self, builder: &mut DigestBuilder) {
        // usize -> u64 cannot fail on supported targets
        let len = u64::try_from(self.len()).unwrap_or(u64::MAX);
        len.digest(builder);
        builder.digest_bytes(self);
    }
}

impl ProofDigest for Vec<u8> {
    fn digest(&self, builder: &mut DigestBuilder) {
        self.as_slice().digest(builder);
    }
}

impl ProofDigest for str {
    fn digest(&self, builder: &mut DigestBuilder) {
        self.as_bytes().digest(builder);
    }
}

impl ProofDigest for String {
    fn digest(&self, builder: &mut DigestBuilder) {
        self.as_str().digest(builder);
    }
}

impl ProofDigest for Address {
    fn digest(&self, builder: &mut DigestBuilder) {
        builder.digest_bytes(self.as_bytes());
    }
}

/// Hash state for building a [`MessageDigest`].
#[derive(Clone)]
pub struct DigestBuilder {
    hasher: Sha3_256,
}

impl std::fmt::Debug for DigestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestBuilder").finish()
    }
}

impl DigestBuilder {
    /// Initialize a new, empty digest under the given domain tag.
    pub fn new(domain: &[u8]) -> Self {
        let mut builder = Self {
            hasher: Sha3_256::new(),
        };
        domain.digest(&mut builder);
        builder
    }

    /// Incorporate an arbitrary sequence of bytes into the digest, without a length prefix.
    pub fn digest_bytes(&mut self, bytes: impl AsRef<[u8]>) {
        self.hasher.update(bytes.as_ref());
    }

    /// Incorporate a value into the digest.
    pub fn with<T: ProofDigest + ?Sized>(mut self, value: &T) -> Self {
        value.digest(&mut self);
        self
    }

    /// Consume the builder and produce the final digest.
    pub fn finish(self) -> MessageDigest {
        let mut bytes = [0; 32];
        bytes.copy_from_slice(&self.hasher.finalize()[..]);
        MessageDigest(bytes)
    }
}

/// A 32-byte digest of a signed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageDigest([u8; 32]);

impl MessageDigest {
    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Compute the digest that a [`SignedMessage`] is signed over.
pub fn message_digest<M: SignedMessage + ?Sized>(msg: &M) -> MessageDigest {
    DigestBuilder::new(M::DOMAIN).with(msg).finish()
}
