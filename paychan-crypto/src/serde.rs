//! Utilities for serializing and deserializing `ed25519_dalek` types using Serde.
//!
//! [`SerializeKey`] looks like a "module" to Serde and can be used with the `#[serde(with =
//! "SerializeKey")]` syntax to add serialization/deserialization to key material without relying
//! on the upstream crate's own serde encoding. Verifying keys are written as their 32-byte
//! compressed form and signatures as their 64-byte form, so a stored channel proof has the same
//! byte layout whatever features the signature crate was built with.

use ed25519_dalek::{Signature, VerifyingKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Serialization/deserialization functionality for external `ed25519_dalek` types.
pub trait SerializeKey: Sized {
    /// Proxy serialization function telling serde how to serialize the implementing type.
    fn serialize<S>(this: &Self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer;

    /// Proxy deserialization function telling serde how to deserialize the implementing type.
    fn deserialize<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>;
}

impl SerializeKey for VerifyingKey {
    fn serialize<S>(this: &Self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        this.to_bytes().serialize(serializer)
    }

    fn deserialize<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = <[u8; 32]>::deserialize(deserializer)?;
        VerifyingKey::from_bytes(&bytes)
            .map_err(|_| de::Error::custom("invalid verifying key encoding"))
    }
}

impl SerializeKey for Signature {
    fn serialize<S>(this: &Self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_big_array::BigArray::serialize(&this.to_bytes(), serializer)
    }

    fn deserialize<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: [u8; Signature::BYTE_SIZE] =
            serde_big_array::BigArray::deserialize(deserializer)?;
        Ok(Signature::from_bytes(&bytes))
    }
}

#[cfg(test)]
mod test {
    use crate::{Keypair, ProofSignature};
    use rand::SeedableRng;

    #[test]
    fn signature_survives_bincode() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"NEVER USE THIS FOR ANYTHING REAL");
        let kp = Keypair::new(&mut rng);
        let sig = kp.sign_digest(&crate::DigestBuilder::new(b"t").with(&1u64).finish());

        let bytes = bincode::serialize(&sig).unwrap();
        let decoded: ProofSignature = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, sig);
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"NEVER USE THIS FOR ANYTHING REAL");
        let kp = Keypair::new(&mut rng);
        let sig = kp.sign_digest(&crate::DigestBuilder::new(b"t").with(&1u64).finish());

        let bytes = bincode::serialize(&sig).unwrap();
        assert!(bincode::deserialize::<ProofSignature>(&bytes[..bytes.len() - 1]).is_err());
    }
}
