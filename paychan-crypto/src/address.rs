//! Account addresses.
//!
//! An [`Address`] is the first [`ADDRESS_LEN`] bytes of a domain-separated SHA3-256 hash. Key
//! holders get an address from their public key; accounts with no key (an executor's asset
//! namespace, a channel's escrow) get one from a label, under a different domain tag so the two
//! spaces never collide in practice.

use crate::{keys::PublicKey, Error};
use serde::*;
use sha3::{Digest, Sha3_256};
use std::{convert::TryInto, fmt, str::FromStr};

/// Length in bytes of an [`Address`].
pub const ADDRESS_LEN: usize = 20;

const KEY_ADDRESS_TAG: &[u8] = b"paychan/address/key/v1";
const DERIVED_ADDRESS_TAG: &[u8] = b"paychan/address/derived/v1";

/// A 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LEN]);

#[cfg(feature = "sqlite")]
crate::impl_sqlx_for_bincode_ty!(Address);

impl Address {
    /// The all-zero address. It belongs to nobody and is rejected wherever a participant is named.
    pub const ZERO: Address = Address([0; ADDRESS_LEN]);

    /// Construct an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Address(bytes)
    }

    /// Derive the address controlled by the given public key.
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self::hash_to_address(KEY_ADDRESS_TAG, &key.to_bytes())
    }

    /// Derive a deterministic keyless address from a label, e.g. an executor name.
    pub fn derive(label: &[u8]) -> Self {
        Self::hash_to_address(DERIVED_ADDRESS_TAG, label)
    }

    fn hash_to_address(tag: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(tag);
        hasher.update(data);
        let digested = hasher.finalize();
        let mut bytes = [0; ADDRESS_LEN];
        bytes.copy_from_slice(&digested[..ADDRESS_LEN]);
        Address(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Whether this is the reserved all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parse a hex address, with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| Error::MalformedAddress(s.to_string()))?;
        let bytes: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| Error::MalformedAddress(s.to_string()))?;
        Ok(Address(bytes))
    }
}
