/*!
The key/value state the executor reads and writes.

The host owns persistence; the executor only sees it through [`StateRead`] and [`KvStore`].
Actions never write to the host's store directly. They run against a [`StateBatch`], which reads
through to the base store and buffers every write. A successful action hands the buffered writes
back in its [`Receipt`](crate::Receipt); a failed one simply drops the batch, so nothing it did
is ever observed.
*/

use crate::{ChannelId, Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors reported by a backing store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed to read or write.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Read access to state.
pub trait StateRead {
    /// Fetch the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, StoreError>;
}

/// Read-write access to state.
pub trait KvStore: StateRead {
    /// Store `value` under `key`, replacing any previous value.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> std::result::Result<(), StoreError>;
}

impl<'a, S: StateRead + ?Sized> StateRead for &'a S {
    fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }
}

impl<'a, S: StateRead + ?Sized> StateRead for &'a mut S {
    fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }
}

impl<'a, S: KvStore + ?Sized> KvStore for &'a mut S {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> std::result::Result<(), StoreError> {
        (**self).put(key, value)
    }
}

/// A single key/value write.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KeyValue {
    /// The key written.
    pub key: Vec<u8>,
    /// The value written.
    pub value: Vec<u8>,
}

/// An in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateRead for MemoryStore {
    fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }
}

impl KvStore for MemoryStore {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> std::result::Result<(), StoreError> {
        let _ = self.entries.insert(key, value);
        Ok(())
    }
}

/// A write buffer over a read-only base store.
#[derive(Debug)]
pub struct StateBatch<'s, S: ?Sized> {
    base: &'s S,
    pending: BTreeMap<Vec<u8>, Vec<u8>>,
    order: Vec<Vec<u8>>,
}

impl<'s, S: StateRead + ?Sized> StateBatch<'s, S> {
    /// Start an empty batch over `base`.
    pub fn new(base: &'s S) -> Self {
        Self {
            base,
            pending: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// The buffered writes, in the order each key was first written, with each key's last value.
    pub fn into_writes(self) -> Vec<KeyValue> {
        let StateBatch {
            mut pending, order, ..
        } = self;
        order
            .into_iter()
            .filter_map(|key| pending.remove(&key).map(|value| KeyValue { key, value }))
            .collect()
    }
}

impl<'s, S: StateRead + ?Sized> StateRead for StateBatch<'s, S> {
    fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, StoreError> {
        match self.pending.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.base.get(key),
        }
    }
}

impl<'s, S: StateRead + ?Sized> KvStore for StateBatch<'s, S> {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> std::result::Result<(), StoreError> {
        if !self.pending.contains_key(&key) {
            self.order.push(key.clone());
        }
        let _ = self.pending.insert(key, value);
        Ok(())
    }
}

/// Read and bincode-decode the value under `key`.
pub(crate) fn get_decoded<T: DeserializeOwned, S: StateRead + ?Sized>(
    state: &S,
    key: &[u8],
) -> Result<Option<T>> {
    match state.get(key)? {
        Some(bytes) => bincode::deserialize(&bytes).map(Some).map_err(Error::Codec),
        None => Ok(None),
    }
}

/// Bincode-encode `value` and store it under `key`.
pub(crate) fn put_encoded<T: Serialize, S: KvStore + ?Sized>(
    state: &mut S,
    key: Vec<u8>,
    value: &T,
) -> Result<()> {
    let bytes = bincode::serialize(value).map_err(Error::Codec)?;
    state.put(key, bytes)?;
    Ok(())
}

/// Key layout of the executor's state.
///
/// Every key lives under the `mavl-<executor>-` prefix so the executor's entries never collide
/// with other executors sharing the host's state.
pub mod keys {
    use super::ChannelId;
    use paychan_crypto::Address;

    /// Prefix of every state key owned by the executor.
    pub fn prefix(executor: &str) -> String {
        format!("mavl-{}-", executor)
    }

    /// Key of the channel id allocation counter.
    pub fn channel_count(executor: &str) -> Vec<u8> {
        format!("{}channelIDCount", prefix(executor)).into_bytes()
    }

    /// Key of one channel entry.
    pub fn channel(executor: &str, channel_id: ChannelId) -> Vec<u8> {
        format!("{}channelID-{}", prefix(executor), channel_id).into_bytes()
    }

    /// Key of an account balance held inside an asset namespace.
    pub fn account(
        executor: &str,
        issue_contract: &str,
        token_symbol: &str,
        namespace: &Address,
        address: &Address,
    ) -> Vec<u8> {
        format!(
            "{}asset-{}-{}-{}:{}",
            prefix(executor),
            issue_contract,
            token_symbol,
            namespace,
            address
        )
        .into_bytes()
    }
}
