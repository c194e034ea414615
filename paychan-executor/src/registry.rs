//! Channel id allocation.
//!
//! The registry is a single persisted counter. It performs no locking: the host applies
//! channel-affecting actions one at a time, so a read-increment-write never races another.

use crate::{
    store::{get_decoded, keys, put_encoded, KvStore, StateRead},
    ChannelId, Error, Result,
};
use tracing::debug;

/// Number of channels allocated so far (0 if none).
pub fn count<S: StateRead + ?Sized>(state: &S, executor: &str) -> Result<u64> {
    Ok(get_decoded(state, &keys::channel_count(executor))?.unwrap_or(0))
}

/// Allocate the next channel id and persist the new count.
pub fn allocate<S: KvStore + ?Sized>(state: &mut S, executor: &str) -> Result<ChannelId> {
    let current = count(&*state, executor)?;
    let next = current.checked_add(1).ok_or(Error::ChannelIdOverflow)?;
    debug!(channel_count = current, "allocating channel id");
    put_encoded(state, keys::channel_count(executor), &next)?;
    Ok(ChannelId(next))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn ids_increase_by_one_from_one() {
        let mut store = MemoryStore::new();
        assert_eq!(count(&store, "paychan").unwrap(), 0);
        assert_eq!(allocate(&mut store, "paychan").unwrap(), ChannelId(1));
        assert_eq!(allocate(&mut store, "paychan").unwrap(), ChannelId(2));
        assert_eq!(count(&store, "paychan").unwrap(), 2);
    }

    #[test]
    fn exhausted_counter_overflows() {
        let mut store = MemoryStore::new();
        put_encoded(&mut store, keys::channel_count("paychan"), &u64::MAX).unwrap();
        let err = allocate(&mut store, "paychan").unwrap_err();
        assert!(matches!(err, Error::ChannelIdOverflow));
        assert!(err.is_fatal());
        assert_eq!(count(&store, "paychan").unwrap(), u64::MAX);
    }

    #[test]
    fn counters_are_per_executor() {
        let mut store = MemoryStore::new();
        let _ = allocate(&mut store, "paychan").unwrap();
        assert_eq!(count(&store, "other").unwrap(), 0);
    }
}
