//! Read-only queries over executor state.

use crate::{
    ledger::AssetLedger,
    registry,
    store::{get_decoded, keys, StateRead},
    Channel, ChannelId, Error, Executor, Result,
};
use serde::*;

/// A query against executor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    /// Fetch one channel.
    GetChannel(ChannelId),
    /// Fetch the number of channels ever opened.
    GetChannelCount,
}

impl Query {
    /// Query name.
    pub fn name(&self) -> &'static str {
        match self {
            Query::GetChannel(_) => "GetChannel",
            Query::GetChannelCount => "GetChannelCount",
        }
    }
}

/// Answer to a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryResponse {
    /// The requested channel.
    Channel(Channel),
    /// Number of channels opened so far.
    ChannelCount(u64),
}

impl<L: AssetLedger> Executor<L> {
    /// The channel stored under `channel_id`.
    pub fn get_channel<S: StateRead + ?Sized>(
        &self,
        state: &S,
        channel_id: ChannelId,
    ) -> Result<Channel> {
        get_decoded(state, &keys::channel(&self.config.executor_name, channel_id))?
            .ok_or(Error::ChannelNotFound(channel_id))
    }

    /// Number of channels opened so far.
    pub fn channel_count<S: StateRead + ?Sized>(&self, state: &S) -> Result<u64> {
        registry::count(state, &self.config.executor_name)
    }

    /// Answer a query.
    pub fn query<S: StateRead + ?Sized>(&self, state: &S, query: Query) -> Result<QueryResponse> {
        match query {
            Query::GetChannel(channel_id) => {
                self.get_channel(state, channel_id).map(QueryResponse::Channel)
            }
            Query::GetChannelCount => self.channel_count(state).map(QueryResponse::ChannelCount),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn empty_state_has_no_channels() {
        let exec: Executor = Executor::default();
        let store = MemoryStore::new();
        assert_eq!(
            exec.query(&store, Query::GetChannelCount).unwrap(),
            QueryResponse::ChannelCount(0)
        );
        assert!(matches!(
            exec.query(&store, Query::GetChannel(ChannelId(1))),
            Err(Error::ChannelNotFound(ChannelId(1)))
        ));
    }

    #[test]
    fn response_serializes_to_json() {
        let json = serde_json::to_string(&QueryResponse::ChannelCount(3)).unwrap();
        assert_eq!(json, r#"{"ChannelCount":3}"#);
    }
}
