//! Executor configuration.

use crate::{AssetId, ChannelId, Error, Result};
use paychan_crypto::Address;
use serde::*;

/// Keys and parameters used throughout the lifetime of an executor, across all its channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Executor name. Prefixes every state key and seeds the executor's derived addresses.
    pub executor_name: String,
    /// Contract that issues the host's native asset.
    pub native_contract: String,
    /// Symbol of the host's native asset.
    pub native_symbol: String,
    /// Lower clamp for the settle timeout requested at Open.
    pub min_settle_timeout: u64,
    /// Upper clamp for the settle timeout requested at Open.
    pub max_settle_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executor_name: "paychan".to_string(),
            native_contract: "coins".to_string(),
            native_symbol: "bty".to_string(),
            min_settle_timeout: 10,
            max_settle_timeout: 10_000,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the executor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.executor_name.is_empty() {
            return Err(Error::InvalidConfig("empty executor name".to_string()));
        }
        if self.native_contract.is_empty() {
            return Err(Error::InvalidConfig("empty native contract".to_string()));
        }
        if self.min_settle_timeout > self.max_settle_timeout {
            return Err(Error::InvalidConfig(format!(
                "min settle timeout {} exceeds max settle timeout {}",
                self.min_settle_timeout, self.max_settle_timeout
            )));
        }
        Ok(())
    }

    /// Clamp a requested settle timeout into the configured bounds.
    pub fn clamp_settle_timeout(&self, requested: u64) -> u64 {
        requested.clamp(self.min_settle_timeout, self.max_settle_timeout)
    }

    /// The executor's own address. All escrowed assets live in this namespace.
    pub fn exec_address(&self) -> Address {
        Address::derive(self.executor_name.as_bytes())
    }

    /// The deterministic escrow account of one channel.
    pub fn escrow_address(&self, channel_id: ChannelId) -> Address {
        Address::derive(format!("{}/escrow/{}", self.executor_name, channel_id).as_bytes())
    }

    /// Whether the asset is issued by the native contract.
    pub fn is_native(&self, asset: &AssetId) -> bool {
        asset.issue_contract == self.native_contract
    }

    /// Fill in the native symbol when an asset leaves its symbol empty.
    pub(crate) fn normalize_asset(&self, asset: &AssetId) -> AssetId {
        if asset.token_symbol.is_empty() {
            AssetId::new(asset.issue_contract.clone(), self.native_symbol.clone())
        } else {
            asset.clone()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_json_takes_defaults() {
        let config = Config::from_json(r#"{"native_symbol": "para"}"#).unwrap();
        assert_eq!(config.native_symbol, "para");
        assert_eq!(config.executor_name, "paychan");
        assert_eq!(config.min_settle_timeout, 10);
    }

    #[test]
    fn inverted_timeouts_are_rejected() {
        let err = Config::from_json(r#"{"min_settle_timeout": 50, "max_settle_timeout": 5}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn timeout_is_clamped() {
        let config = Config::default();
        assert_eq!(config.clamp_settle_timeout(0), 10);
        assert_eq!(config.clamp_settle_timeout(500), 500);
        assert_eq!(config.clamp_settle_timeout(10_001), 10_000);
    }

    #[test]
    fn escrows_differ_per_channel() {
        let config = Config::default();
        assert_ne!(
            config.escrow_address(ChannelId(1)),
            config.escrow_address(ChannelId(2))
        );
        assert_ne!(config.escrow_address(ChannelId(1)), config.exec_address());
    }
}
