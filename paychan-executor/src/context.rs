//! What the host tells the executor about the transaction being applied.

use paychan_crypto::Address;
use serde::*;

/// Per-action execution context supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecContext {
    /// Height of the block the action is executed in.
    pub height: u64,
    /// Address that signed the transaction.
    pub signer: Address,
    /// Chain identifier. Proofs must name this chain.
    pub chain: String,
}

impl ExecContext {
    /// Construct a context.
    pub fn new(height: u64, signer: Address, chain: impl Into<String>) -> Self {
        Self {
            height,
            signer,
            chain: chain.into(),
        }
    }

    /// The same transaction context with a different signer.
    pub fn signed_by(&self, signer: Address) -> Self {
        Self {
            signer,
            ..self.clone()
        }
    }

    /// The same transaction context at a different height.
    pub fn at_height(&self, height: u64) -> Self {
        Self {
            height,
            ..self.clone()
        }
    }
}
