/*!
Off-chain messages exchanged by channel participants and later submitted on-chain.

A [`BalanceProof`] is signed by the participant who has been paying: it attests to the cumulative
amount sent to the counterparty as of some [`Nonce`]. A [`WithdrawProof`] is signed by the
counterparty of a participant who wants to withdraw, authorizing the withdrawal up to a cumulative
amount until an expiration height.

Both messages name the channel, chain and asset they belong to, and each is signed under its own
domain tag, so a proof can be replayed neither on another channel or chain nor as the other kind
of proof.
*/

use crate::{ChannelId, Error, Nonce, Result};
use paychan_crypto::{Address, DigestBuilder, Keypair, ProofDigest, ProofSignature, SignedMessage};
use serde::{de::DeserializeOwned, *};

/// Identifies an asset on a specific chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CanonicalAsset {
    /// Chain the asset lives on.
    pub chain: String,
    /// Contract issuing the asset.
    pub issue_contract: String,
    /// Token symbol.
    pub token_symbol: String,
}

impl CanonicalAsset {
    /// Construct a canonical asset identifier.
    pub fn new(
        chain: impl Into<String>,
        issue_contract: impl Into<String>,
        token_symbol: impl Into<String>,
    ) -> Self {
        Self {
            chain: chain.into(),
            issue_contract: issue_contract.into(),
            token_symbol: token_symbol.into(),
        }
    }

    /// Whether this names the given asset.
    pub fn matches(&self, asset: &crate::AssetId) -> bool {
        self.issue_contract == asset.issue_contract && self.token_symbol == asset.token_symbol
    }
}

impl ProofDigest for CanonicalAsset {
    fn digest(&self, builder: &mut DigestBuilder) {
        self.chain.digest(builder);
        self.issue_contract.digest(builder);
        self.token_symbol.digest(builder);
    }
}

/// A participant's signed attestation of the cumulative amount they have sent the counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceProof {
    /// Channel the proof belongs to.
    pub channel_id: ChannelId,
    /// Sequence number; a proof only replaces a recorded one with a lower nonce.
    pub nonce: Nonce,
    /// Cumulative amount transferred to the counterparty.
    pub transferred_amount: u64,
    /// Asset and chain the channel escrows.
    pub asset: CanonicalAsset,
    /// Opaque data committed to by the signer.
    pub addition_hash: Vec<u8>,
}

impl ProofDigest for BalanceProof {
    fn digest(&self, builder: &mut DigestBuilder) {
        self.channel_id.digest(builder);
        self.nonce.digest(builder);
        self.transferred_amount.digest(builder);
        self.asset.digest(builder);
        self.addition_hash.digest(builder);
    }
}

impl SignedMessage for BalanceProof {
    const DOMAIN: &'static [u8] = b"paychan/balance-proof/v1";
}

/// A counterparty's signed authorization for a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawProof {
    /// Channel the withdrawal is from.
    pub channel_id: ChannelId,
    /// The participant allowed to withdraw.
    pub withdrawer: Address,
    /// Cumulative amount the withdrawer may have withdrawn after this withdrawal.
    pub total_withdraw: u64,
    /// The proof is valid strictly below this block height.
    pub expiration_block: u64,
    /// Asset and chain the channel escrows.
    pub asset: CanonicalAsset,
}

impl ProofDigest for WithdrawProof {
    fn digest(&self, builder: &mut DigestBuilder) {
        self.channel_id.digest(builder);
        self.withdrawer.digest(builder);
        self.total_withdraw.digest(builder);
        self.expiration_block.digest(builder);
        self.asset.digest(builder);
    }
}

impl SignedMessage for WithdrawProof {
    const DOMAIN: &'static [u8] = b"paychan/withdraw-proof/v1";
}

#[cfg(feature = "sqlite")]
paychan_crypto::impl_sqlx_for_bincode_ty!(BalanceProof);
#[cfg(feature = "sqlite")]
paychan_crypto::impl_sqlx_for_bincode_ty!(WithdrawProof);

/// Helpers for handing proofs between participants as hex strings.
pub trait ProofCodec: SignedMessage + Serialize + DeserializeOwned + Sized {
    /// Sign the proof.
    fn sign(&self, keypair: &Keypair) -> ProofSignature {
        keypair.sign(self)
    }

    /// Encode the proof as `0x`-prefixed hex.
    fn encode_hex(&self) -> Result<String> {
        let bytes = bincode::serialize(self).map_err(Error::Codec)?;
        Ok(format!("0x{}", hex::encode(bytes)))
    }

    /// Decode a proof from hex, with or without the `0x` prefix.
    fn decode_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| Error::InvalidParam("proof is not valid hex"))?;
        bincode::deserialize(&bytes).map_err(Error::Codec)
    }
}

impl ProofCodec for BalanceProof {}
impl ProofCodec for WithdrawProof {}

/// Encode a signature as `0x`-prefixed hex.
pub fn encode_signature_hex(sig: &ProofSignature) -> Result<String> {
    let bytes = bincode::serialize(sig).map_err(Error::Codec)?;
    Ok(format!("0x{}", hex::encode(bytes)))
}

/// Decode a signature from hex, with or without the `0x` prefix.
pub fn decode_signature_hex(s: &str) -> Result<ProofSignature> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|_| Error::InvalidParam("signature is not valid hex"))?;
    bincode::deserialize(&bytes).map_err(Error::Codec)
}
