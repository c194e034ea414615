#![allow(dead_code)]

use paychan_crypto::{Address, Keypair, ProofSignature};
use paychan_executor::{
    action::*, AssetId, BalanceProof, CanonicalAsset, Channel, ChannelId, ExecContext, Executor,
    MemoryStore, Nonce, Receipt, Result, WithdrawProof,
};
use rand::SeedableRng;

pub const CHAIN: &str = "bityuan";
pub const FUNDING: u64 = 1_000;

// Seeded rng for replicable tests.
pub fn seeded_rng() -> impl paychan_crypto::Rng {
    const TEST_RNG_SEED: [u8; 32] = *b"NEVER USE THIS FOR ANYTHING REAL";
    rand::rngs::StdRng::from_seed(TEST_RNG_SEED)
}

pub fn native_asset() -> AssetId {
    AssetId::new("coins", "bty")
}

pub fn canonical_asset() -> CanonicalAsset {
    CanonicalAsset::new(CHAIN, "coins", "bty")
}

/// Three funded parties sharing one executor and one store.
pub struct Harness {
    pub exec: Executor,
    pub store: MemoryStore,
    pub a: Keypair,
    pub b: Keypair,
    pub c: Keypair,
    pub height: u64,
}

impl Harness {
    pub fn new() -> Self {
        let mut rng = seeded_rng();
        let exec = Executor::default();
        let mut store = MemoryStore::new();
        let a = Keypair::new(&mut rng);
        let b = Keypair::new(&mut rng);
        let c = Keypair::new(&mut rng);
        let namespace = exec.config().exec_address();
        for kp in [&a, &b, &c].iter() {
            let _ = exec
                .ledger()
                .credit(&mut store, &native_asset(), &namespace, &kp.address(), FUNDING)
                .unwrap();
        }
        Self {
            exec,
            store,
            a,
            b,
            c,
            height: 1,
        }
    }

    pub fn ctx(&self, signer: Address) -> ExecContext {
        ExecContext::new(self.height, signer, CHAIN)
    }

    /// Execute and commit an action signed by `signer` at the current height.
    pub fn run(&mut self, signer: Address, action: &Action) -> Result<Receipt> {
        let ctx = self.ctx(signer);
        self.exec.exec_and_commit(&mut self.store, &ctx, action)
    }

    pub fn channel(&self, channel_id: u64) -> Channel {
        self.exec
            .get_channel(&self.store, ChannelId(channel_id))
            .unwrap()
    }

    pub fn balance(&self, address: &Address) -> u64 {
        let namespace = self.exec.config().exec_address();
        self.exec
            .ledger()
            .balance(&self.store, &native_asset(), &namespace, address)
            .unwrap()
    }

    pub fn escrow_balance(&self, channel_id: u64) -> u64 {
        self.balance(&self.exec.config().escrow_address(ChannelId(channel_id)))
    }

    /// A channel opened by `a` with `b`, `a` depositing `amount`.
    pub fn open_ab(&mut self, amount: u64) -> ChannelId {
        let action = open(&self.b.address(), amount);
        let _ = self.run(self.a.address(), &action).unwrap();
        ChannelId(self.exec.channel_count(&self.store).unwrap())
    }
}

pub fn open(partner: &Address, amount: u64) -> Action {
    Action::Open(OpenChannel {
        asset: AssetId::new("coins", ""),
        partner: *partner,
        settle_timeout: 20,
        amount,
    })
}

pub fn deposit(channel_id: ChannelId, total_deposit: u64) -> Action {
    Action::Deposit(DepositChannel {
        channel_id,
        total_deposit,
    })
}

pub fn balance_proof(
    signer: &Keypair,
    channel_id: ChannelId,
    nonce: u64,
    transferred_amount: u64,
) -> (BalanceProof, ProofSignature) {
    let proof = BalanceProof {
        channel_id,
        nonce: Nonce(nonce),
        transferred_amount,
        asset: canonical_asset(),
        addition_hash: Vec::new(),
    };
    let sig = signer.sign(&proof);
    (proof, sig)
}

pub fn withdraw(
    signer: &Keypair,
    withdrawer: &Address,
    channel_id: ChannelId,
    total_withdraw: u64,
    expiration_block: u64,
) -> Action {
    let proof = WithdrawProof {
        channel_id,
        withdrawer: *withdrawer,
        total_withdraw,
        expiration_block,
        asset: canonical_asset(),
    };
    let partner_signature = signer.sign(&proof);
    Action::Withdraw(WithdrawChannel {
        channel_id,
        proof,
        partner_signature,
    })
}

pub fn close(non_closer: &Keypair, channel_id: ChannelId, nonce: u64, amount: u64) -> Action {
    let (non_closer_proof, non_closer_signature) =
        balance_proof(non_closer, channel_id, nonce, amount);
    Action::Close(CloseChannel {
        channel_id,
        non_closer_proof,
        non_closer_signature,
    })
}

pub fn update(partner: &Keypair, channel_id: ChannelId, nonce: u64, amount: u64) -> Action {
    let (partner_proof, partner_signature) = balance_proof(partner, channel_id, nonce, amount);
    Action::UpdateProof(UpdateBalanceProof {
        channel_id,
        partner_proof,
        partner_signature,
    })
}

pub fn settle(channel_id: ChannelId, self_transferred: u64, partner_transferred: u64) -> Action {
    Action::Settle(Settle {
        channel_id,
        self_transferred,
        partner_transferred,
    })
}
