mod test_utils;

use paychan_crypto::{
    recover_address, Address, DigestBuilder, Error, Keypair, ProofDigest, ProofSignature,
    PublicKey, SignedMessage,
};
use std::str::FromStr;
use test_utils::seeded_rng;

#[derive(Debug, Clone, PartialEq)]
struct Voucher {
    to: Address,
    amount: u64,
    memo: Vec<u8>,
}

impl ProofDigest for Voucher {
    fn digest(&self, builder: &mut DigestBuilder) {
        self.to.digest(builder);
        self.amount.digest(builder);
        self.memo.digest(builder);
    }
}

impl SignedMessage for Voucher {
    const DOMAIN: &'static [u8] = b"paychan/test-voucher/v1";
}

fn voucher() -> Voucher {
    Voucher {
        to: Address::derive(b"recipient"),
        amount: 500,
        memo: b"lunch".to_vec(),
    }
}

#[test]
fn signer_is_recovered_from_signature() {
    let mut rng = seeded_rng();
    let alice = Keypair::new(&mut rng);
    let bob = Keypair::new(&mut rng);
    assert_ne!(alice.address(), bob.address());

    let sig = bob.sign(&voucher());
    assert_eq!(recover_address(&voucher(), &sig), Ok(bob.address()));
    assert!(bob.public_key().verify(&voucher(), &sig).is_verified());
    assert!(!alice.public_key().verify(&voucher(), &sig).is_verified());
}

#[test]
fn every_field_is_signed() {
    let mut rng = seeded_rng();
    let kp = Keypair::new(&mut rng);
    let sig = kp.sign(&voucher());

    let mut changed = voucher();
    changed.amount += 1;
    assert_eq!(recover_address(&changed, &sig), Err(Error::InvalidSignature));

    let mut changed = voucher();
    changed.memo.push(0);
    assert_eq!(recover_address(&changed, &sig), Err(Error::InvalidSignature));

    let mut changed = voucher();
    changed.to = Address::derive(b"someone else");
    assert_eq!(recover_address(&changed, &sig), Err(Error::InvalidSignature));
}

#[test]
fn signatures_survive_bincode() {
    let mut rng = seeded_rng();
    let kp = Keypair::new(&mut rng);
    let sig = kp.sign(&voucher());

    let bytes = bincode::serialize(&sig).unwrap();
    let decoded: ProofSignature = bincode::deserialize(&bytes).unwrap();
    assert_eq!(decoded, sig);
    assert_eq!(recover_address(&voucher(), &decoded), Ok(kp.address()));
}

#[test]
fn address_follows_public_key() {
    let kp = Keypair::from_seed(&[7; 32]);
    let key = PublicKey::from_bytes(&kp.public_key().to_bytes()).unwrap();
    assert_eq!(key.address(), kp.address());
    assert_eq!(Address::from_public_key(&key), kp.address());

    let rendered = kp.address().to_string();
    assert!(rendered.starts_with("0x"));
    assert_eq!(Address::from_str(&rendered), Ok(kp.address()));
    assert_eq!(Address::from_str(&rendered[2..]), Ok(kp.address()));
}
