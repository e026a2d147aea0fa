//! Keccak-256 hashing helpers

use crate::address::TxHash;
use sha3::{Digest, Keccak256};

/// Keccak-256 of arbitrary bytes
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data.as_ref());
    hasher.finalize().into()
}

/// First four bytes of the hashed canonical signature, e.g. `castVote(uint256,uint8)`
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Log topic identifying an event, e.g. `Action(address,bytes32,string,address,uint256)`
pub fn event_topic(signature: &str) -> TxHash {
    TxHash(keccak256(signature.as_bytes()))
}
