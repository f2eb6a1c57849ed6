//! Hash helpers. Block and transaction hashes are 32-byte SHA3-256
//! digests; the all-zero hash is the "null" sentinel used for absent
//! tips and genesis parent links.

use sha3::{Digest, Sha3_256};

pub type BlockHash = [u8; 32];

pub const NULL_HASH: BlockHash = [0u8; 32];

pub fn is_null(hash: &BlockHash) -> bool {
    *hash == NULL_HASH
}

pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}
