//! Block-file aggregates, block-header records, and transaction
//! locations as they cross the storage boundary. Raw block and undo
//! data live in flat files owned elsewhere; only offsets are kept here.

use crate::hash::{sha3_256, BlockHash};

/// Aggregate stats for one physical block-storage file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockFileStats {
    pub blocks: u32,
    pub size: u32,
    pub undo_size: u32,
    pub height_first: u32,
    pub height_last: u32,
    pub time_first: u64,
    pub time_last: u64,
}

/// One row of the block-header metadata graph. Rows form a hash-linked
/// forest: heights are not unique, forks coexist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockIndexRecord {
    pub hash: BlockHash,
    /// Null hash for a root/genesis entry.
    pub prev_hash: BlockHash,
    pub height: u32,
    pub file: u32,
    pub data_pos: u32,
    pub undo_pos: u32,
    pub tx_count: u32,
    pub status: u32,
    pub version: u32,
    pub merkle_root: [u8; 32],
    pub aux_root: [u8; 32],
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockIndexRecord {
    /// Proof-of-work hashing input: the canonical 112-byte header
    /// serialization (version ‖ prev_hash ‖ merkle_root ‖ aux_root ‖
    /// time ‖ bits ‖ nonce), all integers little-endian.
    pub fn header_bytes(&self) -> [u8; 112] {
        let mut buf = [0u8; 112];
        buf[0..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..36].copy_from_slice(&self.prev_hash);
        buf[36..68].copy_from_slice(&self.merkle_root);
        buf[68..100].copy_from_slice(&self.aux_root);
        buf[100..104].copy_from_slice(&self.time.to_le_bytes());
        buf[104..108].copy_from_slice(&self.bits.to_le_bytes());
        buf[108..112].copy_from_slice(&self.nonce.to_le_bytes());
        buf
    }

    /// Hash the header hashing input. This is both the block identity
    /// and the value compared against the compact-bits target.
    pub fn pow_hash(&self) -> BlockHash {
        sha3_256(&self.header_bytes())
    }
}

/// Location of one transaction inside the flat block files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxPosition {
    pub file: u32,
    pub block_pos: u32,
    pub tx_pos: u32,
}
