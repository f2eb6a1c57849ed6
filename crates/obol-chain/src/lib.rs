//! `obol-chain` — chain primitives shared by the node and its storage layer.
//!
//! Owns the types that cross the storage boundary: outpoints and coins,
//! block-file aggregates, block-header records, the in-memory header
//! arena rebuilt at startup, compact-bits proof-of-work validation,
//! script destination extraction, and the cooperative shutdown flag.

pub mod block;
pub mod coin;
pub mod hash;
pub mod index;
pub mod pow;
pub mod script;
pub mod shutdown;

pub use block::{BlockFileStats, BlockIndexRecord, TxPosition};
pub use coin::{Coin, CoinEntry, CoinsMap, OutPoint};
pub use hash::{is_null, sha3_256, BlockHash, NULL_HASH};
pub use index::{HeaderArena, HeaderNode, HeaderTree, NodeId};
pub use pow::{check_proof_of_work, target_from_compact, PowParams};
pub use script::{encode_destination, extract_destination, p2pkh_script, Destination};
pub use shutdown::ShutdownFlag;
