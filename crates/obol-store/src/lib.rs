//! `obol-store` — persistent chain-state storage for the Obol node.
//!
//! Two independently openable redb-backed stores with canonical byte
//! layouts:
//! - [`CoinStore`]: the unspent-output table, its derived address
//!   index, and the `best_block`/`head_block` tip markers that drive
//!   restart recovery after an interrupted chain-tip update.
//! - [`BlockIndexStore`]: block-file aggregates, the block-header
//!   metadata forest (plus its height index), the optional transaction
//!   location index, and small persisted flags.
//!
//! Batch writes are single atomic transactions committed without a
//! disk sync; durability is a separate, caller-requested flush. At
//! most one batch writer per store at a time is a caller-enforced
//! precondition; concurrent readers always observe a consistent
//! snapshot.

pub mod blocktree;
pub mod codec;
pub mod coins;
pub mod config;
pub mod error;

pub use blocktree::BlockIndexStore;
pub use coins::{CoinCursor, CoinStore};
pub use config::StoreOptions;
pub use error::StoreError;
