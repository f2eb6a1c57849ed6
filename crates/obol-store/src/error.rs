//! Store error taxonomy.
//!
//! Missing rows are `Option::None`, never errors. Caller contract
//! violations (committing a null tip) are assertions, not variants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening or creating the backing database failed.
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Starting a read or write transaction failed.
    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    /// Transaction commit failed; no partial writes persisted and the
    /// in-progress chain-state update did not happen.
    #[error("commit failed: {0}")]
    Commit(redb::CommitError),

    /// The post-commit durability flush failed. The logical update
    /// already committed; only extra crash-survival was not obtained.
    #[error("durability flush failed: {0}")]
    Flush(redb::CommitError),

    /// A stored row failed to decode.
    #[error("corrupt row: {0}")]
    Codec(String),

    /// A stored header failed proof-of-work re-validation during bulk
    /// load. Fatal: the whole load is aborted.
    #[error("proof of work check failed for block {} at height {height}", hex::encode(.hash))]
    PowInvalid { hash: [u8; 32], height: u32 },
}
