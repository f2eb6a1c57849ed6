//! Unspent transaction outputs and the caller-owned mutation set that
//! the chain-state manager drains into the coin store.

use std::collections::HashMap;

/// Reference to a single transaction output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub txid: [u8; 32],
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: [u8; 32], vout: u32) -> Self {
        Self { txid, vout }
    }
}

/// One unspent output. Spent coins are deleted from the store, never
/// flagged in place, so there is no spent marker here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coin {
    pub coinbase: bool,
    pub height: u32,
    pub amount: u64,
    pub script: Vec<u8>,
}

/// Cache entry staged by the chain-state manager. `coin == None` means
/// the output was spent (or un-created by a disconnect) and its row
/// must be deleted. Only entries marked dirty are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinEntry {
    pub coin: Option<Coin>,
    pub dirty: bool,
}

impl CoinEntry {
    pub fn unspent(coin: Coin) -> Self {
        Self {
            coin: Some(coin),
            dirty: true,
        }
    }

    pub fn spent() -> Self {
        Self {
            coin: None,
            dirty: true,
        }
    }
}

/// In-memory mutation set, owned by the caller and fully consumed by
/// `CoinStore::batch_write` regardless of per-entry outcome.
pub type CoinsMap = HashMap<OutPoint, CoinEntry>;
