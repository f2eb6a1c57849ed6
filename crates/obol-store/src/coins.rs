//! Coin store: the unspent-output table, its derived address index,
//! and the tip markers driving restart recovery.
//!
//! Table layout:
//! - `unspent`: outpoint key -> coin value (see `codec`)
//! - `unspent_address`: derived address -> outpoint keys (multimap)
//! - `marker`: `best_block` (durable tip) and `head_block` (present
//!   only inside an in-flight batch)

use std::ops::Bound;
use std::path::Path;

use rand::Rng;
use redb::{
    Database, Durability, MultimapTableDefinition, ReadOnlyTable, ReadTransaction, ReadableTable,
    ReadableTableMetadata, TableDefinition,
};
use tracing::{debug, error};

use obol_chain::{
    encode_destination, extract_destination, hash, BlockHash, Coin, CoinsMap, OutPoint,
};

use crate::codec;
use crate::config::StoreOptions;
use crate::error::StoreError;

const COINS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("unspent");
const COINS_BY_ADDRESS: MultimapTableDefinition<&str, &[u8]> =
    MultimapTableDefinition::new("unspent_address");
const MARKER: TableDefinition<&str, &[u8]> = TableDefinition::new("marker");

const BEST_BLOCK: &str = "best_block";
const HEAD_BLOCK: &str = "head_block";

/// Heuristic average on-disk size per unspent row, for
/// [`CoinStore::estimate_size`].
const APPROX_COIN_ROW_BYTES: u64 = 100;

/// How many consumed batch entries between crash-simulation checks.
const CRASH_CHECK_INTERVAL: usize = 200_000;

pub struct CoinStore {
    db: Database,
    crash_simulate: u32,
}

impl CoinStore {
    /// Open (or create) the coin store under `data_dir`.
    pub fn open(data_dir: &Path, options: &StoreOptions) -> Result<Self, StoreError> {
        let mut builder = Database::builder();
        builder.set_cache_size(options.cache_size);
        let db = if options.memory {
            builder.create_with_backend(redb::backends::InMemoryBackend::new())?
        } else {
            builder.create(data_dir.join("coins.redb"))?
        };

        let tx = db.begin_write()?;
        if options.wipe {
            tx.delete_table(COINS)?;
            tx.delete_multimap_table(COINS_BY_ADDRESS)?;
            tx.delete_table(MARKER)?;
        }
        // Open each table so later readers never see a missing table.
        tx.open_table(COINS)?;
        tx.open_multimap_table(COINS_BY_ADDRESS)?;
        tx.open_table(MARKER)?;
        tx.commit().map_err(StoreError::Commit)?;

        Ok(Self {
            db,
            crash_simulate: options.crash_simulate,
        })
    }

    /// Exact lookup. A missing outpoint is `None`, not an error.
    pub fn get_coin(&self, outpoint: &OutPoint) -> Result<Option<Coin>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(COINS)?;
        let key = codec::outpoint_key(outpoint);
        match table.get(key.as_slice())? {
            Some(guard) => Ok(Some(codec::decode_coin(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Existence check without decoding the row.
    pub fn have_coin(&self, outpoint: &OutPoint) -> Result<bool, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(COINS)?;
        let key = codec::outpoint_key(outpoint);
        Ok(table.get(key.as_slice())?.is_some())
    }

    /// The durably committed chain tip; the null hash when unset.
    pub fn get_best_block(&self) -> Result<BlockHash, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(MARKER)?;
        match table.get(BEST_BLOCK)? {
            Some(guard) => codec::decode_hash(guard.value()),
            None => Ok(hash::NULL_HASH),
        }
    }

    /// Marker values in descending name order. Exactly two markers mean
    /// an interrupted batch: `[head_block, best_block]`. Any other
    /// count collapses to empty — "no interrupted batch".
    pub fn get_head_blocks(&self) -> Result<Vec<BlockHash>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(MARKER)?;
        let mut heads = Vec::new();
        for row in table.range::<&str>(..)?.rev() {
            let (_, value) = row?;
            heads.push(codec::decode_hash(value.value())?);
        }
        if heads.len() != 2 {
            heads.clear();
        }
        Ok(heads)
    }

    /// Apply one atomic batch of coin mutations and move the tip to
    /// `new_tip`. The mutation set is fully consumed regardless of
    /// per-entry outcome.
    ///
    /// The `head_block` marker is written first and removed after
    /// `best_block` inside the same transaction. A single atomic
    /// transaction can never expose the intermediate state, but the
    /// marker dance is kept so the marker table stays bit-compatible
    /// with backends that commit a logical batch in several steps and
    /// recover through `get_head_blocks` after an external kill.
    ///
    /// At most one batch writer per store is a caller-enforced
    /// precondition.
    pub fn batch_write(
        &self,
        coins: &mut CoinsMap,
        new_tip: &BlockHash,
        sync: bool,
    ) -> Result<(), StoreError> {
        assert!(
            !hash::is_null(new_tip),
            "batch_write: refusing to commit a null chain tip"
        );

        let mut old_tip = self.get_best_block()?;
        if hash::is_null(&old_tip) {
            // Possibly mid-recovery: an interrupted batch left both
            // markers behind and this call retries it.
            let heads = self.get_head_blocks()?;
            if heads.len() == 2 {
                assert_eq!(
                    heads[0], *new_tip,
                    "batch_write: interrupted batch retried with a different tip"
                );
                old_tip = heads[1];
            }
        }

        let mut count: usize = 0;
        let mut changed: usize = 0;

        let mut tx = self.db.begin_write()?;
        tx.set_durability(Durability::None);
        {
            let mut table = tx.open_table(COINS)?;
            let mut by_address = tx.open_multimap_table(COINS_BY_ADDRESS)?;
            let mut marker = tx.open_table(MARKER)?;

            marker.insert(HEAD_BLOCK, new_tip.as_slice())?;

            for (outpoint, entry) in coins.drain() {
                if entry.dirty {
                    let key = codec::outpoint_key(&outpoint);
                    // Drop the stale address-index row, if any.
                    let old_address = match table.get(key.as_slice())? {
                        Some(guard) => codec::decode_coin(guard.value())
                            .ok()
                            .and_then(|coin| address_of(&coin.script)),
                        None => None,
                    };
                    if let Some(address) = old_address {
                        by_address.remove(address.as_str(), key.as_slice())?;
                    }
                    match entry.coin {
                        // Spent (or unwound by a disconnect): delete.
                        None => {
                            table.remove(key.as_slice())?;
                        }
                        Some(coin) => {
                            table.insert(key.as_slice(), codec::encode_coin(&coin).as_slice())?;
                            if let Some(address) = address_of(&coin.script) {
                                by_address.insert(address.as_str(), key.as_slice())?;
                            }
                        }
                    }
                    changed += 1;
                }
                count += 1;
                if self.crash_simulate != 0
                    && count % CRASH_CHECK_INTERVAL == 0
                    && rand::thread_rng().gen_range(0..self.crash_simulate) == 0
                {
                    error!("simulating a crash mid-batch, goodbye");
                    std::process::exit(0);
                }
            }

            marker.insert(BEST_BLOCK, new_tip.as_slice())?;
            marker.remove(HEAD_BLOCK)?;
        }

        if let Err(e) = tx.commit() {
            error!("error committing transaction output changes to coin store: {e}");
            return Err(StoreError::Commit(e));
        }
        debug!(
            changed,
            count,
            old_tip = %hex::encode(old_tip),
            new_tip = %hex::encode(new_tip),
            "committed coin batch"
        );

        if sync {
            self.flush()?;
        }
        Ok(())
    }

    /// Make every previous commit durable. Reported distinctly from
    /// commit failure: the logical update already succeeded.
    pub fn flush(&self) -> Result<(), StoreError> {
        let mut tx = self.db.begin_write()?;
        tx.set_durability(Durability::Immediate);
        if let Err(e) = tx.commit() {
            error!("error syncing coin store: {e}");
            return Err(StoreError::Flush(e));
        }
        Ok(())
    }

    /// Approximate on-disk footprint: row count times an average row
    /// size. A coarse cache-sizing heuristic, not byte-accurate.
    pub fn estimate_size(&self) -> Result<u64, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(COINS)?;
        Ok(table.len()? * APPROX_COIN_ROW_BYTES)
    }

    /// Open a forward-only snapshot cursor over the full unspent table.
    pub fn cursor(&self) -> Result<CoinCursor, StoreError> {
        let view_block = self.get_best_block()?;
        let tx = self.db.begin_read()?;
        let table = tx.open_table(COINS)?;
        let mut cursor = CoinCursor {
            _tx: tx,
            table,
            view_block,
            current: None,
        };
        cursor.seek_after(None)?;
        Ok(cursor)
    }

    /// Unspent outpoints whose derived address equals `address`.
    pub fn coins_with_address(&self, address: &str) -> Result<Vec<OutPoint>, StoreError> {
        use redb::ReadableMultimapTable;
        let tx = self.db.begin_read()?;
        let table = tx.open_multimap_table(COINS_BY_ADDRESS)?;
        let mut outpoints = Vec::new();
        for value in table.get(address)? {
            outpoints.push(codec::decode_outpoint_key(value?.value())?);
        }
        Ok(outpoints)
    }
}

fn address_of(script: &[u8]) -> Option<String> {
    extract_destination(script).map(|destination| encode_destination(&destination))
}

/// Point-in-time iterator over the full unspent table, in
/// `(txid, vout)` order. Forward-only and single-pass; concurrent
/// writers never affect what it yields.
pub struct CoinCursor {
    _tx: ReadTransaction,
    table: ReadOnlyTable<&'static [u8], &'static [u8]>,
    view_block: BlockHash,
    current: Option<(OutPoint, Coin)>,
}

impl CoinCursor {
    /// `best_block` at the time the cursor was opened — the logical
    /// view this snapshot represents.
    pub fn view_block(&self) -> BlockHash {
        self.view_block
    }

    pub fn valid(&self) -> bool {
        self.current.is_some()
    }

    pub fn get_key(&self) -> Option<OutPoint> {
        self.current.as_ref().map(|(outpoint, _)| *outpoint)
    }

    pub fn get_value(&self) -> Option<Coin> {
        self.current.as_ref().map(|(_, coin)| coin.clone())
    }

    /// Step to the next entry; a cursor past the end stays invalid.
    pub fn next(&mut self) -> Result<(), StoreError> {
        if let Some((outpoint, _)) = self.current.take() {
            self.seek_after(Some(codec::outpoint_key(&outpoint)))?;
        }
        Ok(())
    }

    fn seek_after(&mut self, after: Option<[u8; 36]>) -> Result<(), StoreError> {
        let row = match &after {
            None => self.table.range::<&[u8]>(..)?.next(),
            Some(key) => self
                .table
                .range::<&[u8]>((Bound::Excluded(key.as_slice()), Bound::Unbounded))?
                .next(),
        };
        self.current = match row {
            Some(row) => {
                let (key, value) = row?;
                Some((
                    codec::decode_outpoint_key(key.value())?,
                    codec::decode_coin(value.value())?,
                ))
            }
            None => None,
        };
        Ok(())
    }
}
