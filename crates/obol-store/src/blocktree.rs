//! Block index store: block-file aggregates, the header metadata
//! forest with its height index, the optional transaction location
//! index, and small persisted flags.

use std::path::Path;

use redb::{
    Database, Durability, MultimapTableDefinition, ReadableMultimapTable, ReadableTable,
    TableDefinition,
};
use tracing::{debug, error};

use obol_chain::{
    check_proof_of_work, hash, BlockFileStats, BlockIndexRecord, HeaderTree, PowParams,
    ShutdownFlag, TxPosition,
};

use crate::codec;
use crate::config::StoreOptions;
use crate::error::StoreError;

const BLOCK_FILE: TableDefinition<u32, &[u8]> = TableDefinition::new("block_file");
const BLOCK_INFO: TableDefinition<&[u8], &[u8]> = TableDefinition::new("block_info");
// Non-unique on purpose: forks share heights. Drives the ascending
// height order of `load_block_index`.
const BLOCK_HEIGHT: MultimapTableDefinition<u32, &[u8]> =
    MultimapTableDefinition::new("block_info_height");
const TX_TO_BLOCK: TableDefinition<&[u8], &[u8]> = TableDefinition::new("tx_to_block");
const FLAG: TableDefinition<&str, u64> = TableDefinition::new("flag");

const FLAG_LAST_BLOCK: &str = "last_block";
const FLAG_REINDEXING: &str = "reindexing";

/// Shutdown is polled when a loaded row's height crosses this modulus
/// boundary, not on every row.
const SHUTDOWN_POLL_MASK: u32 = 0x3ff;

pub struct BlockIndexStore {
    db: Database,
}

impl BlockIndexStore {
    /// Open (or create) the block index store under `data_dir`.
    pub fn open(data_dir: &Path, options: &StoreOptions) -> Result<Self, StoreError> {
        let mut builder = Database::builder();
        builder.set_cache_size(options.cache_size);
        let db = if options.memory {
            builder.create_with_backend(redb::backends::InMemoryBackend::new())?
        } else {
            builder.create(data_dir.join("block_index.redb"))?
        };

        let tx = db.begin_write()?;
        if options.wipe {
            tx.delete_table(BLOCK_FILE)?;
            tx.delete_table(BLOCK_INFO)?;
            tx.delete_multimap_table(BLOCK_HEIGHT)?;
            tx.delete_table(TX_TO_BLOCK)?;
            tx.delete_table(FLAG)?;
        }
        tx.open_table(BLOCK_FILE)?;
        tx.open_table(BLOCK_INFO)?;
        tx.open_multimap_table(BLOCK_HEIGHT)?;
        tx.open_table(TX_TO_BLOCK)?;
        tx.open_table(FLAG)?;
        tx.commit().map_err(StoreError::Commit)?;

        Ok(Self { db })
    }

    pub fn read_block_file_info(&self, file: u32) -> Result<Option<BlockFileStats>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(BLOCK_FILE)?;
        match table.get(file)? {
            Some(guard) => Ok(Some(codec::decode_file_stats(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn read_last_block_file(&self) -> Result<Option<u32>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(FLAG)?;
        Ok(table.get(FLAG_LAST_BLOCK)?.map(|guard| guard.value() as u32))
    }

    pub fn write_reindexing(&self, reindexing: bool) -> Result<(), StoreError> {
        self.write_flag(FLAG_REINDEXING, reindexing)
    }

    /// An absent flag reads as "not reindexing".
    pub fn read_reindexing(&self) -> Result<bool, StoreError> {
        Ok(self.read_flag(FLAG_REINDEXING)?.unwrap_or(false))
    }

    pub fn write_flag(&self, name: &str, value: bool) -> Result<(), StoreError> {
        let tx = self.db.begin_write()?;
        {
            let mut table = tx.open_table(FLAG)?;
            table.insert(name, value as u64)?;
        }
        tx.commit().map_err(StoreError::Commit)?;
        Ok(())
    }

    pub fn read_flag(&self, name: &str) -> Result<Option<bool>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(FLAG)?;
        Ok(table.get(name)?.map(|guard| guard.value() != 0))
    }

    /// Upsert file stats, the `last_block` flag, and header records
    /// (with their height-index rows) in one atomic transaction.
    /// Header heights never change across replacements, so the height
    /// index stays consistent under status-bit updates.
    pub fn batch_write(
        &self,
        file_infos: &[(u32, BlockFileStats)],
        last_file: u32,
        records: &[BlockIndexRecord],
        sync: bool,
    ) -> Result<(), StoreError> {
        let mut tx = self.db.begin_write()?;
        tx.set_durability(Durability::None);
        {
            let mut files = tx.open_table(BLOCK_FILE)?;
            for (file, stats) in file_infos {
                files.insert(*file, codec::encode_file_stats(stats).as_slice())?;
            }
            let mut flags = tx.open_table(FLAG)?;
            flags.insert(FLAG_LAST_BLOCK, last_file as u64)?;

            let mut info = tx.open_table(BLOCK_INFO)?;
            let mut by_height = tx.open_multimap_table(BLOCK_HEIGHT)?;
            for record in records {
                info.insert(
                    record.hash.as_slice(),
                    codec::encode_block_record(record).as_slice(),
                )?;
                by_height.insert(record.height, record.hash.as_slice())?;
            }
        }
        if let Err(e) = tx.commit() {
            error!("error committing block info to block index store: {e}");
            return Err(StoreError::Commit(e));
        }
        debug!(
            files = file_infos.len(),
            records = records.len(),
            last_file,
            "committed block index batch"
        );
        if sync {
            self.flush()?;
        }
        Ok(())
    }

    /// Make every previous commit durable; failure is distinct from
    /// commit failure.
    pub fn flush(&self) -> Result<(), StoreError> {
        let mut tx = self.db.begin_write()?;
        tx.set_durability(Durability::Immediate);
        if let Err(e) = tx.commit() {
            error!("error syncing block index store: {e}");
            return Err(StoreError::Flush(e));
        }
        Ok(())
    }

    /// Upsert transaction locations as one atomic batch. An empty list
    /// succeeds without opening a transaction.
    pub fn write_tx_index(&self, list: &[([u8; 32], TxPosition)]) -> Result<(), StoreError> {
        if list.is_empty() {
            return Ok(());
        }
        let mut tx = self.db.begin_write()?;
        tx.set_durability(Durability::None);
        {
            let mut table = tx.open_table(TX_TO_BLOCK)?;
            for (txid, pos) in list {
                table.insert(txid.as_slice(), codec::encode_tx_position(pos).as_slice())?;
            }
        }
        if let Err(e) = tx.commit() {
            error!("error committing tx locations to block index store: {e}");
            return Err(StoreError::Commit(e));
        }
        Ok(())
    }

    /// A txid that was never indexed is `None`, not an error.
    pub fn read_tx_index(&self, txid: &[u8; 32]) -> Result<Option<TxPosition>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(TX_TO_BLOCK)?;
        match table.get(txid.as_slice())? {
            Some(guard) => Ok(Some(codec::decode_tx_position(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Rebuild the in-memory header forest from flat storage.
    ///
    /// Scans header records in ascending height order so every parent
    /// a child references already has at least a placeholder node.
    /// Each row's proof of work is re-validated; a failure aborts the
    /// whole load as fatal corruption. The cooperative shutdown flag
    /// is polled on a height-modulus boundary; when raised the load
    /// stops cleanly and returns `Ok(false)` — not an error — and the
    /// caller discards the partial graph.
    ///
    /// The reachable-transaction count (`chain_tx`) is never written
    /// here; the linkage pass that runs afterwards owns it.
    pub fn load_block_index(
        &self,
        params: &PowParams,
        shutdown: &ShutdownFlag,
        tree: &mut dyn HeaderTree,
    ) -> Result<bool, StoreError> {
        let tx = self.db.begin_read()?;
        let info = tx.open_table(BLOCK_INFO)?;
        let by_height = tx.open_multimap_table(BLOCK_HEIGHT)?;

        let mut loaded: u64 = 0;
        for entry in by_height.range::<u32>(..)? {
            let (_, hashes) = entry?;
            for value in hashes {
                let block_hash = codec::decode_hash(value?.value())?;
                let record = match info.get(block_hash.as_slice())? {
                    Some(row) => codec::decode_block_record(&block_hash, row.value())?,
                    None => {
                        return Err(StoreError::Codec(format!(
                            "height index references missing block {}",
                            hex::encode(block_hash)
                        )))
                    }
                };

                let node = tree.get_or_create(&block_hash);
                let parent = if hash::is_null(&record.prev_hash) {
                    None
                } else {
                    Some(tree.get_or_create(&record.prev_hash))
                };
                let header = tree.node_mut(node);
                header.parent = parent;
                header.height = record.height;
                header.file = record.file;
                header.data_pos = record.data_pos;
                header.undo_pos = record.undo_pos;
                header.tx_count = record.tx_count;
                header.status = record.status;
                header.version = record.version;
                header.merkle_root = record.merkle_root;
                header.aux_root = record.aux_root;
                header.time = record.time;
                header.bits = record.bits;
                header.nonce = record.nonce;

                if !check_proof_of_work(&record.pow_hash(), record.bits, params) {
                    error!(
                        block = %hex::encode(block_hash),
                        height = record.height,
                        bits = record.bits,
                        "proof of work check failed while loading block index"
                    );
                    return Err(StoreError::PowInvalid {
                        hash: block_hash,
                        height: record.height,
                    });
                }

                loaded += 1;
                if record.height & SHUTDOWN_POLL_MASK == SHUTDOWN_POLL_MASK
                    && shutdown.is_requested()
                {
                    debug!(loaded, "block index load interrupted by shutdown");
                    return Ok(false);
                }
            }
        }
        debug!(loaded, "block index loaded");
        Ok(true)
    }
}
