//! On-disk store behavior across process-style open/close cycles.

use obol_chain::{
    p2pkh_script, BlockFileStats, BlockIndexRecord, Coin, CoinEntry, CoinsMap, HeaderArena,
    HeaderTree, OutPoint, PowParams, ShutdownFlag,
};
use obol_store::{BlockIndexStore, CoinStore, StoreOptions};

const TIP: [u8; 32] = [0xaa; 32];

fn sample_coin() -> Coin {
    Coin {
        coinbase: false,
        height: 12,
        amount: 5_000,
        script: p2pkh_script(&[0x44; 20]),
    }
}

#[test]
fn coin_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let outpoint = OutPoint::new([0x11; 32], 1);

    {
        let store = CoinStore::open(dir.path(), &StoreOptions::default()).unwrap();
        let mut map = CoinsMap::new();
        map.insert(outpoint, CoinEntry::unspent(sample_coin()));
        store.batch_write(&mut map, &TIP, true).unwrap();
    }

    let store = CoinStore::open(dir.path(), &StoreOptions::default()).unwrap();
    assert_eq!(store.get_best_block().unwrap(), TIP);
    assert_eq!(store.get_coin(&outpoint).unwrap(), Some(sample_coin()));
    assert!(store.get_head_blocks().unwrap().is_empty());

    let mut cursor = store.cursor().unwrap();
    assert_eq!(cursor.view_block(), TIP);
    assert!(cursor.valid());
    assert_eq!(cursor.get_key(), Some(outpoint));
    cursor.next().unwrap();
    assert!(!cursor.valid());
}

#[test]
fn coin_store_wipe_on_open_resets_everything() {
    let dir = tempfile::tempdir().unwrap();
    let outpoint = OutPoint::new([0x11; 32], 0);

    {
        let store = CoinStore::open(dir.path(), &StoreOptions::default()).unwrap();
        let mut map = CoinsMap::new();
        map.insert(outpoint, CoinEntry::unspent(sample_coin()));
        store.batch_write(&mut map, &TIP, true).unwrap();
    }

    let options = StoreOptions {
        wipe: true,
        ..StoreOptions::default()
    };
    let store = CoinStore::open(dir.path(), &options).unwrap();
    assert!(!store.have_coin(&outpoint).unwrap());
    assert_eq!(store.get_best_block().unwrap(), obol_chain::NULL_HASH);
    assert_eq!(store.estimate_size().unwrap(), 0);
}

#[test]
fn block_index_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    // Half of all hashes satisfy this target; the nonce loop below
    // terminates almost immediately.
    let easy_bits: u32 = 0x207f_ffff;
    let params = PowParams {
        pow_limit: obol_chain::target_from_compact(easy_bits).unwrap(),
    };
    let mut record = BlockIndexRecord {
        hash: obol_chain::NULL_HASH,
        prev_hash: obol_chain::NULL_HASH,
        height: 0,
        file: 0,
        data_pos: 8,
        undo_pos: 0,
        tx_count: 1,
        status: 3,
        version: 1,
        merkle_root: [0x0a; 32],
        aux_root: [0; 32],
        time: 1_700_000_000,
        bits: easy_bits,
        nonce: 0,
    };
    while !obol_chain::check_proof_of_work(&record.pow_hash(), record.bits, &params) {
        record.nonce += 1;
    }
    record.hash = record.pow_hash();
    let stats = BlockFileStats {
        blocks: 1,
        size: 300,
        undo_size: 40,
        height_first: 0,
        height_last: 0,
        time_first: 1_700_000_000,
        time_last: 1_700_000_000,
    };

    {
        let store = BlockIndexStore::open(dir.path(), &StoreOptions::default()).unwrap();
        store
            .batch_write(&[(0, stats)], 0, &[record.clone()], true)
            .unwrap();
        store.write_reindexing(true).unwrap();
    }

    let store = BlockIndexStore::open(dir.path(), &StoreOptions::default()).unwrap();
    assert_eq!(store.read_block_file_info(0).unwrap(), Some(stats));
    assert_eq!(store.read_last_block_file().unwrap(), Some(0));
    assert!(store.read_reindexing().unwrap());

    let mut arena = HeaderArena::new();
    assert!(store
        .load_block_index(&params, &ShutdownFlag::new(), &mut arena)
        .unwrap());
    assert_eq!(arena.len(), 1);
    let id = arena.get(&record.hash).unwrap();
    assert_eq!(arena.node(id).status, 3);
    assert_eq!(arena.node(id).parent, None);
}
