//! Canonical byte layouts for table keys and values.
//!
//! Integers are little-endian except the outpoint key's output index,
//! which is big-endian so lexicographic key order equals
//! `(txid, vout)` order — the order the coin cursor must yield.

use obol_chain::{BlockFileStats, BlockIndexRecord, Coin, OutPoint, TxPosition};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Outpoint key: txid[32] || vout_be[4] = 36 bytes
// ---------------------------------------------------------------------------

pub fn outpoint_key(outpoint: &OutPoint) -> [u8; 36] {
    let mut buf = [0u8; 36];
    buf[0..32].copy_from_slice(&outpoint.txid);
    buf[32..36].copy_from_slice(&outpoint.vout.to_be_bytes());
    buf
}

pub fn decode_outpoint_key(data: &[u8]) -> Result<OutPoint, StoreError> {
    if data.len() != 36 {
        return Err(StoreError::Codec(format!(
            "outpoint key: expected 36 bytes, got {}",
            data.len()
        )));
    }
    let mut txid = [0u8; 32];
    txid.copy_from_slice(&data[0..32]);
    let vout = u32::from_be_bytes(data[32..36].try_into().unwrap());
    Ok(OutPoint { txid, vout })
}

// ---------------------------------------------------------------------------
// Coin value: coinbase[1] || height[4] || amount[8] || script[var]
// ---------------------------------------------------------------------------

pub fn encode_coin(coin: &Coin) -> Vec<u8> {
    let mut buf = Vec::with_capacity(13 + coin.script.len());
    buf.push(coin.coinbase as u8);
    buf.extend_from_slice(&coin.height.to_le_bytes());
    buf.extend_from_slice(&coin.amount.to_le_bytes());
    buf.extend_from_slice(&coin.script);
    buf
}

pub fn decode_coin(data: &[u8]) -> Result<Coin, StoreError> {
    if data.len() < 13 {
        return Err(StoreError::Codec(format!(
            "coin: expected >= 13 bytes, got {}",
            data.len()
        )));
    }
    Ok(Coin {
        coinbase: data[0] != 0,
        height: u32::from_le_bytes(data[1..5].try_into().unwrap()),
        amount: u64::from_le_bytes(data[5..13].try_into().unwrap()),
        script: data[13..].to_vec(),
    })
}

// ---------------------------------------------------------------------------
// 32-byte hash values (tip markers, height-index entries)
// ---------------------------------------------------------------------------

pub fn decode_hash(data: &[u8]) -> Result<[u8; 32], StoreError> {
    if data.len() != 32 {
        return Err(StoreError::Codec(format!(
            "hash: expected 32 bytes, got {}",
            data.len()
        )));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(data);
    Ok(hash)
}

// ---------------------------------------------------------------------------
// Block file stats: 5 x u32 || 2 x u64 = 36 bytes
// ---------------------------------------------------------------------------

pub fn encode_file_stats(stats: &BlockFileStats) -> [u8; 36] {
    let mut buf = [0u8; 36];
    buf[0..4].copy_from_slice(&stats.blocks.to_le_bytes());
    buf[4..8].copy_from_slice(&stats.size.to_le_bytes());
    buf[8..12].copy_from_slice(&stats.undo_size.to_le_bytes());
    buf[12..16].copy_from_slice(&stats.height_first.to_le_bytes());
    buf[16..20].copy_from_slice(&stats.height_last.to_le_bytes());
    buf[20..28].copy_from_slice(&stats.time_first.to_le_bytes());
    buf[28..36].copy_from_slice(&stats.time_last.to_le_bytes());
    buf
}

pub fn decode_file_stats(data: &[u8]) -> Result<BlockFileStats, StoreError> {
    if data.len() != 36 {
        return Err(StoreError::Codec(format!(
            "block file stats: expected 36 bytes, got {}",
            data.len()
        )));
    }
    Ok(BlockFileStats {
        blocks: u32::from_le_bytes(data[0..4].try_into().unwrap()),
        size: u32::from_le_bytes(data[4..8].try_into().unwrap()),
        undo_size: u32::from_le_bytes(data[8..12].try_into().unwrap()),
        height_first: u32::from_le_bytes(data[12..16].try_into().unwrap()),
        height_last: u32::from_le_bytes(data[16..20].try_into().unwrap()),
        time_first: u64::from_le_bytes(data[20..28].try_into().unwrap()),
        time_last: u64::from_le_bytes(data[28..36].try_into().unwrap()),
    })
}

// ---------------------------------------------------------------------------
// Block index record value (keyed by hash):
//   prev_hash[32] || height[4] || file[4] || data_pos[4] || undo_pos[4]
//   || tx_count[4] || status[4] || version[4] || merkle_root[32]
//   || aux_root[32] || time[4] || bits[4] || nonce[4] = 136 bytes
// ---------------------------------------------------------------------------

pub fn encode_block_record(record: &BlockIndexRecord) -> [u8; 136] {
    let mut buf = [0u8; 136];
    buf[0..32].copy_from_slice(&record.prev_hash);
    buf[32..36].copy_from_slice(&record.height.to_le_bytes());
    buf[36..40].copy_from_slice(&record.file.to_le_bytes());
    buf[40..44].copy_from_slice(&record.data_pos.to_le_bytes());
    buf[44..48].copy_from_slice(&record.undo_pos.to_le_bytes());
    buf[48..52].copy_from_slice(&record.tx_count.to_le_bytes());
    buf[52..56].copy_from_slice(&record.status.to_le_bytes());
    buf[56..60].copy_from_slice(&record.version.to_le_bytes());
    buf[60..92].copy_from_slice(&record.merkle_root);
    buf[92..124].copy_from_slice(&record.aux_root);
    buf[124..128].copy_from_slice(&record.time.to_le_bytes());
    buf[128..132].copy_from_slice(&record.bits.to_le_bytes());
    buf[132..136].copy_from_slice(&record.nonce.to_le_bytes());
    buf
}

pub fn decode_block_record(hash: &[u8; 32], data: &[u8]) -> Result<BlockIndexRecord, StoreError> {
    if data.len() != 136 {
        return Err(StoreError::Codec(format!(
            "block index record: expected 136 bytes, got {}",
            data.len()
        )));
    }
    let mut prev_hash = [0u8; 32];
    prev_hash.copy_from_slice(&data[0..32]);
    let mut merkle_root = [0u8; 32];
    merkle_root.copy_from_slice(&data[60..92]);
    let mut aux_root = [0u8; 32];
    aux_root.copy_from_slice(&data[92..124]);
    Ok(BlockIndexRecord {
        hash: *hash,
        prev_hash,
        height: u32::from_le_bytes(data[32..36].try_into().unwrap()),
        file: u32::from_le_bytes(data[36..40].try_into().unwrap()),
        data_pos: u32::from_le_bytes(data[40..44].try_into().unwrap()),
        undo_pos: u32::from_le_bytes(data[44..48].try_into().unwrap()),
        tx_count: u32::from_le_bytes(data[48..52].try_into().unwrap()),
        status: u32::from_le_bytes(data[52..56].try_into().unwrap()),
        version: u32::from_le_bytes(data[56..60].try_into().unwrap()),
        merkle_root,
        aux_root,
        time: u32::from_le_bytes(data[124..128].try_into().unwrap()),
        bits: u32::from_le_bytes(data[128..132].try_into().unwrap()),
        nonce: u32::from_le_bytes(data[132..136].try_into().unwrap()),
    })
}

// ---------------------------------------------------------------------------
// Tx location: file[4] || block_pos[4] || tx_pos[4] = 12 bytes
// ---------------------------------------------------------------------------

pub fn encode_tx_position(pos: &TxPosition) -> [u8; 12] {
    let mut buf = [0u8; 12];
    buf[0..4].copy_from_slice(&pos.file.to_le_bytes());
    buf[4..8].copy_from_slice(&pos.block_pos.to_le_bytes());
    buf[8..12].copy_from_slice(&pos.tx_pos.to_le_bytes());
    buf
}

pub fn decode_tx_position(data: &[u8]) -> Result<TxPosition, StoreError> {
    if data.len() != 12 {
        return Err(StoreError::Codec(format!(
            "tx position: expected 12 bytes, got {}",
            data.len()
        )));
    }
    Ok(TxPosition {
        file: u32::from_le_bytes(data[0..4].try_into().unwrap()),
        block_pos: u32::from_le_bytes(data[4..8].try_into().unwrap()),
        tx_pos: u32::from_le_bytes(data[8..12].try_into().unwrap()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_layout() {
        let coin = Coin {
            coinbase: true,
            height: 7,
            amount: 50,
            script: vec![0xab, 0xcd],
        };
        let encoded = encode_coin(&coin);
        assert_eq!(
            encoded,
            vec![1, 7, 0, 0, 0, 50, 0, 0, 0, 0, 0, 0, 0, 0xab, 0xcd]
        );
        assert_eq!(decode_coin(&encoded).unwrap(), coin);
        // Empty script is legal.
        let bare = Coin {
            coinbase: false,
            height: 0,
            amount: 0,
            script: vec![],
        };
        assert_eq!(decode_coin(&encode_coin(&bare)).unwrap(), bare);
    }

    #[test]
    fn test_outpoint_key_orders_by_vout() {
        let txid = [0x42; 32];
        let k0 = outpoint_key(&OutPoint::new(txid, 0));
        let k1 = outpoint_key(&OutPoint::new(txid, 1));
        let k256 = outpoint_key(&OutPoint::new(txid, 256));
        assert!(k0 < k1 && k1 < k256);
        assert_eq!(
            decode_outpoint_key(&k256).unwrap(),
            OutPoint::new(txid, 256)
        );
    }

    #[test]
    fn test_block_record_fields_keep_their_slots() {
        let record = BlockIndexRecord {
            hash: [0x01; 32],
            prev_hash: [0x02; 32],
            height: 3,
            file: 4,
            data_pos: 5,
            undo_pos: 6,
            tx_count: 7,
            status: 8,
            version: 9,
            merkle_root: [0x0a; 32],
            aux_root: [0x0b; 32],
            time: 12,
            bits: 13,
            nonce: 14,
        };
        let encoded = encode_block_record(&record);
        assert_eq!(decode_block_record(&[0x01; 32], &encoded).unwrap(), record);
    }

    #[test]
    fn test_truncated_rows_rejected() {
        assert!(matches!(decode_coin(&[0u8; 12]), Err(StoreError::Codec(_))));
        assert!(matches!(
            decode_outpoint_key(&[0u8; 35]),
            Err(StoreError::Codec(_))
        ));
        assert!(matches!(
            decode_block_record(&[0u8; 32], &[0u8; 135]),
            Err(StoreError::Codec(_))
        ));
        assert!(matches!(
            decode_tx_position(&[0u8; 11]),
            Err(StoreError::Codec(_))
        ));
    }
}
