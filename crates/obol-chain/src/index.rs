//! In-memory block-header graph rebuilt from flat storage at startup.
//!
//! Nodes live in an arena keyed by hash and refer to each other by
//! stable indices, so parent/child links never form reference cycles.
//! The storage layer drives population through the `HeaderTree` trait.

use std::collections::HashMap;

use crate::hash::{BlockHash, NULL_HASH};

/// Stable handle into a `HeaderTree`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// One header node. Created as a bare placeholder when first referenced
/// (possibly as a parent only) and populated when its own row loads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderNode {
    pub hash: BlockHash,
    pub parent: Option<NodeId>,
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
    /// Transactions reachable from genesis through this node. Computed
    /// by a later linkage pass, never during bulk load.
    pub chain_tx: Option<u64>,
}

impl HeaderNode {
    fn placeholder(hash: BlockHash) -> Self {
        Self {
            hash,
            parent: None,
            height: 0,
            file: 0,
            data_pos: 0,
            undo_pos: 0,
            tx_count: 0,
            status: 0,
            version: 0,
            merkle_root: NULL_HASH,
            aux_root: NULL_HASH,
            time: 0,
            bits: 0,
            nonce: 0,
            chain_tx: None,
        }
    }
}

/// Idempotent node-upsert capability injected into
/// `BlockIndexStore::load_block_index`.
pub trait HeaderTree {
    /// Return the node for `hash`, creating a placeholder if absent.
    fn get_or_create(&mut self, hash: &BlockHash) -> NodeId;
    fn node(&self, id: NodeId) -> &HeaderNode;
    fn node_mut(&mut self, id: NodeId) -> &mut HeaderNode;
}

/// Arena-backed `HeaderTree` implementation.
#[derive(Default)]
pub struct HeaderArena {
    nodes: Vec<HeaderNode>,
    by_hash: HashMap<BlockHash, NodeId>,
}

impl HeaderArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, hash: &BlockHash) -> Option<NodeId> {
        self.by_hash.get(hash).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &HeaderNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }
}

impl HeaderTree for HeaderArena {
    fn get_or_create(&mut self, hash: &BlockHash) -> NodeId {
        if let Some(id) = self.by_hash.get(hash) {
            return *id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(HeaderNode::placeholder(*hash));
        self.by_hash.insert(*hash, id);
        id
    }

    fn node(&self, id: NodeId) -> &HeaderNode {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut HeaderNode {
        &mut self.nodes[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_idempotent() {
        let mut arena = HeaderArena::new();
        let a = arena.get_or_create(&[0x11; 32]);
        let b = arena.get_or_create(&[0x22; 32]);
        assert_ne!(a, b);
        assert_eq!(arena.get_or_create(&[0x11; 32]), a);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_placeholder_then_populate() {
        let mut arena = HeaderArena::new();
        // Parent referenced before its own row loads.
        let parent = arena.get_or_create(&[0xaa; 32]);
        let child = arena.get_or_create(&[0xbb; 32]);
        arena.node_mut(child).parent = Some(parent);
        arena.node_mut(child).height = 1;

        assert_eq!(arena.node(child).parent, Some(parent));
        assert_eq!(arena.node(parent).height, 0);
        assert_eq!(arena.node(parent).chain_tx, None);
        assert_eq!(arena.get(&[0xaa; 32]), Some(parent));
    }
}
