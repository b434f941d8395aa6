// Merkle tree - order-sensitive digest of the transaction log
//
// Leaves hash each transaction's canonical form; levels reduce pairwise,
// bottom-up. An odd trailing node is paired WITH ITSELF (its hash doubled).
// Two devices hashing the same ordered log must reach the same root, so the
// duplication rule is protocol-frozen.

use crate::tx::{Digest, Transaction};
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};

/// Root digest of an empty log
pub fn empty_root() -> Digest {
    Digest::of(b"empty")
}

/// Node of the Merkle tree
///
/// Interior nodes carry children; leaves carry their transaction. A node
/// produced by the odd-count duplication rule has a left child and no right.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MerkleNode {
    hash: Digest,
    left: Option<Box<MerkleNode>>,
    right: Option<Box<MerkleNode>>,
    leaf: Option<Transaction>,
}

impl MerkleNode {
    pub fn hash(&self) -> &Digest {
        &self.hash
    }

    pub fn left(&self) -> Option<&MerkleNode> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&MerkleNode> {
        self.right.as_deref()
    }

    /// The transaction at this node, if it is a leaf
    pub fn leaf(&self) -> Option<&Transaction> {
        self.leaf.as_ref()
    }

    fn leaf_node(tx: &Transaction) -> Self {
        Self {
            hash: tx.content_digest(),
            left: None,
            right: None,
            leaf: Some(tx.clone()),
        }
    }

    fn parent(left: MerkleNode, right: Option<MerkleNode>) -> Self {
        let hash = match &right {
            Some(r) => hash_pair(&left.hash, &r.hash),
            None => hash_pair(&left.hash, &left.hash),
        };
        Self {
            hash,
            left: Some(Box::new(left)),
            right: right.map(Box::new),
            leaf: None,
        }
    }
}

/// Build the tree over an ordered transaction slice; empty input yields None
pub fn build_merkle_tree(transactions: &[Transaction]) -> Option<MerkleNode> {
    if transactions.is_empty() {
        return None;
    }

    let mut level: Vec<MerkleNode> = transactions.iter().map(MerkleNode::leaf_node).collect();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut nodes = level.into_iter();

        while let Some(left) = nodes.next() {
            next.push(MerkleNode::parent(left, nodes.next()));
        }

        level = next;
    }

    level.pop()
}

/// Root over an ordered transaction slice, falling back to the empty marker
pub fn merkle_root(transactions: &[Transaction]) -> Digest {
    build_merkle_tree(transactions)
        .map(|node| *node.hash())
        .unwrap_or_else(empty_root)
}

fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    let hash = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    Digest::from_bytes(out)
}
