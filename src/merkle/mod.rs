// Merkle module - snapshotting the transaction log

mod snapshot;
mod tree;

pub use snapshot::MerkleSnapshot;
pub use tree::{build_merkle_tree, empty_root, merkle_root, MerkleNode};
