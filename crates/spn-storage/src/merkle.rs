//! Binary Merkle tree over SHA3-512 node hashes, duplicate-last-if-odd,
//! non-sorted.
//!
//! The tree is fully determined by its ordered leaf hashes, so the on-disk
//! "tree" file only needs to persist the leaves; every level above is
//! rebuilt deterministically on import.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_512};

#[derive(Debug, thiserror::Error)]
pub enum MerkleError {
    #[error("tree has no leaves")]
    Empty,
    #[error("leaf index {0} out of range")]
    IndexOutOfRange(usize),
}

/// A single step of an authentication path: the sibling hash plus which side
/// it sits on relative to the node being proven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub side: Side,
    pub hash: Vec<u8>,
}

/// Authentication path for one leaf against a tree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub leaf_index: usize,
    pub steps: Vec<ProofStep>,
}

fn node_hash(left: &[u8], right: &[u8]) -> Vec<u8> {
    let mut hasher = Sha3_512::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().to_vec()
}

/// The tree, materialized as one `Vec<Vec<u8>>` per level, leaves first.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Vec<u8>>>,
}

/// Serialized form written to the `tree` file: the ordered leaf hashes.
/// Everything above the leaves is recomputed on import.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportedTree {
    pub leaves: Vec<Vec<u8>>,
}

impl MerkleTree {
    /// Builds a tree from already-computed leaf hashes (see
    /// [`crate::chunk::leaf_hash`] for the recipe).
    pub fn build(leaves: Vec<Vec<u8>>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::Empty);
        }
        let mut levels = vec![leaves];
        while levels.last().unwrap().len() > 1 {
            let prev = levels.last().unwrap();
            let mut next = Vec::with_capacity(prev.len().div_ceil(2));
            let mut i = 0;
            while i < prev.len() {
                let left = &prev[i];
                let right = if i + 1 < prev.len() { &prev[i + 1] } else { left };
                next.push(node_hash(left, right));
                i += 2;
            }
            levels.push(next);
        }
        Ok(MerkleTree { levels })
    }

    pub fn root(&self) -> &[u8] {
        &self.levels.last().expect("tree always has a root level")[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    pub fn export(&self) -> ExportedTree {
        ExportedTree {
            leaves: self.levels[0].clone(),
        }
    }

    pub fn import(exported: ExportedTree) -> Result<Self, MerkleError> {
        Self::build(exported.leaves)
    }

    /// Builds the authentication path for leaf `index`.
    pub fn generate_proof(&self, index: usize) -> Result<Proof, MerkleError> {
        if index >= self.leaf_count() {
            return Err(MerkleError::IndexOutOfRange(index));
        }
        let mut steps = Vec::new();
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            let sibling_idx = if sibling_idx < level.len() {
                sibling_idx
            } else {
                idx // duplicate-last-if-odd: pair with ourselves
            };
            let side = if idx % 2 == 0 { Side::Right } else { Side::Left };
            steps.push(ProofStep {
                side,
                hash: level[sibling_idx].clone(),
            });
            idx /= 2;
        }
        Ok(Proof {
            leaf_index: index,
            steps,
        })
    }
}

/// Pure verification against a root, with no access to the rest of the
/// tree. Used both by [`MerkleTree::generate_proof`]'s self-check and by the
/// peer-facing attestation endpoint.
pub fn verify(root: &[u8], leaf: &[u8], proof: &Proof) -> bool {
    let mut acc = leaf.to_vec();
    for step in &proof.steps {
        acc = match step.side {
            Side::Right => node_hash(&acc, &step.hash),
            Side::Left => node_hash(&step.hash, &acc),
        };
    }
    acc == root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| vec![i as u8; 4]).collect()
    }

    #[test]
    fn single_leaf_root_is_itself_hashed_with_itself() {
        let tree = MerkleTree::build(leaves(1)).unwrap();
        let proof = tree.generate_proof(0).unwrap();
        assert!(verify(tree.root(), &leaves(1)[0], &proof));
    }

    #[test]
    fn odd_leaf_count_duplicates_last() {
        let tree = MerkleTree::build(leaves(3)).unwrap();
        for i in 0..3 {
            let proof = tree.generate_proof(i).unwrap();
            assert!(verify(tree.root(), &leaves(3)[i], &proof));
        }
    }

    #[test]
    fn proof_fails_for_wrong_leaf() {
        let all = leaves(4);
        let tree = MerkleTree::build(all.clone()).unwrap();
        let proof = tree.generate_proof(1).unwrap();
        assert!(!verify(tree.root(), &all[2], &proof));
    }

    #[test]
    fn export_import_roundtrip_preserves_root() {
        let tree = MerkleTree::build(leaves(5)).unwrap();
        let root = tree.root().to_vec();
        let reimported = MerkleTree::import(tree.export()).unwrap();
        assert_eq!(reimported.root(), root.as_slice());
    }

    #[test]
    fn index_out_of_range_errors() {
        let tree = MerkleTree::build(leaves(2)).unwrap();
        assert!(matches!(
            tree.generate_proof(5),
            Err(MerkleError::IndexOutOfRange(5))
        ));
    }
}
