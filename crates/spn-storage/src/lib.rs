//! Content-addressed chunked storage with Merkle commitments: chunking,
//! the leaf-hash recipe, the binary Merkle tree, and the on-disk layout
//! that ties them together.

pub mod chunk;
pub mod engine;
pub mod layout;
pub mod merkle;

pub use chunk::leaf_hash;
pub use engine::{
    build_proof, ingest, load_tree, remove_fid_data, verify, IngestOutcome, StorageError,
};
pub use merkle::{MerkleTree, Proof};
