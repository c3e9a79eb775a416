//! Ingest, proof construction, and verification — the component contract
//! described for the chunk+Merkle engine.

use std::fs;
use std::path::Path;

use spn_common::Fid;
use tracing::warn;

use crate::chunk::{leaf_hash, split};
use crate::layout::{chunk_path, fid_dir, tree_path};
use crate::merkle::{verify as merkle_verify, MerkleError, MerkleTree, Proof};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error writing chunk {index} for {fid}: {source}")]
    IngestIo {
        fid: Fid,
        index: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("stream of {len} bytes exceeds the maximum file size of {max} bytes")]
    IngestSize { len: usize, max: i64 },
    #[error("tree or chunk file missing for {fid} at index {index}")]
    ProofMissing { fid: Fid, index: usize },
    #[error("malformed tree file for {fid}: {source}")]
    CorruptTree {
        fid: Fid,
        #[source]
        source: bincode::Error,
    },
    #[error("invalid proof request: {0}")]
    Merkle(#[from] MerkleError),
}

/// Result of a successful ingest: the fingerprint the bytes hashed to and
/// the Merkle tree built over their chunks.
pub struct IngestOutcome {
    pub fid: Fid,
    pub tree: MerkleTree,
}

/// Splits `data` into `chunk_size`-sized blocks, writes each to
/// `<networkfiles_root>/<FID>/<i>.jkl`, builds the Merkle tree over their
/// leaf hashes, and exports it to `<networkfiles_root>/<FID>/tree`.
///
/// On any I/O failure partway through, the whole `<FID>` directory is
/// removed before the error is returned.
pub fn ingest(
    networkfiles_root: &Path,
    data: &[u8],
    chunk_size: usize,
    max_file_size: i64,
) -> Result<IngestOutcome, StorageError> {
    if data.len() as i64 > max_file_size {
        return Err(StorageError::IngestSize {
            len: data.len(),
            max: max_file_size,
        });
    }

    let fid = Fid::from_bytes(data);
    let dir = fid_dir(networkfiles_root, &fid);

    let result = (|| -> Result<MerkleTree, StorageError> {
        fs::create_dir_all(&dir).map_err(|source| StorageError::IngestIo {
            fid: fid.clone(),
            index: 0,
            source,
        })?;

        let chunks = split(data, chunk_size);
        let mut leaves = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            fs::write(chunk_path(networkfiles_root, &fid, i), chunk).map_err(|source| {
                StorageError::IngestIo {
                    fid: fid.clone(),
                    index: i,
                    source,
                }
            })?;
            leaves.push(leaf_hash(i, chunk));
        }

        let tree = MerkleTree::build(leaves)?;
        let exported = tree.export();
        let serialized =
            bincode::serialize(&exported).map_err(|source| StorageError::CorruptTree {
                fid: fid.clone(),
                source,
            })?;
        fs::write(tree_path(networkfiles_root, &fid), serialized).map_err(|source| {
            StorageError::IngestIo {
                fid: fid.clone(),
                index: 0,
                source,
            }
        })?;
        Ok(tree)
    })();

    match result {
        Ok(tree) => Ok(IngestOutcome { fid, tree }),
        Err(err) => {
            let _ = fs::remove_dir_all(&dir);
            Err(err)
        }
    }
}

/// Removes a fingerprint's entire on-disk footprint: the chunk directory and
/// the tree file it contains. Called by the scheduler only after confirming
/// no other bound contract still references `fid`.
pub fn remove_fid_data(networkfiles_root: &Path, fid: &Fid) -> std::io::Result<()> {
    let dir = fid_dir(networkfiles_root, fid);
    match fs::remove_dir_all(&dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Loads the serialized tree for `fid`, rebuilding it in memory.
pub fn load_tree(networkfiles_root: &Path, fid: &Fid) -> Result<MerkleTree, StorageError> {
    let path = tree_path(networkfiles_root, fid);
    let raw = fs::read(&path).map_err(|_| StorageError::ProofMissing {
        fid: fid.clone(),
        index: 0,
    })?;
    let exported = bincode::deserialize(&raw).map_err(|source| StorageError::CorruptTree {
        fid: fid.clone(),
        source,
    })?;
    Ok(MerkleTree::import(exported)?)
}

/// Loads chunk `index` for `fid`, recomputes its leaf hash, imports the
/// serialized tree, and builds the authentication path.
///
/// If the tree self-verification fails, the proof is still returned (with a
/// logged warning) so the mismatch can be debugged rather than silently
/// swallowed; the chain will reject it regardless.
pub fn build_proof(
    networkfiles_root: &Path,
    fid: &Fid,
    index: usize,
) -> Result<(Vec<u8>, Proof), StorageError> {
    let chunk_file = chunk_path(networkfiles_root, fid, index);
    let chunk = fs::read(&chunk_file).map_err(|_| StorageError::ProofMissing {
        fid: fid.clone(),
        index,
    })?;

    let tree = load_tree(networkfiles_root, fid)?;
    let leaf = leaf_hash(index, &chunk);
    let proof = tree.generate_proof(index)?;

    if !merkle_verify(tree.root(), &leaf, &proof) {
        warn!(
            fid = %fid,
            index,
            "generated proof failed local self-verification; the chain will reject it"
        );
    }

    Ok((chunk, proof))
}

/// Pure verification, no I/O. Used by tests and by the peer-facing
/// attestation endpoint.
pub fn verify(root: &[u8], index: usize, chunk: &[u8], proof: &Proof) -> bool {
    if proof.leaf_index != index {
        return false;
    }
    let leaf = leaf_hash(index, chunk);
    merkle_verify(root, &leaf, proof)
}
