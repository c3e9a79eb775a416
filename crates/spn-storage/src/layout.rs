//! Deterministic paths under a node home `H` for a file fingerprint's chunk
//! directory, chunk files, and serialized tree.

use std::path::{Path, PathBuf};

use spn_common::Fid;

/// `H/networkfiles/<FID>/`
pub fn fid_dir(networkfiles_root: &Path, fid: &Fid) -> PathBuf {
    networkfiles_root.join(fid.as_str())
}

/// `H/networkfiles/<FID>/<i>.jkl`
pub fn chunk_path(networkfiles_root: &Path, fid: &Fid, index: usize) -> PathBuf {
    fid_dir(networkfiles_root, fid).join(format!("{index}.jkl"))
}

/// `H/networkfiles/<FID>/tree`
pub fn tree_path(networkfiles_root: &Path, fid: &Fid) -> PathBuf {
    fid_dir(networkfiles_root, fid).join("tree")
}
