//! RocksDB handle management, mirroring the node's common database-opening
//! convention: a thin `thiserror` wrapper around `rocksdb::Error` plus a
//! fixed set of sane-default options.

use std::path::Path;

use rocksdb::{Options, DB};
use thiserror::Error;

const LOG_TARGET: &str = "contract-index";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    RocksDb(#[from] rocksdb::Error),
}

fn default_db_options() -> Options {
    let mut options = Options::default();
    options.create_if_missing(true);
    options.create_missing_column_families(true);
    options
}

pub fn open_db(path: impl AsRef<Path>) -> Result<DB, DatabaseError> {
    let path = path.as_ref();
    tracing::debug!(target: LOG_TARGET, path = %path.display(), "opening contract index");
    let db = DB::open(&default_db_options(), path)?;
    Ok(db)
}
