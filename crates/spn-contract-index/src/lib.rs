//! Ordered key-value store mapping contract id ↔ file fingerprint
//! bidirectionally, plus per-contract miss counters.
//!
//! Keys are byte-prefixed (`"file/"+CID`, `"down/"+CID`); the prefixes are
//! part of the external on-disk format and must never collide with a future
//! prefix.
//!
//! Reverse-index policy: [`ContractIndex::cids_of`] performs a full prefix
//! scan rather than maintaining a second `fid/FID -> CIDs` index (see
//! `DESIGN.md`). This keeps the forward index as the single write path at
//! the cost of an O(n) scan on eviction.

mod db;

use std::path::Path;

use thiserror::Error;

pub use db::DatabaseError;
use spn_common::{Cid, Fid};

const FILE_PREFIX: &str = "file/";
const DOWN_PREFIX: &str = "down/";
const LOG_TARGET: &str = "contract-index";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("contract {0} is already bound")]
    AlreadyBound(Cid),
    #[error("contract {0} not found")]
    NotFound(Cid),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    RocksDb(#[from] rocksdb::Error),
}

fn file_key(cid: &Cid) -> Vec<u8> {
    format!("{FILE_PREFIX}{cid}").into_bytes()
}

fn down_key(cid: &Cid) -> Vec<u8> {
    format!("{DOWN_PREFIX}{cid}").into_bytes()
}

pub struct ContractIndex {
    db: rocksdb::DB,
}

impl ContractIndex {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        Ok(ContractIndex {
            db: db::open_db(path)?,
        })
    }

    /// Atomically writes `file/CID -> FID`. Fails with `AlreadyBound` if
    /// `CID` is already present; does not touch the miss counter.
    pub fn bind(&self, cid: &Cid, fid: &Fid) -> Result<(), IndexError> {
        let key = file_key(cid);
        if self.db.get(&key)?.is_some() {
            return Err(IndexError::AlreadyBound(cid.clone()));
        }
        self.db.put(&key, fid.as_str().as_bytes())?;
        Ok(())
    }

    pub fn lookup(&self, cid: &Cid) -> Result<Fid, IndexError> {
        let raw = self
            .db
            .get(file_key(cid))?
            .ok_or_else(|| IndexError::NotFound(cid.clone()))?;
        Ok(Fid::from_raw(String::from_utf8_lossy(&raw).into_owned()))
    }

    /// Same as [`Self::lookup`] but returns `None` instead of erroring when
    /// absent; convenient for the scheduler's scan loop.
    pub fn fid_of(&self, cid: &Cid) -> Result<Option<Fid>, IndexError> {
        match self.lookup(cid) {
            Ok(fid) => Ok(Some(fid)),
            Err(IndexError::NotFound(_)) => Ok(None),
            Err(other) => Err(other),
        }
    }

    /// Every CID currently bound to `fid`. Full prefix scan (see module
    /// docs for the reverse-index policy this implements).
    pub fn cids_of(&self, fid: &Fid) -> Result<Vec<Cid>, IndexError> {
        let mut matches = Vec::new();
        for entry in self.scan()? {
            let (cid, entry_fid) = entry?;
            if &entry_fid == fid {
                matches.push(cid);
            }
        }
        Ok(matches)
    }

    /// Removes both the forward binding and the miss counter for `cid`.
    pub fn unbind(&self, cid: &Cid) -> Result<(), IndexError> {
        tracing::debug!(target: LOG_TARGET, %cid, "unbinding contract");
        self.db.delete(file_key(cid))?;
        self.db.delete(down_key(cid))?;
        Ok(())
    }

    fn read_miss_counter(&self, cid: &Cid) -> Result<u32, IndexError> {
        match self.db.get(down_key(cid))? {
            Some(raw) => Ok(String::from_utf8_lossy(&raw).parse().unwrap_or(0)),
            None => Ok(0),
        }
    }

    fn write_miss_counter(&self, cid: &Cid, value: u32) -> Result<(), IndexError> {
        self.db
            .put(down_key(cid), value.to_string().as_bytes())?;
        Ok(())
    }

    /// Increments the miss counter and returns its new value.
    pub fn miss(&self, cid: &Cid) -> Result<u32, IndexError> {
        let next = self.read_miss_counter(cid)?.saturating_add(1);
        self.write_miss_counter(cid, next)?;
        Ok(next)
    }

    /// Decrements the miss counter, floored at 0.
    pub fn hit(&self, cid: &Cid) -> Result<u32, IndexError> {
        let next = self.read_miss_counter(cid)?.saturating_sub(1);
        self.write_miss_counter(cid, next)?;
        Ok(next)
    }

    pub fn clear_miss(&self, cid: &Cid) -> Result<(), IndexError> {
        self.write_miss_counter(cid, 0)
    }

    /// Prefix-filtered ordered scan over `file/*` entries. The underlying
    /// RocksDB iterator (and its snapshot) is released when the returned
    /// iterator is dropped.
    pub fn scan(&self) -> Result<ContractScan<'_>, IndexError> {
        let iter = self
            .db
            .prefix_iterator(FILE_PREFIX.as_bytes());
        Ok(ContractScan { iter })
    }
}

pub struct ContractScan<'a> {
    iter: rocksdb::DBIteratorWithThreadMode<'a, rocksdb::DB>,
}

impl<'a> Iterator for ContractScan<'a> {
    type Item = Result<(Cid, Fid), IndexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.iter.next()?;
            let (key, value) = match item {
                Ok(kv) => kv,
                Err(e) => return Some(Err(IndexError::RocksDb(e))),
            };
            if !key.starts_with(FILE_PREFIX.as_bytes()) {
                // prefix_iterator continues past the prefix at the end of
                // the keyspace; stop rather than yield unrelated keys.
                return None;
            }
            let cid_str = String::from_utf8_lossy(&key[FILE_PREFIX.len()..]).into_owned();
            let fid_str = String::from_utf8_lossy(&value).into_owned();
            return Some(Ok((Cid::from_raw(cid_str), Fid::from_raw(fid_str))));
        }
    }
}
