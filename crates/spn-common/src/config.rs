use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default chunk size in bytes. Recommended by the storage layout, not
/// load-bearing for correctness.
pub const DEFAULT_CHUNK_SIZE: i64 = 1024;

/// Default cap on a single ingested file, 32 GiB.
pub const DEFAULT_MAX_FILE_SIZE: i64 = 32 << 30;

/// Default minimum peer attestations accepted as a quorum on the fast path.
pub const DEFAULT_ATTESTATION_QUORUM: usize = 3;

/// Default number of concurrent stray-reclamation workers.
pub const DEFAULT_HAND_COUNT: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Immutable, startup-constructed configuration record threaded through the
/// whole node. Never mutated after [`NodeConfig::from_file`] or
/// [`NodeConfig::default`] returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node home directory; chunk/tree files live under `storage_dir/networkfiles`,
    /// the contract index under `storage_dir/db`.
    pub storage_dir: PathBuf,
    /// Port the peer-facing HTTP API (`/download`, `/attest`) listens on.
    pub port: u16,
    pub debug: bool,
    /// Proof cycle interval in seconds. Zero means "pick a random interval
    /// per cycle" (see the scheduler).
    pub interval_secs: u16,
    pub chunk_size: i64,
    pub max_file_size: i64,
    pub max_misses: u32,
    /// Delay between per-CID chain queries within one proof cycle, in
    /// milliseconds.
    pub sleep_ms: i64,
    pub attestation_quorum: usize,
    pub hand_count: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            storage_dir: PathBuf::from("./data"),
            port: 3333,
            debug: false,
            interval_secs: 30,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_misses: 10,
            sleep_ms: 0,
            attestation_quorum: DEFAULT_ATTESTATION_QUORUM,
            hand_count: DEFAULT_HAND_COUNT,
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn networkfiles_dir(&self) -> PathBuf {
        self.storage_dir.join("networkfiles")
    }

    pub fn db_dir(&self) -> PathBuf {
        self.storage_dir.join("db")
    }
}
