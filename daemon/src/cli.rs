use std::path::PathBuf;

use clap::Parser;

/// A decentralized storage provider node: stores chunked content-addressed
/// files, periodically proves continued possession to a chain, and
/// opportunistically reclaims strays abandoned by other providers.
#[derive(Debug, Parser)]
#[command(name = "spn-node", version)]
pub struct Cli {
    /// Node home directory.
    #[arg(long, default_value = "./data")]
    pub storagedir: PathBuf,

    /// Port the peer-facing HTTP API listens on.
    #[arg(long, default_value_t = 3333)]
    pub port: u16,

    #[arg(long)]
    pub debug: bool,

    /// Proof cycle interval in seconds. 0 means a random interval per cycle.
    #[arg(long, default_value_t = 0)]
    pub interval: u16,

    #[arg(long = "chunk-size", default_value_t = spn_common::config::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: i64,

    #[arg(long = "max-misses", default_value_t = 10)]
    pub max_misses: u32,

    /// Delay between per-CID chain queries within one proof cycle, ms.
    #[arg(long, default_value_t = 0)]
    pub sleep: i64,

    #[arg(long = "attestation-quorum", default_value_t = spn_common::config::DEFAULT_ATTESTATION_QUORUM)]
    pub attestation_quorum: usize,

    /// Number of concurrent stray-reclamation workers.
    #[arg(long, default_value_t = spn_common::config::DEFAULT_HAND_COUNT)]
    pub hands: usize,

    /// Base URL of the chain RPC collaborator.
    #[arg(long = "chain-url", default_value = "http://127.0.0.1:1317")]
    pub chain_url: String,

    /// This node's own registered address, used to recognize our own
    /// entries in provider/stray listings.
    #[arg(long = "self-address", default_value = "")]
    pub self_address: String,

    /// This node's own network-reachable base URL, used to recognize
    /// ourselves in peer lists during stray reclamation.
    #[arg(long = "self-ip", default_value = "")]
    pub self_ip: String,
}

impl Cli {
    pub fn into_node_config(self) -> spn_common::NodeConfig {
        spn_common::NodeConfig {
            storage_dir: self.storagedir,
            port: self.port,
            debug: self.debug,
            interval_secs: self.interval,
            chunk_size: self.chunk_size,
            max_file_size: spn_common::config::DEFAULT_MAX_FILE_SIZE,
            max_misses: self.max_misses,
            sleep_ms: self.sleep,
            attestation_quorum: self.attestation_quorum,
            hand_count: self.hands,
        }
    }
}
