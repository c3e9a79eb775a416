//! The chain RPC collaborator: the six read operations the scheduler and
//! stray pool need from the external consensus-backed registry, plus a
//! classification of its errors into benign (the contract simply isn't
//! ours any more) versus transient.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A domain-specific sentinel the chain returns when a contract no longer
/// belongs to the querying address. Alongside the substring `"key not
/// found"`, this classifies a chain error as benign.
pub const NOT_YOURS_MARKER: &str = "NotYours";

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain request failed: {0}")]
    Transport(String),
    #[error("chain returned an error: {0}")]
    Remote(String),
}

impl ChainError {
    /// Benign errors mean the contract no longer belongs to us; everything
    /// else is transient and must not touch the miss counter.
    pub fn is_benign(&self) -> bool {
        let message = match self {
            ChainError::Transport(m) | ChainError::Remote(m) => m,
        };
        message.contains("key not found") || message.contains(NOT_YOURS_MARKER)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub address: String,
    pub ip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrayContract {
    pub cid: String,
    pub fid: String,
    pub owner: String,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn is_verified(&self, cid: &str, address: &str) -> Result<bool, ChainError>;
    async fn challenge_block(&self, cid: &str) -> Result<u64, ChainError>;
    async fn providers_for_cid(&self, cid: &str) -> Result<Vec<String>, ChainError>;
    async fn provider_by_address(&self, address: &str) -> Result<ProviderInfo, ChainError>;
    async fn find_file(&self, fid: &str) -> Result<Vec<String>, ChainError>;
    async fn strays_all(&self) -> Result<Vec<StrayContract>, ChainError>;
}

pub use http::HttpChainClient;
pub use mock::MockChainClient;
