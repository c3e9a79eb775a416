//! JSON-over-HTTP implementation of [`crate::ChainClient`]. The wire shape
//! is deliberately simple (one endpoint per operation, JSON bodies) since
//! the real chain RPC transport is an external collaborator this crate only
//! needs to speak a reasonable dialect of, not standardize.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{ChainClient, ChainError, ProviderInfo, StrayContract};

pub struct HttpChainClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChainClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpChainClient {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ChainError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Remote(format!("{status}: {body}")));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))
    }
}

#[derive(Deserialize)]
struct VerifiedResponse {
    verified: bool,
}

#[derive(Deserialize)]
struct ChallengeResponse {
    challenge_block: u64,
}

#[derive(Deserialize)]
struct ProvidersResponse {
    providers: Vec<String>,
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn is_verified(&self, cid: &str, address: &str) -> Result<bool, ChainError> {
        let resp: VerifiedResponse = self
            .get_json(&format!("/isVerified/{cid}/{address}"))
            .await?;
        Ok(resp.verified)
    }

    async fn challenge_block(&self, cid: &str) -> Result<u64, ChainError> {
        let resp: ChallengeResponse = self.get_json(&format!("/challengeBlock/{cid}")).await?;
        Ok(resp.challenge_block)
    }

    async fn providers_for_cid(&self, cid: &str) -> Result<Vec<String>, ChainError> {
        let resp: ProvidersResponse = self.get_json(&format!("/providersForCid/{cid}")).await?;
        Ok(resp.providers)
    }

    async fn provider_by_address(&self, address: &str) -> Result<ProviderInfo, ChainError> {
        self.get_json(&format!("/providerByAddress/{address}")).await
    }

    async fn find_file(&self, fid: &str) -> Result<Vec<String>, ChainError> {
        let resp: ProvidersResponse = self.get_json(&format!("/findFile/{fid}")).await?;
        Ok(resp.providers)
    }

    async fn strays_all(&self) -> Result<Vec<StrayContract>, ChainError> {
        self.get_json("/straysAll").await
    }
}
