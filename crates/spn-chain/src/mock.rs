//! In-memory stand-in for [`crate::ChainClient`], driven by pre-programmed
//! responses. Used by the scheduler's and stray pool's test suites.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{ChainClient, ChainError, ProviderInfo, StrayContract};

#[derive(Default)]
pub struct MockChainClient {
    pub is_verified_responses: Mutex<VecDeque<Result<bool, ChainError>>>,
    pub challenge_block_responses: Mutex<VecDeque<Result<u64, ChainError>>>,
    pub providers_for_cid_responses: Mutex<VecDeque<Result<Vec<String>, ChainError>>>,
    pub provider_by_address_responses: Mutex<VecDeque<Result<ProviderInfo, ChainError>>>,
    pub find_file_responses: Mutex<VecDeque<Result<Vec<String>, ChainError>>>,
    pub strays_all_responses: Mutex<VecDeque<Result<Vec<StrayContract>, ChainError>>>,
}

fn pop<T>(queue: &Mutex<VecDeque<Result<T, ChainError>>>) -> Result<T, ChainError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(ChainError::Transport("mock exhausted".into())))
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_is_verified(&self, value: Result<bool, ChainError>) {
        self.is_verified_responses.lock().unwrap().push_back(value);
    }

    pub fn push_challenge_block(&self, value: Result<u64, ChainError>) {
        self.challenge_block_responses
            .lock()
            .unwrap()
            .push_back(value);
    }

    pub fn push_providers_for_cid(&self, value: Result<Vec<String>, ChainError>) {
        self.providers_for_cid_responses
            .lock()
            .unwrap()
            .push_back(value);
    }

    pub fn push_provider_by_address(&self, value: Result<ProviderInfo, ChainError>) {
        self.provider_by_address_responses
            .lock()
            .unwrap()
            .push_back(value);
    }

    pub fn push_find_file(&self, value: Result<Vec<String>, ChainError>) {
        self.find_file_responses.lock().unwrap().push_back(value);
    }

    pub fn push_strays_all(&self, value: Result<Vec<StrayContract>, ChainError>) {
        self.strays_all_responses.lock().unwrap().push_back(value);
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn is_verified(&self, _cid: &str, _address: &str) -> Result<bool, ChainError> {
        pop(&self.is_verified_responses)
    }

    async fn challenge_block(&self, _cid: &str) -> Result<u64, ChainError> {
        pop(&self.challenge_block_responses)
    }

    async fn providers_for_cid(&self, _cid: &str) -> Result<Vec<String>, ChainError> {
        pop(&self.providers_for_cid_responses)
    }

    async fn provider_by_address(&self, _address: &str) -> Result<ProviderInfo, ChainError> {
        pop(&self.provider_by_address_responses)
    }

    async fn find_file(&self, _fid: &str) -> Result<Vec<String>, ChainError> {
        pop(&self.find_file_responses)
    }

    async fn strays_all(&self) -> Result<Vec<StrayContract>, ChainError> {
        pop(&self.strays_all_responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_error_classification() {
        let e = ChainError::Remote("key not found".into());
        assert!(e.is_benign());
        let e = ChainError::Remote("contract NotYours".into());
        assert!(e.is_benign());
        let e = ChainError::Transport("connection reset".into());
        assert!(!e.is_benign());
    }

    #[tokio::test]
    async fn mock_returns_pushed_responses_in_order() {
        let mock = MockChainClient::new();
        mock.push_is_verified(Ok(true));
        mock.push_is_verified(Ok(false));
        assert!(mock.is_verified("c", "a").await.unwrap());
        assert!(!mock.is_verified("c", "a").await.unwrap());
    }
}
