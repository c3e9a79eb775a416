//! The bounded pool manager: periodically fetches the chain's stray list and
//! assigns unclaimed strays to idle Hands.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::hand::{Hand, HandContext};

const LOG_TARGET: &str = "stray-pool";

/// How often the manager polls the chain for the full stray list.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

pub struct Pool {
    hands: Vec<Arc<Hand>>,
    ctx: Arc<HandContext>,
    poll_interval: Duration,
}

impl Pool {
    pub fn new(size: usize, ctx: HandContext, poll_interval: Duration) -> Self {
        Pool {
            hands: (0..size as u8).map(|i| Arc::new(Hand::new(i))).collect(),
            ctx: Arc::new(ctx),
            poll_interval,
        }
    }

    /// Runs the manager loop until `cancel` observes `true`.
    pub async fn run(self: Arc<Self>, mut cancel: watch::Receiver<bool>) {
        loop {
            self.poll_once().await;
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.changed() => {}
            }
            if *cancel.borrow() {
                break;
            }
        }
    }

    /// Fetches the full stray list and assigns each unowned stray to the
    /// next idle Hand. If no Hand is free, the stray is skipped — it will
    /// be retried on the next pass.
    async fn poll_once(&self) {
        let strays = match self.ctx.chain.strays_all().await {
            Ok(strays) => strays,
            Err(e) => {
                warn!(target: LOG_TARGET, error = %e, "failed to fetch stray list");
                return;
            }
        };

        for stray in strays {
            if stray.owner == self.ctx.self_address {
                continue;
            }
            let Some(hand) = self.hands.iter().find(|h| h.try_claim()) else {
                debug!(target: LOG_TARGET, cid = %stray.cid, "no idle hand available this pass");
                continue;
            };
            let hand = Arc::clone(hand);
            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                hand.run(&ctx, stray).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use spn_chain::{ChainClient, MockChainClient, StrayContract};
    use spn_contract_index::ContractIndex;
    use spn_tx_adaptor::{AdaptorError, TransactionAdaptor, TxMessage, TxOutcome};

    struct NeverClaims;

    #[async_trait]
    impl TransactionAdaptor for NeverClaims {
        async fn submit(&self, _message: TxMessage) -> Result<TxOutcome, AdaptorError> {
            Err(AdaptorError::Rejected("not expected to be called".into()))
        }
    }

    fn pool_with(
        chain: MockChainClient,
        root: std::path::PathBuf,
        self_address: &str,
    ) -> Pool {
        let ctx = HandContext {
            chain: Arc::new(chain) as Arc<dyn ChainClient>,
            index: Arc::new(ContractIndex::open(root.join("db")).unwrap()),
            networkfiles_root: root.join("networkfiles"),
            adaptor: Arc::new(NeverClaims),
            http: reqwest::Client::new(),
            self_address: self_address.to_string(),
            self_ip: "http://127.0.0.1:9".to_string(),
            chunk_size: 1024,
        };
        Pool::new(1, ctx, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn skips_strays_already_owned_by_our_chain_address() {
        let dir = tempfile::tempdir().unwrap();
        let chain = MockChainClient::new();
        chain.push_strays_all(Ok(vec![StrayContract {
            cid: "c1".into(),
            fid: "f1".into(),
            owner: "our-chain-address".into(),
        }]));
        let pool = pool_with(chain, dir.path().to_path_buf(), "our-chain-address");

        // owner matches self_address, so no hand is claimed for this stray.
        pool.poll_once().await;
        assert!(pool.hands.iter().all(|h| h.is_idle()));
    }

    #[tokio::test]
    async fn assigns_strays_not_owned_by_our_chain_address() {
        let dir = tempfile::tempdir().unwrap();
        let chain = MockChainClient::new();
        chain.push_strays_all(Ok(vec![StrayContract {
            cid: "c1".into(),
            fid: "f1".into(),
            owner: "someone-else".into(),
        }]));
        let pool = pool_with(chain, dir.path().to_path_buf(), "our-chain-address");

        pool.poll_once().await;
        // `try_claim` runs synchronously inside `poll_once`, before the
        // processing task is spawned, so the hand is already busy by the
        // time `poll_once` returns control here.
        assert!(pool.hands.iter().any(|h| !h.is_idle()));
    }
}
