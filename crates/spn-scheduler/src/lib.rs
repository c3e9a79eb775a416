//! The periodic proof-of-storage loop: walks the contract index, queries
//! chain challenges, produces proofs, tracks misses, evicts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::watch;
use tracing::{error, info, warn};

use spn_attestation::collect_attestations;
use spn_chain::ChainClient;
use spn_contract_index::ContractIndex;
use spn_tx_adaptor::{TransactionAdaptor, TxMessage};

const LOG_TARGET: &str = "proof-scheduler";

/// Random interval chosen per cycle when the configured interval is 0,
/// matching the source behavior (`rand.Intn(3601) + 60`).
const RANDOM_INTERVAL_MIN_SECS: u64 = 60;
const RANDOM_INTERVAL_SPAN_SECS: u64 = 3601;

const CYCLE_TIME_WARNING: Duration = Duration::from_secs(120);

pub struct SchedulerConfig {
    pub self_address: String,
    pub interval_secs: u16,
    pub max_misses: u32,
    pub inter_cid_sleep: Duration,
    pub attestation_quorum: usize,
    pub attestation_timeout: Duration,
}

pub struct Scheduler {
    pub config: SchedulerConfig,
    pub chain: Arc<dyn ChainClient>,
    pub index: Arc<ContractIndex>,
    pub networkfiles_root: PathBuf,
    pub adaptor: Arc<dyn TransactionAdaptor>,
    pub http: reqwest::Client,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub hits: u32,
    pub misses: u32,
    pub evictions: u32,
    pub proofs_submitted: u32,
    pub transient_errors: u32,
}

impl Scheduler {
    /// Runs cycles until `cancel` observes `true`. A cycle in progress
    /// completes the current CID before the cancellation is observed again;
    /// it never aborts mid-CID.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        while !*cancel.borrow() {
            let stats = self.run_cycle(&mut cancel).await;
            info!(
                target: LOG_TARGET,
                hits = stats.hits,
                misses = stats.misses,
                evictions = stats.evictions,
                proofs_submitted = stats.proofs_submitted,
                "proof cycle complete"
            );
        }
    }

    fn pick_interval(&self) -> Duration {
        if self.config.interval_secs == 0 {
            let extra = rand::thread_rng().gen_range(0..RANDOM_INTERVAL_SPAN_SECS);
            Duration::from_secs(RANDOM_INTERVAL_MIN_SECS + extra)
        } else {
            Duration::from_secs(self.config.interval_secs as u64)
        }
    }

    /// One full pass over the contract index, followed by the inter-cycle
    /// sleep. Exposed directly (not just via `run`) so tests can drive a
    /// single cycle deterministically.
    pub async fn run_cycle(&self, cancel: &mut watch::Receiver<bool>) -> CycleStats {
        let start = Instant::now();
        let mut stats = CycleStats::default();

        let entries: Vec<_> = match self.index.scan() {
            Ok(scan) => scan.filter_map(|r| r.ok()).collect(),
            Err(e) => {
                error!(target: LOG_TARGET, error = %e, "failed to open contract index scan");
                return stats;
            }
        };

        for (cid, fid) in entries {
            self.process_one(&cid, &fid, &mut stats).await;
            tokio::time::sleep(self.config.inter_cid_sleep).await;
            if *cancel.borrow() {
                break;
            }
        }

        let elapsed = start.elapsed();
        if elapsed > CYCLE_TIME_WARNING {
            error!(target: LOG_TARGET, elapsed_secs = elapsed.as_secs(), "proof cycle took too long");
        }

        let interval = self.pick_interval();
        let remaining = interval.saturating_sub(elapsed);
        if !remaining.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(remaining) => {}
                _ = cancel.changed() => {}
            }
        }

        stats
    }

    async fn process_one(
        &self,
        cid: &spn_common::Cid,
        fid: &spn_common::Fid,
        stats: &mut CycleStats,
    ) {
        let verified = self.chain.is_verified(cid.as_str(), &self.config.self_address).await;

        let verified = match verified {
            Err(e) if !e.is_benign() => {
                // transient: counter untouched, move on
                stats.transient_errors += 1;
                return;
            }
            Err(_benign) => {
                let misses = match self.index.miss(cid) {
                    Ok(n) => n,
                    Err(e) => {
                        error!(target: LOG_TARGET, %cid, error = %e, "failed to record miss");
                        return;
                    }
                };
                stats.misses += 1;
                if misses > self.config.max_misses {
                    self.evict(cid, fid, stats).await;
                }
                return;
            }
            Ok(v) => v,
        };

        // Chain query succeeded: the miss counter is decremented
        // unconditionally here, before we look at `verified`. This is
        // load-bearing source behavior, not an oversight: a contract that
        // fails local proof generation this cycle but whose chain query
        // succeeds still has its counter lowered.
        if let Err(e) = self.index.hit(cid) {
            error!(target: LOG_TARGET, %cid, error = %e, "failed to record hit");
            return;
        }
        stats.hits += 1;

        if verified {
            return;
        }

        self.produce_proof(cid, fid, stats).await;
    }

    async fn evict(&self, cid: &spn_common::Cid, fid: &spn_common::Fid, stats: &mut CycleStats) {
        if let Err(e) = self.index.unbind(cid) {
            error!(target: LOG_TARGET, %cid, error = %e, "failed to unbind evicted contract");
            return;
        }
        stats.evictions += 1;

        match self.index.cids_of(fid) {
            Ok(remaining) if remaining.is_empty() => {
                if let Err(e) = spn_storage::remove_fid_data(&self.networkfiles_root, fid) {
                    error!(target: LOG_TARGET, %fid, error = %e, "failed to remove evicted file data");
                }
            }
            Ok(_) => {
                // another contract still references this fingerprint; keep
                // the bytes on disk
            }
            Err(e) => {
                error!(target: LOG_TARGET, %fid, error = %e, "failed to check for remaining references during eviction");
            }
        }
    }

    async fn produce_proof(&self, cid: &spn_common::Cid, fid: &spn_common::Fid, stats: &mut CycleStats) {
        let challenge_index = match self.chain.challenge_block(cid.as_str()).await {
            Ok(i) => i as usize,
            Err(e) => {
                warn!(target: LOG_TARGET, %cid, error = %e, "could not fetch challenge block");
                return;
            }
        };

        let (chunk, proof) =
            match spn_storage::build_proof(&self.networkfiles_root, fid, challenge_index) {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(target: LOG_TARGET, %cid, %fid, error = %e, "could not build proof, treating as a local miss");
                    let _ = self.index.miss(cid);
                    return;
                }
            };

        let chunk_hex = hex::encode(&chunk);
        let proof_json = serde_json::to_string(&proof).unwrap_or_default();

        match collect_attestations(
            self.chain.as_ref(),
            &self.http,
            cid.as_str(),
            chunk_hex.clone(),
            proof_json.clone(),
            self.config.attestation_timeout,
        )
        .await
        {
            Ok(count) if count >= self.config.attestation_quorum => {
                // fast path succeeded: no slow-path submission
                return;
            }
            Ok(_) | Err(_) => {}
        }

        // Slow path: fire-and-forget, the next cycle's `isVerified` reveals
        // the true outcome.
        let adaptor = Arc::clone(&self.adaptor);
        let message = TxMessage::PostProof {
            cid: cid.as_str().to_string(),
            chunk_hex,
            proof_json,
        };
        stats.proofs_submitted += 1;
        tokio::spawn(async move {
            if let Err(e) = adaptor.submit(message).await {
                warn!(target: LOG_TARGET, error = %e, "slow-path proof submission failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spn_chain::MockChainClient;
    use spn_common::{Cid, Fid};
    use spn_tx_adaptor::{AdaptorError, TxOutcome};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAdaptor {
        submissions: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TransactionAdaptor for CountingAdaptor {
        async fn submit(&self, _message: TxMessage) -> Result<TxOutcome, AdaptorError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            Ok(TxOutcome {
                tx_hash: "stub".into(),
            })
        }
    }

    fn scheduler_with(chain: MockChainClient, index: ContractIndex, root: PathBuf) -> Scheduler {
        Scheduler {
            config: SchedulerConfig {
                self_address: "me".into(),
                interval_secs: 1,
                max_misses: 2,
                inter_cid_sleep: Duration::from_millis(0),
                attestation_quorum: 3,
                attestation_timeout: Duration::from_millis(200),
            },
            chain: Arc::new(chain),
            index: Arc::new(index),
            networkfiles_root: root,
            adaptor: Arc::new(CountingAdaptor {
                submissions: AtomicUsize::new(0),
            }),
            http: reqwest::Client::new(),
        }
    }

    #[tokio::test]
    async fn scenario_s3_miss_cycle_evicts_after_max_misses() {
        let dir = tempfile::tempdir().unwrap();
        let index = ContractIndex::open(dir.path().join("db")).unwrap();
        let cid = Cid::from_raw("c1");
        let fid = Fid::from_raw("f1");
        index.bind(&cid, &fid).unwrap();

        let chain = MockChainClient::new();
        for _ in 0..3 {
            chain.push_is_verified(Err(spn_chain::ChainError::Remote("key not found".into())));
        }

        let scheduler = scheduler_with(chain, index, dir.path().join("networkfiles"));
        let (_tx, mut rx) = watch::channel(false);

        scheduler.run_cycle(&mut rx).await;
        scheduler.run_cycle(&mut rx).await;
        let stats = scheduler.run_cycle(&mut rx).await;

        assert_eq!(stats.evictions, 1);
        assert!(matches!(
            scheduler.index.lookup(&cid),
            Err(spn_contract_index::IndexError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn transient_error_does_not_touch_miss_counter() {
        let dir = tempfile::tempdir().unwrap();
        let index = ContractIndex::open(dir.path().join("db")).unwrap();
        let cid = Cid::from_raw("c1");
        let fid = Fid::from_raw("f1");
        index.bind(&cid, &fid).unwrap();

        let chain = MockChainClient::new();
        chain.push_is_verified(Err(spn_chain::ChainError::Transport("timeout".into())));

        let scheduler = scheduler_with(chain, index, dir.path().join("networkfiles"));
        let (_tx, mut rx) = watch::channel(false);
        let stats = scheduler.run_cycle(&mut rx).await;

        assert_eq!(stats.transient_errors, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn verified_already_applies_hit_and_skips_proof() {
        let dir = tempfile::tempdir().unwrap();
        let index = ContractIndex::open(dir.path().join("db")).unwrap();
        let cid = Cid::from_raw("c1");
        let fid = Fid::from_raw("f1");
        index.bind(&cid, &fid).unwrap();
        index.miss(&cid).unwrap();

        let chain = MockChainClient::new();
        chain.push_is_verified(Ok(true));

        let scheduler = scheduler_with(chain, index, dir.path().join("networkfiles"));
        let (_tx, mut rx) = watch::channel(false);
        let stats = scheduler.run_cycle(&mut rx).await;

        assert_eq!(stats.hits, 1);
        assert_eq!(scheduler.index.lookup(&cid).unwrap(), fid);
    }
}
