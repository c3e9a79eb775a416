//! Queries peer providers' attestation HTTP endpoint for a given challenge
//! and counts how many agree.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use spn_chain::ChainClient;

pub const DEFAULT_COLLECTIVE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("chain query for attestation roster failed: {0}")]
    Chain(#[from] spn_chain::ChainError),
    #[error("attestation round did not complete within the collective deadline")]
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
struct AttestRequest {
    cid: String,
    hashlist: String,
    item: String,
}

/// Concurrently POSTs the proof to every peer responsible for attesting
/// `cid` and returns how many answered with HTTP 200.
///
/// The success counter is shared across concurrent tasks and updated with
/// an atomic fetch-add; it is only read after every task has finished, per
/// the load-bearing race note in the design notes.
pub async fn collect_attestations(
    chain: &dyn ChainClient,
    http: &reqwest::Client,
    cid: &str,
    chunk_hex: String,
    proof_json: String,
    timeout: Duration,
) -> Result<usize, AttestationError> {
    let providers = chain.providers_for_cid(cid).await?;
    let mut peer_ips = Vec::with_capacity(providers.len());
    for address in providers {
        match chain.provider_by_address(&address).await {
            Ok(info) => peer_ips.push(info.ip),
            Err(e) => warn!(cid, address, error = %e, "could not resolve provider address"),
        }
    }

    let success_count = Arc::new(AtomicUsize::new(0));
    let body = AttestRequest {
        cid: cid.to_string(),
        hashlist: proof_json,
        item: chunk_hex,
    };

    let tasks = peer_ips.into_iter().map(|peer_ip| {
        let http = http.clone();
        let body = body.clone();
        let success_count = Arc::clone(&success_count);
        async move {
            let url = format!("{peer_ip}/attest");
            match http.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    success_count.fetch_add(1, Ordering::SeqCst);
                }
                Ok(resp) => {
                    debug!(cid = %body.cid, peer = %peer_ip, status = %resp.status(), "peer declined attestation");
                }
                Err(e) => {
                    debug!(cid = %body.cid, peer = %peer_ip, error = %e, "peer unreachable for attestation");
                }
            }
        }
    });

    match tokio::time::timeout(timeout, join_all(tasks)).await {
        Ok(_) => Ok(success_count.load(Ordering::SeqCst)),
        Err(_) => Err(AttestationError::TimedOut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::Router;
    use spn_chain::{MockChainClient, ProviderInfo};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const DEFAULT_ATTESTATION_QUORUM: usize = 3;

    /// Spawns a real HTTP server on an OS-assigned loopback port whose
    /// `/attest` handler always answers with `status`. Returns the server's
    /// base URL and the task so the caller can keep it alive for the test's
    /// duration.
    async fn spawn_attest_stub(status: axum::http::StatusCode) -> (String, JoinHandle<()>) {
        let router = Router::new().route("/attest", post(move || async move { status }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn unreachable_peers_count_toward_no_quorum() {
        let mock = MockChainClient::new();
        mock.push_providers_for_cid(Ok(vec!["p1".into(), "p2".into(), "p3".into()]));
        // provider_by_address is queried once per provider; none of these
        // addresses accept real connections, so the fan-out below exercises
        // the roster resolution and counter plumbing for the no-quorum path.
        mock.push_provider_by_address(Ok(ProviderInfo {
            address: "p1".into(),
            ip: "http://127.0.0.1:1".into(),
        }));
        mock.push_provider_by_address(Ok(ProviderInfo {
            address: "p2".into(),
            ip: "http://127.0.0.1:1".into(),
        }));
        mock.push_provider_by_address(Ok(ProviderInfo {
            address: "p3".into(),
            ip: "http://127.0.0.1:1".into(),
        }));

        let http = reqwest::Client::new();
        let count = collect_attestations(
            &mock,
            &http,
            "cid1",
            "68656c6c6f".into(),
            "[]".into(),
            Duration::from_millis(500),
        )
        .await
        .unwrap();
        // All three peer addresses resolve but none accept real connections
        // on this port, so zero succeed.
        assert_eq!(count, 0);
    }

    /// Scenario S4 (`spec.md` §8): 4 peers, 3 answer 200, 1 answers 500 —
    /// quorum (3) is met.
    #[tokio::test]
    async fn scenario_s4_quorum_met_against_real_http_peers() {
        let (ok_a, _a) = spawn_attest_stub(axum::http::StatusCode::OK).await;
        let (ok_b, _b) = spawn_attest_stub(axum::http::StatusCode::OK).await;
        let (ok_c, _c) = spawn_attest_stub(axum::http::StatusCode::OK).await;
        let (bad, _d) = spawn_attest_stub(axum::http::StatusCode::INTERNAL_SERVER_ERROR).await;

        let mock = MockChainClient::new();
        mock.push_providers_for_cid(Ok(vec!["p1".into(), "p2".into(), "p3".into(), "p4".into()]));
        for (address, ip) in [("p1", ok_a), ("p2", ok_b), ("p3", ok_c), ("p4", bad)] {
            mock.push_provider_by_address(Ok(ProviderInfo {
                address: address.into(),
                ip,
            }));
        }

        let http = reqwest::Client::new();
        let count = collect_attestations(
            &mock,
            &http,
            "cid1",
            "68656c6c6f".into(),
            "[]".into(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(count, 3);
        assert!(count >= DEFAULT_ATTESTATION_QUORUM);
    }

    /// Scenario S5 (`spec.md` §8): same roster, but only 2 of 4 peers agree —
    /// quorum is missed and the scheduler must fall back to the slow path.
    #[tokio::test]
    async fn scenario_s5_quorum_missed_against_real_http_peers() {
        let (ok_a, _a) = spawn_attest_stub(axum::http::StatusCode::OK).await;
        let (ok_b, _b) = spawn_attest_stub(axum::http::StatusCode::OK).await;
        let (bad_a, _c) = spawn_attest_stub(axum::http::StatusCode::INTERNAL_SERVER_ERROR).await;
        let (bad_b, _d) = spawn_attest_stub(axum::http::StatusCode::INTERNAL_SERVER_ERROR).await;

        let mock = MockChainClient::new();
        mock.push_providers_for_cid(Ok(vec!["p1".into(), "p2".into(), "p3".into(), "p4".into()]));
        for (address, ip) in [("p1", ok_a), ("p2", ok_b), ("p3", bad_a), ("p4", bad_b)] {
            mock.push_provider_by_address(Ok(ProviderInfo {
                address: address.into(),
                ip,
            }));
        }

        let http = reqwest::Client::new();
        let count = collect_attestations(
            &mock,
            &http,
            "cid1",
            "68656c6c6f".into(),
            "[]".into(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(count, 2);
        assert!(count < DEFAULT_ATTESTATION_QUORUM);
    }
}
