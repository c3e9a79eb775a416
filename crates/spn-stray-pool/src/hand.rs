//! A single worker's handling of one claimed stray contract.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use spn_chain::{ChainClient, StrayContract};
use spn_common::{Cid, Fid};
use spn_contract_index::ContractIndex;
use spn_tx_adaptor::{TransactionAdaptor, TxMessage};

const LOG_TARGET: &str = "stray-pool";

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no provider holds the file and we don't have it locally either")]
    Abandoned,
    #[error("could not download the file from any peer")]
    DownloadFailed,
    #[error(transparent)]
    Storage(#[from] spn_storage::StorageError),
}

pub struct HandContext {
    pub chain: Arc<dyn ChainClient>,
    pub index: Arc<ContractIndex>,
    pub networkfiles_root: PathBuf,
    pub adaptor: Arc<dyn TransactionAdaptor>,
    pub http: reqwest::Client,
    /// This node's chain account address, the same identifier passed to
    /// `is_verified`/`ClaimStray`. Compared against `StrayContract::owner`,
    /// which is an address too — not a network address.
    pub self_address: String,
    /// This node's network-reachable base URL, used to recognize ourselves
    /// in peer-IP listings (e.g. `find_file`'s provider list) during stray
    /// download.
    pub self_ip: String,
    /// Node-wide chunk size, used when re-chunking bytes downloaded from a
    /// peer so the rebuilt tree matches what a fresh local ingest would
    /// have produced.
    pub chunk_size: i64,
}

/// One of the pool's `N` concurrent workers. `index` derives this Hand's
/// signing sub-key (see [`crate::key::derive_hand_key`]); `busy` gates
/// whether the manager may hand it a new stray.
pub struct Hand {
    pub index: u8,
    busy: AtomicBool,
}

impl Hand {
    pub fn new(index: u8) -> Self {
        Hand {
            index,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.busy.load(Ordering::SeqCst)
    }

    /// Atomically claims this Hand if it is idle. Returns `false` without
    /// side effects if another caller claimed it first.
    pub fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn release(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Runs [`process`] for an already-claimed Hand and releases it
    /// afterwards regardless of outcome. Callers must have claimed this
    /// Hand via [`Self::try_claim`] first.
    pub async fn run(&self, ctx: &HandContext, stray: StrayContract) {
        info!(target: LOG_TARGET, hand = self.index, cid = %stray.cid, "processing stray");
        if let Err(e) = process(ctx, &stray).await {
            info!(target: LOG_TARGET, hand = self.index, cid = %stray.cid, reason = %e, "stray abandoned");
        }
        self.release();
    }
}

/// Reclaims one stray contract: recovers the bytes from disk or a peer,
/// then claims the contract and binds it.
///
/// The original source's "ignore ourselves" check returned from the whole
/// function upon finding our own IP in the provider list, which meant a
/// stray could never be reclaimed once we were spuriously listed as one of
/// its own providers. This instead skips only our own IP and keeps
/// evaluating the remaining peers.
pub async fn process(ctx: &HandContext, stray: &StrayContract) -> Result<(), ProcessError> {
    let cid = Cid::from_raw(stray.cid.clone());
    let fid = Fid::from_raw(stray.fid.clone());

    let providers = ctx
        .chain
        .find_file(&stray.fid)
        .await
        .unwrap_or_default();

    let have_locally = spn_storage::layout::fid_dir(&ctx.networkfiles_root, &fid).exists();

    if providers.is_empty() && !have_locally {
        return Err(ProcessError::Abandoned);
    }

    let only_us = !providers.is_empty() && providers.iter().all(|p| *p == ctx.self_ip);

    // Re-download from a genuine peer whenever one is listed, even if we
    // already hold a local copy, to keep our bytes consistent with what the
    // rest of the network agrees on. A local copy only lets us skip the
    // download when the provider list is empty (nothing to re-check
    // against) or contains only ourselves.
    if !providers.is_empty() && !only_us {
        let mut downloaded = false;
        for peer in &providers {
            if *peer == ctx.self_ip {
                continue;
            }
            match download_from_peer(&ctx.http, peer, &stray.fid).await {
                Ok(bytes) => {
                    spn_storage::ingest(
                        &ctx.networkfiles_root,
                        &bytes,
                        ctx.chunk_size as usize,
                        i64::MAX,
                    )?;
                    downloaded = true;
                    break;
                }
                Err(e) => {
                    warn!(target: LOG_TARGET, peer, error = %e, "peer download failed, trying next");
                }
            }
        }
        if !downloaded {
            return Err(ProcessError::DownloadFailed);
        }
    }

    match ctx
        .adaptor
        .submit(TxMessage::ClaimStray {
            cid: stray.cid.clone(),
        })
        .await
    {
        Ok(_) => {
            if let Err(e) = ctx.index.bind(&cid, &fid) {
                warn!(target: LOG_TARGET, %cid, error = %e, "claimed stray but failed to bind locally");
            }
            Ok(())
        }
        Err(e) => {
            // Another provider claimed it first; not an error.
            info!(target: LOG_TARGET, %cid, reason = %e, "stray claim lost the race");
            Ok(())
        }
    }
}

async fn download_from_peer(
    http: &reqwest::Client,
    peer_base: &str,
    fid: &str,
) -> Result<Vec<u8>, reqwest::Error> {
    let url = format!("{peer_base}/download/{fid}");
    let response = http.get(&url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}
