mod adaptor;
mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use spn_chain::HttpChainClient;
use spn_common::{init_logging, LogFormat};
use spn_contract_index::ContractIndex;
use spn_scheduler::{Scheduler, SchedulerConfig};
use spn_stray_pool::{HandContext, Pool, DEFAULT_POLL_INTERVAL};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let format = if cli.debug {
        LogFormat::Text
    } else {
        LogFormat::auto_detect()
    };
    init_logging(format, cli.debug);

    let chain_url = cli.chain_url.clone();
    let self_address = cli.self_address.clone();
    let self_ip = cli.self_ip.clone();
    let config = cli.into_node_config();

    info!(storage_dir = %config.storage_dir.display(), port = config.port, "starting storage provider node");

    std::fs::create_dir_all(config.networkfiles_dir())?;
    std::fs::create_dir_all(&config.storage_dir)?;

    let index = Arc::new(ContractIndex::open(config.db_dir())?);
    let chain = Arc::new(HttpChainClient::new(chain_url));
    let adaptor = Arc::new(adaptor::UnconfiguredTransactionAdaptor);
    let http = reqwest::Client::new();

    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);

    let scheduler = Scheduler {
        config: SchedulerConfig {
            self_address: self_address.clone(),
            interval_secs: config.interval_secs,
            max_misses: config.max_misses,
            inter_cid_sleep: Duration::from_millis(config.sleep_ms.max(0) as u64),
            attestation_quorum: config.attestation_quorum,
            attestation_timeout: spn_attestation::DEFAULT_COLLECTIVE_TIMEOUT,
        },
        chain: chain.clone(),
        index: index.clone(),
        networkfiles_root: config.networkfiles_dir(),
        adaptor: adaptor.clone(),
        http: http.clone(),
    };
    let scheduler_cancel = cancel_rx.clone();
    let scheduler_handle = tokio::spawn(async move { scheduler.run(scheduler_cancel).await });

    let pool = Arc::new(Pool::new(
        config.hand_count,
        HandContext {
            chain: chain.clone(),
            index: index.clone(),
            networkfiles_root: config.networkfiles_dir(),
            adaptor: adaptor.clone(),
            http: http.clone(),
            self_address: self_address.clone(),
            self_ip,
            chunk_size: config.chunk_size,
        },
        DEFAULT_POLL_INTERVAL,
    ));
    let pool_cancel = cancel_rx.clone();
    let pool_handle = tokio::spawn(async move { pool.run(pool_cancel).await });

    let api_state = spn_peer_api::AppState {
        index: index.clone(),
        networkfiles_root: config.networkfiles_dir(),
        self_address,
        version: env!("CARGO_PKG_VERSION"),
    };
    let router = spn_peer_api::routes(api_state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("peer API server failed");
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = cancel_tx.send(true);

    let _ = scheduler_handle.await;
    let _ = pool_handle.await;
    server_handle.abort();

    Ok(())
}
