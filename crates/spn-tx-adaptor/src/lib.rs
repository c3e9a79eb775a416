//! Thin wait-for-reply shim the core uses to push messages through the
//! external broadcast queue.
//!
//! The original "wait group + callback" pattern (a `sync.WaitGroup` plus a
//! response pointer filled in by the queue worker) becomes a one-shot
//! notifier: the submitter awaits a `tokio::sync::oneshot::Receiver` that
//! the adaptor's implementation is responsible for completing.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum TxMessage {
    PostProof {
        cid: String,
        chunk_hex: String,
        proof_json: String,
    },
    ClaimStray {
        cid: String,
    },
}

#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub tx_hash: String,
}

#[derive(Debug, Error)]
pub enum AdaptorError {
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("the broadcast queue dropped the completion notifier without replying")]
    NotifierDropped,
}

/// The external broadcast queue's contract: accept a message, eventually
/// notify the submitter of its outcome.
#[async_trait]
pub trait TransactionAdaptor: Send + Sync {
    async fn submit(&self, message: TxMessage) -> Result<TxOutcome, AdaptorError>;
}

impl From<tokio::sync::oneshot::error::RecvError> for AdaptorError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        AdaptorError::NotifierDropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAdaptor;

    #[async_trait]
    impl TransactionAdaptor for EchoAdaptor {
        async fn submit(&self, message: TxMessage) -> Result<TxOutcome, AdaptorError> {
            let (tx, rx) = tokio::sync::oneshot::channel();
            let outcome = match message {
                TxMessage::PostProof { cid, .. } => TxOutcome {
                    tx_hash: format!("proof-{cid}"),
                },
                TxMessage::ClaimStray { cid } => TxOutcome {
                    tx_hash: format!("claim-{cid}"),
                },
            };
            let _ = tx.send(Ok(outcome));
            rx.await?
        }
    }

    #[tokio::test]
    async fn submit_round_trips_through_a_oneshot_notifier() {
        let adaptor = EchoAdaptor;
        let outcome = adaptor
            .submit(TxMessage::ClaimStray {
                cid: "c1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome.tx_hash, "claim-c1");
    }
}
