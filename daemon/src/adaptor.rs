//! Stand-in for the external transaction-broadcast queue. A real deployment
//! wires in whatever queue serializes the operator's account-sequence
//! numbers; this logs and reports failure, which is enough to exercise the
//! scheduler's and stray pool's fire-and-forget submission paths without a
//! live chain connection.

use async_trait::async_trait;
use tracing::warn;

use spn_tx_adaptor::{AdaptorError, TransactionAdaptor, TxMessage, TxOutcome};

pub struct UnconfiguredTransactionAdaptor;

#[async_trait]
impl TransactionAdaptor for UnconfiguredTransactionAdaptor {
    async fn submit(&self, message: TxMessage) -> Result<TxOutcome, AdaptorError> {
        warn!(
            "no transaction-broadcast queue configured; dropping submission: {:?}",
            message
        );
        Err(AdaptorError::Rejected(
            "no transaction-broadcast queue configured".to_string(),
        ))
    }
}
