// Batched transaction submission with confirmation polling
//
// All transactions of a batch are signed with consecutive sequence ordinals
// and submitted without waiting on each other; confirmation is then polled
// per transaction hash. Submission alone proves nothing - a transaction
// counts only once the node reports it contained.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppResult, SubmitError};
use crate::ledger::models::TxHash;
use crate::rpc::ChainRpc;
use crate::txn::{Transaction, TxSigner};

#[derive(Debug, Clone)]
pub struct SubmitConfig {
    /// Fixed fee stamped on every transaction of a batch
    pub fee: u64,
    pub poll_interval: Duration,
    pub confirmation_timeout: Duration,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            fee: 100_000,
            poll_interval: Duration::from_millis(500),
            confirmation_timeout: Duration::from_secs(60),
        }
    }
}

pub struct BatchSubmitter {
    rpc: Arc<dyn ChainRpc>,
    signer: Arc<dyn TxSigner>,
    config: SubmitConfig,
}

impl BatchSubmitter {
    pub fn new(rpc: Arc<dyn ChainRpc>, signer: Arc<dyn TxSigner>, config: SubmitConfig) -> Self {
        Self {
            rpc,
            signer,
            config,
        }
    }

    /// Submits `count` transactions from the signing account and waits until
    /// every one of them is contained in the chain.
    ///
    /// The signer's sequence is read once; transaction `i` gets ordinal
    /// `seq + i`, so the batch can never collide with itself. The builder is
    /// called with the batch index `0..count`.
    pub async fn submit_batch<F>(&self, count: u64, build: F) -> AppResult<Vec<TxHash>>
    where
        F: Fn(u64) -> Transaction,
    {
        let batch_id = Uuid::new_v4();
        let signer_address = self.signer.address().clone();
        let seq = self.rpc.get_seq(&signer_address).await?;

        info!(
            "batch {}: submitting {} transactions from {} starting at seq {}",
            batch_id, count, signer_address, seq
        );

        let mut hashes = Vec::with_capacity(count as usize);
        for index in 0..count {
            let signed = self
                .signer
                .sign(build(index), self.config.fee, seq + index)?;
            let hash = self.rpc.send_signed_transaction(&signed).await?;
            debug!("batch {}: submitted {} (seq {})", batch_id, hash, seq + index);
            hashes.push(hash);
        }

        for hash in &hashes {
            self.wait_contained(hash).await?;
        }

        info!("batch {}: all {} transactions confirmed", batch_id, count);
        Ok(hashes)
    }

    /// Polls until the node reports the transaction contained, or fails with
    /// a timeout.
    pub async fn wait_contained(&self, hash: &TxHash) -> AppResult<()> {
        wait_for_transaction(
            self.rpc.as_ref(),
            hash,
            self.config.confirmation_timeout,
            self.config.poll_interval,
        )
        .await
    }
}

pub async fn wait_for_transaction(
    rpc: &dyn ChainRpc,
    hash: &TxHash,
    timeout: Duration,
    interval: Duration,
) -> AppResult<()> {
    let start = Instant::now();
    loop {
        if rpc.contains_transaction(hash).await? {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(SubmitError::ConfirmationTimeout {
                hash: *hash,
                timeout,
            }
            .into());
        }
        tokio::time::sleep(interval).await;
    }
}
