// Submits a batch of 100 self-payments from the faucet account and waits
// until every one of them is contained.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tracing::info;

use ledger_mirror::config::Config;
use ledger_mirror::init_tracing;
use ledger_mirror::ledger::models::PlatformAddress;
use ledger_mirror::rpc::HttpChainRpc;
use ledger_mirror::submit::{BatchSubmitter, SubmitConfig};
use ledger_mirror::txn::{LocalKeySigner, Transaction};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    let faucet_address = PlatformAddress::new(
        config
            .faucet_address
            .clone()
            .ok_or_else(|| anyhow!("FAUCET_ADDRESS is not specified"))?,
    );
    let faucet_secret = config
        .faucet_secret
        .clone()
        .ok_or_else(|| anyhow!("FAUCET_SECRET is not specified"))?;

    let rpc = Arc::new(HttpChainRpc::new(config.rpc_url.clone()));
    let signer = Arc::new(LocalKeySigner::from_hex(
        faucet_address.clone(),
        &faucet_secret,
    )?);
    let submitter = BatchSubmitter::new(
        rpc,
        signer,
        SubmitConfig {
            fee: config.fee,
            poll_interval: Duration::from_millis(500),
            confirmation_timeout: Duration::from_secs(config.confirmation_timeout_secs),
        },
    );

    let recipient = faucet_address.clone();
    submitter
        .submit_batch(100, |_| Transaction::pay(recipient.clone(), 100))
        .await?;

    info!("finish");
    Ok(())
}
