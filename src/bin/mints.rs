// Submits a batch of 100 asset-mint transactions, each with unique metadata,
// and waits until every one of them is contained.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tracing::info;
use uuid::Uuid;

use ledger_mirror::config::Config;
use ledger_mirror::init_tracing;
use ledger_mirror::ledger::models::{AssetScheme, PlatformAddress};
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
    let recipient = signer.account_id();
    let submitter = BatchSubmitter::new(
        rpc,
        signer,
        SubmitConfig {
            fee: config.fee,
            poll_interval: Duration::from_millis(500),
            confirmation_timeout: Duration::from_secs(config.confirmation_timeout_secs),
        },
    );

    let network_id = config.network_id.clone();
    submitter
        .submit_batch(100, |_| {
            let metadata = serde_json::json!({
                "name": format!("Gold For Performance Test {}", Uuid::new_v4()),
                "description": "An asset to test performance",
                "icon_url": "https://static.majecty.tech/images/clock512.png",
            })
            .to_string();
            let scheme = AssetScheme {
                shard_id: 0,
                metadata,
                supply: 100,
                registrar: None,
            };
            Transaction::mint_asset(&network_id, &scheme, recipient)
        })
        .await?;

    info!("finish");
    Ok(())
}
