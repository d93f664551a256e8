// Mints one 100-supply asset and splits it into 100 single-quantity
// outputs, confirming each step.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tracing::info;

use ledger_mirror::config::Config;
use ledger_mirror::init_tracing;
use ledger_mirror::ledger::models::{AssetScheme, PlatformAddress};
use ledger_mirror::rpc::{ChainRpc, HttpChainRpc};
use ledger_mirror::submit::wait_for_transaction;
use ledger_mirror::txn::{split_outputs, LocalKeySigner, Transaction, TxSigner};

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
    let signer = LocalKeySigner::from_hex(faucet_address.clone(), &faucet_secret)?;
    let recipient = signer.account_id();

    let poll_interval = Duration::from_millis(500);
    let timeout = Duration::from_secs(config.confirmation_timeout_secs);

    // mint a single 100-supply asset
    let scheme = AssetScheme {
        shard_id: 0,
        metadata: serde_json::json!({
            "name": "Gold For Performance Test",
            "description": "An asset to test performance",
            "icon_url": "https://static.majecty.tech/images/clock512.png",
        })
        .to_string(),
        supply: 100,
        registrar: None,
    };
    let mint = Transaction::mint_asset(&config.network_id, &scheme, recipient);
    let minted = mint
        .minted_asset()
        .ok_or_else(|| anyhow!("mint produced no asset"))?;

    let seq = rpc.get_seq(&faucet_address).await?;
    let signed = signer.sign(mint, config.fee, seq)?;
    let hash = rpc.send_signed_transaction(&signed).await?;
    wait_for_transaction(rpc.as_ref(), &hash, timeout, poll_interval).await?;
    info!("minted {} of asset type {}", minted.quantity, minted.asset_type);

    // split it into 100 single-quantity outputs
    let outputs = split_outputs(&minted, recipient, 100);
    let transfer =
        Transaction::transfer_asset(&config.network_id, vec![minted.clone()], outputs);

    let seq = rpc.get_seq(&faucet_address).await?;
    let signed = signer.sign(transfer, 100, seq)?;
    let hash = rpc.send_signed_transaction(&signed).await?;
    wait_for_transaction(rpc.as_ref(), &hash, timeout, poll_interval).await?;
    info!("split {} into 100 single-quantity outputs", minted.asset_type);

    info!("finish");
    Ok(())
}
