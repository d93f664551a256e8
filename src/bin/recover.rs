// Rebuilds the local ledger mirror from the node and the UTXO index, then
// reports the recovered holdings.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::info;

use ledger_mirror::config::Config;
use ledger_mirror::indexer::HttpUtxoIndexer;
use ledger_mirror::init_tracing;
use ledger_mirror::ledger::models::{AccountId, AssetScheme, PlatformAddress};
use ledger_mirror::ledger::recovery::{RecoveryConfig, StateRecovery};
use ledger_mirror::ledger::store::StateStore;
use ledger_mirror::rpc::HttpChainRpc;

fn env_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    let regulator = PlatformAddress::new(
        config
            .regulator
            .clone()
            .ok_or_else(|| anyhow!("REGULATOR is not specified"))?,
    );
    let regulator_alt = config.regulator_alt.clone().map(PlatformAddress::new);

    let addresses: Vec<PlatformAddress> = env_list("PLATFORM_ADDRESSES")
        .into_iter()
        .map(PlatformAddress::new)
        .collect();
    let accounts: Vec<AccountId> = env_list("ASSET_ACCOUNTS")
        .iter()
        .map(|s| AccountId::from_hex(s))
        .collect::<Result<_, _>>()?;
    let supply = std::env::var("ASSET_SUPPLY")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(100);
    let schemes: Vec<AssetScheme> = env_list("ASSET_METADATA")
        .into_iter()
        .map(|metadata| AssetScheme {
            shard_id: 0,
            metadata,
            supply,
            registrar: Some(regulator.clone()),
        })
        .collect();

    let rpc = Arc::new(HttpChainRpc::new(config.rpc_url.clone()));
    let indexer = Arc::new(HttpUtxoIndexer::new(config.indexer_url.clone()));
    let recovery = StateRecovery::new(
        rpc,
        indexer,
        RecoveryConfig {
            network_id: config.network_id.clone(),
            regulator,
            regulator_alt,
        },
    );

    let mut state = StateStore::new();
    recovery
        .recover(&mut state, &addresses, &accounts, &schemes)
        .await?;

    info!(
        "recovered {} platform accounts and {} asset schemes",
        addresses.len(),
        state.all_asset_schemes().count()
    );
    Ok(())
}
