// Long-lived lottery loop
//
// Every cycle: fetch the account listing, pick a winner weighted by balance
// (the payer never wins its own reward), send the reward payment, sleep.
// Cycle failures are logged and the loop continues - only a broken
// configuration stops the process, and that before the first cycle.

use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use tracing::{error, info};

use ledger_mirror::config::Config;
use ledger_mirror::error::AppResult;
use ledger_mirror::init_tracing;
use ledger_mirror::ledger::models::PlatformAddress;
use ledger_mirror::lottery::{self, WeightedDraw};
use ledger_mirror::notify::{AnnouncementConfig, EmailAnnouncer};
use ledger_mirror::rpc::{ChainRpc, HttpChainRpc};
use ledger_mirror::txn::{LocalKeySigner, Transaction, TxSigner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    let payer = PlatformAddress::new(
        config
            .payer
            .clone()
            .ok_or_else(|| anyhow!("PAYER is not specified"))?,
    );
    let payer_secret = config
        .payer_secret
        .clone()
        .ok_or_else(|| anyhow!("PAYER_SECRET is not specified"))?;
    let accounts_url = config
        .accounts_url
        .clone()
        .ok_or_else(|| anyhow!("ACCOUNTS_URL is not specified"))?;
    if config.reward == 0 {
        return Err(anyhow!("REWARD is not specified"));
    }

    let rpc = HttpChainRpc::new(config.rpc_url.clone());
    let signer = LocalKeySigner::from_hex(payer.clone(), &payer_secret)?;
    let client = reqwest::Client::new();
    let announcer = EmailAnnouncer::new(AnnouncementConfig::from_env());
    let announce_to = std::env::var("ANNOUNCE_EMAIL").ok();

    info!(
        "lottery started: reward {} every {}s",
        config.reward, config.drop_interval_secs
    );

    loop {
        match run_cycle(&rpc, &signer, &client, &accounts_url, &payer, config.reward).await {
            Ok(winner) => {
                info!("{} has won the lottery!", winner);
                if let Some(to) = &announce_to {
                    let body = format!(
                        "{} won {} at {}",
                        winner,
                        config.reward,
                        Utc::now().to_rfc3339()
                    );
                    announcer.send_announcement(to, "Lottery winner", &body).await;
                }
            }
            Err(error) => error!("lottery cycle failed: {}", error),
        }

        tokio::time::sleep(Duration::from_secs(config.drop_interval_secs)).await;
    }
}

async fn run_cycle(
    rpc: &HttpChainRpc,
    signer: &LocalKeySigner,
    client: &reqwest::Client,
    accounts_url: &str,
    payer: &PlatformAddress,
    reward: u64,
) -> AppResult<PlatformAddress> {
    let accounts = lottery::fetch_accounts(client, accounts_url).await?;
    let draw = WeightedDraw::random(&mut rand::rng());
    let winner = lottery::choose_recipient(accounts, payer, draw)?;

    let seq = rpc.get_seq(payer).await?;
    let signed = signer.sign(Transaction::pay(winner.address.clone(), reward), 10, seq)?;
    rpc.send_signed_transaction(&signed).await?;

    Ok(winner.address)
}
