use serde::Deserialize;

/// Process configuration, read once from the environment and passed into
/// component constructors explicitly.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub indexer_url: String,
    pub network_id: String,
    pub accounts_url: Option<String>,
    pub payer: Option<String>,
    pub payer_secret: Option<String>,
    pub faucet_address: Option<String>,
    pub faucet_secret: Option<String>,
    pub regulator: Option<String>,
    pub regulator_alt: Option<String>,
    pub fee: u64,
    pub reward: u64,
    pub drop_interval_secs: u64,
    pub confirmation_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Ok(Self {
            rpc_url: std::env::var("RPC_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            indexer_url: std::env::var("INDEXER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:9001".to_string()),
            network_id: std::env::var("NETWORK_ID").unwrap_or_else(|_| "tc".to_string()),
            accounts_url: std::env::var("ACCOUNTS_URL").ok(),
            payer: std::env::var("PAYER").ok(),
            payer_secret: std::env::var("PAYER_SECRET").ok(),
            faucet_address: std::env::var("FAUCET_ADDRESS").ok(),
            faucet_secret: std::env::var("FAUCET_SECRET").ok(),
            regulator: std::env::var("REGULATOR").ok(),
            regulator_alt: std::env::var("REGULATOR_ALT").ok(),
            fee: env_u64("FEE", 100_000),
            reward: env_u64("REWARD", 100),
            drop_interval_secs: env_u64("DROP_INTERVAL", 60),
            confirmation_timeout_secs: env_u64("TRANSACTION_TIMEOUT", 60),
        })
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
