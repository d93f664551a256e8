pub mod config;
pub mod error;
pub mod indexer;
pub mod ledger;
pub mod lottery;
pub mod notify;
pub mod rpc;
pub mod submit;
pub mod txn;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,ledger_mirror=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
