use std::time::Duration;

use thiserror::Error;

use crate::ledger::models::{AccountId, AssetType, PlatformAddress, TxHash, H160};

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Indexer error: {0}")]
    Indexer(#[from] IndexerError),

    #[error("Submit error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Local state integrity errors
///
/// These mean the local mirror and the remote ledger have diverged, or an
/// invariant was violated. There is no safe local correction; the current
/// operation must abort.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("unrecognized lock script hash {lock_script_hash} on utxo of {owner} (asset type {asset_type})")]
    UnrecognizedLockScript {
        owner: AccountId,
        asset_type: AssetType,
        lock_script_hash: H160,
    },

    #[error("asset scheme already registered for asset type {0}")]
    AssetSchemeExists(AssetType),

    #[error("no asset scheme registered for asset type {0}")]
    AssetSchemeMissing(AssetType),

    #[error("no sequence recorded for {0}, recovery must run first")]
    SequenceUnknown(PlatformAddress),
}

/// Ledger node RPC errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("node returned error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// UTXO index query errors
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed record: {0}")]
    InvalidRecord(String),
}

/// Transaction submission errors
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("transaction {hash} not confirmed within {timeout:?}")]
    ConfirmationTimeout { hash: TxHash, timeout: Duration },
}

/// Weighted account selection errors
///
/// Degenerate inputs, rejected before any remote call is attempted.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("no candidate accounts to select from")]
    NoCandidates,

    #[error("total balance of candidate accounts is zero")]
    ZeroTotalBalance,
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Internal(format!("serialization error: {}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
