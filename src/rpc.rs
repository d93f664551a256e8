// Ledger node JSON-RPC client
//
// Thin wrapper over the node's HTTP endpoint. The trait is what the rest of
// the crate consumes; tests substitute their own implementations.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppResult, RpcError};
use crate::ledger::models::{AssetScheme, AssetType, PlatformAddress, TxHash, H256};
use crate::txn::SignedTransaction;

/// A transaction as reported by the node, reduced to the fields we track
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    pub block_hash: Option<H256>,
}

/// A block header view with the hashes of its transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: u64,
    pub hash: H256,
    pub transactions: Vec<TxHash>,
}

/// Remote ledger node operations used by recovery and submission
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn get_balance(&self, address: &PlatformAddress) -> AppResult<u64>;

    async fn get_seq(&self, address: &PlatformAddress) -> AppResult<u64>;

    async fn get_asset_scheme_by_type(
        &self,
        asset_type: &AssetType,
        shard_id: u16,
    ) -> AppResult<Option<AssetScheme>>;

    async fn send_signed_transaction(&self, tx: &SignedTransaction) -> AppResult<TxHash>;

    async fn contains_transaction(&self, hash: &TxHash) -> AppResult<bool>;

    async fn get_transaction(&self, hash: &TxHash) -> AppResult<Option<TransactionRecord>>;

    async fn get_block(&self, number: u64) -> AppResult<Option<Block>>;

    async fn get_best_block_number(&self) -> AppResult<u64>;
}

/// The block a transaction was mined into, if any yet.
pub async fn get_block_of_transaction(
    rpc: &dyn ChainRpc,
    hash: &TxHash,
) -> AppResult<Option<Block>> {
    let record = match rpc.get_transaction(hash).await? {
        Some(record) => record,
        None => return Ok(None),
    };
    match record.block_number {
        Some(number) => rpc.get_block(number).await,
        None => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 client against a node URL
pub struct HttpChainRpc {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpChainRpc {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> AppResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(RpcError::Transport)?;

        let envelope: JsonRpcResponse = response.json().await.map_err(RpcError::Transport)?;

        if let Some(error) = envelope.error {
            return Err(RpcError::Node {
                code: error.code,
                message: error.message,
            }
            .into());
        }

        // absent and null results are the same thing: "nothing registered"
        let result = envelope.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| RpcError::InvalidResponse(format!("{}: {}", method, e)).into())
    }

    async fn call_u64(&self, method: &str, params: Value) -> AppResult<u64> {
        let value: Value = self.call(method, params).await?;
        u64_from_value(&value).ok_or_else(|| {
            RpcError::InvalidResponse(format!("{}: not an unsigned integer: {}", method, value))
                .into()
        })
    }
}

// Nodes report quantities either as JSON numbers or as hex/decimal strings.
fn u64_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            if let Some(hex) = s.strip_prefix("0x") {
                u64::from_str_radix(hex, 16).ok()
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    }
}

#[async_trait]
impl ChainRpc for HttpChainRpc {
    async fn get_balance(&self, address: &PlatformAddress) -> AppResult<u64> {
        self.call_u64("chain_getBalance", serde_json::json!([address]))
            .await
    }

    async fn get_seq(&self, address: &PlatformAddress) -> AppResult<u64> {
        self.call_u64("chain_getSeq", serde_json::json!([address]))
            .await
    }

    async fn get_asset_scheme_by_type(
        &self,
        asset_type: &AssetType,
        shard_id: u16,
    ) -> AppResult<Option<AssetScheme>> {
        self.call(
            "chain_getAssetSchemeByType",
            serde_json::json!([asset_type, shard_id]),
        )
        .await
    }

    async fn send_signed_transaction(&self, tx: &SignedTransaction) -> AppResult<TxHash> {
        self.call("mempool_sendSignedTransaction", serde_json::json!([tx]))
            .await
    }

    async fn contains_transaction(&self, hash: &TxHash) -> AppResult<bool> {
        self.call("chain_containsTransaction", serde_json::json!([hash]))
            .await
    }

    async fn get_transaction(&self, hash: &TxHash) -> AppResult<Option<TransactionRecord>> {
        self.call("chain_getTransaction", serde_json::json!([hash]))
            .await
    }

    async fn get_block(&self, number: u64) -> AppResult<Option<Block>> {
        self.call("chain_getBlockByNumber", serde_json::json!([number]))
            .await
    }

    async fn get_best_block_number(&self) -> AppResult<u64> {
        self.call_u64("chain_getBestBlockNumber", serde_json::json!([]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_parse_from_number_and_string_forms() {
        assert_eq!(u64_from_value(&serde_json::json!(42)), Some(42));
        assert_eq!(u64_from_value(&serde_json::json!("42")), Some(42));
        assert_eq!(u64_from_value(&serde_json::json!("0x2a")), Some(42));
        assert_eq!(u64_from_value(&serde_json::json!(-1)), None);
        assert_eq!(u64_from_value(&serde_json::json!(null)), None);
    }
}
