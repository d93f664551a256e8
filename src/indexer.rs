// Paginated UTXO index client
//
// The external index serves UTXO records page by page (1-indexed); an empty
// page terminates the listing. Pagination within one address/asset-type query
// is strictly sequential - each request is only issued once the previous page
// came back non-empty.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppResult, IndexerError};
use crate::ledger::models::{Asset, AssetType, TxHash, H160, H256};

/// Raw UTXO record as the index reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub address: String,
    pub asset_type: AssetType,
    pub shard_id: u16,
    pub lock_script_hash: H160,
    pub parameters: Vec<String>,
    pub quantity: String,
    #[serde(default)]
    pub order_hash: Option<H256>,
    pub transaction_hash: TxHash,
    pub transaction_tracker: H256,
    pub transaction_output_index: u64,
}

impl UtxoRecord {
    pub fn into_asset(self) -> Result<Asset, IndexerError> {
        let quantity = self.quantity.parse::<u64>().map_err(|_| {
            IndexerError::InvalidRecord(format!(
                "bad quantity {:?} on output {} of {}",
                self.quantity, self.transaction_output_index, self.transaction_hash
            ))
        })?;
        Ok(Asset {
            asset_type: self.asset_type,
            shard_id: self.shard_id,
            lock_script_hash: self.lock_script_hash,
            parameters: self.parameters,
            quantity,
            order_hash: self.order_hash,
            tracker: self.transaction_tracker,
            output_index: self.transaction_output_index,
        })
    }
}

/// One page of the UTXO listing for an address and asset type
#[async_trait]
pub trait UtxoIndexer: Send + Sync {
    async fn utxo_page(
        &self,
        address: &str,
        asset_type: &AssetType,
        page: u32,
    ) -> AppResult<Vec<UtxoRecord>>;
}

/// Requests pages 1, 2, 3, ... until one comes back empty and returns the
/// concatenation.
pub async fn fetch_all_utxos(
    indexer: &dyn UtxoIndexer,
    address: &str,
    asset_type: &AssetType,
) -> AppResult<Vec<UtxoRecord>> {
    let mut records = Vec::new();
    for page in 1u32.. {
        let result = indexer.utxo_page(address, asset_type, page).await?;
        if result.is_empty() {
            break;
        }
        records.extend(result);
    }
    Ok(records)
}

/// HTTP client for the index API
pub struct HttpUtxoIndexer {
    base_url: String,
    client: reqwest::Client,
}

impl HttpUtxoIndexer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl UtxoIndexer for HttpUtxoIndexer {
    async fn utxo_page(
        &self,
        address: &str,
        asset_type: &AssetType,
        page: u32,
    ) -> AppResult<Vec<UtxoRecord>> {
        let url = format!(
            "{}/api/utxo?address={}&assetType={}&page={}",
            self.base_url, address, asset_type, page
        );
        let records = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(IndexerError::Transport)?
            .json()
            .await
            .map_err(IndexerError::Transport)?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::models::P2PKH_LOCK_SCRIPT_HASH;
    use parking_lot::Mutex;

    fn record(quantity: &str) -> UtxoRecord {
        UtxoRecord {
            id: None,
            address: "owner".to_string(),
            asset_type: H160([1; 20]),
            shard_id: 0,
            lock_script_hash: P2PKH_LOCK_SCRIPT_HASH,
            parameters: vec![],
            quantity: quantity.to_string(),
            order_hash: None,
            transaction_hash: H256([2; 32]),
            transaction_tracker: H256([3; 32]),
            transaction_output_index: 0,
        }
    }

    struct PagedIndexer {
        pages: Vec<Vec<UtxoRecord>>,
        requests: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl UtxoIndexer for PagedIndexer {
        async fn utxo_page(
            &self,
            _address: &str,
            _asset_type: &AssetType,
            page: u32,
        ) -> AppResult<Vec<UtxoRecord>> {
            self.requests.lock().push(page);
            Ok(self
                .pages
                .get((page - 1) as usize)
                .cloned()
                .unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn pagination_stops_at_first_empty_page() {
        let indexer = PagedIndexer {
            pages: vec![
                vec![record("1"), record("2")],
                vec![record("3")],
                vec![],
            ],
            requests: Mutex::new(Vec::new()),
        };

        let records = fetch_all_utxos(&indexer, "owner", &H160([1; 20]))
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(*indexer.requests.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn record_with_garbage_quantity_is_rejected() {
        assert!(record("not-a-number").into_asset().is_err());
        assert_eq!(record("17").into_asset().unwrap().quantity, 17);
    }
}
