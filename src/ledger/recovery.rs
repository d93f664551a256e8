// State recovery - rebuilds the local mirror from authoritative remotes
//
// One bulk population pass per invocation:
// 1. Look up candidate asset schemes on the node (skip ones never minted)
// 2. Fetch balance + sequence per platform account, concurrently
// 3. Walk the paginated index for every account / asset type pair
// 4. Validate each UTXO's lock script against the recognized predicates
//
// Any unrecognized lock script or failed remote fetch aborts the whole pass;
// there is no partial or degraded recovery.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future;
use tracing::{error, info};

use crate::error::{AppResult, StateError};
use crate::indexer::{fetch_all_utxos, UtxoIndexer};
use crate::ledger::models::{
    AccountId, AssetScheme, AssetType, LockScript, PlatformAddress, Utxo,
};
use crate::ledger::store::StateStore;
use crate::rpc::ChainRpc;
use crate::txn;

#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub network_id: String,
    /// Registrar identity used to classify asset types in the summary
    pub regulator: PlatformAddress,
    pub regulator_alt: Option<PlatformAddress>,
}

pub struct StateRecovery {
    rpc: Arc<dyn ChainRpc>,
    indexer: Arc<dyn UtxoIndexer>,
    config: RecoveryConfig,
}

impl StateRecovery {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        indexer: Arc<dyn UtxoIndexer>,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            rpc,
            indexer,
            config,
        }
    }

    pub async fn recover(
        &self,
        state: &mut StateStore,
        addresses: &[PlatformAddress],
        accounts: &[AccountId],
        asset_schemes: &[AssetScheme],
    ) -> AppResult<()> {
        info!("state recovery");

        // Asset schemes: derive each candidate's canonical type and ask the
        // node what is actually registered there. Nothing registered means
        // the scheme was never minted - not an error.
        for scheme in asset_schemes {
            let asset_type = txn::asset_type_of(&self.config.network_id, scheme);
            let current = self
                .rpc
                .get_asset_scheme_by_type(&asset_type, scheme.shard_id)
                .await?;
            let current = match current {
                Some(current) => current,
                None => continue,
            };
            info!(
                "asset scheme {}: supply {}, registrar {:?}",
                asset_type, current.supply, current.registrar
            );
            state.set_asset_scheme(asset_type, current)?;
        }

        // Balances and sequences, fetched concurrently across accounts. The
        // (balance, seq) pair of one account is applied only after both
        // queries returned.
        let fetches = addresses.iter().map(|address| {
            let rpc = Arc::clone(&self.rpc);
            async move { future::try_join(rpc.get_balance(address), rpc.get_seq(address)).await }
        });
        let pairs = future::try_join_all(fetches).await?;

        for (address, (balance, seq)) in addresses.iter().zip(pairs) {
            state.modify_balance(address, |_| balance);
            info!("balance {}: {}", address, balance);

            state.set_seq(address, seq);
            info!("seq {}: {}", address, seq);
        }

        // UTXOs per account and known asset type, through the paginated
        // index. Sequential within one pair: the next page request depends
        // on the previous page being non-empty.
        let asset_types: Vec<AssetType> =
            state.all_asset_schemes().map(|(ty, _)| *ty).collect();
        for account in accounts {
            state.utxos_mut(account).clear();
            for asset_type in &asset_types {
                let records =
                    fetch_all_utxos(self.indexer.as_ref(), &account.to_hex(), asset_type).await?;
                for record in records {
                    let asset = record.into_asset()?;
                    if asset.lock_script().is_none() {
                        error!(
                            "unrecognizable lock script hash {} (recognized: {}, {})",
                            asset.lock_script_hash,
                            LockScript::P2pkh.hash(),
                            LockScript::P2pkhBurn.hash(),
                        );
                        return Err(StateError::UnrecognizedLockScript {
                            owner: *account,
                            asset_type: *asset_type,
                            lock_script_hash: asset.lock_script_hash,
                        }
                        .into());
                    }
                    state.utxos_mut(account).push(Utxo {
                        owner: *account,
                        asset,
                    });
                }
            }
            self.report_utxos(state, &[*account]);
        }

        Ok(())
    }

    /// Human-readable holdings summary. Observability only - nothing reads
    /// this back.
    pub fn report_utxos(&self, state: &StateStore, accounts: &[AccountId]) {
        let mut regulators = vec![&self.config.regulator];
        if let Some(alt) = &self.config.regulator_alt {
            regulators.push(alt);
        }
        for regulator in regulators {
            let owned: Vec<&AssetType> = state
                .all_asset_schemes()
                .filter(|(_, scheme)| scheme.registrar.as_ref() == Some(regulator))
                .map(|(ty, _)| ty)
                .collect();
            if !owned.is_empty() {
                info!("registrar: {}", regulator);
                for asset_type in owned {
                    info!("  owns: {}", asset_type);
                }
            }
        }

        for account in accounts {
            let utxos = state.utxos(account);
            if utxos.is_empty() {
                continue;
            }
            // lexical order of asset types, quantities descending per bin
            let asset_types: BTreeSet<AssetType> =
                utxos.iter().map(|u| u.asset.asset_type).collect();

            info!("utxo for {}", account);
            for asset_type in &asset_types {
                let plain = quantities(utxos, asset_type, LockScript::P2pkh);
                let burns = quantities(utxos, asset_type, LockScript::P2pkhBurn);
                info!("  utxo {}: [{}], burns: [{}]", asset_type, plain, burns);
            }
        }
    }
}

fn quantities(utxos: &[Utxo], asset_type: &AssetType, lock: LockScript) -> String {
    let mut amounts: Vec<u64> = utxos
        .iter()
        .filter(|u| u.asset.asset_type == *asset_type && u.asset.lock_script() == Some(lock))
        .map(|u| u.asset.quantity)
        .collect();
    amounts.sort_unstable_by(|a, b| b.cmp(a));
    amounts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::indexer::UtxoRecord;
    use crate::ledger::models::{TxHash, H160, H256, P2PKH_LOCK_SCRIPT_HASH};
    use crate::rpc::{Block, TransactionRecord};
    use crate::txn::SignedTransaction;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    struct MockRpc {
        balances: HashMap<PlatformAddress, u64>,
        seqs: HashMap<PlatformAddress, u64>,
        schemes: HashMap<AssetType, AssetScheme>,
    }

    #[async_trait]
    impl ChainRpc for MockRpc {
        async fn get_balance(&self, address: &PlatformAddress) -> AppResult<u64> {
            Ok(self.balances[address])
        }

        async fn get_seq(&self, address: &PlatformAddress) -> AppResult<u64> {
            Ok(self.seqs[address])
        }

        async fn get_asset_scheme_by_type(
            &self,
            asset_type: &AssetType,
            _shard_id: u16,
        ) -> AppResult<Option<AssetScheme>> {
            Ok(self.schemes.get(asset_type).cloned())
        }

        async fn send_signed_transaction(&self, _tx: &SignedTransaction) -> AppResult<TxHash> {
            unreachable!()
        }

        async fn contains_transaction(&self, _hash: &TxHash) -> AppResult<bool> {
            unreachable!()
        }

        async fn get_transaction(
            &self,
            _hash: &TxHash,
        ) -> AppResult<Option<TransactionRecord>> {
            unreachable!()
        }

        async fn get_block(&self, _number: u64) -> AppResult<Option<Block>> {
            unreachable!()
        }

        async fn get_best_block_number(&self) -> AppResult<u64> {
            unreachable!()
        }
    }

    struct PagedIndexer {
        pages: Vec<Vec<UtxoRecord>>,
        requests: Mutex<u32>,
    }

    #[async_trait]
    impl UtxoIndexer for PagedIndexer {
        async fn utxo_page(
            &self,
            _address: &str,
            _asset_type: &AssetType,
            page: u32,
        ) -> AppResult<Vec<UtxoRecord>> {
            *self.requests.lock() += 1;
            Ok(self
                .pages
                .get((page - 1) as usize)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn test_scheme() -> AssetScheme {
        AssetScheme {
            shard_id: 0,
            metadata: "gold".to_string(),
            supply: 100,
            registrar: Some(PlatformAddress::new("cccregulator")),
        }
    }

    fn record(asset_type: AssetType, quantity: &str, lock_script_hash: H160) -> UtxoRecord {
        UtxoRecord {
            id: None,
            address: "owner".to_string(),
            asset_type,
            shard_id: 0,
            lock_script_hash,
            parameters: vec![],
            quantity: quantity.to_string(),
            order_hash: None,
            transaction_hash: H256([2; 32]),
            transaction_tracker: H256([3; 32]),
            transaction_output_index: 0,
        }
    }

    fn recovery(rpc: MockRpc, indexer: Arc<PagedIndexer>) -> StateRecovery {
        StateRecovery::new(
            Arc::new(rpc),
            indexer,
            RecoveryConfig {
                network_id: "tc".to_string(),
                regulator: PlatformAddress::new("cccregulator"),
                regulator_alt: None,
            },
        )
    }

    #[tokio::test]
    async fn recovers_balances_seqs_schemes_and_utxos() {
        let scheme = test_scheme();
        let asset_type = txn::asset_type_of("tc", &scheme);
        let address = PlatformAddress::new("cccpayer");
        let account = H160([5; 20]);

        let rpc = MockRpc {
            balances: HashMap::from([(address.clone(), 1000)]),
            seqs: HashMap::from([(address.clone(), 7)]),
            schemes: HashMap::from([(asset_type, scheme.clone())]),
        };
        let indexer = Arc::new(PagedIndexer {
            pages: vec![
                vec![
                    record(asset_type, "60", P2PKH_LOCK_SCRIPT_HASH),
                    record(asset_type, "30", P2PKH_LOCK_SCRIPT_HASH),
                ],
                vec![record(asset_type, "10", P2PKH_LOCK_SCRIPT_HASH)],
                vec![],
            ],
            requests: Mutex::new(0),
        });

        let recovery = recovery(rpc, indexer);
        let mut state = StateStore::new();
        recovery
            .recover(&mut state, &[address.clone()], &[account], &[scheme])
            .await
            .unwrap();

        assert_eq!(state.balance(&address), 1000);
        assert_eq!(state.seq(&address).unwrap(), 7);
        assert!(state.has_asset_scheme(&asset_type));
        assert_eq!(state.utxos(&account).len(), 3);
    }

    #[tokio::test]
    async fn unminted_schemes_are_skipped_silently() {
        let rpc = MockRpc {
            balances: HashMap::new(),
            seqs: HashMap::new(),
            schemes: HashMap::new(),
        };
        let indexer = Arc::new(PagedIndexer {
            pages: vec![],
            requests: Mutex::new(0),
        });

        let recovery = recovery(rpc, Arc::clone(&indexer));
        let mut state = StateStore::new();
        recovery
            .recover(&mut state, &[], &[H160([5; 20])], &[test_scheme()])
            .await
            .unwrap();

        assert_eq!(state.all_asset_schemes().count(), 0);
        // no known asset types, so the index was never queried
        assert_eq!(*indexer.requests.lock(), 0);
    }

    #[tokio::test]
    async fn unrecognized_lock_script_aborts_recovery() {
        let scheme = test_scheme();
        let asset_type = txn::asset_type_of("tc", &scheme);

        let rpc = MockRpc {
            balances: HashMap::new(),
            seqs: HashMap::new(),
            schemes: HashMap::from([(asset_type, scheme.clone())]),
        };
        let indexer = Arc::new(PagedIndexer {
            pages: vec![vec![record(asset_type, "10", H160([0xab; 20]))]],
            requests: Mutex::new(0),
        });

        let recovery = recovery(rpc, indexer);
        let mut state = StateStore::new();
        let err = recovery
            .recover(&mut state, &[], &[H160([5; 20])], &[scheme])
            .await;

        assert!(matches!(
            err,
            Err(AppError::State(StateError::UnrecognizedLockScript { .. }))
        ));
    }
}
