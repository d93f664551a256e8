// In-memory mirror of remote ledger state
//
// Holds, per account: platform balance, next transaction sequence, owned
// UTXOs; plus the registry of asset schemes seen so far. Rebuilt from the
// remote node and indexer on every process start (see recovery) - nothing
// here is persisted.

use std::collections::HashMap;

use crate::error::{AppResult, StateError};
use crate::ledger::models::{AccountId, AssetScheme, AssetType, PlatformAddress, Utxo};

/// Local ledger state store.
///
/// Exclusively owned by the single logical process; all remote I/O suspends
/// without touching it, so no interior locking is needed.
#[derive(Debug, Default)]
pub struct StateStore {
    balances: HashMap<PlatformAddress, u64>,
    seqs: HashMap<PlatformAddress, u64>,
    utxos: HashMap<AccountId, Vec<Utxo>>,
    asset_schemes: HashMap<AssetType, AssetScheme>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of an account, zero if never recorded. Never fails.
    pub fn balance(&self, address: &PlatformAddress) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn set_balance(&mut self, address: &PlatformAddress, value: u64) {
        self.balances.insert(address.clone(), value);
    }

    /// Read-modify-write in one step. Returns the balance that was current
    /// before the call.
    pub fn modify_balance<F>(&mut self, address: &PlatformAddress, f: F) -> u64
    where
        F: FnOnce(u64) -> u64,
    {
        let existing = self.balance(address);
        self.set_balance(address, f(existing));
        existing
    }

    /// Next valid sequence for an account. Errors if recovery has not
    /// recorded one - guessing a sequence would collide on the node.
    pub fn seq(&self, address: &PlatformAddress) -> AppResult<u64> {
        self.seqs
            .get(address)
            .copied()
            .ok_or_else(|| StateError::SequenceUnknown(address.clone()).into())
    }

    /// Returns the current sequence and advances the stored counter by one.
    ///
    /// Allocation is strictly increasing and gap-free for the lifetime of
    /// this process. Not safe across processes - one writer per account.
    pub fn next_seq(&mut self, address: &PlatformAddress) -> AppResult<u64> {
        match self.seqs.get_mut(address) {
            Some(seq) => {
                let current = *seq;
                *seq += 1;
                Ok(current)
            }
            None => Err(StateError::SequenceUnknown(address.clone()).into()),
        }
    }

    pub(crate) fn set_seq(&mut self, address: &PlatformAddress, seq: u64) {
        self.seqs.insert(address.clone(), seq);
    }

    /// UTXOs of an account for mutation. Initializes an empty set for
    /// unknown accounts, so pushes are visible on the next call.
    pub fn utxos_mut(&mut self, account: &AccountId) -> &mut Vec<Utxo> {
        self.utxos.entry(*account).or_default()
    }

    /// Read-only view of an account's UTXOs, empty if never recorded.
    pub fn utxos(&self, account: &AccountId) -> &[Utxo] {
        self.utxos.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_asset_scheme(&self, asset_type: &AssetType) -> bool {
        self.asset_schemes.contains_key(asset_type)
    }

    pub fn asset_scheme(&self, asset_type: &AssetType) -> AppResult<&AssetScheme> {
        self.asset_schemes
            .get(asset_type)
            .ok_or_else(|| StateError::AssetSchemeMissing(*asset_type).into())
    }

    /// Registers an asset scheme. One-time write: a second call for the same
    /// asset type is a programming error and leaves the first value intact.
    pub fn set_asset_scheme(&mut self, asset_type: AssetType, scheme: AssetScheme) -> AppResult<()> {
        if self.asset_schemes.contains_key(&asset_type) {
            return Err(StateError::AssetSchemeExists(asset_type).into());
        }
        self.asset_schemes.insert(asset_type, scheme);
        Ok(())
    }

    /// All registered (asset type, scheme) pairs, order unspecified.
    pub fn all_asset_schemes(&self) -> impl Iterator<Item = (&AssetType, &AssetScheme)> {
        self.asset_schemes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::ledger::models::H160;

    fn addr(s: &str) -> PlatformAddress {
        PlatformAddress::new(s)
    }

    fn scheme(metadata: &str) -> AssetScheme {
        AssetScheme {
            shard_id: 0,
            metadata: metadata.to_string(),
            supply: 100,
            registrar: None,
        }
    }

    #[test]
    fn unknown_accounts_default_to_zero_and_empty() {
        let mut store = StateStore::new();
        assert_eq!(store.balance(&addr("ccc1")), 0);
        assert!(store.utxos(&H160([1; 20])).is_empty());
        assert!(store.utxos_mut(&H160([1; 20])).is_empty());
    }

    #[test]
    fn modify_balance_returns_previous_value() {
        let mut store = StateStore::new();
        store.set_balance(&addr("ccc1"), 50);

        let previous = store.modify_balance(&addr("ccc1"), |b| b + 25);
        assert_eq!(previous, 50);
        assert_eq!(store.balance(&addr("ccc1")), 75);
    }

    #[test]
    fn next_seq_is_gap_free() {
        let mut store = StateStore::new();
        store.set_seq(&addr("ccc1"), 7);

        for expected in 7..12 {
            assert_eq!(store.next_seq(&addr("ccc1")).unwrap(), expected);
        }
        assert_eq!(store.seq(&addr("ccc1")).unwrap(), 12);
    }

    #[test]
    fn seq_of_unrecovered_account_fails() {
        let mut store = StateStore::new();
        assert!(matches!(
            store.next_seq(&addr("ccc1")),
            Err(AppError::State(StateError::SequenceUnknown(_)))
        ));
        assert!(store.seq(&addr("ccc1")).is_err());
    }

    #[test]
    fn asset_scheme_is_write_once() {
        let mut store = StateStore::new();
        let asset_type = H160([9; 20]);

        store.set_asset_scheme(asset_type, scheme("first")).unwrap();
        let err = store.set_asset_scheme(asset_type, scheme("second"));
        assert!(matches!(
            err,
            Err(AppError::State(StateError::AssetSchemeExists(_)))
        ));

        // the first registration survives
        assert_eq!(store.asset_scheme(&asset_type).unwrap().metadata, "first");
        assert_eq!(store.all_asset_schemes().count(), 1);
    }

    #[test]
    fn utxo_pushes_are_visible() {
        let mut store = StateStore::new();
        let account = H160([2; 20]);
        let asset = crate::ledger::models::Asset {
            asset_type: H160([3; 20]),
            shard_id: 0,
            lock_script_hash: crate::ledger::models::P2PKH_LOCK_SCRIPT_HASH,
            parameters: vec![],
            quantity: 10,
            order_hash: None,
            tracker: crate::ledger::models::H256([4; 32]),
            output_index: 0,
        };

        store.utxos_mut(&account).push(Utxo {
            owner: account,
            asset,
        });
        assert_eq!(store.utxos(&account).len(), 1);
    }
}
