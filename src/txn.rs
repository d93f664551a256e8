// Transaction construction and signing
//
// Unsigned transaction forms (payment, asset mint, asset transfer), the
// canonical asset-type derivation for mints, and the local single-key signer.

use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};
use crate::ledger::models::{
    AccountId, Asset, AssetScheme, AssetType, PlatformAddress, TxHash, H160, H256,
    P2PKH_LOCK_SCRIPT_HASH,
};

/// An unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Transaction {
    #[serde(rename_all = "camelCase")]
    Pay {
        recipient: PlatformAddress,
        quantity: u64,
    },
    #[serde(rename_all = "camelCase")]
    MintAsset {
        network_id: String,
        shard_id: u16,
        metadata: String,
        supply: u64,
        registrar: Option<PlatformAddress>,
        recipient: AccountId,
    },
    #[serde(rename_all = "camelCase")]
    TransferAsset {
        network_id: String,
        inputs: Vec<Asset>,
        outputs: Vec<TransferOutput>,
    },
}

/// One output of an asset transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutput {
    pub recipient: AccountId,
    pub quantity: u64,
    pub asset_type: AssetType,
    pub shard_id: u16,
}

impl Transaction {
    pub fn pay(recipient: PlatformAddress, quantity: u64) -> Self {
        Transaction::Pay {
            recipient,
            quantity,
        }
    }

    pub fn mint_asset(network_id: &str, scheme: &AssetScheme, recipient: AccountId) -> Self {
        Transaction::MintAsset {
            network_id: network_id.to_string(),
            shard_id: scheme.shard_id,
            metadata: scheme.metadata.clone(),
            supply: scheme.supply,
            registrar: scheme.registrar.clone(),
            recipient,
        }
    }

    pub fn transfer_asset(
        network_id: &str,
        inputs: Vec<Asset>,
        outputs: Vec<TransferOutput>,
    ) -> Self {
        Transaction::TransferAsset {
            network_id: network_id.to_string(),
            inputs,
            outputs,
        }
    }

    /// Canonical asset type of a mint, None for other transaction kinds.
    pub fn minted_asset_type(&self) -> Option<AssetType> {
        match self {
            Transaction::MintAsset {
                network_id,
                shard_id,
                metadata,
                supply,
                registrar,
                ..
            } => Some(derive_asset_type(
                network_id,
                *shard_id,
                metadata,
                *supply,
                registrar.as_ref(),
            )),
            _ => None,
        }
    }

    /// The asset a mint transaction creates, as it will appear in output 0.
    pub fn minted_asset(&self) -> Option<Asset> {
        match self {
            Transaction::MintAsset {
                shard_id, supply, ..
            } => Some(Asset {
                asset_type: self.minted_asset_type()?,
                shard_id: *shard_id,
                lock_script_hash: P2PKH_LOCK_SCRIPT_HASH,
                parameters: vec![],
                quantity: *supply,
                order_hash: None,
                tracker: self.tracker(),
                output_index: 0,
            }),
            _ => None,
        }
    }

    /// Digest identifying this transaction's asset effects, stable across
    /// re-signing.
    pub fn tracker(&self) -> H256 {
        let bytes = serde_json::to_vec(self).expect("serialize transaction");
        let digest = Sha256::digest(&bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        H256(out)
    }
}

/// Canonical asset-type identifier of a scheme. Every party deriving the
/// type for the same scheme parameters must arrive at the same value.
pub fn asset_type_of(network_id: &str, scheme: &AssetScheme) -> AssetType {
    derive_asset_type(
        network_id,
        scheme.shard_id,
        &scheme.metadata,
        scheme.supply,
        scheme.registrar.as_ref(),
    )
}

fn derive_asset_type(
    network_id: &str,
    shard_id: u16,
    metadata: &str,
    supply: u64,
    registrar: Option<&PlatformAddress>,
) -> AssetType {
    let mut hasher = Sha256::new();
    hasher.update(network_id.as_bytes());
    hasher.update(shard_id.to_be_bytes());
    hasher.update(metadata.as_bytes());
    hasher.update(supply.to_be_bytes());
    if let Some(registrar) = registrar {
        hasher.update(registrar.as_str().as_bytes());
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[..20]);
    H160(out)
}

/// Outputs that split an asset into `count` single-quantity pieces for one
/// recipient.
pub fn split_outputs(asset: &Asset, recipient: AccountId, count: u64) -> Vec<TransferOutput> {
    (0..count)
        .map(|_| TransferOutput {
            recipient,
            quantity: 1,
            asset_type: asset.asset_type,
            shard_id: asset.shard_id,
        })
        .collect()
}

/// A transaction envelope ready for submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub tx: Transaction,
    pub signer: PlatformAddress,
    pub fee: u64,
    pub seq: u64,
    pub signature: String,
}

impl SignedTransaction {
    pub fn hash(&self) -> TxHash {
        let bytes = serde_json::to_vec(self).expect("serialize transaction");
        let digest = Sha256::digest(&bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        H256(out)
    }
}

/// Produces signed transactions for one signing account
pub trait TxSigner: Send + Sync {
    fn address(&self) -> &PlatformAddress;

    fn sign(&self, tx: Transaction, fee: u64, seq: u64) -> AppResult<SignedTransaction>;
}

/// Single-key in-process signer
pub struct LocalKeySigner {
    address: PlatformAddress,
    key: SigningKey,
}

impl LocalKeySigner {
    pub fn new(address: PlatformAddress, key: SigningKey) -> Self {
        Self { address, key }
    }

    pub fn from_hex(address: PlatformAddress, secret_hex: &str) -> AppResult<Self> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|e| AppError::Config(format!("invalid signer secret: {}", e)))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AppError::Config("signer secret must be 32 bytes".to_string()))?;
        Ok(Self::new(address, SigningKey::from_bytes(&key)))
    }

    /// Key hash used when this signer's key owns asset outputs.
    pub fn account_id(&self) -> AccountId {
        let digest = Sha256::digest(self.key.verifying_key().as_bytes());
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[..20]);
        H160(out)
    }
}

impl TxSigner for LocalKeySigner {
    fn address(&self) -> &PlatformAddress {
        &self.address
    }

    fn sign(&self, tx: Transaction, fee: u64, seq: u64) -> AppResult<SignedTransaction> {
        let payload = serde_json::to_vec(&(&tx, &self.address, fee, seq))?;
        let signature = self.key.sign(&payload);
        Ok(SignedTransaction {
            tx,
            signer: self.address.clone(),
            fee,
            seq,
            signature: hex::encode(signature.to_bytes()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::models::LockScript;

    fn scheme(metadata: &str) -> AssetScheme {
        AssetScheme {
            shard_id: 0,
            metadata: metadata.to_string(),
            supply: 100,
            registrar: Some(PlatformAddress::new("cccregulator")),
        }
    }

    #[test]
    fn asset_type_is_deterministic_per_scheme() {
        let a = asset_type_of("tc", &scheme("gold"));
        let b = asset_type_of("tc", &scheme("gold"));
        let c = asset_type_of("tc", &scheme("silver"));
        let d = asset_type_of("wc", &scheme("gold"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn mint_derivation_matches_scheme_derivation() {
        let scheme = scheme("gold");
        let mint = Transaction::mint_asset("tc", &scheme, H160([1; 20]));
        assert_eq!(mint.minted_asset_type(), Some(asset_type_of("tc", &scheme)));
    }

    #[test]
    fn minted_asset_carries_supply_under_single_key_lock() {
        let mint = Transaction::mint_asset("tc", &scheme("gold"), H160([1; 20]));
        let asset = mint.minted_asset().unwrap();

        assert_eq!(asset.quantity, 100);
        assert_eq!(asset.lock_script(), Some(LockScript::P2pkh));
        assert_eq!(asset.output_index, 0);
    }

    #[test]
    fn split_outputs_cover_the_supply() {
        let mint = Transaction::mint_asset("tc", &scheme("gold"), H160([1; 20]));
        let asset = mint.minted_asset().unwrap();
        let outputs = split_outputs(&asset, H160([1; 20]), 100);

        assert_eq!(outputs.len(), 100);
        assert!(outputs.iter().all(|o| o.quantity == 1));
        assert_eq!(
            outputs.iter().map(|o| o.quantity).sum::<u64>(),
            asset.quantity
        );
    }

    #[test]
    fn signing_stamps_fee_and_seq() {
        let signer = LocalKeySigner::new(
            PlatformAddress::new("cccpayer"),
            SigningKey::from_bytes(&[7u8; 32]),
        );
        let signed = signer
            .sign(Transaction::pay(PlatformAddress::new("cccx"), 5), 10, 42)
            .unwrap();

        assert_eq!(signed.fee, 10);
        assert_eq!(signed.seq, 42);
        assert_eq!(signed.signer, PlatformAddress::new("cccpayer"));
        // same envelope hashes the same, different seq does not
        let again = signer
            .sign(Transaction::pay(PlatformAddress::new("cccx"), 5), 10, 42)
            .unwrap();
        let other = signer
            .sign(Transaction::pay(PlatformAddress::new("cccx"), 5), 10, 43)
            .unwrap();
        assert_eq!(signed.hash(), again.hash());
        assert_ne!(signed.hash(), other.hash());
    }
}
