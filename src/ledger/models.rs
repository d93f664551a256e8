use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 160-bit value - account key hashes, asset types, lock script hashes.
/// Canonical encoding is lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct H160(pub [u8; 20]);

impl H160 {
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut out = [0u8; 20];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut out)?;
        Ok(Self(out))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for H160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for H160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H160({})", self.to_hex())
    }
}

impl FromStr for H160 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for H160 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for H160 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// 256-bit value - transaction hashes, trackers, block hashes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct H256(pub [u8; 32]);

impl H256 {
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut out)?;
        Ok(Self(out))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H256({})", self.to_hex())
    }
}

impl FromStr for H256 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for H256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for H256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Key hash of an asset-owning account
pub type AccountId = H160;

/// Canonical identifier of an asset type
pub type AssetType = H160;

/// Hash of a signed transaction
pub type TxHash = H256;

/// Platform-level account address. Opaque, value equality, used as a map
/// key via its canonical string form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformAddress(String);

impl PlatformAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PlatformAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlatformAddress({})", self.0)
    }
}

// ============ LOCK SCRIPTS ============

/// Lock script hash of single-key ownership outputs
pub const P2PKH_LOCK_SCRIPT_HASH: H160 = H160([
    0x5f, 0x59, 0x60, 0xa7, 0xbc, 0xa6, 0xce, 0xee, 0xb0, 0xc9, 0x7b, 0xc7, 0x17, 0x56, 0x29,
    0x14, 0xe7, 0xa1, 0xde, 0x04,
]);

/// Lock script hash of burn-locked single-key ownership outputs
pub const P2PKH_BURN_LOCK_SCRIPT_HASH: H160 = H160([
    0x37, 0x57, 0x2b, 0xdc, 0xc2, 0x2d, 0x39, 0xa5, 0x9c, 0x0d, 0x12, 0xd3, 0x01, 0xf6, 0x27,
    0x1b, 0xa3, 0xfd, 0xd4, 0x51,
]);

/// The recognized ownership predicates. Every UTXO accepted into the local
/// mirror must be locked by one of these; anything else means the remote data
/// cannot be spent by a key we understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScript {
    P2pkh,
    P2pkhBurn,
}

impl LockScript {
    pub fn from_hash(hash: &H160) -> Option<Self> {
        if *hash == P2PKH_LOCK_SCRIPT_HASH {
            Some(LockScript::P2pkh)
        } else if *hash == P2PKH_BURN_LOCK_SCRIPT_HASH {
            Some(LockScript::P2pkhBurn)
        } else {
            None
        }
    }

    pub fn hash(&self) -> H160 {
        match self {
            LockScript::P2pkh => P2PKH_LOCK_SCRIPT_HASH,
            LockScript::P2pkhBurn => P2PKH_BURN_LOCK_SCRIPT_HASH,
        }
    }
}

// ============ ASSETS ============

/// Immutable definition of an asset type, registered once at mint time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetScheme {
    pub shard_id: u16,
    pub metadata: String,
    pub supply: u64,
    pub registrar: Option<PlatformAddress>,
}

/// An asset instance as it sits in an unspent output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub asset_type: AssetType,
    pub shard_id: u16,
    pub lock_script_hash: H160,
    pub parameters: Vec<String>,
    pub quantity: u64,
    pub order_hash: Option<H256>,
    /// Tracker of the transaction that created this output
    pub tracker: H256,
    pub output_index: u64,
}

impl Asset {
    pub fn lock_script(&self) -> Option<LockScript> {
        LockScript::from_hash(&self.lock_script_hash)
    }
}

/// An unspent output together with the account that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub owner: AccountId,
    pub asset: Asset,
}
