use minechain_core::Hash;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

pub mod keys;

pub const TX_OUT_BYTE_SIZE: usize = 40;
pub const TX_IN_BYTE_SIZE: usize = 40;

/// An output locking an amount to a destination address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub address: Hash,
    pub amount: u64,
}

impl TxOut {
    /// Fixed layout `[32B address][8B amount LE]`.
    pub fn to_bytes(&self) -> [u8; TX_OUT_BYTE_SIZE] {
        let mut ba = [0u8; TX_OUT_BYTE_SIZE];
        ba[..32].copy_from_slice(&self.address);
        ba[32..].copy_from_slice(&self.amount.to_le_bytes());
        ba
    }
}

/// An input unlocking a previously created output. The signature travels
/// with the input but is not part of its fixed encoding, so it never feeds
/// the transaction id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub tx_out_id: Hash,
    pub tx_out_index: u64,
    pub signature: Vec<u8>,
}

impl TxIn {
    /// Fixed layout `[32B tx_out_id][8B tx_out_index LE]`.
    pub fn to_bytes(&self) -> [u8; TX_IN_BYTE_SIZE] {
        let mut ba = [0u8; TX_IN_BYTE_SIZE];
        ba[..32].copy_from_slice(&self.tx_out_id);
        ba[32..].copy_from_slice(&self.tx_out_index.to_le_bytes());
        ba
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Hash,
    pub tx_ins: Vec<TxIn>,
    pub tx_outs: Vec<TxOut>,
}

impl Transaction {
    pub fn new(tx_ins: Vec<TxIn>, tx_outs: Vec<TxOut>) -> Self {
        let mut tx = Self {
            id: [0u8; 32],
            tx_ins,
            tx_outs,
        };
        tx.id = calculate_transaction_id(&tx);
        tx
    }
}

/// Unspent-output record a lookup index would key on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentTxOut {
    pub tx_out_id: Hash,
    pub tx_out_index: u64,
    pub address: Hash,
    pub amount: u64,
}

/// Digest over every input encoding in list order, then every output
/// encoding in list order. Reordering either list changes the id.
pub fn calculate_transaction_id(tx: &Transaction) -> Hash {
    let mut bytes =
        Vec::with_capacity(TX_IN_BYTE_SIZE * tx.tx_ins.len() + TX_OUT_BYTE_SIZE * tx.tx_outs.len());
    for tx_in in &tx.tx_ins {
        bytes.extend_from_slice(&tx_in.to_bytes());
    }
    for tx_out in &tx.tx_outs {
        bytes.extend_from_slice(&tx_out.to_bytes());
    }
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

pub fn is_valid_transaction(tx: &Transaction) -> bool {
    if calculate_transaction_id(tx) != tx.id {
        warn!("transaction id does not match its recomputed value");
        return false;
    }
    true
}
