use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::utxo::OutPoint;
use super::COINBASE_AMOUNT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxIn {
    /// Id of the transaction whose output is being spent.
    pub tx_out_id: String,
    pub tx_out_index: u64,
    /// Hex-encoded DER ECDSA signature over the spending transaction's id.
    pub signature: String,
}

impl TxIn {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            tx_out_id: self.tx_out_id.clone(),
            tx_out_index: self.tx_out_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub address: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub tx_ins: Vec<TxIn>,
    pub tx_outs: Vec<TxOut>,
    /// Content hash, see [`Transaction::compute_id`].
    pub id: String,
}

impl Transaction {
    /// Build a transaction and compute its id from its content.
    /// Signatures are not part of the id, so inputs may be signed afterwards.
    pub fn new(tx_ins: Vec<TxIn>, tx_outs: Vec<TxOut>) -> Self {
        let mut tx = Self {
            tx_ins,
            tx_outs,
            id: String::new(),
        };
        tx.id = tx.compute_id();
        tx
    }

    /// The reward transaction that opens every mined block. Its single input
    /// carries the block index so that coinbases of different blocks never
    /// share an id.
    pub fn coinbase(address: &str, block_index: u64) -> Self {
        Self::new(
            vec![TxIn {
                tx_out_id: String::new(),
                tx_out_index: block_index,
                signature: String::new(),
            }],
            vec![TxOut {
                address: address.to_string(),
                amount: COINBASE_AMOUNT,
            }],
        )
    }

    /// SHA-256 over `txOutId || txOutIndex` of every input followed by
    /// `address || amount` of every output.
    pub fn compute_id(&self) -> String {
        let mut hasher = Sha256::new();
        for tx_in in &self.tx_ins {
            hasher.update(tx_in.tx_out_id.as_bytes());
            hasher.update(tx_in.tx_out_index.to_string().as_bytes());
        }
        for tx_out in &self.tx_outs {
            hasher.update(tx_out.address.as_bytes());
            hasher.update(tx_out.amount.to_string().as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    pub fn total_output_amount(&self) -> u128 {
        self.tx_outs.iter().map(|o| o.amount as u128).sum()
    }

    /// Outputs this transaction consumes.
    pub fn outpoints(&self) -> impl Iterator<Item = OutPoint> + '_ {
        self.tx_ins.iter().map(TxIn::outpoint)
    }

    /// The 32-byte digest every input signs.
    pub fn sighash(&self) -> Option<[u8; 32]> {
        let bytes = hex::decode(&self.id).ok()?;
        bytes.try_into().ok()
    }
}
