use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::model::{Transaction, TxOut};

/// Identifies a specific transaction output by its transaction id and index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutPoint {
    pub tx_out_id: String,
    pub tx_out_index: u64,
}

/// Spendable outputs keyed by (txOutId, txOutIndex).
///
/// Always derived by replaying blocks; the ledger swaps whole sets rather than
/// editing the live one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoSet {
    map: HashMap<OutPoint, TxOut>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(&mut self, outpoint: OutPoint, output: TxOut) {
        self.map.insert(outpoint, output);
    }

    /// Spend (remove) a single outpoint. Returns the removed output if it existed.
    pub fn spend(&mut self, outpoint: &OutPoint) -> Option<TxOut> {
        self.map.remove(outpoint)
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&TxOut> {
        self.map.get(outpoint)
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.map.contains_key(outpoint)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Outputs paying `address`.
    pub fn owned_by<'a>(
        &'a self,
        address: &'a str,
    ) -> impl Iterator<Item = (&'a OutPoint, &'a TxOut)> + 'a {
        self.map.iter().filter(move |(_, out)| out.address == address)
    }

    pub fn add_tx_outputs(&mut self, tx: &Transaction) {
        for (i, out) in tx.tx_outs.iter().enumerate() {
            let op = OutPoint {
                tx_out_id: tx.id.clone(),
                tx_out_index: i as u64,
            };
            self.insert(op, out.clone());
        }
    }

    /// Unconditionally apply a batch: remove every consumed output, then add
    /// every produced one. Callers validate first.
    pub fn apply(&mut self, txs: &[Transaction]) {
        for tx in txs {
            for op in tx.outpoints() {
                self.spend(&op);
            }
        }
        for tx in txs {
            self.add_tx_outputs(tx);
        }
    }
}
