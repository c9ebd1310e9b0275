use log::{debug, warn};
use std::collections::HashSet;

use super::model::Transaction;
use super::utxo::{OutPoint, UtxoSet};
use super::COINBASE_AMOUNT;
use crate::wallet::verify_signature_hex;

/// Transaction semantics the ledger depends on but does not define itself.
pub trait TxRules: Send + Sync {
    fn create_coinbase_tx(&self, address: &str, block_index: u64) -> Transaction;

    /// Replay a block's transactions on top of `unspent`, returning the new set,
    /// or `None` if any transaction is invalid or an output is spent twice.
    fn process_txs(
        &self,
        txs: &[Transaction],
        unspent: &UtxoSet,
        block_index: u64,
    ) -> Option<UtxoSet>;

    /// Standalone validity of a non-coinbase transaction against `unspent`.
    fn validate_tx(&self, tx: &Transaction, unspent: &UtxoSet) -> Result<(), &'static str>;
}

/// secp256k1-signed transactions with a fixed coinbase reward.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignedTxRules;

impl SignedTxRules {
    fn validate_coinbase(tx: &Transaction, block_index: u64) -> Result<(), &'static str> {
        if tx.compute_id() != tx.id {
            return Err("coinbase id does not match its content");
        }
        if tx.tx_ins.len() != 1 {
            return Err("coinbase must have exactly one input");
        }
        if !tx.tx_ins[0].tx_out_id.is_empty() {
            return Err("coinbase input must not reference an output");
        }
        if tx.tx_ins[0].tx_out_index != block_index {
            return Err("coinbase input index must equal the block index");
        }
        if tx.tx_outs.len() != 1 {
            return Err("coinbase must have exactly one output");
        }
        if tx.tx_outs[0].amount != COINBASE_AMOUNT {
            return Err("coinbase amount differs from the block reward");
        }
        Ok(())
    }
}

impl TxRules for SignedTxRules {
    fn create_coinbase_tx(&self, address: &str, block_index: u64) -> Transaction {
        Transaction::coinbase(address, block_index)
    }

    fn process_txs(
        &self,
        txs: &[Transaction],
        unspent: &UtxoSet,
        block_index: u64,
    ) -> Option<UtxoSet> {
        let Some((coinbase, rest)) = txs.split_first() else {
            warn!("block #{block_index} has no coinbase");
            return None;
        };
        if let Err(msg) = Self::validate_coinbase(coinbase, block_index) {
            warn!("block #{block_index} coinbase rejected: {msg}");
            return None;
        }

        // No output may be consumed twice within one block.
        let mut seen = HashSet::<OutPoint>::new();
        for op in rest.iter().flat_map(Transaction::outpoints) {
            if !seen.insert(op) {
                warn!("block #{block_index} spends the same output twice");
                return None;
            }
        }

        for tx in rest {
            if let Err(msg) = self.validate_tx(tx, unspent) {
                warn!("block #{block_index} tx {} rejected: {msg}", tx.id);
                return None;
            }
        }

        let mut next = unspent.clone();
        next.apply(txs);
        debug!(
            "block #{block_index} replayed: {} txs, utxo {} -> {}",
            txs.len(),
            unspent.len(),
            next.len()
        );
        Some(next)
    }

    fn validate_tx(&self, tx: &Transaction, unspent: &UtxoSet) -> Result<(), &'static str> {
        if tx.compute_id() != tx.id {
            return Err("transaction id does not match its content");
        }
        if tx.tx_ins.is_empty() {
            return Err("transaction must have at least one input");
        }
        if tx.tx_outs.is_empty() {
            return Err("transaction must have at least one output");
        }
        if tx.tx_outs.iter().any(|o| o.amount == 0) {
            return Err("output amount must be > 0");
        }

        let mut seen = HashSet::<OutPoint>::new();
        for op in tx.outpoints() {
            if !seen.insert(op) {
                return Err("duplicate input outpoint in transaction");
            }
        }

        let sighash = tx.sighash().ok_or("transaction id is not a 32-byte hex digest")?;
        let mut input_sum: u128 = 0;
        for tx_in in &tx.tx_ins {
            let prev_out = unspent
                .get(&tx_in.outpoint())
                .ok_or("referenced output is not unspent")?;
            if tx_in.signature.is_empty() {
                return Err("missing signature in input");
            }
            if !verify_signature_hex(&prev_out.address, &tx_in.signature, sighash)? {
                return Err("invalid signature");
            }
            input_sum += prev_out.amount as u128;
        }

        if input_sum != tx.total_output_amount() {
            return Err("inputs total does not equal outputs total");
        }
        Ok(())
    }
}
