use log::{debug, warn};

use crate::error::MempoolError;
use crate::transaction::{Transaction, TxRules, UtxoSet};

/// Transactions waiting to be mined, in arrival order.
///
/// Every pooled input is currently unspent and claimed by exactly one pooled
/// transaction.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    txs: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self { txs: Vec::new() }
    }

    pub fn snapshot(&self) -> Vec<Transaction> {
        self.txs.clone()
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Admit `tx` after standalone validation against `unspent` and a conflict
    /// check against the pool. First seen wins; there is no replacement.
    pub fn admit(
        &mut self,
        tx: Transaction,
        rules: &dyn TxRules,
        unspent: &UtxoSet,
    ) -> Result<(), MempoolError> {
        if let Err(msg) = rules.validate_tx(&tx, unspent) {
            warn!("MEMPOOL - tx {} invalid: {msg}", tx.id);
            return Err(MempoolError::InvalidTransaction(format!("{}: {msg}", tx.id)));
        }
        if let Some(op) = tx
            .outpoints()
            .find(|op| self.txs.iter().any(|pooled| pooled.outpoints().any(|p| &p == op)))
        {
            warn!(
                "MEMPOOL - tx {} conflicts on {}:{}",
                tx.id, op.tx_out_id, op.tx_out_index
            );
            return Err(MempoolError::ConflictingTransaction {
                tx_out_id: op.tx_out_id,
                tx_out_index: op.tx_out_index,
            });
        }

        debug!(
            "MEMPOOL - admitted tx {} (size: {} -> {})",
            tx.id,
            self.txs.len(),
            self.txs.len() + 1
        );
        self.txs.push(tx);
        Ok(())
    }

    /// Drop every transaction that consumes an output no longer in `unspent`.
    pub fn prune(&mut self, unspent: &UtxoSet) {
        let before = self.txs.len();
        self.txs
            .retain(|tx| tx.outpoints().all(|op| unspent.contains(&op)));
        let removed = before - self.txs.len();
        if removed > 0 {
            debug!("MEMPOOL - pruned {removed} txs ({before} -> {})", self.txs.len());
        }
    }
}
