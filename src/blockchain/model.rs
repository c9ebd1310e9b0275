use log::{info, warn};

use super::{Block, difficulty};
use crate::error::LedgerError;
use crate::transaction::{TxRules, UtxoSet};

/// The ledger: the accepted block sequence and the unspent outputs it implies.
///
/// Both halves only ever change together, through [`Blockchain::append`] or
/// [`Blockchain::try_replace`](super::fork).
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub(super) chain: Vec<Block>,
    pub(super) utxos: UtxoSet,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Initialize a ledger holding only the genesis block.
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
            utxos: genesis_utxos(),
        }
    }

    /// Return the last block in the chain.
    pub fn newest_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn unspent_outputs(&self) -> &UtxoSet {
        &self.utxos
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn block_by_hash(&self, hash: &str) -> Option<&Block> {
        self.chain.iter().find(|b| b.hash == hash)
    }

    /// Difficulty the next mined block must carry.
    pub fn current_difficulty(&self) -> u32 {
        difficulty::current_difficulty(&self.chain)
    }

    /// Validate `candidate` against the tip, replay its transactions, and only
    /// then commit both the block and the new unspent set.
    pub fn append(
        &mut self,
        candidate: Block,
        rules: &dyn TxRules,
        now: i64,
    ) -> Result<(), LedgerError> {
        if let Err(e) = candidate.check_successor_of(self.newest_block(), now) {
            warn!("LEDGER - block #{} rejected: {e}", candidate.index);
            return Err(e);
        }
        let Some(next) = rules.process_txs(&candidate.data, &self.utxos, candidate.index) else {
            warn!(
                "LEDGER - block #{} rejected: transactions do not replay",
                candidate.index
            );
            return Err(LedgerError::InvalidTransactions {
                index: candidate.index,
            });
        };

        info!(
            "LEDGER - appended block #{} (hash={}, txs={}, difficulty={})",
            candidate.index,
            candidate.hash,
            candidate.data.len(),
            candidate.difficulty
        );
        self.chain.push(candidate);
        self.utxos = next;
        Ok(())
    }
}

/// Outputs created by the genesis block. The genesis transaction is a
/// protocol constant and is applied without validation.
pub fn genesis_utxos() -> UtxoSet {
    let mut set = UtxoSet::new();
    set.apply(&Block::genesis().data);
    set
}
