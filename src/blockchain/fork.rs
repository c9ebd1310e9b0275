//! Fork choice: a peer chain replaces ours only when it revalidates from
//! genesis and carries strictly more cumulative work.

use log::{info, warn};
use num_bigint::BigUint;

use super::model::genesis_utxos;
use super::{Block, Blockchain};
use crate::error::{ForkChoiceError, LedgerError};
use crate::transaction::{TxRules, UtxoSet};

/// Σ 2^difficulty over all blocks.
pub fn cumulative_work(chain: &[Block]) -> BigUint {
    chain
        .iter()
        .map(|b| BigUint::from(1u8) << b.difficulty)
        .sum()
}

/// Replay `candidate` from genesis into a fresh unspent set without touching
/// any live state. Returns the fully replayed set, or the first failure.
pub fn validate_candidate_chain(
    candidate: &[Block],
    rules: &dyn TxRules,
    now: i64,
) -> Result<UtxoSet, ForkChoiceError> {
    let Some((genesis, rest)) = candidate.split_first() else {
        return Err(ForkChoiceError::Empty);
    };
    if !genesis.is_genesis() {
        return Err(ForkChoiceError::GenesisMismatch);
    }

    rest.iter()
        .try_fold((genesis, genesis_utxos()), |(prev, utxos), block| {
            block
                .check_successor_of(prev, now)
                .map_err(|source| ForkChoiceError::InvalidBlock {
                    index: block.index,
                    source,
                })?;
            let next = rules
                .process_txs(&block.data, &utxos, block.index)
                .ok_or(ForkChoiceError::InvalidBlock {
                    index: block.index,
                    source: LedgerError::InvalidTransactions { index: block.index },
                })?;
            Ok((block, next))
        })
        .map(|(_, utxos)| utxos)
}

impl Blockchain {
    pub fn cumulative_work(&self) -> BigUint {
        cumulative_work(&self.chain)
    }

    /// Swap in `candidate` if it is fully valid and heavier than the local
    /// chain. Equal work keeps the incumbent. Nothing changes on rejection.
    pub fn try_replace(
        &mut self,
        candidate: Vec<Block>,
        rules: &dyn TxRules,
        now: i64,
    ) -> Result<(), ForkChoiceError> {
        let utxos = match validate_candidate_chain(&candidate, rules, now) {
            Ok(utxos) => utxos,
            Err(e) => {
                warn!("FORK - candidate chain rejected: {e}");
                return Err(e);
            }
        };

        let theirs = cumulative_work(&candidate);
        let ours = self.cumulative_work();
        if theirs <= ours {
            warn!("FORK - candidate chain rejected: work {theirs} <= {ours}");
            return Err(ForkChoiceError::InsufficientWork);
        }

        info!(
            "FORK - replacing chain: height {} -> {}, work {} -> {}",
            self.chain.len(),
            candidate.len(),
            ours,
            theirs
        );
        self.chain = candidate;
        self.utxos = utxos;
        debug_assert!(self.chain[0].is_genesis());
        Ok(())
    }
}
