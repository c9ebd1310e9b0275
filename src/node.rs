use chrono::Utc;
use log::{debug, info};
use num_bigint::BigUint;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::blockchain::{Block, Blockchain};
use crate::error::{ForkChoiceError, LedgerError, MempoolError, NodeError};
use crate::mempool::Mempool;
use crate::p2p::Broadcaster;
use crate::transaction::{Transaction, TxRules, UtxoSet};
use crate::wallet::{Wallet, get_balance};

/// Chain, unspent outputs and mempool. Always locked as one unit so no reader
/// sees a chain whose unspent set or pool has not caught up.
#[derive(Debug, Default)]
struct LedgerState {
    chain: Blockchain,
    mempool: Mempool,
}

/// Point-in-time summary taken under a single lock.
#[derive(Debug, Clone)]
pub struct NodeStats {
    pub height: usize,
    pub next_difficulty: u32,
    pub cumulative_work: BigUint,
    pub mempool_size: usize,
    pub utxo_size: usize,
}

/// The single owner of ledger state. Every mutation funnels through here.
pub struct Node {
    state: Mutex<LedgerState>,
    rules: Arc<dyn TxRules>,
    broadcaster: Arc<dyn Broadcaster>,
    wallet: Wallet,
    /// Cancellation token of the running mining search, if any.
    mining: Mutex<Option<Arc<AtomicBool>>>,
}

impl Node {
    pub fn new(wallet: Wallet, rules: Arc<dyn TxRules>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            rules,
            broadcaster,
            wallet,
            mining: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().expect("mutex poisoned")
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn newest_block(&self) -> Block {
        self.state().chain.newest_block().clone()
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.state().chain.blocks().to_vec()
    }

    pub fn block_by_hash(&self, hash: &str) -> Option<Block> {
        self.state().chain.block_by_hash(hash).cloned()
    }

    /// Look up a mined transaction by id.
    pub fn find_transaction(&self, id: &str) -> Option<Transaction> {
        self.state()
            .chain
            .blocks()
            .iter()
            .flat_map(|b| b.data.iter())
            .find(|tx| tx.id == id)
            .cloned()
    }

    pub fn unspent_outputs(&self) -> UtxoSet {
        self.state().chain.unspent_outputs().clone()
    }

    pub fn mempool(&self) -> Vec<Transaction> {
        self.state().mempool.snapshot()
    }

    pub fn balance_of(&self, address: &str) -> u64 {
        get_balance(address, self.state().chain.unspent_outputs())
    }

    pub fn account_balance(&self) -> u64 {
        self.wallet.balance(self.state().chain.unspent_outputs())
    }

    pub fn stats(&self) -> NodeStats {
        let state = self.state();
        NodeStats {
            height: state.chain.len(),
            next_difficulty: state.chain.current_difficulty(),
            cumulative_work: state.chain.cumulative_work(),
            mempool_size: state.mempool.len(),
            utxo_size: state.chain.unspent_outputs().len(),
        }
    }

    /// Coinbase to `miner_address` followed by the current pool, coinbase first.
    fn candidate_block_data(&self, state: &LedgerState, miner_address: &str) -> Vec<Transaction> {
        let height = state.chain.newest_block().index + 1;
        if state.mempool.is_empty() {
            debug!("NODE - candidate #{height} carries only the coinbase");
        }
        let mut data = vec![self.rules.create_coinbase_tx(miner_address, height)];
        data.extend(state.mempool.snapshot());
        data
    }

    /// An unsolved block on top of the current tip, with index, link,
    /// timestamp and difficulty fixed.
    pub fn candidate_block(&self, miner_address: &str) -> Block {
        let state = self.state();
        let tip = state.chain.newest_block();
        Block::candidate(
            tip.index + 1,
            tip.hash.clone(),
            Utc::now().timestamp(),
            self.candidate_block_data(&state, miner_address),
            state.chain.current_difficulty(),
        )
    }

    /// Append one block to the tip, then prune the pool, stop any search on the
    /// old tip and announce the block. Nothing changes on failure.
    pub fn append_block(&self, block: Block) -> Result<(), LedgerError> {
        {
            let mut state = self.state();
            state
                .chain
                .append(block.clone(), self.rules.as_ref(), Utc::now().timestamp())?;
            let LedgerState { chain, mempool } = &mut *state;
            mempool.prune(chain.unspent_outputs());
        }
        self.cancel_mining();
        self.broadcaster.broadcast_new_block(&block);
        Ok(())
    }

    /// Fork choice against a peer chain. See [`Blockchain::try_replace`].
    pub fn replace_chain(&self, candidate: Vec<Block>) -> Result<(), ForkChoiceError> {
        let tip = {
            let mut state = self.state();
            state
                .chain
                .try_replace(candidate, self.rules.as_ref(), Utc::now().timestamp())?;
            let LedgerState { chain, mempool } = &mut *state;
            mempool.prune(chain.unspent_outputs());
            chain.newest_block().clone()
        };
        self.cancel_mining();
        self.broadcaster.broadcast_new_block(&tip);
        Ok(())
    }

    /// A transaction relayed by a peer.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<(), MempoolError> {
        let mut state = self.state();
        let LedgerState { chain, mempool } = &mut *state;
        mempool.admit(tx, self.rules.as_ref(), chain.unspent_outputs())
    }

    /// Pay `amount` to `to` from the node wallet and announce the new pool.
    ///
    /// Building and admitting happen under the same lock as remote input, so
    /// a concurrent block or peer tx cannot slip in between.
    pub fn send_transaction(&self, to: &str, amount: u64) -> Result<Transaction, NodeError> {
        let (tx, pool) = {
            let mut state = self.state();
            let LedgerState { chain, mempool } = &mut *state;
            let tx = self.wallet.create_tx(
                to,
                amount,
                chain.unspent_outputs(),
                &mempool.snapshot(),
            )?;
            mempool.admit(tx.clone(), self.rules.as_ref(), chain.unspent_outputs())?;
            (tx, mempool.snapshot())
        };
        info!("NODE - sent {amount} to {to} in tx {}", tx.id);
        self.broadcaster.broadcast_mempool(&pool);
        Ok(tx)
    }

    /// Remember the token of a new search, cancelling any previous one.
    pub fn register_mining_job(&self, cancel: Arc<AtomicBool>) {
        let previous = self
            .mining
            .lock()
            .expect("mutex poisoned")
            .replace(cancel);
        if let Some(token) = previous {
            token.store(true, Ordering::Relaxed);
        }
    }

    /// The tip moved: any running search is now building on a stale block.
    fn cancel_mining(&self) {
        if let Some(token) = self.mining.lock().expect("mutex poisoned").take() {
            token.store(true, Ordering::Relaxed);
        }
    }
}
