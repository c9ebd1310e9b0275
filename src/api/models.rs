use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::blockchain::Block;
use crate::miner::Miner;
use crate::node::Node;
use crate::transaction::Transaction;

/// Shared application state: the ledger owner and its miner.
pub struct AppState {
    pub node: Arc<Node>,
    pub miner: Arc<Miner>,
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ReplaceResponse {
    pub replaced: bool,
    pub length: usize,
}

/* ---------- Mining API Models ---------- */

#[derive(Serialize)]
pub struct MineResponse {
    pub status: &'static str,
    pub block: Option<Block>,
    pub reason: Option<String>,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct SendRequest {
    pub address: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct MempoolResponse {
    pub size: usize,
    pub transactions: Vec<Transaction>,
}

/* ---------- Wallet API Models ---------- */

#[derive(Serialize)]
pub struct AddressResponse {
    pub address: String,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: u64,
    pub utxos: usize,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub next_difficulty: u32,
    /// Decimal string, the value is unbounded.
    pub cumulative_work: String,
    pub block_generation_interval_secs: i64,
    pub adjust_interval_blocks: u64,
    pub last_interval_secs: Option<i64>,
    pub mempool_size: usize,
    pub utxo_size: usize,
}
