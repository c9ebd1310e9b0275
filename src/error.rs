use thiserror::Error;

/// Why a single block was refused by the ledger.
///
/// Variants are ordered the way the checks run; the first failing clause wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid structure: {0}")]
    InvalidStructure(&'static str),

    #[error("invalid index: expected {expected}, got {got}")]
    InvalidIndex { expected: u64, got: u64 },

    #[error("invalid link: previous hash does not match block #{predecessor}")]
    InvalidLink { predecessor: u64 },

    #[error("invalid hash: block #{index} hash does not match its content")]
    InvalidHash { index: u64 },

    #[error("invalid proof of work: block #{index} hash misses difficulty {difficulty}")]
    InvalidProofOfWork { index: u64, difficulty: u32 },

    #[error("invalid timestamp: {timestamp} outside tolerance window")]
    InvalidTimestamp { timestamp: i64 },

    #[error("invalid transactions in block #{index}")]
    InvalidTransactions { index: u64 },
}

impl LedgerError {
    /// A block mined on top of a tip that has since moved.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidIndex { .. } | LedgerError::InvalidLink { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    #[error("invalid transaction {0}")]
    InvalidTransaction(String),

    #[error("conflicting transaction: input {tx_out_id}:{tx_out_index} already claimed in pool")]
    ConflictingTransaction { tx_out_id: String, tx_out_index: u64 },
}

/// Why a peer chain did not replace the local one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForkChoiceError {
    #[error("candidate chain is empty")]
    Empty,

    #[error("candidate genesis block differs from ours")]
    GenesisMismatch,

    #[error("candidate block #{index} rejected: {source}")]
    InvalidBlock {
        index: u64,
        #[source]
        source: LedgerError,
    },

    #[error("candidate chain does not carry more work than ours")]
    InsufficientWork,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("invalid private key")]
    InvalidKey,

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("amount must be > 0")]
    ZeroAmount,

    #[error("signing failed: {0}")]
    Signing(&'static str),
}

/// Failures of the node-level send path (wallet + mempool).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Mempool(#[from] MempoolError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MinerError {
    #[error("mining worker is not running")]
    WorkerGone,

    #[error("mined block rejected: {0}")]
    Rejected(LedgerError),
}
