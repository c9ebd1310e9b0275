pub mod model;
pub mod rules;
pub mod utxo;

pub use model::{Transaction, TxIn, TxOut};
pub use rules::{SignedTxRules, TxRules};
pub use utxo::{OutPoint, UtxoSet};

/// Reward paid by every coinbase transaction.
pub const COINBASE_AMOUNT: u64 = 50;
