pub mod block;
pub mod difficulty;
pub mod fork;
pub mod model;
pub mod pow;

pub use block::Block;
pub use model::Blockchain;

/// Expected seconds between blocks.
pub const BLOCK_GENERATION_INTERVAL: i64 = 10;

/// Retarget every this many blocks.
pub const DIFFICULTY_ADJUSTMENT_INTERVAL: u64 = 10;

/// Allowed clock skew, in seconds, against the predecessor and against now.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 60;
