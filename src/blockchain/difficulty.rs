use log::info;

use super::{BLOCK_GENERATION_INTERVAL, Block, DIFFICULTY_ADJUSTMENT_INTERVAL};

/// Difficulty for the block that will follow the tip of `chain`.
pub fn current_difficulty(chain: &[Block]) -> u32 {
    let Some(newest) = chain.last() else {
        return 0;
    };
    if newest.index != 0 && newest.index % DIFFICULTY_ADJUSTMENT_INTERVAL == 0 {
        recompute_difficulty(newest, chain)
    } else {
        newest.difficulty
    }
}

/// Bang-bang retarget against the block `DIFFICULTY_ADJUSTMENT_INTERVAL` back:
/// one step harder when the window took less than half the expected time, one
/// step easier (never below 0) when it took more than twice as long.
pub fn recompute_difficulty(newest: &Block, chain: &[Block]) -> u32 {
    let Some(start) = chain.len().checked_sub(DIFFICULTY_ADJUSTMENT_INTERVAL as usize) else {
        return newest.difficulty;
    };
    let last_adjusted = &chain[start];
    let expected = BLOCK_GENERATION_INTERVAL * DIFFICULTY_ADJUSTMENT_INTERVAL as i64;
    let taken = newest.timestamp - last_adjusted.timestamp;

    let next = if taken < expected / 2 {
        last_adjusted.difficulty.saturating_add(1)
    } else if taken > expected * 2 {
        last_adjusted.difficulty.saturating_sub(1)
    } else {
        last_adjusted.difficulty
    };
    info!(
        "Difficulty retarget at #{}: {} -> {} (taken {}s, expected {}s)",
        newest.index, last_adjusted.difficulty, next, taken, expected
    );
    next
}
