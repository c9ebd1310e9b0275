use log::{debug, trace};
use sha2::Digest;
use std::sync::atomic::{AtomicBool, Ordering};

use super::block::{Block, header_hasher};

/// How many nonces to try between cancellation checks.
const CANCEL_CHECK_EVERY: u64 = 1024;

/// True when the hex-encoded `hash` starts with at least `difficulty` zero bits.
pub fn hash_matches_difficulty(hash: &str, difficulty: u32) -> bool {
    let Ok(bytes) = hex::decode(hash) else {
        return false;
    };
    leading_zero_bits(&bytes) >= difficulty
}

fn leading_zero_bits(bytes: &[u8]) -> u32 {
    let mut bits = 0;
    for b in bytes {
        if *b == 0 {
            bits += 8;
        } else {
            bits += b.leading_zeros();
            break;
        }
    }
    bits
}

/// Linear nonce search from 0 over a fixed candidate.
///
/// Returns `None` only if `cancel` is raised before a solution is found.
pub fn solve(mut candidate: Block, cancel: &AtomicBool) -> Option<Block> {
    let prefix = header_hasher(
        candidate.index,
        candidate.previous_hash.as_deref(),
        candidate.timestamp,
        &candidate.data,
        candidate.difficulty,
    );

    let mut nonce: u64 = 0;
    loop {
        if nonce % CANCEL_CHECK_EVERY == 0 && cancel.load(Ordering::Relaxed) {
            debug!(
                "POW - search for #{} cancelled at nonce {}",
                candidate.index, nonce
            );
            return None;
        }

        let mut hasher = prefix.clone();
        hasher.update(nonce.to_string().as_bytes());
        let digest = hasher.finalize();
        if leading_zero_bits(&digest) >= candidate.difficulty {
            candidate.nonce = nonce;
            candidate.hash = hex::encode(digest);
            debug!(
                "POW - found nonce {} for #{} at difficulty {}",
                nonce, candidate.index, candidate.difficulty
            );
            return Some(candidate);
        }
        trace!("POW - nonce {nonce} misses difficulty {}", candidate.difficulty);
        nonce = nonce.wrapping_add(1);
    }
}
