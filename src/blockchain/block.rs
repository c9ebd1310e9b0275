use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::TIMESTAMP_TOLERANCE_SECS;
use super::pow::hash_matches_difficulty;
use crate::error::LedgerError;
use crate::transaction::{Transaction, TxIn, TxOut};

const GENESIS_HASH: &str = "372f8eb0083e86222beb47f0ed827d2929bc5bedd568e0e67ce2faeea08efb4c";
const GENESIS_TIMESTAMP: i64 = 1525750421;
const GENESIS_ADDRESS: &str = "048f0ef659289c5c9dff1c030cbc4f84cc76f951d113857aae80d3be7a74d3fa23bb67ef376e36aa2253717aae70a5ed760bacdee1ba18d6e78df609d36855b263";
const GENESIS_TX_ID: &str = "b403851a4b5f51965ac38e503a1a4423044b1b15adb70126b1c02d9f01e73b9a";

/// A single block in the chain holding an ordered batch of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub hash: String,
    /// `None` only for the genesis block.
    pub previous_hash: Option<String>,
    pub timestamp: i64, // Unix seconds (UTC)
    pub data: Vec<Transaction>,
    /// Required leading zero bits of `hash`.
    pub difficulty: u32,
    pub nonce: u64,
}

impl Block {
    /// The protocol-wide first block. Its hash is a constant shared by every
    /// participant and is compared by equality, never recomputed.
    pub fn genesis() -> Self {
        let tx = Transaction {
            tx_ins: vec![TxIn {
                tx_out_id: String::new(),
                tx_out_index: 0,
                signature: String::new(),
            }],
            tx_outs: vec![TxOut {
                address: GENESIS_ADDRESS.to_string(),
                amount: 50,
            }],
            id: GENESIS_TX_ID.to_string(),
        };
        Self {
            index: 0,
            hash: GENESIS_HASH.to_string(),
            previous_hash: None,
            timestamp: GENESIS_TIMESTAMP,
            data: vec![tx],
            difficulty: 0,
            nonce: 0,
        }
    }

    /// A mining candidate at nonce 0. Call `pow::solve` to search for a valid nonce.
    pub fn candidate(
        index: u64,
        previous_hash: String,
        timestamp: i64,
        data: Vec<Transaction>,
        difficulty: u32,
    ) -> Self {
        let mut block = Self {
            index,
            hash: String::new(),
            previous_hash: Some(previous_hash),
            timestamp,
            data,
            difficulty,
            nonce: 0,
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn compute_hash(&self) -> String {
        calculate_hash(
            self.index,
            self.previous_hash.as_deref(),
            self.timestamp,
            &self.data,
            self.difficulty,
            self.nonce,
        )
    }

    pub fn is_genesis(&self) -> bool {
        *self == Self::genesis()
    }

    /// Shape checks that do not depend on any other block. Fails closed.
    pub fn check_structure(&self) -> Result<(), LedgerError> {
        if !is_hash_hex(&self.hash) {
            return Err(LedgerError::InvalidStructure("hash is not a 64-char hex digest"));
        }
        match self.previous_hash.as_deref() {
            Some(prev) if is_hash_hex(prev) => {}
            Some(_) => {
                return Err(LedgerError::InvalidStructure(
                    "previousHash is not a 64-char hex digest",
                ));
            }
            None => return Err(LedgerError::InvalidStructure("previousHash is missing")),
        }
        if self.timestamp < 0 {
            return Err(LedgerError::InvalidStructure("timestamp is negative"));
        }
        Ok(())
    }

    pub fn is_structurally_valid(&self) -> bool {
        self.check_structure().is_ok()
    }

    /// Whether `self` may directly follow `predecessor` at wall-clock `now`.
    /// Checks run in order: structure, index, link, hash, proof of work, timestamp.
    pub fn check_successor_of(&self, predecessor: &Block, now: i64) -> Result<(), LedgerError> {
        self.check_structure()?;
        if self.index != predecessor.index + 1 {
            return Err(LedgerError::InvalidIndex {
                expected: predecessor.index + 1,
                got: self.index,
            });
        }
        if self.previous_hash.as_deref() != Some(predecessor.hash.as_str()) {
            return Err(LedgerError::InvalidLink {
                predecessor: predecessor.index,
            });
        }
        if self.compute_hash() != self.hash {
            return Err(LedgerError::InvalidHash { index: self.index });
        }
        if !hash_matches_difficulty(&self.hash, self.difficulty) {
            return Err(LedgerError::InvalidProofOfWork {
                index: self.index,
                difficulty: self.difficulty,
            });
        }
        if !(predecessor.timestamp - TIMESTAMP_TOLERANCE_SECS < self.timestamp
            && self.timestamp - TIMESTAMP_TOLERANCE_SECS < now)
        {
            return Err(LedgerError::InvalidTimestamp {
                timestamp: self.timestamp,
            });
        }
        Ok(())
    }

    pub fn is_valid_successor_of(&self, predecessor: &Block, now: i64) -> bool {
        self.check_successor_of(predecessor, now).is_ok()
    }
}

/// SHA-256 over index, previousHash (`null` when absent), timestamp, compact
/// JSON of the transactions, difficulty and nonce, concatenated in that order.
pub fn calculate_hash(
    index: u64,
    previous_hash: Option<&str>,
    timestamp: i64,
    data: &[Transaction],
    difficulty: u32,
    nonce: u64,
) -> String {
    let mut hasher = header_hasher(index, previous_hash, timestamp, data, difficulty);
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Hasher primed with every field except the nonce.
pub(crate) fn header_hasher(
    index: u64,
    previous_hash: Option<&str>,
    timestamp: i64,
    data: &[Transaction],
    difficulty: u32,
) -> Sha256 {
    let txs_json = serde_json::to_string(data).expect("transactions always serialize");
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(previous_hash.unwrap_or("null").as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(txs_json.as_bytes());
    hasher.update(difficulty.to_string().as_bytes());
    hasher
}

fn is_hash_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_after(prev: &Block, timestamp: i64) -> Block {
        Block::candidate(
            prev.index + 1,
            prev.hash.clone(),
            timestamp,
            vec![Transaction::coinbase("miner", prev.index + 1)],
            0,
        )
    }

    #[test]
    fn genesis_is_the_fixed_constant() {
        let g = Block::genesis();
        assert_eq!(g.index, 0);
        assert_eq!(g.hash, GENESIS_HASH);
        assert!(g.previous_hash.is_none());
        assert!(g.is_genesis());
        assert_eq!(g.data.len(), 1);
    }

    #[test]
    fn hash_is_deterministic_and_nonce_sensitive() {
        let g = Block::genesis();
        let b = next_after(&g, 1_600_000_000);
        assert_eq!(b.hash, b.compute_hash());
        assert_eq!(b.hash.len(), 64);
        let mut bumped = b.clone();
        bumped.nonce += 1;
        assert_ne!(bumped.compute_hash(), b.hash);
    }

    #[test]
    fn previous_hash_renders_as_null_when_absent() {
        let with_null = calculate_hash(0, None, 1, &[], 0, 0);
        let with_text = calculate_hash(0, Some("null"), 1, &[], 0, 0);
        assert_eq!(with_null, with_text);
    }

    #[test]
    fn accepts_well_formed_successor() {
        let g = Block::genesis();
        let now = 1_600_000_000;
        let b = next_after(&g, now);
        assert_eq!(b.check_successor_of(&g, now), Ok(()));
    }

    #[test]
    fn every_single_field_mutation_is_rejected() {
        let g = Block::genesis();
        let now = 1_600_000_000;
        let b = next_after(&g, now);

        let mut m = b.clone();
        m.index = 2;
        assert_eq!(
            m.check_successor_of(&g, now),
            Err(LedgerError::InvalidIndex { expected: 1, got: 2 })
        );

        let mut m = b.clone();
        m.previous_hash = Some("ab".repeat(32));
        assert_eq!(
            m.check_successor_of(&g, now),
            Err(LedgerError::InvalidLink { predecessor: 0 })
        );

        let mut m = b.clone();
        m.hash = "cd".repeat(32);
        assert_eq!(
            m.check_successor_of(&g, now),
            Err(LedgerError::InvalidHash { index: 1 })
        );

        let mut m = b.clone();
        m.timestamp += 1;
        assert_eq!(
            m.check_successor_of(&g, now),
            Err(LedgerError::InvalidHash { index: 1 })
        );

        let mut m = b.clone();
        m.difficulty = 255;
        m.hash = m.compute_hash();
        assert_eq!(
            m.check_successor_of(&g, now),
            Err(LedgerError::InvalidProofOfWork {
                index: 1,
                difficulty: 255
            })
        );

        let mut m = b.clone();
        m.data.push(Transaction::coinbase("other", 1));
        assert!(!m.is_valid_successor_of(&g, now));
    }

    #[test]
    fn structure_failures_come_first() {
        let g = Block::genesis();
        let mut b = next_after(&g, 1_600_000_000);
        b.previous_hash = None;
        b.index = 9;
        assert!(matches!(
            b.check_successor_of(&g, 1_600_000_000),
            Err(LedgerError::InvalidStructure(_))
        ));
        b.previous_hash = Some("xyz".into());
        assert!(!b.is_structurally_valid());
    }

    #[test]
    fn timestamp_window() {
        let g = Block::genesis();
        let now = 1_600_000_000;

        // too far behind the predecessor
        let early = next_after(&g, g.timestamp - 60);
        assert_eq!(
            early.check_successor_of(&g, now),
            Err(LedgerError::InvalidTimestamp {
                timestamp: g.timestamp - 60
            })
        );
        let slightly_early = next_after(&g, g.timestamp - 59);
        assert!(slightly_early.is_valid_successor_of(&g, now));

        // too far in the future
        let future = next_after(&g, now + 60);
        assert!(!future.is_valid_successor_of(&g, now));
        let near_future = next_after(&g, now + 59);
        assert!(near_future.is_valid_successor_of(&g, now));
    }
}
