//! Background proof-of-work.
//!
//! A dedicated worker thread runs the nonce search so the ledger stays free to
//! accept peer blocks, chains and transactions. Jobs go in over one channel,
//! results come back over a per-job reply channel.

use log::{debug, error, info, warn};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, mpsc};
use std::thread;
use uuid::Uuid;

use crate::blockchain::{Block, pow};
use crate::error::{LedgerError, MinerError};
use crate::node::Node;

struct Job {
    id: Uuid,
    candidate: Block,
    cancel: Arc<AtomicBool>,
    reply: mpsc::Sender<Option<Block>>,
}

/// What became of one mining run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    /// Solved and appended to the chain.
    Mined(Block),
    /// Solved, but another block took the tip first.
    Stale(LedgerError),
    /// The tip moved while searching.
    Cancelled,
}

pub struct Miner {
    node: Arc<Node>,
    address: String,
    jobs: mpsc::Sender<Job>,
}

impl Miner {
    /// Start the worker thread. Coinbase rewards go to `address`.
    pub fn spawn(node: Arc<Node>, address: String) -> std::io::Result<Self> {
        let (jobs, inbox) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name("pow-worker".into())
            .spawn(move || {
                for job in inbox {
                    debug!(
                        "MINER - job {} started on #{} (difficulty {})",
                        job.id, job.candidate.index, job.candidate.difficulty
                    );
                    let found = pow::solve(job.candidate, &job.cancel);
                    // the requester may have gone away; nothing to do then
                    let _ = job.reply.send(found);
                }
                debug!("MINER - job channel closed, worker exiting");
            })?;
        Ok(Self {
            node,
            address,
            jobs,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Build a candidate on the current tip, search it on the worker, and
    /// append the result. Blocks the calling thread until the search ends.
    pub fn mine_next_block(&self) -> Result<MineOutcome, MinerError> {
        self.mine_with(|node, address| node.candidate_block(address))
    }

    fn mine_with(
        &self,
        build: impl FnOnce(&Node, &str) -> Block,
    ) -> Result<MineOutcome, MinerError> {
        let id = Uuid::new_v4();
        // registered before the candidate exists so no tip change is missed
        let cancel = Arc::new(AtomicBool::new(false));
        self.node.register_mining_job(cancel.clone());
        let candidate = build(&self.node, &self.address);
        let index = candidate.index;

        let (reply, result) = mpsc::channel();
        self.jobs
            .send(Job {
                id,
                candidate,
                cancel,
                reply,
            })
            .map_err(|_| MinerError::WorkerGone)?;

        let Some(block) = result.recv().map_err(|_| MinerError::WorkerGone)? else {
            info!("MINER - job {id} for #{index} cancelled, tip moved");
            return Ok(MineOutcome::Cancelled);
        };

        match self.node.append_block(block.clone()) {
            Ok(()) => {
                info!(
                    "MINER - job {id} sealed block #{} (hash={}, nonce={})",
                    block.index, block.hash, block.nonce
                );
                Ok(MineOutcome::Mined(block))
            }
            Err(e) if e.is_stale() => {
                warn!("MINER - job {id} result for #{index} is stale: {e}");
                Ok(MineOutcome::Stale(e))
            }
            Err(e) => {
                error!("MINER - job {id} produced an invalid block #{index}: {e}");
                Err(MinerError::Rejected(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::node;
    use std::time::Duration;

    #[test]
    fn mines_and_appends_on_worker() {
        let node = Arc::new(node());
        let me = node.wallet().public_address().to_string();
        let miner = Miner::spawn(node.clone(), me).unwrap();

        let outcome = miner.mine_next_block().unwrap();
        let MineOutcome::Mined(block) = outcome else {
            panic!("expected a mined block, got {outcome:?}");
        };
        assert_eq!(block.index, 1);
        assert_eq!(node.newest_block(), block);
        assert_eq!(node.account_balance(), 50);
    }

    #[test]
    fn consecutive_runs_extend_the_chain() {
        let node = Arc::new(node());
        let miner = Miner::spawn(node.clone(), "miner".into()).unwrap();
        for _ in 0..3 {
            assert!(matches!(
                miner.mine_next_block().unwrap(),
                MineOutcome::Mined(_)
            ));
        }
        assert_eq!(node.blocks().len(), 4);
        assert_eq!(node.balance_of("miner"), 150);
    }

    #[test]
    fn tip_change_cancels_running_search() {
        let node = Arc::new(node());
        let miner = Arc::new(Miner::spawn(node.clone(), "miner".into()).unwrap());

        let running = {
            let miner = miner.clone();
            thread::spawn(move || {
                miner.mine_with(|node, address| {
                    let mut candidate = node.candidate_block(address);
                    candidate.difficulty = 256;
                    candidate
                })
            })
        };

        // keep moving the tip until the unreachable search gives up
        while !running.is_finished() {
            let block = pow::solve(node.candidate_block("peer"), &AtomicBool::new(false)).unwrap();
            node.append_block(block).unwrap();
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(running.join().unwrap(), Ok(MineOutcome::Cancelled));
        assert!(node.balance_of("peer") > 0);
        assert_eq!(node.balance_of("miner"), 0);
    }

    #[test]
    fn result_on_an_old_tip_is_stale() {
        let node = Arc::new(node());
        let miner = Miner::spawn(node.clone(), "miner".into()).unwrap();

        let old = node.candidate_block("miner");
        let peer = pow::solve(node.candidate_block("peer"), &AtomicBool::new(false)).unwrap();
        node.append_block(peer).unwrap();

        let outcome = miner.mine_with(move |_, _| old).unwrap();
        assert!(matches!(outcome, MineOutcome::Stale(ref e) if e.is_stale()));
        assert_eq!(node.blocks().len(), 2);
        assert_eq!(node.balance_of("miner"), 0);
    }
}
