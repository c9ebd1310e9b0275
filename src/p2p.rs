use log::info;

use crate::blockchain::Block;
use crate::transaction::Transaction;

/// Outbound gossip handle injected into the node.
///
/// Calls are fire-and-forget notifications made after local state has been
/// committed; the node never waits on or retries them.
pub trait Broadcaster: Send + Sync {
    fn broadcast_new_block(&self, block: &Block);
    fn broadcast_mempool(&self, txs: &[Transaction]);
}

/// Broadcaster for a node without a peer transport: it only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBroadcaster;

impl Broadcaster for LogBroadcaster {
    fn broadcast_new_block(&self, block: &Block) {
        info!("P2P - new tip #{} ({})", block.index, block.hash);
    }

    fn broadcast_mempool(&self, txs: &[Transaction]) {
        info!("P2P - mempool now holds {} txs", txs.len());
    }
}
