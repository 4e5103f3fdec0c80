// src/pow/broadcaster.rs
//! Background block broadcaster
//!
//! Decouples "a finished block exists" from "the block has been sent to
//! peers": the mining loop enqueues finished blocks without blocking and
//! a dedicated thread drains the queue at its own pace, so network
//! latency and backpressure never stall round transitions.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::network::{BlockWrapper, NetworkChannels};
use crate::utils::error::PowError;

/// Background sender draining a bounded outbound queue
///
/// Cloneable handle; all clones share the queue and run flag. The
/// broadcaster never touches round state.
#[derive(Clone)]
pub struct BlockBroadcaster {
    queue: Sender<BlockWrapper>,
    outbound: Receiver<BlockWrapper>,
    running: Arc<AtomicBool>,
    network: Arc<dyn NetworkChannels>,
    poll: Duration,
}

impl BlockBroadcaster {
    /// Creates a broadcaster
    ///
    /// # Arguments
    /// * `network` - Peer fan-out collaborator, called from the drain thread
    /// * `running` - Cooperative shutdown flag shared with the coordinator
    /// * `capacity` - Outbound queue bound; a full queue drops blocks
    /// * `poll` - Drain-side wait interval, bounds shutdown latency
    pub fn new(
        network: Arc<dyn NetworkChannels>,
        running: Arc<AtomicBool>,
        capacity: usize,
        poll: Duration,
    ) -> Self {
        let (queue, outbound) = bounded(capacity);
        BlockBroadcaster {
            queue,
            outbound,
            running,
            network,
            poll,
        }
    }

    /// Enqueues a block for delivery without blocking
    ///
    /// # Errors
    /// [`PowError::BroadcastQueueFull`] when the queue is saturated; the
    /// block is dropped and never retried (the next round's block
    /// supersedes it).
    pub fn broadcast(&self, block: BlockWrapper) -> Result<(), PowError> {
        self.queue.try_send(block).map_err(|e| match e {
            TrySendError::Full(dropped) => PowError::BroadcastQueueFull(format!(
                "dropping block with nonce {}",
                hex::encode(dropped.block.nonce())
            )),
            TrySendError::Disconnected(_) => {
                PowError::Channel("broadcast queue disconnected".into())
            }
        })
    }

    /// Spawns the drain thread; it exits when the run flag clears.
    pub fn spawn(&self) -> JoinHandle<()> {
        let broadcaster = self.clone();
        std::thread::spawn(move || broadcaster.run())
    }

    fn run(&self) {
        while self.running.load(Ordering::SeqCst) {
            match self.outbound.recv_timeout(self.poll) {
                Ok(block) => self.network.send_new_block(&block),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Snoops the outbound queue; used by tests to assert on enqueued
    /// blocks without running the drain thread.
    #[cfg(test)]
    pub(crate) fn outbound(&self) -> &Receiver<BlockWrapper> {
        &self.outbound
    }
}
