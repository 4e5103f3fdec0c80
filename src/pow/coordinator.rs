// src/pow/coordinator.rs
//! The proof-of-work round coordinator
//!
//! A single-owner actor: all round state (candidate block, best share,
//! current task, history ring) is confined to one event-loop thread.
//! External producers (network receive path, pretop notifier, the round
//! timer) only enqueue events into one shared FIFO queue; the loop
//! consumes them strictly in arrival order, so share comparison and
//! round transitions are race-free without locks on the round state.

use arc_swap::{ArcSwap, ArcSwapOption};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::chain::{Chain, NodeStateSource, Signer};
use crate::config::PowConfig;
use crate::engine::{DatasetPair, HashEngine};
use crate::network::BlockWrapper;
use crate::pool::{AwardLedger, MinerRegistry, MinerRef};
use crate::pow::broadcaster::BlockBroadcaster;
use crate::pow::evaluator::{RoundHistory, ShareEvaluator};
use crate::pow::task::{Round, Task, TaskBuilder};
use crate::pow::timer::RoundTimer;
use crate::types::Hash256;
use crate::utils::error::PowError;
use crate::utils::time::{current_timestamp, end_of_epoch, main_time};

/// Events consumed by the coordinator loop
///
/// One variant per event kind, each carrying its own typed payload.
#[derive(Clone, Debug)]
pub enum Event {
    /// The armed round deadline expired. Carries the deadline it was
    /// armed for so stale timeouts from a superseded round are
    /// discarded instead of finalizing twice.
    Timeout {
        /// The deadline this timeout was armed for.
        deadline: i64,
    },
    /// A miner submitted a share for the current task.
    NewShare {
        /// Raw share payload as received from the wire.
        data: Vec<u8>,
        /// Which miner sent it, for statistics attribution.
        miner: MinerRef,
    },
    /// The chain layer observed a new best tip.
    NewPretop(Hash256),
    /// Reserved difficulty-change event; accepted and ignored.
    NewDiff,
}

/// The collaborator seams the coordinator is wired to.
pub struct Collaborators {
    /// Chain storage and candidate construction.
    pub chain: Arc<dyn Chain>,
    /// Block signing.
    pub signer: Arc<dyn Signer>,
    /// Hashing primitives.
    pub engine: Arc<dyn HashEngine>,
    /// Shared RandomX dataset double buffer.
    pub datasets: Arc<DatasetPair>,
    /// Task distribution and share statistics.
    pub registry: Arc<dyn MinerRegistry>,
    /// Round-boundary award accounting.
    pub awards: Arc<dyn AwardLedger>,
    /// Peer fan-out for finished blocks.
    pub network: Arc<dyn crate::network::NetworkChannels>,
    /// Node-wide sync-state gate.
    pub node_state: Arc<dyn NodeStateSource>,
}

struct Shared {
    config: PowConfig,
    chain: Arc<dyn Chain>,
    signer: Arc<dyn Signer>,
    engine: Arc<dyn HashEngine>,
    datasets: Arc<DatasetPair>,
    registry: Arc<dyn MinerRegistry>,
    awards: Arc<dyn AwardLedger>,
    node_state: Arc<dyn NodeStateSource>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    running: Arc<AtomicBool>,
    pretop: ArcSwap<Hash256>,
    current_task: ArcSwapOption<Task>,
    history: ArcSwap<RoundHistory>,
    timer: RoundTimer,
    broadcaster: BlockBroadcaster,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

/// The mining round lifecycle coordinator
///
/// Lifecycle: `start()` spawns the event loop, timer and broadcaster
/// threads; `stop()` signals all three to halt cooperatively. Shares
/// and pretop notifications may be submitted from any thread.
pub struct PowCoordinator {
    shared: Arc<Shared>,
}

impl PowCoordinator {
    /// Creates a coordinator wired to its collaborators
    ///
    /// # Errors
    /// [`PowError::Config`] if the configuration fails validation.
    pub fn new(config: PowConfig, collaborators: Collaborators) -> Result<Self, PowError> {
        config.validate()?;

        let (events_tx, events_rx) = unbounded();
        let running = Arc::new(AtomicBool::new(false));
        let timer = RoundTimer::new(
            events_tx.clone(),
            running.clone(),
            Duration::from_millis(config.poll_interval_ms),
        );
        let broadcaster = BlockBroadcaster::new(
            collaborators.network,
            running.clone(),
            config.broadcast_queue_capacity,
            Duration::from_millis(config.broadcast_poll_ms),
        );

        Ok(PowCoordinator {
            shared: Arc::new(Shared {
                config,
                chain: collaborators.chain,
                signer: collaborators.signer,
                engine: collaborators.engine,
                datasets: collaborators.datasets,
                registry: collaborators.registry,
                awards: collaborators.awards,
                node_state: collaborators.node_state,
                events_tx,
                events_rx,
                running,
                pretop: ArcSwap::from_pointee([0u8; 32]),
                current_task: ArcSwapOption::empty(),
                history: ArcSwap::from_pointee(RoundHistory::new()),
                timer,
                broadcaster,
                handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Starts the coordinator; calling twice is a no-op.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }

        // Discard anything left over from a previous run.
        while self.shared.events_rx.try_recv().is_ok() {}

        let shared = self.shared.clone();
        let pow_loop = std::thread::spawn(move || PowLoop::new(shared).run());
        if let Ok(mut handles) = self.shared.handles.lock() {
            handles.push(self.shared.timer.spawn());
            handles.push(self.shared.broadcaster.spawn());
            handles.push(pow_loop);
        }
    }

    /// Signals all execution units to halt and waits for them to exit;
    /// calling twice is a no-op. In-flight hash evaluation is not
    /// interrupted: each thread exits at its next poll boundary, so a
    /// subsequent `start()` never shares the event queue with a previous
    /// generation's loop.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        let handles: Vec<JoinHandle<()>> = match self.shared.handles.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Whether the coordinator is currently running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Submits a miner's share for evaluation
    ///
    /// Non-blocking and safe to call from any thread; ignored while the
    /// coordinator is stopped.
    pub fn submit_share(&self, data: &[u8], miner: MinerRef) {
        if !self.is_running() {
            return;
        }
        log::debug!("received share from miner {:?}: {}", miner, hex::encode(data));
        let _ = self.shared.events_tx.send(Event::NewShare {
            data: data.to_vec(),
            miner,
        });
    }

    /// Notifies the coordinator of a possibly changed pretop
    ///
    /// A byte-exact match against the last-known pretop is a no-op;
    /// otherwise the stored pretop is refreshed from chain state and
    /// exactly one pretop-change event is enqueued. Duplicate or stale
    /// notifications are inherently idempotent.
    pub fn notify_new_pretop(&self, candidate: &Hash256) {
        if !self.is_running() {
            return;
        }
        if **self.shared.pretop.load() == *candidate {
            return;
        }
        let fresh = self.shared.chain.pre_top();
        self.shared.pretop.store(Arc::new(fresh));
        let _ = self.shared.events_tx.send(Event::NewPretop(*candidate));
    }

    /// Returns the currently published task, if a round is active.
    pub fn current_task(&self) -> Option<Arc<Task>> {
        self.shared.current_task.load_full()
    }

    /// Returns a snapshot of the per-epoch best-share history ring
    ///
    /// Award collaborators read this to retroactively credit the miner
    /// whose share won an epoch once that epoch finalizes. Snapshots are
    /// immutable; every improving share publishes a fresh one.
    pub fn round_history(&self) -> Arc<RoundHistory> {
        self.shared.history.load_full()
    }

    /// Queues an externally received block for relay broadcast, reusing
    /// the broadcaster thread. Ignored while stopped.
    pub fn relay_block(&self, block: crate::chain::Block) {
        if !self.is_running() {
            return;
        }
        let wrapper = BlockWrapper::new(block, self.shared.config.block_ttl);
        if let Err(e) = self.shared.broadcaster.broadcast(wrapper) {
            log::error!("failed to queue relay block: {}", e);
        }
    }
}

/// Per-thread state of the event loop: the single writer of all round
/// state.
struct PowLoop {
    shared: Arc<Shared>,
    builder: TaskBuilder,
    evaluator: ShareEvaluator,
    round: Option<Round>,
    history: RoundHistory,
    armed_deadline: i64,
}

impl PowLoop {
    fn new(shared: Arc<Shared>) -> Self {
        let builder = TaskBuilder::new(
            shared.chain.clone(),
            shared.signer.clone(),
            shared.engine.clone(),
            shared.datasets.clone(),
            shared.registry.clone(),
            shared.awards.clone(),
        );
        let evaluator = ShareEvaluator::new(
            shared.engine.clone(),
            shared.registry.clone(),
            shared.config.award_epoch_mask,
        );
        PowLoop {
            shared,
            builder,
            evaluator,
            round: None,
            history: RoundHistory::new(),
            armed_deadline: -1,
        }
    }

    fn run(&mut self) {
        log::info!("PoW main loop starting");
        self.arm_startup_timeout();
        self.shared.history.store(Arc::new(self.history.clone()));
        self.shared
            .pretop
            .store(Arc::new(self.shared.chain.pre_top()));

        let poll = Duration::from_millis(self.shared.config.poll_interval_ms);
        while self.shared.running.load(Ordering::SeqCst) {
            match self.shared.events_rx.recv_timeout(poll) {
                Ok(event) => self.dispatch(event),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::info!("PoW main loop stopped");
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::NewShare { data, miner } => self.on_new_share(&data, miner),
            Event::Timeout { deadline } => {
                if deadline != self.armed_deadline {
                    log::trace!("discarding stale timeout for deadline {}", deadline);
                    return;
                }
                if self.can_produce() {
                    self.on_timeout();
                }
            }
            Event::NewPretop(pretop) => {
                if self.can_produce() {
                    self.on_new_pretop(&pretop);
                }
            }
            Event::NewDiff => {}
        }
    }

    fn can_produce(&self) -> bool {
        self.shared.node_state.sync_state().can_produce_blocks()
    }

    /// Shares are always evaluated, regardless of the sync gate: scoring
    /// is cheap and must not stall behind sync state.
    fn on_new_share(&mut self, data: &[u8], miner: MinerRef) {
        let Some(round) = self.round.as_mut() else {
            log::trace!("share before first task, ignoring");
            return;
        };
        match self.evaluator.process(data, miner, round, &mut self.history) {
            Ok(_) => self.shared.history.store(Arc::new(self.history.clone())),
            Err(e) => log::warn!("share dropped: {}", e),
        }
    }

    /// Arms the first deadline a short grace past now. The grace is a
    /// few raw ticks, so within an epoch this lands on the current
    /// epoch's end and the first round starts at the same boundary
    /// steady-state rounds do.
    fn arm_startup_timeout(&mut self) {
        let grace = self.shared.config.startup_grace;
        self.reset_timeout(end_of_epoch(current_timestamp() + grace));
    }

    fn on_timeout(&mut self) {
        self.finalize_round();
        self.new_round();
    }

    /// A better chain tip makes the in-flight candidate stale: abandon
    /// it (no finalize, no broadcast) and restart against the new base.
    fn on_new_pretop(&mut self, pretop: &Hash256) {
        log::debug!("new pretop {}, restarting round", hex::encode(pretop));
        self.new_round();
    }

    fn finalize_round(&mut self) {
        let Some(round) = &self.round else {
            return;
        };

        let block_hash = self.shared.engine.block_hash(round.block.as_bytes());
        log::debug!(
            "broadcasting locally generated block, waiting to be verified, hash {}",
            hex::encode(block_hash)
        );

        if let Err(e) = self.shared.chain.try_connect(&round.block) {
            log::warn!("finalized block not connected: {}", e);
        }
        self.shared
            .awards
            .on_round_finalized(&round.min_share, &block_hash, round.block.timestamp());

        let wrapper = BlockWrapper::new(round.block.clone(), self.shared.config.block_ttl);
        if let Err(e) = self.shared.broadcaster.broadcast(wrapper) {
            log::error!("{}", e);
        }
    }

    fn new_round(&mut self) {
        let send_time = main_time();
        self.reset_timeout(send_time);
        let round = self.builder.start_round(send_time);
        self.shared.current_task.store(Some(round.task.clone()));
        self.round = Some(round);
    }

    /// Re-arms the timer; recording the new deadline also invalidates
    /// any timeout still queued for the previous one.
    fn reset_timeout(&mut self, deadline: i64) {
        match self.shared.timer.arm(deadline) {
            Ok(()) => self.armed_deadline = deadline,
            Err(e) => log::error!("failed to arm round timer: {}", e),
        }
    }
}
