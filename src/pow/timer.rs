// src/pow/timer.rs
//! Round timeout timer
//!
//! A single background thread sleep-polls the wall clock against an
//! armed deadline and enqueues exactly one timeout event when it
//! expires, then disarms itself until re-armed. The fired event carries
//! the deadline it was armed for, so the coordinator can discard stale
//! timeouts left over from a superseded round.

use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::pow::coordinator::Event;
use crate::utils::error::PowError;
use crate::utils::time::current_timestamp;

/// Sentinel for "no deadline armed".
const DISARMED: i64 = -1;

/// Background ticker that fires one timeout per armed deadline
///
/// Cloneable handle; all clones share the same deadline and run flag.
/// The timer only ever produces events, it never reads round state.
#[derive(Clone)]
pub struct RoundTimer {
    deadline: Arc<AtomicI64>,
    running: Arc<AtomicBool>,
    events: Sender<Event>,
    poll: Duration,
}

impl RoundTimer {
    /// Creates a disarmed timer
    ///
    /// # Arguments
    /// * `events` - The coordinator's shared event queue
    /// * `running` - Cooperative shutdown flag shared with the coordinator
    /// * `poll` - Sleep interval between deadline checks
    pub fn new(events: Sender<Event>, running: Arc<AtomicBool>, poll: Duration) -> Self {
        RoundTimer {
            deadline: Arc::new(AtomicI64::new(DISARMED)),
            running,
            events,
            poll,
        }
    }

    /// Arms the timer for `deadline` (XDAG timestamp)
    ///
    /// Replaces any previously armed deadline. A past or equal deadline
    /// still fires promptly on the next poll tick.
    ///
    /// # Errors
    /// [`PowError::Config`] for negative deadlines; never clamped.
    pub fn arm(&self, deadline: i64) -> Result<(), PowError> {
        if deadline < 0 {
            return Err(PowError::Config(format!(
                "timer deadline must not be negative, got {}",
                deadline
            )));
        }
        self.deadline.store(deadline, Ordering::SeqCst);
        Ok(())
    }

    /// Returns the currently armed deadline, or -1 when disarmed.
    pub fn armed_deadline(&self) -> i64 {
        self.deadline.load(Ordering::SeqCst)
    }

    /// Spawns the polling thread; it exits when the run flag clears.
    pub fn spawn(&self) -> JoinHandle<()> {
        let timer = self.clone();
        std::thread::spawn(move || timer.run())
    }

    fn run(&self) {
        while self.running.load(Ordering::SeqCst) {
            let deadline = self.deadline.load(Ordering::SeqCst);
            if deadline != DISARMED && current_timestamp() > deadline {
                // Disarm first; a concurrent re-arm wins over firing.
                if self
                    .deadline
                    .compare_exchange(deadline, DISARMED, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    let _ = self.events.send(Event::Timeout { deadline });
                }
                continue;
            }
            std::thread::sleep(self.poll);
        }
    }
}
