// src/pow/mod.rs
//! Proof-of-work round machinery
//!
//! The coordinator, its event loop, and the execution units it spawns.
//! All round state is owned by the loop thread; the other modules here
//! either feed its event queue or consume its output.

/// The coordinator, its event queue and the single-writer event loop
pub mod coordinator;

/// Per-share scoring and the round-history ring
pub mod evaluator;

/// Mining task construction at round start
pub mod task;

/// The round-deadline timer thread
pub mod timer;

/// The background block-broadcast thread
pub mod broadcaster;

// Re-export main components for cleaner imports
pub use broadcaster::BlockBroadcaster;
pub use coordinator::{Collaborators, Event, PowCoordinator};
pub use evaluator::{HISTORY_SLOTS, RoundHistory, ShareEvaluator};
pub use task::{Round, Task, TaskBuilder, TaskField};
pub use timer::RoundTimer;
