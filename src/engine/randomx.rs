// src/engine/randomx.rs
//! RandomX dataset rotation and hashing
//!
//! The memory-hard dataset is double-buffered across epochs: while one
//! dataset is active, the next epoch's dataset is prepared in the other
//! slot. Exactly one slot is current at any wall-clock time. Slot
//! selection is a pure function over the two switch times; the
//! `switched` flag is flipped at most once per activation and is read by
//! hashing threads, so it is an atomic rather than a plain field.

use rust_randomx::{Context, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::types::Hash256;
use crate::utils::error::PowError;

/// One epoch's dataset metadata: activation seed, the epoch at which it
/// becomes active, and whether the coordinator has observed the switch.
#[derive(Debug)]
pub struct DatasetSlot {
    seed: Hash256,
    switch_time: i64,
    switched: AtomicBool,
}

impl DatasetSlot {
    /// Creates a slot that activates at `switch_time` (epoch units).
    pub fn new(seed: Hash256, switch_time: i64) -> Self {
        DatasetSlot {
            seed,
            switch_time,
            switched: AtomicBool::new(false),
        }
    }

    /// The dataset's activation seed.
    pub fn seed(&self) -> Hash256 {
        self.seed
    }

    /// The epoch at which this dataset becomes active.
    pub fn switch_time(&self) -> i64 {
        self.switch_time
    }

    /// Whether the switch to this dataset has been observed.
    pub fn is_switched(&self) -> bool {
        self.switched.load(Ordering::Acquire)
    }
}

/// Selects which of the two dataset slots is current at `now_epoch`
///
/// Picks the slot whose switch time has already passed, preferring the
/// more recently activated one when both have; when neither has passed
/// yet, the earlier-activating slot is chosen. Missing slots count as
/// switch time 0.
pub fn select_active_slot(now_epoch: i64, time0: Option<i64>, time1: Option<i64>) -> usize {
    let t0 = time0.unwrap_or(0);
    let t1 = time1.unwrap_or(0);
    match (now_epoch >= t0, now_epoch >= t1) {
        (true, true) => usize::from(t1 >= t0),
        (true, false) => 0,
        (false, true) => 1,
        (false, false) => usize::from(t1 < t0),
    }
}

/// The double-buffered pair of RandomX dataset epochs
///
/// Shared read-mostly between the coordinator (slot selection once per
/// round) and the hashing engine (seed lookup per share).
#[derive(Debug, Default)]
pub struct DatasetPair {
    slots: [RwLock<Option<DatasetSlot>>; 2],
}

impl DatasetPair {
    /// Creates a pair with both slots empty.
    pub fn new() -> Self {
        DatasetPair::default()
    }

    /// Installs a dataset epoch into a slot, clearing its switch flag.
    ///
    /// # Panics
    /// Panics if `index > 1`.
    pub fn install(&self, index: usize, seed: Hash256, switch_time: i64) {
        if let Ok(mut slot) = self.slots[index].write() {
            *slot = Some(DatasetSlot::new(seed, switch_time));
        }
    }

    /// Returns the seed of slot `index`, if installed.
    pub fn seed(&self, index: usize) -> Option<Hash256> {
        let slot = self.slots[index].read().ok()?;
        slot.as_ref().map(DatasetSlot::seed)
    }

    /// Returns the switch time of slot `index`, if installed.
    pub fn switch_time(&self, index: usize) -> Option<i64> {
        let slot = self.slots[index].read().ok()?;
        slot.as_ref().map(DatasetSlot::switch_time)
    }

    /// Returns whether slot `index` has observed its switch.
    pub fn is_switched(&self, index: usize) -> Option<bool> {
        let slot = self.slots[index].read().ok()?;
        slot.as_ref().map(DatasetSlot::is_switched)
    }

    /// Picks the slot that is current at `now_epoch`.
    pub fn select_active(&self, now_epoch: i64) -> usize {
        select_active_slot(now_epoch, self.switch_time(0), self.switch_time(1))
    }

    /// Marks slot `index` as switched if its switch time has elapsed and
    /// the flag is still unset. Returns `true` only on the single call
    /// that performs the flip.
    pub fn mark_switched(&self, index: usize, now_epoch: i64) -> bool {
        let Ok(slot) = self.slots[index].read() else {
            return false;
        };
        match slot.as_ref() {
            Some(s) if now_epoch >= s.switch_time => s
                .switched
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
            _ => false,
        }
    }
}

/// Per-slot cache of initialized RandomX contexts
///
/// Building a context is expensive (dataset generation), so contexts are
/// kept per slot and rebuilt only when the slot's seed rotates. Light
/// mode is used: the coordinator verifies shares, it does not search
/// nonces itself.
#[derive(Default)]
pub struct RandomXVmCache {
    contexts: Mutex<[Option<(Hash256, Arc<Context>)>; 2]>,
}

impl RandomXVmCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        RandomXVmCache::default()
    }

    /// Hashes `data` with the dataset that is active at `epoch`.
    pub fn hash(&self, datasets: &DatasetPair, data: &[u8], epoch: i64) -> Result<Hash256, PowError> {
        let slot = datasets.select_active(epoch);
        let seed = datasets.seed(slot).ok_or_else(|| {
            PowError::Hash(format!("no RandomX dataset installed in slot {}", slot))
        })?;
        let context = self.context_for(slot, seed)?;
        let hasher = Hasher::new(context);
        let output = hasher.hash(data);

        let mut hash = [0u8; 32];
        hash.copy_from_slice(output.as_ref());
        Ok(hash)
    }

    fn context_for(&self, slot: usize, seed: Hash256) -> Result<Arc<Context>, PowError> {
        let mut cache = self
            .contexts
            .lock()
            .map_err(|_| PowError::Hash("RandomX context cache poisoned".into()))?;

        let entry = &mut cache[slot];
        let context = match entry {
            Some((cached_seed, context)) if *cached_seed == seed => context.clone(),
            _ => {
                let context = Arc::new(Context::new(&seed, false));
                *entry = Some((seed, context.clone()));
                context
            }
        };
        Ok(context)
    }
}
