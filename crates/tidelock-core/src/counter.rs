//! Sender-side per-slot sequence allocation.

use std::collections::BTreeMap;

/// Slots retained behind the newest one before pruning.
///
/// Purely memory hygiene: the sender never needs to forget a counter for
/// correctness, it only needs nonce/sequence uniqueness going forward, and
/// a pruned slot is one the sender will never seal for again (wall time has
/// moved past it).
const RETAINED_SLOTS: u64 = 8;

/// Monotonic per-slot sequence number generator.
#[derive(Debug, Default)]
pub struct MessageCounter {
    counters: BTreeMap<u64, u64>,
}

impl MessageCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next sequence number for a slot, starting at 0.
    pub fn next(&mut self, slot: u64) -> u64 {
        let counter = self.counters.entry(slot).or_insert(0);
        let sequence = *counter;
        *counter += 1;

        self.prune(slot);
        sequence
    }

    /// Number of slots currently tracked (diagnostic only).
    pub fn tracked_slots(&self) -> usize {
        self.counters.len()
    }

    fn prune(&mut self, newest: u64) {
        if self.counters.len() <= RETAINED_SLOTS as usize {
            return;
        }
        let min_valid = newest.saturating_sub(RETAINED_SLOTS);
        // Keep anything at or above the cutoff; with nearest-prime
        // normalization a later slot can be numerically smaller, and the
        // cutoff slack covers that
        self.counters = self.counters.split_off(&min_valid);
    }
}
