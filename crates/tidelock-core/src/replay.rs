//! Bounded-memory replay protection.
//!
//! Tracks the highest accepted sequence number per slot. Memory stays
//! bounded by evicting slots that have fallen out of the drift window plus
//! a small margin; packets for those slots are already rejected by the
//! window check before replay tracking is consulted.

use std::collections::BTreeMap;

/// Extra slots kept beyond the drift window before eviction.
///
/// Covers the window check and the replay check observing slightly
/// different "current slot" values around a slot boundary.
const EVICTION_MARGIN: u64 = 2;

/// Per-slot highest-accepted-sequence tracker.
///
/// # Invariants
///
/// - No (slot, sequence) pair is ever accepted twice
/// - At most `drift_window + margin + 1` slots are tracked after any call
#[derive(Debug)]
pub struct ReplayGuard {
    /// Highest accepted sequence per slot
    highest: BTreeMap<u64, u64>,
    drift_window: u64,
}

impl ReplayGuard {
    /// Create a guard for the given drift window.
    pub fn new(drift_window: u64) -> Self {
        Self { highest: BTreeMap::new(), drift_window }
    }

    /// Check a (slot, sequence) pair and record it if acceptable.
    ///
    /// Returns `false` without mutating anything when the sequence is not
    /// strictly greater than the highest already accepted for that slot.
    /// Out-of-order delivery within one slot is therefore rejected as a
    /// replay; senders allocate sequences monotonically per slot, so this
    /// only drops packets that were genuinely reordered or duplicated.
    ///
    /// `current_slot` is the receiver's current normalized slot, used for
    /// eviction after an accept.
    pub fn check_and_accept(&mut self, slot: u64, sequence: u64, current_slot: u64) -> bool {
        if let Some(&highest) = self.highest.get(&slot) {
            if sequence <= highest {
                return false;
            }
        }

        self.highest.insert(slot, sequence);
        self.evict(current_slot);
        true
    }

    /// Number of slots currently tracked (diagnostic only).
    pub fn tracked_slots(&self) -> usize {
        self.highest.len()
    }

    /// Drop all tracked state.
    ///
    /// Called on a secret rotation: a new generation is a trust boundary
    /// and its (slot, sequence) space starts clean.
    pub fn clear(&mut self) {
        self.highest.clear();
    }

    fn evict(&mut self, current_slot: u64) {
        let budget = (self.drift_window + EVICTION_MARGIN) as usize;
        if self.highest.len() <= budget {
            return;
        }

        let min_valid = current_slot.saturating_sub(self.drift_window + EVICTION_MARGIN);
        self.highest = self.highest.split_off(&min_valid);
    }
}
