//! Slot index normalization.
//!
//! An optional, deterministic `u64 -> u64` transform applied to raw slot
//! indices before any key derivation or wire encoding. No cryptographic
//! property is claimed for the prime strategies or required of them, and no
//! other component depends on their mathematical shape. They must only be
//! total, deterministic, and identical on both parties.

/// Slot normalization strategy.
///
/// `Nearest` is not monotonic: it can map a raw index to a smaller value
/// (e.g. 8 -> 7). That is an accepted property of the strategy, handled by
/// the receiver normalizing its drift-window candidates through the same
/// map rather than comparing raw indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrimeStrategy {
    /// Identity: use raw slot indices
    #[default]
    None,
    /// Round to the nearest prime, ties toward the next prime
    Nearest,
    /// Round up to the next prime >= the input
    Next,
}

impl PrimeStrategy {
    /// Normalize a raw slot index.
    ///
    /// Total over all of `u64`; inputs below 2 pass through unchanged under
    /// the prime strategies, matching the behavior both parties must share.
    pub fn normalize(self, slot: u64) -> u64 {
        match self {
            Self::None => slot,
            Self::Nearest | Self::Next if slot < 2 => slot,
            Self::Nearest => nearest_prime(slot),
            Self::Next => next_prime(slot),
        }
    }
}

/// Primality test by trial division over 6k±1 candidates.
///
/// Slot indices are wall-clock derived (a 1-second slot today is ~1.7e9),
/// so trial division up to sqrt(n) is plenty fast.
fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }

    let mut i = 5u64;
    while i.saturating_mul(i) <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Smallest prime >= n.
///
/// Prime gaps grow like O(log n), so the search terminates quickly. Above
/// the largest u64 prime (which no wall-clock slot reaches) the input is
/// returned unchanged rather than wrapping.
fn next_prime(n: u64) -> u64 {
    if n <= 2 {
        return 2;
    }

    let mut candidate = if n % 2 == 0 { n + 1 } else { n };
    loop {
        if is_prime(candidate) {
            return candidate;
        }
        match candidate.checked_add(2) {
            Some(next) => candidate = next,
            None => return n,
        }
    }
}

/// Largest prime <= n, if any.
fn previous_prime(n: u64) -> Option<u64> {
    if n < 2 {
        return None;
    }
    let mut candidate = n;
    loop {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate -= 1;
        if candidate < 2 {
            return None;
        }
    }
}

/// Prime nearest to n, preferring the next prime when equidistant.
fn nearest_prime(n: u64) -> u64 {
    if is_prime(n) {
        return n;
    }

    let next = next_prime(n);
    let Some(prev) = previous_prime(n) else {
        return next;
    };

    if next - n <= n - prev { next } else { prev }
}
