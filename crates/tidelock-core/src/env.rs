//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from system resources (wall-clock time,
//! randomness). Production code uses [`SystemEnvironment`]; tests use
//! [`ManualEnvironment`] with a settable clock and a seeded RNG so every
//! drift and rotation scenario is reproducible.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};

use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Abstract environment providing wall-clock time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `unix_now()` never goes backwards within one execution context
/// - `random_bytes()` uses cryptographically secure entropy in production
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time as a duration since the Unix epoch.
    ///
    /// Slot indices are derived from this value, so sender and receiver
    /// clocks must agree to within the configured drift window.
    fn unix_now(&self) -> Duration;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);
}

/// Production environment: system clock and OS entropy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn unix_now(&self) -> Duration {
        // A clock before the Unix epoch means the host clock is broken;
        // slot 0 is the only sane answer either way.
        SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buffer);
    }
}

/// Test environment with a manually driven clock and seeded RNG.
///
/// Clones share state, so a sender and receiver channel built from clones
/// of one `ManualEnvironment` observe the same clock.
#[derive(Debug, Clone)]
pub struct ManualEnvironment {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug)]
struct ManualState {
    now: Duration,
    rng: StdRng,
}

impl ManualEnvironment {
    /// Create an environment at the given Unix time with a seeded RNG.
    pub fn new(now: Duration, seed: u64) -> Self {
        Self { inner: Arc::new(Mutex::new(ManualState { now, rng: StdRng::seed_from_u64(seed) })) }
    }

    /// Set the clock to an absolute Unix time.
    ///
    /// Moving the clock backwards is allowed here (tests simulate skewed
    /// peers with separate environments), but production implementations
    /// must never do it.
    pub fn set_time(&self, now: Duration) {
        self.lock().now = now;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // A poisoned lock means a test already panicked; propagating the
        // inner state is fine for test-only code.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Environment for ManualEnvironment {
    fn unix_now(&self) -> Duration {
        self.lock().now
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.lock().rng.fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_environment_time_is_sane() {
        let env = SystemEnvironment;
        // Any machine running this is well past 2001-09-09 (1e9 seconds)
        assert!(env.unix_now() > Duration::from_secs(1_000_000_000));
    }

    #[test]
    fn system_environment_randomness_varies() {
        let env = SystemEnvironment;
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        env.random_bytes(&mut a);
        env.random_bytes(&mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn manual_environment_clock_is_controlled() {
        let env = ManualEnvironment::new(Duration::from_secs(100), 0);
        assert_eq!(env.unix_now(), Duration::from_secs(100));

        env.advance(Duration::from_secs(5));
        assert_eq!(env.unix_now(), Duration::from_secs(105));

        env.set_time(Duration::from_secs(50));
        assert_eq!(env.unix_now(), Duration::from_secs(50));
    }

    #[test]
    fn manual_environment_clones_share_clock() {
        let env = ManualEnvironment::new(Duration::from_secs(1), 0);
        let clone = env.clone();

        env.advance(Duration::from_secs(9));
        assert_eq!(clone.unix_now(), Duration::from_secs(10));
    }

    #[test]
    fn manual_environment_rng_is_deterministic() {
        let env_a = ManualEnvironment::new(Duration::ZERO, 7);
        let env_b = ManualEnvironment::new(Duration::ZERO, 7);

        let mut a = [0u8; 8];
        let mut b = [0u8; 8];
        env_a.random_bytes(&mut a);
        env_b.random_bytes(&mut b);
        assert_eq!(a, b, "same seed must produce same bytes");
    }
}
