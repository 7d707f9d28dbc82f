//! Fuzz target for Channel::open
//!
//! Drives a receiving channel with adversarial wire bytes and adversarial
//! configurations.
//!
//! # Strategy
//!
//! - Arbitrary raw bytes fed straight to `open`
//! - Legitimate packets from a paired sender, then corrupted variants
//! - Configurations spanning prime strategies, jitter, and rotation
//!
//! # Invariants
//!
//! - `open` never panics, whatever the input
//! - Packets sealed by a matching sender always open once
//! - A byte-identical replay always fails
//! - Any single-byte corruption of a valid packet fails

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tidelock_core::{Channel, Config, JitterRange, ManualEnvironment, PrimeStrategy};

#[derive(Debug, Arbitrary)]
struct OpenScenario {
    secret: [u8; 32],
    /// Base unix time in seconds, kept clear of u64 overflow territory
    base_secs: u32,
    slot_secs: u8,
    drift_window: u8,
    strategy: StrategyChoice,
    jittered: bool,
    rotating: bool,
    /// Raw adversarial inputs
    garbage: Vec<Vec<u8>>,
    /// Legitimate plaintexts to seal and open
    messages: Vec<Vec<u8>>,
    /// (message index, byte index) corruption picks
    corruptions: Vec<(u8, u8)>,
}

#[derive(Debug, Arbitrary)]
enum StrategyChoice {
    None,
    Nearest,
    Next,
}

impl StrategyChoice {
    fn into_strategy(self) -> PrimeStrategy {
        match self {
            StrategyChoice::None => PrimeStrategy::None,
            StrategyChoice::Nearest => PrimeStrategy::Nearest,
            StrategyChoice::Next => PrimeStrategy::Next,
        }
    }
}

fuzz_target!(|scenario: OpenScenario| {
    let config = Config {
        slot_duration: Duration::from_secs(u64::from(scenario.slot_secs).max(1)),
        drift_window: u64::from(scenario.drift_window % 8),
        prime_strategy: scenario.strategy.into_strategy(),
        jitter: scenario.jittered.then_some(JitterRange {
            min: Duration::from_secs(2),
            max: Duration::from_secs(10),
        }),
        refresh_interval: scenario.rotating.then_some(Duration::from_secs(3600)),
        ..Config::default()
    };

    let env = ManualEnvironment::new(Duration::from_secs(u64::from(scenario.base_secs)), 7);
    let sender = Channel::with_env(&scenario.secret, config.clone(), env.clone())
        .expect("config is valid by construction");
    let receiver = Channel::with_env(&scenario.secret, config, env)
        .expect("config is valid by construction");

    // INVARIANT 1: arbitrary bytes never panic the receiver
    for bytes in &scenario.garbage {
        let _ = receiver.open(bytes, b"");
    }

    let mut packets = Vec::new();
    for message in scenario.messages.iter().take(16) {
        let packet = sender.seal(message, b"");

        // INVARIANT 2: a matching sender's packet opens exactly once
        let opened = receiver.open(&packet, b"");
        assert_eq!(opened.as_deref(), Ok(message.as_slice()), "valid packet must open");

        // INVARIANT 3: the byte-identical replay fails
        assert!(receiver.open(&packet, b"").is_err(), "replay must fail");

        packets.push(packet);
    }

    // INVARIANT 4: single-byte corruption of a consumed packet fails
    for &(message_index, byte_index) in &scenario.corruptions {
        let Some(packet) = packets.get(usize::from(message_index) % packets.len().max(1)) else {
            continue;
        };
        let mut corrupted = packet.clone();
        let index = usize::from(byte_index) % corrupted.len();
        corrupted[index] ^= 0x01;
        assert!(receiver.open(&corrupted, b"").is_err(), "corrupted packet must fail");
    }
});
