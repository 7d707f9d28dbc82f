//! Fuzz target for slot key derivation and sealing
//!
//! Tests HKDF slot-key derivation and the AEAD layer under adversarial
//! inputs.
//!
//! # Strategy
//!
//! - Arbitrary secrets, contexts, and role tags
//! - Boundary slot and sequence values (0, MAX)
//! - Seal/open with derived keys, then corrupted variants
//! - Ratchet chains advanced arbitrary distances
//!
//! # Invariants
//!
//! - Derivation is deterministic (same inputs produce the same key)
//! - Slot, context, and role each separate the key space
//! - Seal/open round-trips; any corruption fails the tag check
//! - Chain rotation is deterministic and retains exactly one prior secret

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tidelock_crypto::{SecretChain, derive_slot_key, open, seal};

#[derive(Debug, Arbitrary)]
struct KeyScenario {
    secret: [u8; 32],
    context: Vec<u8>,
    role: Option<Vec<u8>>,
    slot: u64,
    sequence: u64,
    plaintext: Vec<u8>,
    associated_data: Vec<u8>,
    nonce_random: [u8; 4],
    rotations: u8,
}

fuzz_target!(|scenario: KeyScenario| {
    let role = scenario.role.as_deref();

    // INVARIANT 1: derivation is deterministic
    let key = derive_slot_key(&scenario.secret, &scenario.context, scenario.slot, role);
    let again = derive_slot_key(&scenario.secret, &scenario.context, scenario.slot, role);
    assert_eq!(key.key(), again.key(), "derivation must be deterministic");

    // INVARIANT 2: adjacent slots produce different keys
    if scenario.slot < u64::MAX {
        let next = derive_slot_key(&scenario.secret, &scenario.context, scenario.slot + 1, role);
        assert_ne!(key.key(), next.key(), "different slots must produce different keys");
    }

    // INVARIANT 3: seal/open round-trips
    let ciphertext = seal(
        &key,
        &scenario.plaintext,
        scenario.slot,
        scenario.sequence,
        &scenario.associated_data,
        scenario.nonce_random,
    );
    let opened = open(
        &key,
        &ciphertext,
        scenario.slot,
        scenario.sequence,
        &scenario.associated_data,
        scenario.nonce_random,
    );
    assert_eq!(opened.as_deref(), Ok(scenario.plaintext.as_slice()), "round trip must succeed");

    // INVARIANT 4: flipping any ciphertext byte fails authentication
    if !ciphertext.is_empty() {
        let mut corrupted = ciphertext.clone();
        let index = usize::from(scenario.nonce_random[0]) % corrupted.len();
        corrupted[index] ^= 0xFF;
        let result = open(
            &key,
            &corrupted,
            scenario.slot,
            scenario.sequence,
            &scenario.associated_data,
            scenario.nonce_random,
        );
        assert!(result.is_err(), "corrupted ciphertext must fail");
    }

    // INVARIANT 5: rotation is deterministic and keeps one prior secret
    let mut chain = SecretChain::new(&scenario.secret);
    let mut shadow = SecretChain::new(&scenario.secret);
    for expected in 1..=u64::from(scenario.rotations % 16) {
        chain.rotate();
        shadow.rotate();
        assert_eq!(chain.generation(), expected);
        assert_eq!(chain.current(), shadow.current(), "chains must stay in lockstep");

        let prior_marker = chain.marker().wrapping_sub(1);
        assert!(chain.secret_for_marker(prior_marker).is_some(), "prior secret must be retained");
        assert!(
            chain.secret_for_marker(prior_marker.wrapping_sub(1)).is_none(),
            "only one prior generation is retained"
        );
    }
});
