//! Fuzz target for Packet::decode
//!
//! This fuzzer tests packet decoding with arbitrary byte sequences to find:
//! - Parser crashes or panics
//! - Integer overflows in length calculations
//! - Buffer over-reads
//! - Malformed headers that bypass validation
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tidelock_proto::Packet;

fuzz_target!(|data: &[u8]| {
    // Both framing variants must reject bad input with an error, never panic
    for with_generation in [false, true] {
        if let Ok(packet) = Packet::decode(data, with_generation) {
            // Anything that decodes must re-encode byte-for-byte
            let encoded = packet.encode_to_vec();
            assert_eq!(encoded, data, "decode/encode must round-trip");
        }
    }
});
