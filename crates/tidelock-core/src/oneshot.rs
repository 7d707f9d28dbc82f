//! Stateless single-packet helpers.
//!
//! For callers that manage their own slot and sequence numbering (bench
//! harnesses, protocol bridges, tests). No replay protection, no secret
//! rotation, no generation marker; the 20-byte packet format is compatible
//! with a [`Channel`](crate::Channel) configured without a refresh
//! interval. Use a `Channel` for anything long-lived.

use tidelock_crypto::{SECRET_SIZE, derive_slot_key};
use tidelock_proto::{NONCE_RANDOM_SIZE, Packet, PacketHeader};

use crate::{
    env::Environment,
    error::{OpenError, RejectReason},
};

/// Seal one packet for an explicit (slot, sequence) pair.
///
/// The slot is used exactly as given; apply any normalization before
/// calling.
pub fn seal_packet(
    env: &impl Environment,
    secret: &[u8; SECRET_SIZE],
    context: &[u8],
    slot: u64,
    sequence: u64,
    plaintext: &[u8],
    associated_data: &[u8],
) -> Vec<u8> {
    let key = derive_slot_key(secret, context, slot, None);

    let mut nonce_random = [0u8; NONCE_RANDOM_SIZE];
    env.random_bytes(&mut nonce_random);

    let ciphertext =
        tidelock_crypto::seal(&key, plaintext, slot, sequence, associated_data, nonce_random);

    Packet::new(PacketHeader { generation: None, slot, sequence, nonce_random }, ciphertext)
        .encode_to_vec()
}

/// Open one packet against an explicit local slot.
///
/// Accepts the packet when its slot is within `drift_window` of
/// `local_slot` (plain distance; no normalization is applied here).
///
/// # Errors
///
/// The opaque [`OpenError`] on malformed framing, slot outside the window,
/// or failed authentication. Replays are NOT detected; that is the caller's
/// problem by choosing this API.
pub fn open_packet(
    secret: &[u8; SECRET_SIZE],
    context: &[u8],
    packet: &[u8],
    associated_data: &[u8],
    local_slot: u64,
    drift_window: u64,
) -> Result<Vec<u8>, OpenError> {
    let packet = Packet::decode(packet, false)?;
    let header = packet.header;

    let distance = local_slot.abs_diff(header.slot);
    if distance > drift_window {
        return Err(OpenError::new(RejectReason::SlotOutOfWindow));
    }

    let key = derive_slot_key(secret, context, header.slot, None);

    tidelock_crypto::open(
        &key,
        &packet.ciphertext,
        header.slot,
        header.sequence,
        associated_data,
        header.nonce_random,
    )
    .map_err(|_| OpenError::new(RejectReason::AuthenticationFailure))
}
