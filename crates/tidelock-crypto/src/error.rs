//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors produced by the primitive layer.
///
/// These are internal error kinds. The protocol layer collapses them into a
/// single opaque rejection before anything reaches a remote peer, so the
/// distinctions here exist for logging and tests only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// AEAD tag verification failed (wrong key, tampered data, or both).
    ///
    /// Deliberately carries no detail: the failure must look the same
    /// whether the key, nonce, ciphertext, or associated data was wrong.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// Shared secret is not exactly [`SECRET_SIZE`](crate::SECRET_SIZE) bytes.
    #[error("invalid secret length: expected 32 bytes, got {actual}")]
    InvalidSecretLength {
        /// Length of the secret that was supplied
        actual: usize,
    },
}
