//! # Hashing Utilities
//!
//! SHA-256 is the only hash function this protocol speaks. Key derivation,
//! signature challenges, account ids, transaction ids and message keys all
//! run through it, frequently as a *chained* digest where one input is fed
//! after another into the same running state. These helpers make that
//! chaining explicit instead of allocating concatenated buffers.

use sha2::{Digest, Sha256};

/// SHA-256 of a single input.
///
/// # Example
///
/// ```
/// use nxt_protocol::crypto::hash::sha256;
///
/// let hash = sha256(b"");
/// assert_eq!(
///     hex::encode(hash),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 over the concatenation of `parts`, fed in order into a single
/// running digest.
///
/// `sha256_chain(&[a, b])` equals `sha256(a || b)` without building the
/// concatenated buffer.
pub fn sha256_chain(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
