//! # Cryptographic Primitives
//!
//! Everything the transaction layer signs, hashes or encrypts flows through
//! here. The ledger fixes every algorithm, so none of this is a choice:
//!
//! - **Curve25519** in its Montgomery form for both key agreement and a
//!   deterministic KCDSA-style signature (not Ed25519).
//! - **SHA-256** for key derivation, signature challenges, ids and message
//!   keys.
//! - **AES-256-CBC** with PKCS#7 padding for attached messages, keyed by a
//!   Diffie-Hellman secret mixed with a per-message nonce.
//! - **Reed-Solomon** over GF(32) for checksummed account addresses.
//!
//! The field and group arithmetic comes from `curve25519-dalek`, the block
//! cipher from `aes`. What lives in this module is the glue that makes them
//! produce the exact bytes the network expects.

pub mod curve;
pub mod encryption;
pub mod hash;
pub mod keys;
pub mod payload;
pub mod reed_solomon;
pub mod signatures;

use thiserror::Error;

pub use hash::sha256;
pub use keys::{account_id, parse_account_id, KeyPair, PrivateKey, PublicKey};
pub use payload::EncryptedPayload;
pub use signatures::{sign, verify, Signature};

/// Errors from key handling, signing, encryption and address decoding.
///
/// Decryption failures deliberately do not say whether the key or the data
/// was wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("public key is not canonical")]
    NonCanonicalPublicKey,

    #[error("signature is not canonical")]
    NonCanonicalSignature,

    #[error("invalid {what} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid ciphertext length {0}: must be a positive multiple of 16 after the IV")]
    InvalidCiphertextLength(usize),

    #[error("decryption failed: bad padding")]
    InvalidPadding,

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("invalid address character {0:?}")]
    InvalidAddressSymbol(char),

    #[error("invalid address length: expected 17 symbols, got {0}")]
    InvalidAddressLength(usize),

    #[error("address checksum does not match")]
    AddressChecksum,

    #[error("address does not re-encode to {0:?}")]
    AddressMismatch(String),

    #[error("invalid account reference {0:?}")]
    InvalidAccountId(String),
}
