//! # Key Management
//!
//! Curve25519 key pairs for ledger accounts.
//!
//! An account is controlled by a *secret phrase*. The private key is the
//! clamped SHA-256 of that phrase, the public key is the corresponding
//! Montgomery u-coordinate, and the account id is the first eight bytes of
//! SHA-256(public key) read little-endian. There is no random key generation
//! in the protocol itself; [`KeyPair::generate`] exists for tests and tools
//! and simply feeds random bytes through the same clamping.
//!
//! ## Security considerations
//!
//! - Private key bytes never appear in `Debug` output.
//! - Key material is never logged. If you add logging to this module, log
//!   public keys or account ids only.

use std::fmt;
use std::str::FromStr;

use rand_core::{CryptoRng, RngCore};

use super::curve;
use super::hash::sha256;
use super::reed_solomon;
use super::signatures::{self, Signature};
use super::CryptoError;
use crate::config::{ADDRESS_PREFIX, PUBLIC_KEY_LENGTH};
use crate::numeric::{full_hash_to_id, parse_hex_array, parse_unsigned_long};

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// A clamped Curve25519 private scalar.
///
/// Construction always clamps, so any value of this type is a valid scalar
/// for both signing and key agreement.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Derives the private key of a secret phrase: SHA-256 of its UTF-8
    /// bytes, clamped.
    pub fn from_secret_phrase(secret_phrase: &str) -> Self {
        Self::from_bytes(sha256(secret_phrase.as_bytes()))
    }

    /// Wraps raw scalar bytes, clamping them.
    pub fn from_bytes(mut bytes: [u8; 32]) -> Self {
        curve::clamp(&mut bytes);
        Self(bytes)
    }

    /// Random private key. Only for tests and throwaway accounts.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    /// Raw clamped scalar bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(curve::public_key(&self.0))
    }

    /// Diffie-Hellman shared secret with another account.
    pub fn shared_secret(&self, their_public_key: &PublicKey) -> [u8; 32] {
        curve::shared_secret(&self.0, their_public_key.as_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A Curve25519 public key (Montgomery u-coordinate, little-endian).
///
/// Any 32 bytes are accepted here; canonicality is checked where it
/// matters (key derivation and strict signature verification).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a slice, which must be exactly 32 bytes.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            slice.try_into().map_err(|_| CryptoError::InvalidLength {
                what: "public key",
                expected: PUBLIC_KEY_LENGTH,
                actual: slice.len(),
            })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses 64 hex digits.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        parse_hex_array(text)
            .map(Self)
            .map_err(|_| CryptoError::InvalidLength {
                what: "public key",
                expected: PUBLIC_KEY_LENGTH,
                actual: text.len() / 2,
            })
    }

    /// True when the key is the unique encoding of its field element.
    pub fn is_canonical(&self) -> bool {
        curve::is_canonical_public_key(&self.0)
    }

    /// Account id owning this key.
    pub fn account_id(&self) -> u64 {
        account_id(&self.0)
    }

    /// Reed-Solomon address of the owning account, with the `NXT-` prefix.
    pub fn rs_address(&self) -> String {
        rs_address(self.account_id())
    }

    /// Verifies a signature made by this key. See [`signatures::verify`].
    pub fn verify(&self, message: &[u8], signature: &Signature, enforce_canonical: bool) -> bool {
        signatures::verify(signature, message, self, enforce_canonical)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// ---------------------------------------------------------------------------
// KeyPair
// ---------------------------------------------------------------------------

/// A private key together with its public key.
///
/// # Examples
///
/// ```
/// use nxt_protocol::crypto::KeyPair;
///
/// let keys = KeyPair::from_secret_phrase("correct horse battery staple").unwrap();
/// let signature = keys.sign(b"send 1 NXT to bob").unwrap();
/// assert!(keys.public_key().verify(b"send 1 NXT to bob", &signature, true));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Key pair of a secret phrase.
    ///
    /// Fails if the derived public key is not canonical, which the network
    /// would refuse to accept for the account.
    pub fn from_secret_phrase(secret_phrase: &str) -> Result<Self, CryptoError> {
        Self::from_private_key(PrivateKey::from_secret_phrase(secret_phrase))
    }

    pub fn from_private_key(private_key: PrivateKey) -> Result<Self, CryptoError> {
        let public_key = private_key.public_key();
        if !public_key.is_canonical() {
            return Err(CryptoError::NonCanonicalPublicKey);
        }
        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Random key pair. Only for tests and throwaway accounts.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let private_key = PrivateKey::generate(rng);
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn account_id(&self) -> u64 {
        self.public_key.account_id()
    }

    pub fn rs_address(&self) -> String {
        self.public_key.rs_address()
    }

    /// Deterministic signature over `message`.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        signatures::sign(message, &self.private_key)
    }

    /// Diffie-Hellman shared secret with another account.
    pub fn shared_secret(&self, their_public_key: &PublicKey) -> [u8; 32] {
        self.private_key.shared_secret(their_public_key)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair(pub={})", self.public_key.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Account ids and addresses
// ---------------------------------------------------------------------------

/// Account id of a public key: SHA-256 of the key, first eight bytes
/// little-endian.
pub fn account_id(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> u64 {
    full_hash_to_id(&sha256(public_key))
}

/// Reed-Solomon address of an account id, including the `NXT-` prefix.
pub fn rs_address(account_id: u64) -> String {
    format!("{ADDRESS_PREFIX}{}", reed_solomon::encode(account_id))
}

/// Parses an account reference: either an unsigned decimal id or a
/// Reed-Solomon address with the `NXT-` prefix (any case).
pub fn parse_account_id(text: &str) -> Result<u64, CryptoError> {
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();
    if let Some(address) = upper.strip_prefix(ADDRESS_PREFIX) {
        return reed_solomon::decode(address);
    }
    parse_unsigned_long(trimmed).map_err(|_| CryptoError::InvalidAccountId(text.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
