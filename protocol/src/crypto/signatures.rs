//! # Digital Signatures
//!
//! Deterministic Curve25519 signatures, byte-compatible with the ledger.
//!
//! Signing a message `M` with private key `k`:
//!
//! 1. `(P, s) = keygen(k)`, the public key and signing scalar.
//! 2. `m = SHA256(M)`
//! 3. `x = SHA256(m ‖ s)`, clamped; `Y = keygen(x)`
//! 4. `h = SHA256(m ‖ Y)`
//! 5. `v = (x - h)·s mod q`
//!
//! The signature is `v ‖ h`. No randomness is involved, so the same key and
//! message always give the same 64 bytes. Verification recomputes `Y` from
//! `(v, h, P)` and checks that hashing it again reproduces `h`.
//!
//! ## Strictness
//!
//! `verify` takes an `enforce_canonical` flag. With it set, signatures whose
//! `v` is not fully reduced and public keys at or above `p` are rejected
//! before any curve arithmetic. Transaction verification always sets it;
//! the lenient mode exists for checking arbitrary historical data.

use std::fmt;

use tracing::debug;

use super::curve;
use super::hash::{sha256, sha256_chain};
use super::keys::{PrivateKey, PublicKey};
use super::CryptoError;
use crate::config::SIGNATURE_LENGTH;
use crate::numeric::parse_hex_array;

/// A 64-byte signature: response `v` followed by challenge `h`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn try_from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SIGNATURE_LENGTH] =
            slice.try_into().map_err(|_| CryptoError::InvalidLength {
                what: "signature",
                expected: SIGNATURE_LENGTH,
                actual: slice.len(),
            })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        parse_hex_array(text)
            .map(Self)
            .map_err(|_| CryptoError::InvalidLength {
                what: "signature",
                expected: SIGNATURE_LENGTH,
                actual: text.len() / 2,
            })
    }

    /// True when `v` is reduced mod the group order.
    pub fn is_canonical(&self) -> bool {
        curve::is_canonical_signature(&self.0)
    }

    fn halves(&self) -> ([u8; 32], [u8; 32]) {
        let mut v = [0u8; 32];
        let mut h = [0u8; 32];
        v.copy_from_slice(&self.0[..32]);
        h.copy_from_slice(&self.0[32..]);
        (v, h)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

/// Signs `message` with `private_key`.
///
/// # Example
///
/// ```
/// use nxt_protocol::crypto::{sign, verify, PrivateKey};
///
/// let key = PrivateKey::from_secret_phrase("example");
/// let signature = sign(b"message", &key).unwrap();
///
/// assert!(verify(&signature, b"message", &key.public_key(), true));
/// assert_eq!(signature, sign(b"message", &key).unwrap());
/// ```
pub fn sign(message: &[u8], private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let keys = curve::keygen(private_key.as_bytes());
    let m = sha256(message);

    let mut x = sha256_chain(&[&m, &keys.signing_key]);
    curve::clamp(&mut x);
    let y = curve::public_key(&x);
    let h = sha256_chain(&[&m, &y]);
    let v = curve::sign(&h, &x, &keys.signing_key);

    let mut bytes = [0u8; SIGNATURE_LENGTH];
    bytes[..32].copy_from_slice(&v);
    bytes[32..].copy_from_slice(&h);
    let signature = Signature(bytes);

    if !signature.is_canonical() {
        return Err(CryptoError::NonCanonicalSignature);
    }
    Ok(signature)
}

/// Verifies `signature` over `message` against `public_key`.
///
/// Returns `false` for any failure; the reason is only logged at `debug`.
pub fn verify(
    signature: &Signature,
    message: &[u8],
    public_key: &PublicKey,
    enforce_canonical: bool,
) -> bool {
    if enforce_canonical {
        if !signature.is_canonical() {
            debug!("rejecting non-canonical signature");
            return false;
        }
        if !public_key.is_canonical() {
            debug!(public_key = %public_key, "rejecting non-canonical public key");
            return false;
        }
    }

    let (v, h) = signature.halves();
    let Some(y) = curve::verify(&v, &h, public_key.as_bytes()) else {
        debug!(public_key = %public_key, "public key is not on the curve");
        return false;
    };
    let h2 = sha256_chain(&[&sha256(message), &y]);
    h == h2
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "nxt transaction core test phrase";

    #[test]
    fn known_signature_vector() {
        let key = PrivateKey::from_secret_phrase(PHRASE);
        let signature = sign(b"hello nxt", &key).unwrap();
        assert_eq!(
            signature.to_hex(),
            "0a730e79c912970eb497093f798692b532d9ae2f4518791107e80efe7c45a602\
             4ccf33ba38618fc1073659ba076fbc47355245fc602c32770f283e823f5fc725"
        );
        assert!(verify(&signature, b"hello nxt", &key.public_key(), true));
    }

    #[test]
    fn signing_is_deterministic() {
        let key = PrivateKey::from_secret_phrase("determinism");
        assert_eq!(sign(b"msg", &key).unwrap(), sign(b"msg", &key).unwrap());
    }

    #[test]
    fn wrong_message_fails_verification() {
        let key = PrivateKey::from_secret_phrase(PHRASE);
        let signature = sign(b"correct message", &key).unwrap();
        assert!(!verify(&signature, b"wrong message", &key.public_key(), true));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let a = PrivateKey::from_secret_phrase("a");
        let b = PrivateKey::from_secret_phrase("b");
        let signature = sign(b"message", &a).unwrap();
        assert!(!verify(&signature, b"message", &b.public_key(), true));
    }

    #[test]
    fn every_flipped_signature_byte_fails() {
        let key = PrivateKey::from_secret_phrase(PHRASE);
        let signature = sign(b"flip", &key).unwrap();
        for i in 0..SIGNATURE_LENGTH {
            let mut bytes = *signature.as_bytes();
            bytes[i] ^= 0x01;
            let tampered = Signature::from_bytes(bytes);
            assert!(
                !verify(&tampered, b"flip", &key.public_key(), true),
                "byte {i}"
            );
        }
    }

    #[test]
    fn empty_message_signs() {
        let key = PrivateKey::from_secret_phrase(PHRASE);
        let signature = sign(b"", &key).unwrap();
        assert!(verify(&signature, b"", &key.public_key(), true));
    }

    #[test]
    fn non_canonical_signature_rejected_only_when_enforced() {
        let key = PrivateKey::from_secret_phrase(PHRASE);
        let signature = sign(b"malleable", &key).unwrap();

        // v + q verifies under lenient mode but is not canonical.
        const Q: [u8; 32] = [
            0xed, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58, 0xd6, 0x9c, 0xf7, 0xa2, 0xde, 0xf9,
            0xde, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x10,
        ];
        let mut bytes = *signature.as_bytes();
        let mut carry = 0u16;
        for i in 0..32 {
            let sum = bytes[i] as u16 + Q[i] as u16 + carry;
            bytes[i] = sum as u8;
            carry = sum >> 8;
        }
        if carry == 0 {
            let malleated = Signature::from_bytes(bytes);
            assert!(!malleated.is_canonical());
            assert!(!verify(&malleated, b"malleable", &key.public_key(), true));
            assert!(verify(&malleated, b"malleable", &key.public_key(), false));
        }
    }

    #[test]
    fn hex_round_trip() {
        let key = PrivateKey::from_secret_phrase(PHRASE);
        let signature = sign(b"hex", &key).unwrap();
        assert_eq!(Signature::from_hex(&signature.to_hex()).unwrap(), signature);
        assert!(Signature::from_hex("00").is_err());
    }
}
