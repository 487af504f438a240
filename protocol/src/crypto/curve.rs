//! # Curve25519 Key Agreement and Signatures
//!
//! The ledger signs with a KCDSA-style scheme over Curve25519 rather than
//! Ed25519. Keys are Montgomery u-coordinates, and a signature is a pair
//! `(v, h)` of 32-byte little-endian scalars. The operations here are the
//! curve-level building blocks; [`super::signatures`] composes them into the
//! full hash-and-sign recipe.
//!
//! ## How the math maps onto `curve25519-dalek`
//!
//! Scalar multiplication runs on dalek's Edwards points and converts to the
//! Montgomery form with the standard birational map. The only thing dalek
//! does not expose is the Montgomery *v* coordinate, and the scheme needs
//! its parity: a public key `P` only carries `u`, so the verifier lifts it to
//! the point `|P|` whose `v` is even, and the signer picks the sign of its
//! signing scalar so that `s·|P| = G`. That parity is computed here with a
//! handful of `num-bigint` field operations (one square root, a few
//! inversions), which is cheap next to the scalar multiplications.
//!
//! Base point `G` has `u = 9` and an even `v`. The map
//! `v = sqrt(-486664)·u/x` with the RFC 7748 root sends dalek's Ed25519 base
//! point exactly there, so the two descriptions agree.

use std::sync::OnceLock;

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Fixes the low three bits and the top two bits of a private scalar.
pub fn clamp(key: &mut [u8; 32]) {
    key[31] &= 0x7F;
    key[31] |= 0x40;
    key[0] &= 0xF8;
}

/// Result of [`keygen`]: the public key and the signing scalar.
#[derive(Clone, Copy)]
pub struct Keygen {
    /// Montgomery u-coordinate of `k·G`.
    pub public_key: [u8; 32],
    /// `s` with `s·|P| = G`, reduced mod the group order.
    pub signing_key: [u8; 32],
}

/// Derives the public key and signing scalar from a private scalar. The
/// input is clamped before use.
pub fn keygen(private_key: &[u8; 32]) -> Keygen {
    let mut k = *private_key;
    clamp(&mut k);
    let scalar = Scalar::from_bytes_mod_order(k);
    let point = EdwardsPoint::mul_base(&scalar);

    // |P| is P itself when its v is even, otherwise -P, which is (-k)·G.
    let s = match montgomery_v_is_odd(&point) {
        Some(true) => -scalar,
        _ => scalar,
    };

    Keygen {
        public_key: point.to_montgomery().to_bytes(),
        signing_key: s.invert().to_bytes(),
    }
}

/// Public key for a private scalar (clamped before use).
pub fn public_key(private_key: &[u8; 32]) -> [u8; 32] {
    let mut k = *private_key;
    clamp(&mut k);
    EdwardsPoint::mul_base(&Scalar::from_bytes_mod_order(k))
        .to_montgomery()
        .to_bytes()
}

/// Signature response `v = (x - h)·s mod q`.
///
/// `x` is the clamped ephemeral private scalar, `h` the challenge hash and
/// `s` the signer's signing scalar from [`keygen`].
pub fn sign(h: &[u8; 32], x: &[u8; 32], s: &[u8; 32]) -> [u8; 32] {
    let h = Scalar::from_bytes_mod_order(*h);
    let x = Scalar::from_bytes_mod_order(*x);
    let s = Scalar::from_bytes_mod_order(*s);
    ((x - h) * s).to_bytes()
}

/// Recovers the ephemeral public value `Y = u(v·|P| + h·G)`.
///
/// Returns `None` when `public_key` is not the u-coordinate of a curve
/// point, which no valid signature can verify against.
pub fn verify(v: &[u8; 32], h: &[u8; 32], public_key: &[u8; 32]) -> Option<[u8; 32]> {
    let mut lifted = MontgomeryPoint(*public_key).to_edwards(0)?;
    if montgomery_v_is_odd(&lifted)? {
        lifted = -lifted;
    }
    let v = Scalar::from_bytes_mod_order(*v);
    let h = Scalar::from_bytes_mod_order(*h);
    let y = EdwardsPoint::vartime_double_scalar_mul_basepoint(&v, &lifted, &h);
    Some(y.to_montgomery().to_bytes())
}

/// Diffie-Hellman: u-coordinate of `private·their_public`.
pub fn shared_secret(private_key: &[u8; 32], their_public_key: &[u8; 32]) -> [u8; 32] {
    MontgomeryPoint(*their_public_key)
        .mul_clamped(*private_key)
        .to_bytes()
}

/// A public key is canonical when its little-endian value is below `p`,
/// i.e. it is the unique encoding of its field element.
pub fn is_canonical_public_key(public_key: &[u8; 32]) -> bool {
    BigUint::from_bytes_le(public_key) < field().p
}

/// A signature is canonical when its `v` half is fully reduced mod the
/// group order.
pub fn is_canonical_signature(signature: &[u8; 64]) -> bool {
    let mut v = [0u8; 32];
    v.copy_from_slice(&signature[..32]);
    bool::from(Scalar::from_canonical_bytes(v).is_some())
}

// ---------------------------------------------------------------------------
// Montgomery v parity
// ---------------------------------------------------------------------------

/// Parity of the Montgomery `v` coordinate of an Edwards point, or `None`
/// for the identity (whose `u` is at infinity).
fn montgomery_v_is_odd(point: &EdwardsPoint) -> Option<bool> {
    let f = field();
    let mut encoded = point.compress().to_bytes();
    let x_is_odd = encoded[31] >> 7 == 1;
    encoded[31] &= 0x7F;

    let one = BigUint::one();
    let y = BigUint::from_bytes_le(&encoded);
    if y == one {
        return None;
    }

    // x^2 = (y^2 - 1) / (d·y^2 + 1)
    let yy = f.mul(&y, &y);
    let xx = f.mul(&f.sub(&yy, &one), &f.inv(&f.add(&f.mul(&f.d, &yy), &one)));
    let mut x = f.sqrt(&xx)?;
    if x.is_zero() {
        return Some(false);
    }
    if is_odd(&x) != x_is_odd {
        x = &f.p - &x;
    }

    // u = (1 + y) / (1 - y), v = sqrt(-486664)·u / x
    let u = f.mul(&f.add(&one, &y), &f.inv(&f.sub(&one, &y)));
    let v = f.mul(&f.mul(&f.sqrt_m486664, &u), &f.inv(&x));
    Some(is_odd(&v))
}

fn is_odd(value: &BigUint) -> bool {
    value.to_bytes_le()[0] & 1 == 1
}

/// Arithmetic in GF(2^255 - 19), only as much as the parity check needs.
struct Field {
    p: BigUint,
    d: BigUint,
    sqrt_m1: BigUint,
    sqrt_m486664: BigUint,
    sqrt_exponent: BigUint,
    inverse_exponent: BigUint,
}

fn field() -> &'static Field {
    static FIELD: OnceLock<Field> = OnceLock::new();
    FIELD.get_or_init(|| {
        let p = BigUint::from_slice(&[
            0xffffffed, 0xffffffff, 0xffffffff, 0xffffffff, 0xffffffff, 0xffffffff, 0xffffffff,
            0x7fffffff,
        ]);
        let d = BigUint::from_slice(&[
            0x135978a3, 0x75eb4dca, 0x4141d8ab, 0x00700a4d, 0x7779e898, 0x8cc74079, 0x2b6ffe73,
            0x52036cee,
        ]);
        let sqrt_m1 = BigUint::from_slice(&[
            0x4a0ea0b0, 0xc4ee1b27, 0xad2fe478, 0x2f431806, 0x3dfbd7a7, 0x2b4d0099, 0x4fc1df0b,
            0x2b832480,
        ]);
        let sqrt_m486664 = BigUint::from_slice(&[
            0xff457e06, 0xcc6e04aa, 0x4b7d1a82, 0xc5a1d3d1, 0x03fc4f7e, 0xd27b08dc, 0x60a006bb,
            0x0f26edf4,
        ]);
        let sqrt_exponent = (&p + 3u32) >> 3;
        let inverse_exponent = &p - 2u32;
        Field {
            p,
            d,
            sqrt_m1,
            sqrt_m486664,
            sqrt_exponent,
            inverse_exponent,
        }
    })
}

impl Field {
    fn add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + b) % &self.p
    }

    fn sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + &self.p - b) % &self.p
    }

    fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.p
    }

    fn inv(&self, a: &BigUint) -> BigUint {
        a.modpow(&self.inverse_exponent, &self.p)
    }

    /// Square root for p ≡ 5 (mod 8), if one exists.
    fn sqrt(&self, a: &BigUint) -> Option<BigUint> {
        let r = a.modpow(&self.sqrt_exponent, &self.p);
        if self.mul(&r, &r) == *a {
            return Some(r);
        }
        let r = self.mul(&r, &self.sqrt_m1);
        if self.mul(&r, &r) == *a {
            return Some(r);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::sha256;
    use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;

    fn private_key(phrase: &str) -> [u8; 32] {
        let mut k = sha256(phrase.as_bytes());
        clamp(&mut k);
        k
    }

    #[test]
    fn clamp_sets_expected_bits() {
        let mut k = [0xFFu8; 32];
        clamp(&mut k);
        assert_eq!(k[0], 0xF8);
        assert_eq!(k[31], 0x7F);

        let mut z = [0u8; 32];
        clamp(&mut z);
        assert_eq!(z[31], 0x40);
    }

    #[test]
    fn base_point_has_even_montgomery_v() {
        assert_eq!(montgomery_v_is_odd(&ED25519_BASEPOINT_POINT), Some(false));
        assert_eq!(montgomery_v_is_odd(&-ED25519_BASEPOINT_POINT), Some(true));
    }

    #[test]
    fn identity_has_no_montgomery_v() {
        use curve25519_dalek::traits::Identity;
        assert_eq!(montgomery_v_is_odd(&EdwardsPoint::identity()), None);
    }

    #[test]
    fn known_public_key() {
        let k = private_key("nxt transaction core test phrase");
        assert_eq!(
            hex::encode(k),
            "58c7b618e707dd8599390180e9dbd6b199f804edd02e6327e9793704d8eccf66"
        );
        assert_eq!(
            hex::encode(public_key(&k)),
            "f66f93b7bf462733bee0a96ce9c6a8bc9b980fcb7e88e659c7fff5e994721c43"
        );
        assert_eq!(keygen(&k).public_key, public_key(&k));
    }

    #[test]
    fn public_key_matches_x25519_base_multiplication() {
        let k = private_key("cross-check");
        let expected = MontgomeryPoint::mul_base_clamped(k).to_bytes();
        assert_eq!(public_key(&k), expected);
    }

    #[test]
    fn signing_scalar_inverts_to_absolute_public_point() {
        // v = (x - h)·s and s·|P| = G, so v·|P| + h·G = x·G.
        let k = private_key("scalar relation");
        let gen = keygen(&k);
        let mut x = sha256(b"ephemeral");
        clamp(&mut x);
        let h = sha256(b"challenge");
        let v = sign(&h, &x, &gen.signing_key);
        let y = verify(&v, &h, &gen.public_key).unwrap();
        assert_eq!(y, public_key(&x));
    }

    #[test]
    fn shared_secret_is_symmetric() {
        let a = private_key("alice");
        let b = private_key("bob");
        let ab = shared_secret(&a, &public_key(&b));
        let ba = shared_secret(&b, &public_key(&a));
        assert_eq!(ab, ba);
        assert_ne!(ab, [0u8; 32]);
    }

    #[test]
    fn canonical_public_key_bounds() {
        let mut p_minus_one = [0xFFu8; 32];
        p_minus_one[0] = 0xEC;
        p_minus_one[31] = 0x7F;
        assert!(is_canonical_public_key(&p_minus_one));

        let mut p = p_minus_one;
        p[0] = 0xED;
        assert!(!is_canonical_public_key(&p));

        let mut high_bit = [0u8; 32];
        high_bit[31] = 0x80;
        assert!(!is_canonical_public_key(&high_bit));
    }

    #[test]
    fn canonical_signature_requires_reduced_v() {
        let mut sig = [0u8; 64];
        assert!(is_canonical_signature(&sig));
        sig[..31].fill(0xFF);
        sig[31] = 0x10;
        assert!(!is_canonical_signature(&sig));
    }
}
