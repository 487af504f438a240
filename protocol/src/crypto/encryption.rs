//! # AES-256-CBC Message Encryption
//!
//! Encryption for messages attached to transactions and for digital goods.
//!
//! The key for a message between two accounts is derived from their
//! Diffie-Hellman secret and a random 32-byte nonce that travels with the
//! ciphertext:
//!
//! ```text
//! seed = curve(my_private, their_public) XOR nonce
//! key  = SHA256(seed)
//! ```
//!
//! so every message gets a fresh key even between the same two accounts.
//! The cipher is AES-256 in CBC mode with PKCS#7 padding and a random
//! 16-byte IV.
//!
//! ## Wire format
//!
//! [`encrypt`] returns `iv || ciphertext`. [`decrypt`] expects the same and
//! rejects anything shorter than two blocks or not block-aligned before
//! touching the cipher.
//!
//! There is no authentication tag. Integrity comes from the signature on
//! the enclosing transaction.
//!
//! ## Randomness
//!
//! The IV (and, in [`super::payload`], the nonce) come from a caller-supplied
//! `RngCore + CryptoRng`. Pass `rand::rngs::OsRng` in production and a
//! seeded `StdRng` in tests.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use rand_core::{CryptoRng, RngCore};

use super::hash::sha256;
use super::keys::{PrivateKey, PublicKey};
use super::CryptoError;
use crate::config::{AES_BLOCK_LENGTH, ENCRYPTION_NONCE_LENGTH};

/// Message key for a nonce between two accounts.
pub fn derive_key(
    my_private_key: &PrivateKey,
    their_public_key: &PublicKey,
    nonce: &[u8; ENCRYPTION_NONCE_LENGTH],
) -> [u8; 32] {
    let mut seed = my_private_key.shared_secret(their_public_key);
    for (s, n) in seed.iter_mut().zip(nonce.iter()) {
        *s ^= n;
    }
    sha256(&seed)
}

/// Encrypts `plaintext` for `their_public_key`. Returns `iv || ciphertext`.
///
/// # Example
///
/// ```
/// use nxt_protocol::crypto::encryption::{decrypt, encrypt};
/// use nxt_protocol::crypto::PrivateKey;
///
/// let alice = PrivateKey::from_secret_phrase("alice");
/// let bob = PrivateKey::from_secret_phrase("bob");
/// let nonce = [7u8; 32];
///
/// let sealed = encrypt(b"hi bob", &alice, &bob.public_key(), &nonce, &mut rand::rngs::OsRng);
/// let opened = decrypt(&sealed, &bob, &alice.public_key(), &nonce).unwrap();
/// assert_eq!(opened, b"hi bob");
/// ```
pub fn encrypt<R: RngCore + CryptoRng>(
    plaintext: &[u8],
    my_private_key: &PrivateKey,
    their_public_key: &PublicKey,
    nonce: &[u8; ENCRYPTION_NONCE_LENGTH],
    rng: &mut R,
) -> Vec<u8> {
    let key = derive_key(my_private_key, their_public_key, nonce);
    let mut iv = [0u8; AES_BLOCK_LENGTH];
    rng.fill_bytes(&mut iv);

    let ciphertext = cbc_encrypt(&key, &iv, plaintext);
    let mut out = Vec::with_capacity(AES_BLOCK_LENGTH + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    out
}

/// Decrypts `iv || ciphertext` produced by [`encrypt`] on the other side.
pub fn decrypt(
    iv_and_ciphertext: &[u8],
    my_private_key: &PrivateKey,
    their_public_key: &PublicKey,
    nonce: &[u8; ENCRYPTION_NONCE_LENGTH],
) -> Result<Vec<u8>, CryptoError> {
    let length = iv_and_ciphertext.len();
    if length < 2 * AES_BLOCK_LENGTH || length % AES_BLOCK_LENGTH != 0 {
        return Err(CryptoError::InvalidCiphertextLength(length));
    }
    let (iv, ciphertext) = iv_and_ciphertext.split_at(AES_BLOCK_LENGTH);
    let mut iv_block = [0u8; AES_BLOCK_LENGTH];
    iv_block.copy_from_slice(iv);

    let key = derive_key(my_private_key, their_public_key, nonce);
    cbc_decrypt(&key, &iv_block, ciphertext)
}

// ---------------------------------------------------------------------------
// CBC mode
// ---------------------------------------------------------------------------

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

fn cbc_encrypt(key: &[u8; 32], iv: &[u8; AES_BLOCK_LENGTH], plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

fn cbc_decrypt(
    key: &[u8; 32],
    iv: &[u8; AES_BLOCK_LENGTH],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::InvalidPadding)
}
