//! Encrypted payloads: ciphertext plus the nonce it was keyed with.
//!
//! This is the value carried by encrypted-message appendages and digital
//! goods deliveries. On the wire it is `data || nonce`; the length prefix and
//! text flag belong to the enclosing structure.

use std::io::{Read, Write};

use bytes::BufMut;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rand_core::{CryptoRng, RngCore};

use super::encryption;
use super::keys::{PrivateKey, PublicKey};
use super::CryptoError;
use crate::config::ENCRYPTION_NONCE_LENGTH;

/// Ciphertext (`iv || aes-cbc output`) and its 32-byte nonce.
///
/// [`EncryptedPayload::EMPTY`] stands for an empty plaintext: no data and no
/// nonce, zero bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncryptedPayload {
    data: Vec<u8>,
    nonce: Vec<u8>,
}

impl EncryptedPayload {
    pub const EMPTY: Self = Self {
        data: Vec::new(),
        nonce: Vec::new(),
    };

    /// Assembles a payload from its parts.
    ///
    /// The nonce must be 32 bytes, except for the empty payload where both
    /// parts are empty.
    pub fn from_parts(data: Vec<u8>, nonce: Vec<u8>) -> Result<Self, CryptoError> {
        if data.is_empty() {
            if !nonce.is_empty() {
                return Err(CryptoError::InvalidLength {
                    what: "nonce",
                    expected: 0,
                    actual: nonce.len(),
                });
            }
            return Ok(Self::EMPTY);
        }
        if nonce.len() != ENCRYPTION_NONCE_LENGTH {
            return Err(CryptoError::InvalidLength {
                what: "nonce",
                expected: ENCRYPTION_NONCE_LENGTH,
                actual: nonce.len(),
            });
        }
        Ok(Self { data, nonce })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes on the wire: data then nonce.
    pub fn size(&self) -> usize {
        self.data.len() + self.nonce.len()
    }

    pub fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.data);
        buf.put_slice(&self.nonce);
    }

    /// Encrypts `plaintext` from `my_private_key` to `their_public_key`
    /// under a fresh random nonce, gzip-compressing it first if `compress`
    /// is set. An empty plaintext gives [`Self::EMPTY`].
    pub fn encrypt<R: RngCore + CryptoRng>(
        plaintext: &[u8],
        compress: bool,
        my_private_key: &PrivateKey,
        their_public_key: &PublicKey,
        rng: &mut R,
    ) -> Result<Self, CryptoError> {
        if plaintext.is_empty() {
            return Ok(Self::EMPTY);
        }
        let compressed;
        let input = if compress {
            compressed = gzip(plaintext)?;
            &compressed[..]
        } else {
            plaintext
        };

        let mut nonce = [0u8; ENCRYPTION_NONCE_LENGTH];
        rng.fill_bytes(&mut nonce);
        let data = encryption::encrypt(input, my_private_key, their_public_key, &nonce, rng);
        Ok(Self {
            data,
            nonce: nonce.to_vec(),
        })
    }

    /// Reverses [`Self::encrypt`]. `compressed` must match the flag used
    /// when encrypting.
    pub fn decrypt(
        &self,
        compressed: bool,
        my_private_key: &PrivateKey,
        their_public_key: &PublicKey,
    ) -> Result<Vec<u8>, CryptoError> {
        if self.data.is_empty() {
            return Ok(Vec::new());
        }
        let nonce: [u8; ENCRYPTION_NONCE_LENGTH] =
            self.nonce
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidLength {
                    what: "nonce",
                    expected: ENCRYPTION_NONCE_LENGTH,
                    actual: self.nonce.len(),
                })?;
        let plaintext = encryption::decrypt(&self.data, my_private_key, their_public_key, &nonce)?;
        if compressed {
            gunzip(&plaintext)
        } else {
            Ok(plaintext)
        }
    }
}

/// Gzip-compresses `data`.
pub fn gzip(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CryptoError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CryptoError::Compression(e.to_string()))
}

/// Inflates gzip data.
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| CryptoError::Compression(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pair() -> (PrivateKey, PrivateKey) {
        (
            PrivateKey::from_secret_phrase("sender"),
            PrivateKey::from_secret_phrase("recipient"),
        )
    }

    #[test]
    fn empty_plaintext_is_empty_payload() {
        let (a, b) = pair();
        let mut rng = StdRng::seed_from_u64(0);
        let payload = EncryptedPayload::encrypt(b"", true, &a, &b.public_key(), &mut rng).unwrap();
        assert_eq!(payload, EncryptedPayload::EMPTY);
        assert_eq!(payload.size(), 0);
        assert!(payload.decrypt(true, &b, &a.public_key()).unwrap().is_empty());
    }

    #[test]
    fn round_trip_with_and_without_compression() {
        let (a, b) = pair();
        let mut rng = StdRng::seed_from_u64(1);
        let text = b"the quick brown fox jumps over the lazy dog".repeat(10);
        for compress in [false, true] {
            let payload =
                EncryptedPayload::encrypt(&text, compress, &a, &b.public_key(), &mut rng).unwrap();
            assert_eq!(payload.nonce().len(), 32);
            let opened = payload.decrypt(compress, &b, &a.public_key()).unwrap();
            assert_eq!(opened, text);
        }
    }

    #[test]
    fn compression_shrinks_repetitive_text() {
        let (a, b) = pair();
        let mut rng = StdRng::seed_from_u64(2);
        let text = vec![b'a'; 900];
        let plain = EncryptedPayload::encrypt(&text, false, &a, &b.public_key(), &mut rng).unwrap();
        let packed = EncryptedPayload::encrypt(&text, true, &a, &b.public_key(), &mut rng).unwrap();
        assert!(packed.data().len() < plain.data().len());
    }

    #[test]
    fn put_writes_data_then_nonce() {
        let payload = EncryptedPayload::from_parts(vec![1, 2, 3], vec![9u8; 32]).unwrap();
        let mut out = Vec::new();
        payload.put(&mut out);
        assert_eq!(out.len(), payload.size());
        assert_eq!(&out[..3], &[1, 2, 3]);
        assert_eq!(&out[3..], &[9u8; 32]);
    }

    #[test]
    fn from_parts_checks_nonce_length() {
        assert!(EncryptedPayload::from_parts(vec![1], vec![0u8; 31]).is_err());
        // no data means no nonce either, or the length prefix would hide it
        assert_eq!(
            EncryptedPayload::from_parts(Vec::new(), vec![7u8; 32]),
            Err(CryptoError::InvalidLength {
                what: "nonce",
                expected: 0,
                actual: 32,
            })
        );
        assert_eq!(
            EncryptedPayload::from_parts(Vec::new(), Vec::new()).unwrap(),
            EncryptedPayload::EMPTY
        );
    }

    #[test]
    fn gunzip_rejects_garbage() {
        assert!(matches!(
            gunzip(b"definitely not gzip"),
            Err(CryptoError::Compression(_))
        ));
    }
}
