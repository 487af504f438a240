//! Transaction signing and identity derivation.
//!
//! Signing is a separate step from building because the key may not be
//! available at construction time (hardware wallet, remote signer). The
//! signed message is [`Transaction::unsigned_bytes`]: the full binary form
//! with the 64 signature bytes zeroed.
//!
//! The id and full hash are not a plain hash of the signed bytes. The
//! signature is hashed on its own and that digest is folded in after the
//! zero-signature bytes:
//!
//! ```text
//! full_hash = sha256(unsigned_bytes || sha256(signature))
//! id        = u64::from_le_bytes(full_hash[..8])
//! ```

use tracing::debug;

use super::builder::Transaction;
use super::verification::TransactionError;
use crate::config::{HASH_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::hash::{sha256, sha256_chain};
use crate::crypto::{self, PrivateKey, Signature};
use crate::numeric::full_hash_to_id;

/// Cached id and full hash of a signed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Identity {
    pub id: u64,
    pub full_hash: [u8; HASH_LENGTH],
}

/// Derives the identity from the zero-signature bytes and the signature.
/// Unsigned types hash 64 zero bytes in place of the signature.
pub(crate) fn derive_identity(unsigned_bytes: &[u8], signature: Option<&Signature>) -> Identity {
    let signature_hash = match signature {
        Some(signature) => sha256(signature.as_bytes()),
        None => sha256(&[0u8; SIGNATURE_LENGTH]),
    };
    let full_hash = sha256_chain(&[unsigned_bytes, signature_hash.as_slice()]);
    Identity {
        id: full_hash_to_id(&full_hash),
        full_hash,
    }
}

/// Signs a transaction in place with the sender's private key.
///
/// Fails if the transaction already carries a signature or if the key does
/// not belong to the sender. Signing is deterministic: the same transaction
/// and key always give the same signature.
///
/// # Example
///
/// ```
/// use nxt_protocol::crypto::KeyPair;
/// use nxt_protocol::transaction::{sign_transaction, TransactionBuilder, TransactionType};
///
/// let keys = KeyPair::from_secret_phrase("signing doc").unwrap();
/// let mut tx = TransactionBuilder::new(TransactionType::OrdinaryPayment)
///     .sender_public_key(keys.public_key())
///     .recipient(1)
///     .amount(1)
///     .build()
///     .unwrap();
///
/// sign_transaction(&mut tx, keys.private_key()).unwrap();
/// assert!(tx.signature().is_some());
/// assert!(sign_transaction(&mut tx, keys.private_key()).is_err());
/// ```
pub fn sign_transaction<'a>(
    tx: &'a mut Transaction,
    private_key: &PrivateKey,
) -> Result<&'a Transaction, TransactionError> {
    if tx.signature().is_some() {
        return Err(TransactionError::AlreadySigned);
    }
    if private_key.public_key() != *tx.sender_public_key() {
        return Err(TransactionError::WrongSigner);
    }
    let signature = crypto::sign(&tx.unsigned_bytes(), private_key)?;
    tx.set_signature(signature);
    debug!(
        transaction_type = %tx.transaction_type(),
        sender = tx.sender_id(),
        "transaction signed"
    );
    Ok(tx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ONE_NXT, SIGNATURE_OFFSET};
    use crate::crypto::KeyPair;
    use crate::transaction::{TransactionBuilder, TransactionType};

    fn payment(keys: &KeyPair) -> Transaction {
        TransactionBuilder::new(TransactionType::OrdinaryPayment)
            .sender_public_key(keys.public_key())
            .recipient(12345)
            .amount(ONE_NXT)
            .timestamp(0)
            .build()
            .unwrap()
    }

    #[test]
    fn signing_sets_a_verifiable_signature() {
        let keys = KeyPair::from_secret_phrase("signing").unwrap();
        let mut tx = payment(&keys);
        assert!(!tx.verify_signature());
        sign_transaction(&mut tx, keys.private_key()).unwrap();
        assert!(tx.verify_signature());
    }

    #[test]
    fn signing_twice_fails() {
        let keys = KeyPair::from_secret_phrase("signing").unwrap();
        let mut tx = payment(&keys);
        tx.sign(keys.private_key()).unwrap();
        let first = *tx.signature().unwrap();
        assert!(matches!(
            tx.sign(keys.private_key()),
            Err(TransactionError::AlreadySigned)
        ));
        assert_eq!(tx.signature(), Some(&first));
    }

    #[test]
    fn foreign_key_cannot_sign() {
        let keys = KeyPair::from_secret_phrase("signing").unwrap();
        let other = KeyPair::from_secret_phrase("not the sender").unwrap();
        let mut tx = payment(&keys);
        assert!(matches!(
            tx.sign(other.private_key()),
            Err(TransactionError::WrongSigner)
        ));
        assert!(tx.signature().is_none());
    }

    #[test]
    fn signing_is_deterministic() {
        let keys = KeyPair::from_secret_phrase("signing").unwrap();
        let mut a = payment(&keys);
        let mut b = payment(&keys);
        a.sign(keys.private_key()).unwrap();
        b.sign(keys.private_key()).unwrap();
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.id().unwrap(), b.id().unwrap());
    }

    #[test]
    fn identity_folds_in_the_signature_hash() {
        let keys = KeyPair::from_secret_phrase("signing").unwrap();
        let mut tx = payment(&keys);
        tx.sign(keys.private_key()).unwrap();

        let bytes = tx.bytes();
        let mut zeroed = bytes.clone();
        zeroed[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_LENGTH].fill(0);
        let signature_hash = sha256(&bytes[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_LENGTH]);
        let expected = sha256_chain(&[zeroed.as_slice(), signature_hash.as_slice()]);

        assert_eq!(tx.full_hash().unwrap(), expected);
        assert_eq!(tx.id().unwrap(), full_hash_to_id(&expected));
        assert_ne!(expected, sha256(&bytes));
    }

    #[test]
    fn unsigned_identity_uses_zero_signature_hash() {
        let identity = derive_identity(b"abc", None);
        let zero_hash = sha256(&[0u8; 64]);
        let expected = sha256_chain(&[b"abc".as_slice(), zero_hash.as_slice()]);
        assert_eq!(identity.full_hash, expected);
    }
}
