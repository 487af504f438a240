//! Transaction errors and verification.
//!
//! Construction-time checks live in [`super::builder`]; this module holds
//! the error vocabulary they share and the signature check run on complete
//! transactions.

use thiserror::Error;
use tracing::debug;

use super::builder::Transaction;
use super::types::TransactionType;
use crate::crypto::CryptoError;
use crate::numeric::NumericError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from building, parsing, signing and identifying transactions.
///
/// Each variant names the rule that was broken. Nothing here is repaired
/// silently; the one documented default (a zero fee becomes the minimum
/// fee) never produces an error.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("unknown transaction type {type_code}:{subtype}")]
    UnknownType { type_code: u8, subtype: u8 },

    #[error("unsupported transaction version {0}")]
    UnsupportedVersion(u8),

    #[error("attachment of type {attachment} does not match transaction type {transaction}")]
    AttachmentTypeMismatch {
        transaction: TransactionType,
        attachment: TransactionType,
    },

    #[error("{appendage} version {version} is not valid in a version {transaction_version} transaction")]
    AppendageVersionMismatch {
        appendage: &'static str,
        version: u8,
        transaction_version: u8,
    },

    #[error("{appendage} cannot be attached to this {transaction_type} transaction")]
    AppendageNotAllowed {
        appendage: &'static str,
        transaction_type: TransactionType,
    },

    #[error("fee {fee} NQT is below the minimum of {minimum} NQT")]
    FeeBelowMinimum { fee: i64, minimum: i64 },

    #[error("fee {0} NQT is out of range")]
    FeeOutOfRange(i64),

    #[error("amount {0} NQT is out of range")]
    AmountOutOfRange(i64),

    #[error("deadline must be at least 1 minute, got {0}")]
    InvalidDeadline(i16),

    #[error("{transaction_type} transactions have no recipient, got {recipient}")]
    UnexpectedRecipient {
        transaction_type: TransactionType,
        recipient: u64,
    },

    #[error("{transaction_type} transactions cannot move coins, got {amount} NQT")]
    UnexpectedAmount {
        transaction_type: TransactionType,
        amount: i64,
    },

    #[error("{field} is too long: {length} exceeds {max}")]
    FieldTooLong {
        field: &'static str,
        length: usize,
        max: usize,
    },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("truncated input reading {field}: need {needed} bytes, {remaining} left")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("{0} unexpected bytes after the transaction")]
    TrailingBytes(usize),

    #[error("transaction is already signed")]
    AlreadySigned,

    #[error("transaction is not signed yet")]
    NotSigned,

    #[error("signing key does not match the sender public key")]
    WrongSigner,

    #[error("signature does not verify against the sender public key")]
    InvalidSignature,

    #[error(transparent)]
    Numeric(#[from] NumericError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Checks that a transaction carries a valid signature by its sender.
///
/// Canonical encodings are enforced: a signature whose `v` half is not
/// reduced, or a sender key at or above the field prime, fails even if the
/// curve equation would hold.
pub fn verify_transaction(tx: &Transaction) -> Result<(), TransactionError> {
    if tx.signature().is_none() {
        return Err(TransactionError::NotSigned);
    }
    if !tx.verify_signature() {
        debug!(
            transaction_type = %tx.transaction_type(),
            sender = tx.sender_id(),
            "transaction signature rejected"
        );
        return Err(TransactionError::InvalidSignature);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
