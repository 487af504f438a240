//! # Transaction Module
//!
//! Construction, encoding, signing and verification of NXT transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        Type registry: (type, subtype) codes, recipient rule, fees
//! attachment.rs   Type-specific payloads, binary and JSON
//! appendix.rs     Optional appendages: messages and key announcements
//! builder.rs      Transaction model, TransactionBuilder, wire and JSON forms
//! signing.rs      sign_transaction and id / full hash derivation
//! verification.rs TransactionError and verify_transaction
//! codec.rs        Bounds-checked little-endian reader and string writers
//! json.rs         JSON record and attachment-object helpers
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: [`TransactionBuilder`] validates and freezes the fields,
//!    filling in the minimum fee when none is given.
//! 2. **Sign**: [`sign_transaction`] (or [`Transaction::sign`]) signs the
//!    zero-signature bytes with the sender's key, exactly once.
//! 3. **Identify**: [`Transaction::id`] and [`Transaction::full_hash`] are
//!    derived from the signed form and cached.
//! 4. **Verify**: [`verify_transaction`] checks the signature with canonical
//!    encodings enforced.
//!
//! [`Transaction::bytes`] and [`Transaction::to_json`] produce the forms a
//! node accepts; [`Transaction::parse`] and [`Transaction::from_json`] read
//! them back through the same builder checks.

pub mod appendix;
pub mod attachment;
pub mod builder;
pub(crate) mod codec;
pub(crate) mod json;
pub mod signing;
pub mod types;
pub mod verification;

pub use appendix::{
    Appendage, EncryptToSelfMessage, EncryptedMessage, Message, PublicKeyAnnouncement,
};
pub use attachment::Attachment;
pub use builder::{Transaction, TransactionBuilder};
pub use signing::sign_transaction;
pub use types::{Fee, TransactionType};
pub use verification::{verify_transaction, TransactionError};
