// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NXT Protocol — Transaction Core
//!
//! The transaction layer of an NXT-family ledger client, the part a wallet
//! embeds to talk to a node. It builds, serializes, signs, verifies and
//! parses account-ledger transactions, and carries the cryptography those
//! transactions depend on.
//!
//! Correctness here is binary-exact. A different field order, a different
//! hashing order or a slip in the curve arithmetic yields a transaction
//! with another id, a signature nobody accepts, or an address that sends
//! funds somewhere else. Fixed vectors in the tests pin every recipe.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants, epoch time and per-network fee heights.
//! - **numeric** — Overflow-checked arithmetic, hex and unsigned id helpers.
//! - **crypto** — Curve25519 keys, deterministic signatures, shared secrets,
//!   message encryption and Reed-Solomon account addresses.
//! - **transaction** — The type registry, attachments, appendages, the
//!   builder, and the binary and JSON forms.
//!
//! ## Quick start
//!
//! ```
//! use nxt_protocol::crypto::KeyPair;
//! use nxt_protocol::config::ONE_NXT;
//! use nxt_protocol::transaction::{Transaction, TransactionBuilder, TransactionType};
//!
//! let keys = KeyPair::from_secret_phrase("correct horse battery staple").unwrap();
//! let mut tx = TransactionBuilder::new(TransactionType::OrdinaryPayment)
//!     .sender_public_key(keys.public_key())
//!     .recipient(12345)
//!     .amount(10 * ONE_NXT)
//!     .build()
//!     .unwrap();
//! tx.sign(keys.private_key()).unwrap();
//!
//! let parsed = Transaction::from_bytes(&tx.bytes()).unwrap();
//! assert_eq!(parsed.id().unwrap(), tx.id().unwrap());
//! ```
//!
//! ## Ground rules
//!
//! 1. Signing is deterministic; randomness only ever feeds encryption nonces.
//! 2. Amounts are NQT in `i64` and every sum is overflow-checked.
//! 3. Nothing is repaired silently. The single default is a zero fee, which
//!    becomes the minimum fee.

pub mod config;
pub mod crypto;
pub mod numeric;
pub mod transaction;
