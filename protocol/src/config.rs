//! # Protocol Configuration & Constants
//!
//! Every magic number of the transaction layer lives here. If you're
//! hardcoding a length limit or a fee somewhere else, move it here.
//!
//! Most of these values are consensus rules of the ledger we talk to. They
//! are not ours to tune: a wrong constant does not make the wallet "more
//! conservative", it makes it produce transactions the network rejects.
//!
//! The few values a wallet legitimately needs to vary per network (fee
//! activation heights, the height assumed for fee computation) are grouped
//! in [`ChainParams`].

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Monetary Units
// ---------------------------------------------------------------------------

/// One whole coin expressed in NQT, the smallest indivisible unit.
pub const ONE_NXT: i64 = 100_000_000;

/// Total supply in whole coins. No balance, amount or fee can exceed it.
pub const MAX_BALANCE_NXT: i64 = 1_000_000_000;

/// Total supply in NQT. Upper bound for every amount and fee field.
pub const MAX_BALANCE_NQT: i64 = MAX_BALANCE_NXT * ONE_NXT;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Unix timestamp (seconds) of the ledger epoch: 2013-11-24T12:00:00Z.
///
/// Transaction timestamps count seconds from this instant, not from 1970.
pub const EPOCH_BEGINNING_UNIX: i64 = 1_385_294_400;

/// Default transaction deadline in minutes (24 hours).
pub const DEFAULT_DEADLINE_MINUTES: i16 = 1440;

/// Converts a wall-clock instant into protocol epoch seconds.
///
/// Instants before the epoch clamp to zero; instants past the `i32` range
/// (year 2081) saturate.
pub fn epoch_time(at: DateTime<Utc>) -> i32 {
    let seconds = at.timestamp() - EPOCH_BEGINNING_UNIX;
    seconds.clamp(0, i32::MAX as i64) as i32
}

/// Current protocol epoch time in seconds.
pub fn epoch_now() -> i32 {
    epoch_time(Utc::now())
}

/// Converts protocol epoch seconds back into a UTC instant.
pub fn from_epoch_time(timestamp: i32) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(EPOCH_BEGINNING_UNIX + timestamp as i64, 0)
        .single()
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Account id of the genesis block creator.
///
/// Transaction types without a recipient still occupy the 8-byte recipient
/// slot on the wire; this id is written there instead.
pub const GENESIS_CREATOR_ID: u64 = 1_739_068_987_193_023_818;

/// Prefix used for human-facing Reed-Solomon addresses.
pub const ADDRESS_PREFIX: &str = "NXT-";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Curve25519 public key length in bytes (Montgomery u-coordinate).
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Clamped Curve25519 private scalar length in bytes.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Signature length: 32-byte response `v` followed by 32-byte challenge `h`.
pub const SIGNATURE_LENGTH: usize = 64;

/// SHA-256 digest length. Also the length of a transaction full hash.
pub const HASH_LENGTH: usize = 32;

/// Nonce mixed into the Diffie-Hellman secret of an encrypted message.
pub const ENCRYPTION_NONCE_LENGTH: usize = 32;

/// AES block size; also the length of the CBC initialisation vector.
pub const AES_BLOCK_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Transaction Layout
// ---------------------------------------------------------------------------

/// Fixed header size: type, subtype/version, timestamp, deadline, sender
/// key, recipient, amount, fee, referenced hash, signature.
pub const TRANSACTION_HEADER_LENGTH: usize = 1 + 1 + 4 + 2 + 32 + 8 + 8 + 8 + 32 + 64;

/// Extra header bytes present when version > 0: flags, EC block height and id.
pub const TRANSACTION_V1_EXTENSION_LENGTH: usize = 4 + 4 + 8;

/// Byte offset of the signature within the serialized header.
pub const SIGNATURE_OFFSET: usize = 1 + 1 + 4 + 2 + 32 + 8 + 8 + 8 + 32;

/// Highest transaction version this implementation understands.
pub const CURRENT_TRANSACTION_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Field Length Limits
// ---------------------------------------------------------------------------

pub const MAX_ARBITRARY_MESSAGE_LENGTH: usize = 1000;
pub const MAX_ENCRYPTED_MESSAGE_LENGTH: usize = 1000;

pub const MAX_ALIAS_LENGTH: usize = 100;
pub const MAX_ALIAS_URI_LENGTH: usize = 1000;

pub const MAX_POLL_NAME_LENGTH: usize = 100;
pub const MAX_POLL_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_POLL_OPTION_LENGTH: usize = 100;
pub const MAX_POLL_OPTION_COUNT: usize = 100;

pub const MAX_ASSET_NAME_LENGTH: usize = 10;
pub const MAX_ASSET_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_ASSET_TRANSFER_COMMENT_LENGTH: usize = 1000;

pub const MAX_ACCOUNT_NAME_LENGTH: usize = 100;
pub const MAX_ACCOUNT_DESCRIPTION_LENGTH: usize = 1000;

pub const MAX_HUB_ANNOUNCEMENT_URIS: usize = 100;
pub const MAX_HUB_ANNOUNCEMENT_URI_LENGTH: usize = 1000;

pub const MAX_DGS_LISTING_NAME_LENGTH: usize = 100;
pub const MAX_DGS_LISTING_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_DGS_LISTING_TAGS_LENGTH: usize = 100;
pub const MAX_DGS_GOODS_LENGTH: usize = 10240;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Below this height no minimum fee applies.
pub const BASELINE_FEE_HEIGHT: i32 = 1;

/// At or above this height the "next" fee schedule applies. `i32::MAX`
/// means no fee change is scheduled.
pub const NEXT_FEE_HEIGHT: i32 = i32::MAX;

/// Height assumed when a transaction is not yet on the ledger.
pub const UNCONFIRMED_FEE_HEIGHT: i32 = i32::MAX;

/// Network-level parameters a wallet may override.
///
/// The defaults match the live network. Tests and private networks load
/// their own values, typically from JSON:
///
/// ```
/// use nxt_protocol::config::ChainParams;
///
/// let params: ChainParams =
///     serde_json::from_str(r#"{ "nextFeeHeight": 500000 }"#).unwrap();
/// assert_eq!(params.next_fee_height, 500_000);
/// assert_eq!(params.baseline_fee_height, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainParams {
    /// Heights strictly below this require no fee at all.
    pub baseline_fee_height: i32,
    /// Heights at or above this use each type's "next" fee schedule.
    pub next_fee_height: i32,
    /// Height used for fee computation when the transaction has none.
    pub unconfirmed_fee_height: i32,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            baseline_fee_height: BASELINE_FEE_HEIGHT,
            next_fee_height: NEXT_FEE_HEIGHT,
            unconfirmed_fee_height: UNCONFIRMED_FEE_HEIGHT,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
