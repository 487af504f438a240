//! The transaction type registry.
//!
//! Every transaction is identified on the wire by a `(type, subtype)` byte
//! pair. The set is closed, so it is a plain enum here; everything that
//! varies per type (recipient semantics, fee schedule, attachment layout)
//! is a `match` on it.

use std::fmt;

use crate::config::{ChainParams, ONE_NXT};
use crate::numeric::{safe_add, safe_multiply, NumericError};

pub const TYPE_PAYMENT: u8 = 0;
pub const TYPE_MESSAGING: u8 = 1;
pub const TYPE_COLORED_COINS: u8 = 2;
pub const TYPE_DIGITAL_GOODS: u8 = 3;
pub const TYPE_ACCOUNT_CONTROL: u8 = 4;

// ---------------------------------------------------------------------------
// Fee
// ---------------------------------------------------------------------------

/// A fee schedule: a constant part plus a per-byte charge on the
/// attachment and appendages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fee {
    pub constant: i64,
    pub per_appendage_byte: i64,
}

impl Fee {
    /// One coin flat, nothing per byte.
    pub const DEFAULT: Fee = Fee {
        constant: ONE_NXT,
        per_appendage_byte: 0,
    };

    pub const fn flat(constant: i64) -> Self {
        Self {
            constant,
            per_appendage_byte: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Every `(type, subtype)` pair the ledger defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionType {
    OrdinaryPayment,

    ArbitraryMessage,
    AliasAssignment,
    PollCreation,
    VoteCasting,
    HubAnnouncement,
    AccountInfo,
    AliasSell,
    AliasBuy,

    AssetIssuance,
    AssetTransfer,
    AskOrderPlacement,
    BidOrderPlacement,
    AskOrderCancellation,
    BidOrderCancellation,

    DigitalGoodsListing,
    DigitalGoodsDelisting,
    DigitalGoodsPriceChange,
    DigitalGoodsQuantityChange,
    DigitalGoodsPurchase,
    DigitalGoodsDelivery,
    DigitalGoodsFeedback,
    DigitalGoodsRefund,

    EffectiveBalanceLeasing,
}

impl TransactionType {
    /// All registered types, ordered by `(type, subtype)`.
    pub const ALL: [TransactionType; 24] = [
        Self::OrdinaryPayment,
        Self::ArbitraryMessage,
        Self::AliasAssignment,
        Self::PollCreation,
        Self::VoteCasting,
        Self::HubAnnouncement,
        Self::AccountInfo,
        Self::AliasSell,
        Self::AliasBuy,
        Self::AssetIssuance,
        Self::AssetTransfer,
        Self::AskOrderPlacement,
        Self::BidOrderPlacement,
        Self::AskOrderCancellation,
        Self::BidOrderCancellation,
        Self::DigitalGoodsListing,
        Self::DigitalGoodsDelisting,
        Self::DigitalGoodsPriceChange,
        Self::DigitalGoodsQuantityChange,
        Self::DigitalGoodsPurchase,
        Self::DigitalGoodsDelivery,
        Self::DigitalGoodsFeedback,
        Self::DigitalGoodsRefund,
        Self::EffectiveBalanceLeasing,
    ];

    /// Looks a type up by its wire codes.
    pub fn from_codes(type_code: u8, subtype: u8) -> Option<Self> {
        use TransactionType::*;
        let found = match (type_code, subtype) {
            (TYPE_PAYMENT, 0) => OrdinaryPayment,

            (TYPE_MESSAGING, 0) => ArbitraryMessage,
            (TYPE_MESSAGING, 1) => AliasAssignment,
            (TYPE_MESSAGING, 2) => PollCreation,
            (TYPE_MESSAGING, 3) => VoteCasting,
            (TYPE_MESSAGING, 4) => HubAnnouncement,
            (TYPE_MESSAGING, 5) => AccountInfo,
            (TYPE_MESSAGING, 6) => AliasSell,
            (TYPE_MESSAGING, 7) => AliasBuy,

            (TYPE_COLORED_COINS, 0) => AssetIssuance,
            (TYPE_COLORED_COINS, 1) => AssetTransfer,
            (TYPE_COLORED_COINS, 2) => AskOrderPlacement,
            (TYPE_COLORED_COINS, 3) => BidOrderPlacement,
            (TYPE_COLORED_COINS, 4) => AskOrderCancellation,
            (TYPE_COLORED_COINS, 5) => BidOrderCancellation,

            (TYPE_DIGITAL_GOODS, 0) => DigitalGoodsListing,
            (TYPE_DIGITAL_GOODS, 1) => DigitalGoodsDelisting,
            (TYPE_DIGITAL_GOODS, 2) => DigitalGoodsPriceChange,
            (TYPE_DIGITAL_GOODS, 3) => DigitalGoodsQuantityChange,
            (TYPE_DIGITAL_GOODS, 4) => DigitalGoodsPurchase,
            (TYPE_DIGITAL_GOODS, 5) => DigitalGoodsDelivery,
            (TYPE_DIGITAL_GOODS, 6) => DigitalGoodsFeedback,
            (TYPE_DIGITAL_GOODS, 7) => DigitalGoodsRefund,

            (TYPE_ACCOUNT_CONTROL, 0) => EffectiveBalanceLeasing,

            _ => return None,
        };
        Some(found)
    }

    /// Major type byte.
    pub fn type_code(self) -> u8 {
        self.codes().0
    }

    /// Subtype nibble.
    pub fn subtype(self) -> u8 {
        self.codes().1
    }

    /// `(type, subtype)` as written on the wire.
    pub fn codes(self) -> (u8, u8) {
        use TransactionType::*;
        match self {
            OrdinaryPayment => (TYPE_PAYMENT, 0),

            ArbitraryMessage => (TYPE_MESSAGING, 0),
            AliasAssignment => (TYPE_MESSAGING, 1),
            PollCreation => (TYPE_MESSAGING, 2),
            VoteCasting => (TYPE_MESSAGING, 3),
            HubAnnouncement => (TYPE_MESSAGING, 4),
            AccountInfo => (TYPE_MESSAGING, 5),
            AliasSell => (TYPE_MESSAGING, 6),
            AliasBuy => (TYPE_MESSAGING, 7),

            AssetIssuance => (TYPE_COLORED_COINS, 0),
            AssetTransfer => (TYPE_COLORED_COINS, 1),
            AskOrderPlacement => (TYPE_COLORED_COINS, 2),
            BidOrderPlacement => (TYPE_COLORED_COINS, 3),
            AskOrderCancellation => (TYPE_COLORED_COINS, 4),
            BidOrderCancellation => (TYPE_COLORED_COINS, 5),

            DigitalGoodsListing => (TYPE_DIGITAL_GOODS, 0),
            DigitalGoodsDelisting => (TYPE_DIGITAL_GOODS, 1),
            DigitalGoodsPriceChange => (TYPE_DIGITAL_GOODS, 2),
            DigitalGoodsQuantityChange => (TYPE_DIGITAL_GOODS, 3),
            DigitalGoodsPurchase => (TYPE_DIGITAL_GOODS, 4),
            DigitalGoodsDelivery => (TYPE_DIGITAL_GOODS, 5),
            DigitalGoodsFeedback => (TYPE_DIGITAL_GOODS, 6),
            DigitalGoodsRefund => (TYPE_DIGITAL_GOODS, 7),

            EffectiveBalanceLeasing => (TYPE_ACCOUNT_CONTROL, 0),
        }
    }

    /// Whether the recipient field carries a real account. Types without a
    /// recipient write the genesis creator id in that slot and must move no
    /// coins.
    pub fn has_recipient(self) -> bool {
        use TransactionType::*;
        matches!(
            self,
            OrdinaryPayment
                | ArbitraryMessage
                | AliasSell
                | AliasBuy
                | AssetTransfer
                | DigitalGoodsPurchase
                | DigitalGoodsDelivery
                | DigitalGoodsFeedback
                | DigitalGoodsRefund
                | EffectiveBalanceLeasing
        )
    }

    /// Whether transactions of this type carry a signature. Every
    /// registered type does. Unsigned entries would skip the amount, fee
    /// and deadline checks and derive their id from a zero signature.
    pub fn is_signed(self) -> bool {
        true
    }

    /// Whether the attachment of this type is an empty marker.
    pub fn has_empty_attachment(self) -> bool {
        matches!(self, Self::OrdinaryPayment | Self::ArbitraryMessage)
    }

    /// Fee schedule below the next-fee height.
    pub fn baseline_fee(self) -> Fee {
        match self {
            Self::AssetIssuance => Fee::flat(1000 * ONE_NXT),
            _ => Fee::DEFAULT,
        }
    }

    /// Fee schedule at and above the next-fee height.
    pub fn next_fee(self) -> Fee {
        match self {
            Self::AssetIssuance => Fee::flat(1000 * ONE_NXT),
            _ => Fee::DEFAULT,
        }
    }

    /// Minimum fee in NQT for a transaction at `height` whose attachment and
    /// appendages occupy `appendages_size` bytes.
    ///
    /// ```
    /// use nxt_protocol::config::{ChainParams, ONE_NXT};
    /// use nxt_protocol::transaction::TransactionType;
    ///
    /// let params = ChainParams::default();
    /// let fee = TransactionType::OrdinaryPayment.minimum_fee(1000, 0, &params).unwrap();
    /// assert_eq!(fee, ONE_NXT);
    /// assert_eq!(TransactionType::OrdinaryPayment.minimum_fee(0, 0, &params).unwrap(), 0);
    /// ```
    pub fn minimum_fee(
        self,
        height: i32,
        appendages_size: usize,
        params: &ChainParams,
    ) -> Result<i64, NumericError> {
        if height < params.baseline_fee_height {
            return Ok(0);
        }
        let fee = if height >= params.next_fee_height {
            self.next_fee()
        } else {
            self.baseline_fee()
        };
        let size = i64::try_from(appendages_size).unwrap_or(i64::MAX);
        safe_add(fee.constant, safe_multiply(size, fee.per_appendage_byte)?)
    }

    /// Name used in JSON `version.<name>` keys and in logs.
    pub fn name(self) -> &'static str {
        use TransactionType::*;
        match self {
            OrdinaryPayment => "OrdinaryPayment",
            ArbitraryMessage => "ArbitraryMessage",
            AliasAssignment => "AliasAssignment",
            PollCreation => "PollCreation",
            VoteCasting => "VoteCasting",
            HubAnnouncement => "HubAnnouncement",
            AccountInfo => "AccountInfo",
            AliasSell => "AliasSell",
            AliasBuy => "AliasBuy",
            AssetIssuance => "AssetIssuance",
            AssetTransfer => "AssetTransfer",
            AskOrderPlacement => "AskOrderPlacement",
            BidOrderPlacement => "BidOrderPlacement",
            AskOrderCancellation => "AskOrderCancellation",
            BidOrderCancellation => "BidOrderCancellation",
            DigitalGoodsListing => "DigitalGoodsListing",
            DigitalGoodsDelisting => "DigitalGoodsDelisting",
            DigitalGoodsPriceChange => "DigitalGoodsPriceChange",
            DigitalGoodsQuantityChange => "DigitalGoodsQuantityChange",
            DigitalGoodsPurchase => "DigitalGoodsPurchase",
            DigitalGoodsDelivery => "DigitalGoodsDelivery",
            DigitalGoodsFeedback => "DigitalGoodsFeedback",
            DigitalGoodsRefund => "DigitalGoodsRefund",
            EffectiveBalanceLeasing => "EffectiveBalanceLeasing",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
