//! Type-specific attachment payloads.
//!
//! Every transaction carries exactly one attachment, and its variant must
//! match the transaction type. Payments and arbitrary messages carry empty
//! markers that occupy no bytes; every other type has a fixed little-endian
//! layout of ids, amounts and length-prefixed UTF-8 strings.
//!
//! The attachment's version byte is not part of the payload: it is held by
//! the transaction and framed around these bodies (see [`super::appendix`]).
//! The only layout that depends on it is the asset-transfer comment, which
//! exists at version 0 alone.

use bytes::BufMut;
use serde_json::Value;

use super::codec::{
    check_string, long_string_size, put_flagged_length, put_long_string, put_short_string,
    short_string_size, Reader, LONG_PREFIX_CAPACITY, SHORT_PREFIX_CAPACITY,
};
use super::json::{
    get_bool, get_hex, get_int, get_string, get_string_array, get_unsigned, JsonMap,
};
use super::types::TransactionType;
use super::verification::TransactionError;
use crate::config::*;
use crate::crypto::EncryptedPayload;
use crate::numeric::{to_hex, to_unsigned_long};

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasAssignment {
    pub alias: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasSell {
    pub alias: String,
    pub price_nqt: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasBuy {
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollCreation {
    pub name: String,
    pub description: String,
    pub options: Vec<String>,
    pub min_number_of_options: u8,
    pub max_number_of_options: u8,
    pub options_are_binary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteCasting {
    pub poll_id: u64,
    /// One byte per poll option.
    pub votes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubAnnouncement {
    pub min_fee_per_byte_nqt: i64,
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetIssuance {
    pub name: String,
    pub description: String,
    pub quantity_qnt: i64,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTransfer {
    pub asset_id: u64,
    pub quantity_qnt: i64,
    /// Only carried by version 0 attachments; must be empty otherwise.
    pub comment: String,
}

/// Ask or bid order placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlacement {
    pub asset_id: u64,
    pub quantity_qnt: i64,
    pub price_nqt: i64,
}

/// Ask or bid order cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCancellation {
    pub order_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsListing {
    pub name: String,
    pub description: String,
    pub tags: String,
    pub quantity: i32,
    pub price_nqt: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsDelisting {
    pub goods_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsPriceChange {
    pub goods_id: u64,
    pub price_nqt: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsQuantityChange {
    pub goods_id: u64,
    pub delta_quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsPurchase {
    pub goods_id: u64,
    pub quantity: i32,
    pub price_nqt: i64,
    pub delivery_deadline_timestamp: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsDelivery {
    pub purchase_id: u64,
    /// Goods encrypted to the buyer.
    pub goods: EncryptedPayload,
    pub goods_is_text: bool,
    pub discount_nqt: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsFeedback {
    pub purchase_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsRefund {
    pub purchase_id: u64,
    pub refund_nqt: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveBalanceLeasing {
    /// Lease length in blocks.
    pub period: i16,
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// The attachment of a transaction, one variant per [`TransactionType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    OrdinaryPayment,
    ArbitraryMessage,
    AliasAssignment(AliasAssignment),
    AliasSell(AliasSell),
    AliasBuy(AliasBuy),
    PollCreation(PollCreation),
    VoteCasting(VoteCasting),
    HubAnnouncement(HubAnnouncement),
    AccountInfo(AccountInfo),
    AssetIssuance(AssetIssuance),
    AssetTransfer(AssetTransfer),
    AskOrderPlacement(OrderPlacement),
    BidOrderPlacement(OrderPlacement),
    AskOrderCancellation(OrderCancellation),
    BidOrderCancellation(OrderCancellation),
    DigitalGoodsListing(GoodsListing),
    DigitalGoodsDelisting(GoodsDelisting),
    DigitalGoodsPriceChange(GoodsPriceChange),
    DigitalGoodsQuantityChange(GoodsQuantityChange),
    DigitalGoodsPurchase(GoodsPurchase),
    DigitalGoodsDelivery(GoodsDelivery),
    DigitalGoodsFeedback(GoodsFeedback),
    DigitalGoodsRefund(GoodsRefund),
    EffectiveBalanceLeasing(EffectiveBalanceLeasing),
}

impl Attachment {
    /// The empty marker for types that have one.
    pub fn empty_for(transaction_type: TransactionType) -> Option<Self> {
        match transaction_type {
            TransactionType::OrdinaryPayment => Some(Self::OrdinaryPayment),
            TransactionType::ArbitraryMessage => Some(Self::ArbitraryMessage),
            _ => None,
        }
    }

    /// The transaction type this attachment belongs to.
    pub fn transaction_type(&self) -> TransactionType {
        use Attachment as A;
        use TransactionType as T;
        match self {
            A::OrdinaryPayment => T::OrdinaryPayment,
            A::ArbitraryMessage => T::ArbitraryMessage,
            A::AliasAssignment(_) => T::AliasAssignment,
            A::AliasSell(_) => T::AliasSell,
            A::AliasBuy(_) => T::AliasBuy,
            A::PollCreation(_) => T::PollCreation,
            A::VoteCasting(_) => T::VoteCasting,
            A::HubAnnouncement(_) => T::HubAnnouncement,
            A::AccountInfo(_) => T::AccountInfo,
            A::AssetIssuance(_) => T::AssetIssuance,
            A::AssetTransfer(_) => T::AssetTransfer,
            A::AskOrderPlacement(_) => T::AskOrderPlacement,
            A::BidOrderPlacement(_) => T::BidOrderPlacement,
            A::AskOrderCancellation(_) => T::AskOrderCancellation,
            A::BidOrderCancellation(_) => T::BidOrderCancellation,
            A::DigitalGoodsListing(_) => T::DigitalGoodsListing,
            A::DigitalGoodsDelisting(_) => T::DigitalGoodsDelisting,
            A::DigitalGoodsPriceChange(_) => T::DigitalGoodsPriceChange,
            A::DigitalGoodsQuantityChange(_) => T::DigitalGoodsQuantityChange,
            A::DigitalGoodsPurchase(_) => T::DigitalGoodsPurchase,
            A::DigitalGoodsDelivery(_) => T::DigitalGoodsDelivery,
            A::DigitalGoodsFeedback(_) => T::DigitalGoodsFeedback,
            A::DigitalGoodsRefund(_) => T::DigitalGoodsRefund,
            A::EffectiveBalanceLeasing(_) => T::EffectiveBalanceLeasing,
        }
    }

    /// Empty markers have no body and no version byte.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::OrdinaryPayment | Self::ArbitraryMessage)
    }

    /// Name used in `version.<name>` JSON keys.
    pub fn name(&self) -> &'static str {
        self.transaction_type().name()
    }

    /// Size of the body in bytes, excluding the version byte.
    pub fn body_size(&self, version: u8) -> usize {
        use Attachment as A;
        match self {
            A::OrdinaryPayment | A::ArbitraryMessage => 0,
            A::AliasAssignment(a) => short_string_size(&a.alias) + long_string_size(&a.uri),
            A::AliasSell(a) => short_string_size(&a.alias) + 8,
            A::AliasBuy(a) => short_string_size(&a.alias),
            A::PollCreation(p) => {
                long_string_size(&p.name)
                    + long_string_size(&p.description)
                    + 1
                    + p.options.iter().map(|o| long_string_size(o)).sum::<usize>()
                    + 3
            }
            A::VoteCasting(v) => 8 + 1 + v.votes.len(),
            A::HubAnnouncement(h) => {
                8 + 1 + h.uris.iter().map(|u| long_string_size(u)).sum::<usize>()
            }
            A::AccountInfo(a) => short_string_size(&a.name) + long_string_size(&a.description),
            A::AssetIssuance(a) => {
                short_string_size(&a.name) + long_string_size(&a.description) + 8 + 1
            }
            A::AssetTransfer(a) => {
                8 + 8 + if version == 0 {
                    long_string_size(&a.comment)
                } else {
                    0
                }
            }
            A::AskOrderPlacement(_) | A::BidOrderPlacement(_) => 8 + 8 + 8,
            A::AskOrderCancellation(_) | A::BidOrderCancellation(_) => 8,
            A::DigitalGoodsListing(g) => {
                long_string_size(&g.name)
                    + long_string_size(&g.description)
                    + long_string_size(&g.tags)
                    + 4
                    + 8
            }
            A::DigitalGoodsDelisting(_) => 8,
            A::DigitalGoodsPriceChange(_) => 8 + 8,
            A::DigitalGoodsQuantityChange(_) => 8 + 4,
            A::DigitalGoodsPurchase(_) => 8 + 4 + 8 + 4,
            A::DigitalGoodsDelivery(d) => 8 + 4 + d.goods.size() + 8,
            A::DigitalGoodsFeedback(_) => 8,
            A::DigitalGoodsRefund(_) => 8 + 8,
            A::EffectiveBalanceLeasing(_) => 2,
        }
    }

    /// Writes the body, excluding the version byte.
    pub fn put_body<B: BufMut>(&self, buf: &mut B, version: u8) {
        use Attachment as A;
        match self {
            A::OrdinaryPayment | A::ArbitraryMessage => {}
            A::AliasAssignment(a) => {
                put_short_string(buf, &a.alias);
                put_long_string(buf, &a.uri);
            }
            A::AliasSell(a) => {
                put_short_string(buf, &a.alias);
                buf.put_i64_le(a.price_nqt);
            }
            A::AliasBuy(a) => put_short_string(buf, &a.alias),
            A::PollCreation(p) => {
                put_long_string(buf, &p.name);
                put_long_string(buf, &p.description);
                buf.put_u8(p.options.len() as u8);
                for option in &p.options {
                    put_long_string(buf, option);
                }
                buf.put_u8(p.min_number_of_options);
                buf.put_u8(p.max_number_of_options);
                buf.put_u8(p.options_are_binary as u8);
            }
            A::VoteCasting(v) => {
                buf.put_u64_le(v.poll_id);
                buf.put_u8(v.votes.len() as u8);
                buf.put_slice(&v.votes);
            }
            A::HubAnnouncement(h) => {
                buf.put_i64_le(h.min_fee_per_byte_nqt);
                buf.put_u8(h.uris.len() as u8);
                for uri in &h.uris {
                    put_long_string(buf, uri);
                }
            }
            A::AccountInfo(a) => {
                put_short_string(buf, &a.name);
                put_long_string(buf, &a.description);
            }
            A::AssetIssuance(a) => {
                put_short_string(buf, &a.name);
                put_long_string(buf, &a.description);
                buf.put_i64_le(a.quantity_qnt);
                buf.put_u8(a.decimals);
            }
            A::AssetTransfer(a) => {
                buf.put_u64_le(a.asset_id);
                buf.put_i64_le(a.quantity_qnt);
                if version == 0 {
                    put_long_string(buf, &a.comment);
                }
            }
            A::AskOrderPlacement(o) | A::BidOrderPlacement(o) => {
                buf.put_u64_le(o.asset_id);
                buf.put_i64_le(o.quantity_qnt);
                buf.put_i64_le(o.price_nqt);
            }
            A::AskOrderCancellation(o) | A::BidOrderCancellation(o) => buf.put_u64_le(o.order_id),
            A::DigitalGoodsListing(g) => {
                put_long_string(buf, &g.name);
                put_long_string(buf, &g.description);
                put_long_string(buf, &g.tags);
                buf.put_i32_le(g.quantity);
                buf.put_i64_le(g.price_nqt);
            }
            A::DigitalGoodsDelisting(g) => buf.put_u64_le(g.goods_id),
            A::DigitalGoodsPriceChange(g) => {
                buf.put_u64_le(g.goods_id);
                buf.put_i64_le(g.price_nqt);
            }
            A::DigitalGoodsQuantityChange(g) => {
                buf.put_u64_le(g.goods_id);
                buf.put_i32_le(g.delta_quantity);
            }
            A::DigitalGoodsPurchase(g) => {
                buf.put_u64_le(g.goods_id);
                buf.put_i32_le(g.quantity);
                buf.put_i64_le(g.price_nqt);
                buf.put_i32_le(g.delivery_deadline_timestamp);
            }
            A::DigitalGoodsDelivery(d) => {
                buf.put_u64_le(d.purchase_id);
                put_flagged_length(buf, d.goods.data().len(), d.goods_is_text);
                d.goods.put(buf);
                buf.put_i64_le(d.discount_nqt);
            }
            A::DigitalGoodsFeedback(g) => buf.put_u64_le(g.purchase_id),
            A::DigitalGoodsRefund(g) => {
                buf.put_u64_le(g.purchase_id);
                buf.put_i64_le(g.refund_nqt);
            }
            A::EffectiveBalanceLeasing(l) => buf.put_i16_le(l.period),
        }
    }

    /// Reads the body of a `transaction_type` attachment.
    pub(crate) fn parse_body(
        transaction_type: TransactionType,
        reader: &mut Reader<'_>,
        version: u8,
    ) -> Result<Self, TransactionError> {
        use TransactionType as T;
        let attachment = match transaction_type {
            T::OrdinaryPayment => Self::OrdinaryPayment,
            T::ArbitraryMessage => Self::ArbitraryMessage,
            T::AliasAssignment => Self::AliasAssignment(AliasAssignment {
                alias: reader.short_string(MAX_ALIAS_LENGTH, "alias")?,
                uri: reader.long_string(MAX_ALIAS_URI_LENGTH, "uri")?,
            }),
            T::AliasSell => Self::AliasSell(AliasSell {
                alias: reader.short_string(MAX_ALIAS_LENGTH, "alias")?,
                price_nqt: reader.i64("priceNQT")?,
            }),
            T::AliasBuy => Self::AliasBuy(AliasBuy {
                alias: reader.short_string(MAX_ALIAS_LENGTH, "alias")?,
            }),
            T::PollCreation => {
                let name = reader.long_string(MAX_POLL_NAME_LENGTH, "name")?;
                let description = reader.long_string(MAX_POLL_DESCRIPTION_LENGTH, "description")?;
                let count = reader.u8("options")? as usize;
                if count > MAX_POLL_OPTION_COUNT {
                    return Err(TransactionError::FieldTooLong {
                        field: "options",
                        length: count,
                        max: MAX_POLL_OPTION_COUNT,
                    });
                }
                let mut options = Vec::with_capacity(count);
                for _ in 0..count {
                    options.push(reader.long_string(MAX_POLL_OPTION_LENGTH, "options")?);
                }
                Self::PollCreation(PollCreation {
                    name,
                    description,
                    options,
                    min_number_of_options: reader.u8("minNumberOfOptions")?,
                    max_number_of_options: reader.u8("maxNumberOfOptions")?,
                    options_are_binary: reader.u8("optionsAreBinary")? != 0,
                })
            }
            T::VoteCasting => {
                let poll_id = reader.u64("pollId")?;
                let count = reader.u8("vote")? as usize;
                if count > MAX_POLL_OPTION_COUNT {
                    return Err(TransactionError::FieldTooLong {
                        field: "vote",
                        length: count,
                        max: MAX_POLL_OPTION_COUNT,
                    });
                }
                Self::VoteCasting(VoteCasting {
                    poll_id,
                    votes: reader.bytes(count, "vote")?,
                })
            }
            T::HubAnnouncement => {
                let min_fee_per_byte_nqt = reader.i64("minFeePerByteNQT")?;
                let count = reader.u8("uris")? as usize;
                if count > MAX_HUB_ANNOUNCEMENT_URIS {
                    return Err(TransactionError::FieldTooLong {
                        field: "uris",
                        length: count,
                        max: MAX_HUB_ANNOUNCEMENT_URIS,
                    });
                }
                let mut uris = Vec::with_capacity(count);
                for _ in 0..count {
                    uris.push(reader.long_string(MAX_HUB_ANNOUNCEMENT_URI_LENGTH, "uris")?);
                }
                Self::HubAnnouncement(HubAnnouncement {
                    min_fee_per_byte_nqt,
                    uris,
                })
            }
            T::AccountInfo => Self::AccountInfo(AccountInfo {
                name: reader.short_string(MAX_ACCOUNT_NAME_LENGTH, "name")?,
                description: reader.long_string(MAX_ACCOUNT_DESCRIPTION_LENGTH, "description")?,
            }),
            T::AssetIssuance => Self::AssetIssuance(AssetIssuance {
                name: reader.short_string(MAX_ASSET_NAME_LENGTH, "name")?,
                description: reader.long_string(MAX_ASSET_DESCRIPTION_LENGTH, "description")?,
                quantity_qnt: reader.i64("quantityQNT")?,
                decimals: reader.u8("decimals")?,
            }),
            T::AssetTransfer => {
                let asset_id = reader.u64("asset")?;
                let quantity_qnt = reader.i64("quantityQNT")?;
                let comment = if version == 0 {
                    reader.long_string(MAX_ASSET_TRANSFER_COMMENT_LENGTH, "comment")?
                } else {
                    String::new()
                };
                Self::AssetTransfer(AssetTransfer {
                    asset_id,
                    quantity_qnt,
                    comment,
                })
            }
            T::AskOrderPlacement | T::BidOrderPlacement => {
                let order = OrderPlacement {
                    asset_id: reader.u64("asset")?,
                    quantity_qnt: reader.i64("quantityQNT")?,
                    price_nqt: reader.i64("priceNQT")?,
                };
                if transaction_type == T::AskOrderPlacement {
                    Self::AskOrderPlacement(order)
                } else {
                    Self::BidOrderPlacement(order)
                }
            }
            T::AskOrderCancellation | T::BidOrderCancellation => {
                let order = OrderCancellation {
                    order_id: reader.u64("order")?,
                };
                if transaction_type == T::AskOrderCancellation {
                    Self::AskOrderCancellation(order)
                } else {
                    Self::BidOrderCancellation(order)
                }
            }
            T::DigitalGoodsListing => Self::DigitalGoodsListing(GoodsListing {
                name: reader.long_string(MAX_DGS_LISTING_NAME_LENGTH, "name")?,
                description: reader.long_string(MAX_DGS_LISTING_DESCRIPTION_LENGTH, "description")?,
                tags: reader.long_string(MAX_DGS_LISTING_TAGS_LENGTH, "tags")?,
                quantity: reader.i32("quantity")?,
                price_nqt: reader.i64("priceNQT")?,
            }),
            T::DigitalGoodsDelisting => Self::DigitalGoodsDelisting(GoodsDelisting {
                goods_id: reader.u64("goods")?,
            }),
            T::DigitalGoodsPriceChange => Self::DigitalGoodsPriceChange(GoodsPriceChange {
                goods_id: reader.u64("goods")?,
                price_nqt: reader.i64("priceNQT")?,
            }),
            T::DigitalGoodsQuantityChange => Self::DigitalGoodsQuantityChange(GoodsQuantityChange {
                goods_id: reader.u64("goods")?,
                delta_quantity: reader.i32("deltaQuantity")?,
            }),
            T::DigitalGoodsPurchase => Self::DigitalGoodsPurchase(GoodsPurchase {
                goods_id: reader.u64("goods")?,
                quantity: reader.i32("quantity")?,
                price_nqt: reader.i64("priceNQT")?,
                delivery_deadline_timestamp: reader.i32("deliveryDeadlineTimestamp")?,
            }),
            T::DigitalGoodsDelivery => {
                let purchase_id = reader.u64("purchase")?;
                let (length, goods_is_text) = reader.flagged_length("goodsData")?;
                let goods = reader.encrypted_payload(length, MAX_DGS_GOODS_LENGTH, "goodsData")?;
                Self::DigitalGoodsDelivery(GoodsDelivery {
                    purchase_id,
                    goods,
                    goods_is_text,
                    discount_nqt: reader.i64("discountNQT")?,
                })
            }
            T::DigitalGoodsFeedback => Self::DigitalGoodsFeedback(GoodsFeedback {
                purchase_id: reader.u64("purchase")?,
            }),
            T::DigitalGoodsRefund => Self::DigitalGoodsRefund(GoodsRefund {
                purchase_id: reader.u64("purchase")?,
                refund_nqt: reader.i64("refundNQT")?,
            }),
            T::EffectiveBalanceLeasing => Self::EffectiveBalanceLeasing(EffectiveBalanceLeasing {
                period: reader.i16("period")?,
            }),
        };
        Ok(attachment)
    }

    /// Adds the body's keys to the shared attachment object.
    pub(crate) fn put_json(&self, map: &mut JsonMap, version: u8) {
        use Attachment as A;
        let mut put = |key: &str, value: Value| {
            map.insert(key.to_string(), value);
        };
        match self {
            A::OrdinaryPayment | A::ArbitraryMessage => {}
            A::AliasAssignment(a) => {
                put("alias", a.alias.clone().into());
                put("uri", a.uri.clone().into());
            }
            A::AliasSell(a) => {
                put("alias", a.alias.clone().into());
                put("priceNQT", a.price_nqt.into());
            }
            A::AliasBuy(a) => put("alias", a.alias.clone().into()),
            A::PollCreation(p) => {
                put("name", p.name.clone().into());
                put("description", p.description.clone().into());
                put("options", p.options.clone().into());
                put("minNumberOfOptions", p.min_number_of_options.into());
                put("maxNumberOfOptions", p.max_number_of_options.into());
                put("optionsAreBinary", p.options_are_binary.into());
            }
            A::VoteCasting(v) => {
                put("pollId", to_unsigned_long(v.poll_id as i64).into());
                let votes: Vec<Value> = v.votes.iter().map(|&b| Value::from(b as i8)).collect();
                put("vote", votes.into());
            }
            A::HubAnnouncement(h) => {
                put("minFeePerByteNQT", h.min_fee_per_byte_nqt.into());
                put("uris", h.uris.clone().into());
            }
            A::AccountInfo(a) => {
                put("name", a.name.clone().into());
                put("description", a.description.clone().into());
            }
            A::AssetIssuance(a) => {
                put("name", a.name.clone().into());
                put("description", a.description.clone().into());
                put("quantityQNT", a.quantity_qnt.into());
                put("decimals", a.decimals.into());
            }
            A::AssetTransfer(a) => {
                put("asset", to_unsigned_long(a.asset_id as i64).into());
                put("quantityQNT", a.quantity_qnt.into());
                if version == 0 {
                    put("comment", a.comment.clone().into());
                }
            }
            A::AskOrderPlacement(o) | A::BidOrderPlacement(o) => {
                put("asset", to_unsigned_long(o.asset_id as i64).into());
                put("quantityQNT", o.quantity_qnt.into());
                put("priceNQT", o.price_nqt.into());
            }
            A::AskOrderCancellation(o) | A::BidOrderCancellation(o) => {
                put("order", to_unsigned_long(o.order_id as i64).into());
            }
            A::DigitalGoodsListing(g) => {
                put("name", g.name.clone().into());
                put("description", g.description.clone().into());
                put("tags", g.tags.clone().into());
                put("quantity", g.quantity.into());
                put("priceNQT", g.price_nqt.into());
            }
            A::DigitalGoodsDelisting(g) => put("goods", to_unsigned_long(g.goods_id as i64).into()),
            A::DigitalGoodsPriceChange(g) => {
                put("goods", to_unsigned_long(g.goods_id as i64).into());
                put("priceNQT", g.price_nqt.into());
            }
            A::DigitalGoodsQuantityChange(g) => {
                put("goods", to_unsigned_long(g.goods_id as i64).into());
                put("deltaQuantity", g.delta_quantity.into());
            }
            A::DigitalGoodsPurchase(g) => {
                put("goods", to_unsigned_long(g.goods_id as i64).into());
                put("quantity", g.quantity.into());
                put("priceNQT", g.price_nqt.into());
                put("deliveryDeadlineTimestamp", g.delivery_deadline_timestamp.into());
            }
            A::DigitalGoodsDelivery(d) => {
                put("purchase", to_unsigned_long(d.purchase_id as i64).into());
                put("goodsData", to_hex(d.goods.data()).into());
                put("goodsNonce", to_hex(d.goods.nonce()).into());
                put("goodsIsText", d.goods_is_text.into());
                put("discountNQT", d.discount_nqt.into());
            }
            A::DigitalGoodsFeedback(g) => {
                put("purchase", to_unsigned_long(g.purchase_id as i64).into());
            }
            A::DigitalGoodsRefund(g) => {
                put("purchase", to_unsigned_long(g.purchase_id as i64).into());
                put("refundNQT", g.refund_nqt.into());
            }
            A::EffectiveBalanceLeasing(l) => put("period", l.period.into()),
        }
    }

    /// Reads a `transaction_type` attachment from the shared attachment
    /// object.
    pub(crate) fn from_json(
        transaction_type: TransactionType,
        map: &JsonMap,
        version: u8,
    ) -> Result<Self, TransactionError> {
        use TransactionType as T;
        let attachment = match transaction_type {
            T::OrdinaryPayment => Self::OrdinaryPayment,
            T::ArbitraryMessage => Self::ArbitraryMessage,
            T::AliasAssignment => Self::AliasAssignment(AliasAssignment {
                alias: get_string(map, "alias")?,
                uri: get_string(map, "uri")?,
            }),
            T::AliasSell => Self::AliasSell(AliasSell {
                alias: get_string(map, "alias")?,
                price_nqt: get_int(map, "priceNQT")?,
            }),
            T::AliasBuy => Self::AliasBuy(AliasBuy {
                alias: get_string(map, "alias")?,
            }),
            T::PollCreation => Self::PollCreation(PollCreation {
                name: get_string(map, "name")?,
                description: get_string(map, "description")?,
                options: get_string_array(map, "options")?,
                min_number_of_options: get_int(map, "minNumberOfOptions")?,
                max_number_of_options: get_int(map, "maxNumberOfOptions")?,
                options_are_binary: get_bool(map, "optionsAreBinary"),
            }),
            T::VoteCasting => {
                let votes = match map.get("vote") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(|item| {
                            item.as_i64()
                                .filter(|v| (-128..=255).contains(v))
                                .map(|v| v as u8)
                                .ok_or_else(|| TransactionError::InvalidField {
                                    field: "vote",
                                    reason: item.to_string(),
                                })
                        })
                        .collect::<Result<Vec<u8>, _>>()?,
                    None | Some(Value::Null) => Vec::new(),
                    Some(other) => {
                        return Err(TransactionError::InvalidField {
                            field: "vote",
                            reason: other.to_string(),
                        })
                    }
                };
                Self::VoteCasting(VoteCasting {
                    poll_id: get_unsigned(map, "pollId")?,
                    votes,
                })
            }
            T::HubAnnouncement => Self::HubAnnouncement(HubAnnouncement {
                min_fee_per_byte_nqt: get_int(map, "minFeePerByteNQT")?,
                uris: get_string_array(map, "uris")?,
            }),
            T::AccountInfo => Self::AccountInfo(AccountInfo {
                name: get_string(map, "name")?,
                description: get_string(map, "description")?,
            }),
            T::AssetIssuance => Self::AssetIssuance(AssetIssuance {
                name: get_string(map, "name")?,
                description: get_string(map, "description")?,
                quantity_qnt: get_int(map, "quantityQNT")?,
                decimals: get_int(map, "decimals")?,
            }),
            T::AssetTransfer => Self::AssetTransfer(AssetTransfer {
                asset_id: get_unsigned(map, "asset")?,
                quantity_qnt: get_int(map, "quantityQNT")?,
                comment: if version == 0 {
                    get_string(map, "comment")?
                } else {
                    String::new()
                },
            }),
            T::AskOrderPlacement | T::BidOrderPlacement => {
                let order = OrderPlacement {
                    asset_id: get_unsigned(map, "asset")?,
                    quantity_qnt: get_int(map, "quantityQNT")?,
                    price_nqt: get_int(map, "priceNQT")?,
                };
                if transaction_type == T::AskOrderPlacement {
                    Self::AskOrderPlacement(order)
                } else {
                    Self::BidOrderPlacement(order)
                }
            }
            T::AskOrderCancellation | T::BidOrderCancellation => {
                let order = OrderCancellation {
                    order_id: get_unsigned(map, "order")?,
                };
                if transaction_type == T::AskOrderCancellation {
                    Self::AskOrderCancellation(order)
                } else {
                    Self::BidOrderCancellation(order)
                }
            }
            T::DigitalGoodsListing => Self::DigitalGoodsListing(GoodsListing {
                name: get_string(map, "name")?,
                description: get_string(map, "description")?,
                tags: get_string(map, "tags")?,
                quantity: get_int(map, "quantity")?,
                price_nqt: get_int(map, "priceNQT")?,
            }),
            T::DigitalGoodsDelisting => Self::DigitalGoodsDelisting(GoodsDelisting {
                goods_id: get_unsigned(map, "goods")?,
            }),
            T::DigitalGoodsPriceChange => Self::DigitalGoodsPriceChange(GoodsPriceChange {
                goods_id: get_unsigned(map, "goods")?,
                price_nqt: get_int(map, "priceNQT")?,
            }),
            T::DigitalGoodsQuantityChange => Self::DigitalGoodsQuantityChange(GoodsQuantityChange {
                goods_id: get_unsigned(map, "goods")?,
                delta_quantity: get_int(map, "deltaQuantity")?,
            }),
            T::DigitalGoodsPurchase => Self::DigitalGoodsPurchase(GoodsPurchase {
                goods_id: get_unsigned(map, "goods")?,
                quantity: get_int(map, "quantity")?,
                price_nqt: get_int(map, "priceNQT")?,
                delivery_deadline_timestamp: get_int(map, "deliveryDeadlineTimestamp")?,
            }),
            T::DigitalGoodsDelivery => Self::DigitalGoodsDelivery(GoodsDelivery {
                purchase_id: get_unsigned(map, "purchase")?,
                goods: EncryptedPayload::from_parts(
                    get_hex(map, "goodsData")?,
                    get_hex(map, "goodsNonce")?,
                )?,
                goods_is_text: get_bool(map, "goodsIsText"),
                discount_nqt: get_int(map, "discountNQT")?,
            }),
            T::DigitalGoodsFeedback => Self::DigitalGoodsFeedback(GoodsFeedback {
                purchase_id: get_unsigned(map, "purchase")?,
            }),
            T::DigitalGoodsRefund => Self::DigitalGoodsRefund(GoodsRefund {
                purchase_id: get_unsigned(map, "purchase")?,
                refund_nqt: get_int(map, "refundNQT")?,
            }),
            T::EffectiveBalanceLeasing => Self::EffectiveBalanceLeasing(EffectiveBalanceLeasing {
                period: get_int(map, "period")?,
            }),
        };
        Ok(attachment)
    }

    /// Length and count limits. Run by the builder before a transaction is
    /// frozen.
    pub fn validate(&self, version: u8) -> Result<(), TransactionError> {
        use Attachment as A;
        const SHORT: usize = SHORT_PREFIX_CAPACITY;
        const LONG: usize = LONG_PREFIX_CAPACITY;
        match self {
            A::OrdinaryPayment | A::ArbitraryMessage => {}
            A::AliasAssignment(a) => {
                check_string(&a.alias, MAX_ALIAS_LENGTH, SHORT, "alias")?;
                check_string(&a.uri, MAX_ALIAS_URI_LENGTH, LONG, "uri")?;
            }
            A::AliasSell(a) => check_string(&a.alias, MAX_ALIAS_LENGTH, SHORT, "alias")?,
            A::AliasBuy(a) => check_string(&a.alias, MAX_ALIAS_LENGTH, SHORT, "alias")?,
            A::PollCreation(p) => {
                check_string(&p.name, MAX_POLL_NAME_LENGTH, LONG, "name")?;
                check_string(&p.description, MAX_POLL_DESCRIPTION_LENGTH, LONG, "description")?;
                check_count(p.options.len(), MAX_POLL_OPTION_COUNT, "options")?;
                for option in &p.options {
                    check_string(option, MAX_POLL_OPTION_LENGTH, LONG, "options")?;
                }
            }
            A::VoteCasting(v) => check_count(v.votes.len(), MAX_POLL_OPTION_COUNT, "vote")?,
            A::HubAnnouncement(h) => {
                check_count(h.uris.len(), MAX_HUB_ANNOUNCEMENT_URIS, "uris")?;
                for uri in &h.uris {
                    check_string(uri, MAX_HUB_ANNOUNCEMENT_URI_LENGTH, LONG, "uris")?;
                }
            }
            A::AccountInfo(a) => {
                check_string(&a.name, MAX_ACCOUNT_NAME_LENGTH, SHORT, "name")?;
                check_string(&a.description, MAX_ACCOUNT_DESCRIPTION_LENGTH, LONG, "description")?;
            }
            A::AssetIssuance(a) => {
                check_string(&a.name, MAX_ASSET_NAME_LENGTH, SHORT, "name")?;
                check_string(&a.description, MAX_ASSET_DESCRIPTION_LENGTH, LONG, "description")?;
            }
            A::AssetTransfer(a) => {
                check_string(&a.comment, MAX_ASSET_TRANSFER_COMMENT_LENGTH, LONG, "comment")?;
                if version > 0 && !a.comment.is_empty() {
                    return Err(TransactionError::InvalidField {
                        field: "comment",
                        reason: format!("not carried by version {version} asset transfers"),
                    });
                }
            }
            A::DigitalGoodsListing(g) => {
                check_string(&g.name, MAX_DGS_LISTING_NAME_LENGTH, LONG, "name")?;
                check_string(&g.description, MAX_DGS_LISTING_DESCRIPTION_LENGTH, LONG, "description")?;
                check_string(&g.tags, MAX_DGS_LISTING_TAGS_LENGTH, LONG, "tags")?;
            }
            A::DigitalGoodsDelivery(d) => {
                check_count(d.goods.data().len(), MAX_DGS_GOODS_LENGTH, "goodsData")?;
            }
            A::AskOrderPlacement(_)
            | A::BidOrderPlacement(_)
            | A::AskOrderCancellation(_)
            | A::BidOrderCancellation(_)
            | A::DigitalGoodsDelisting(_)
            | A::DigitalGoodsPriceChange(_)
            | A::DigitalGoodsQuantityChange(_)
            | A::DigitalGoodsPurchase(_)
            | A::DigitalGoodsFeedback(_)
            | A::DigitalGoodsRefund(_)
            | A::EffectiveBalanceLeasing(_) => {}
        }
        Ok(())
    }
}

fn check_count(count: usize, max: usize, field: &'static str) -> Result<(), TransactionError> {
    if count > max {
        return Err(TransactionError::FieldTooLong {
            field,
            length: count,
            max,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
