//! Transaction model and construction via the builder pattern.
//!
//! A [`TransactionBuilder`] accumulates fields; `.build()` substitutes the
//! minimum fee for a zero fee, runs every structural check and freezes the
//! result into a [`Transaction`]. After that the only change a transaction
//! accepts is its signature, set exactly once (see [`super::signing`]).
//!
//! Parsing from bytes or JSON goes through the same builder, so a parsed
//! transaction has passed exactly the checks a freshly built one has.
//!
//! # Wire layout
//!
//! All integers are little-endian.
//!
//! ```text
//! type u8 | version << 4 | subtype u8 | timestamp i32 | deadline i16
//! sender public key [32] | recipient u64 | amount i64 | fee i64
//! referenced full hash [32] | signature [64]
//! (version > 0) flags u32 | ec block height i32 | ec block id u64
//! attachment | message | encrypted message | public key announcement
//! | encrypt-to-self message
//! ```

use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use super::appendix::{
    check_version, read_version, Appendage, EncryptToSelfMessage, EncryptedMessage, Message,
    PublicKeyAnnouncement, ENCRYPTED_MESSAGE_FLAG, ENCRYPT_TO_SELF_MESSAGE_FLAG, MESSAGE_FLAG,
    PUBLIC_KEY_ANNOUNCEMENT_FLAG,
};
use super::attachment::Attachment;
use super::codec::Reader;
use super::json::{get_version, put_version, JsonMap, TransactionJson};
use super::signing::{derive_identity, Identity};
use super::types::TransactionType;
use super::verification::TransactionError;
use crate::config::{
    epoch_now, ChainParams, CURRENT_TRANSACTION_VERSION, DEFAULT_DEADLINE_MINUTES,
    GENESIS_CREATOR_ID, HASH_LENGTH, MAX_BALANCE_NQT, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
    SIGNATURE_OFFSET, TRANSACTION_HEADER_LENGTH, TRANSACTION_V1_EXTENSION_LENGTH,
};
use crate::crypto::{self, PrivateKey, PublicKey, Signature};
use crate::numeric::{parse_hex_array, parse_unsigned_long, to_hex, to_unsigned_long};

const KNOWN_FLAGS: u32 =
    MESSAGE_FLAG | ENCRYPTED_MESSAGE_FLAG | PUBLIC_KEY_ANNOUNCEMENT_FLAG | ENCRYPT_TO_SELF_MESSAGE_FLAG;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An NXT ledger transaction.
///
/// Immutable once built, apart from the signature. The id and full hash
/// are derived from the signed byte form on first use and cached; they are
/// unavailable until the transaction is signed.
#[derive(Debug, Clone)]
pub struct Transaction {
    transaction_type: TransactionType,
    version: u8,
    timestamp: i32,
    deadline: i16,
    sender_public_key: PublicKey,
    /// Zero when the type has no recipient.
    recipient_id: u64,
    amount_nqt: i64,
    fee_nqt: i64,
    referenced_transaction_full_hash: Option<[u8; HASH_LENGTH]>,
    signature: Option<Signature>,
    ec_block_height: i32,
    ec_block_id: u64,
    attachment: Attachment,
    attachment_version: u8,
    /// Sorted by flag, at most one of each kind.
    appendages: Vec<Appendage>,
    height: Option<u32>,
    confirmations: Option<u32>,
    identity: OnceLock<Identity>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.transaction_type == other.transaction_type
            && self.version == other.version
            && self.timestamp == other.timestamp
            && self.deadline == other.deadline
            && self.sender_public_key == other.sender_public_key
            && self.recipient_id == other.recipient_id
            && self.amount_nqt == other.amount_nqt
            && self.fee_nqt == other.fee_nqt
            && self.referenced_transaction_full_hash == other.referenced_transaction_full_hash
            && self.signature == other.signature
            && self.ec_block_height == other.ec_block_height
            && self.ec_block_id == other.ec_block_id
            && self.attachment == other.attachment
            && self.attachment_version == other.attachment_version
            && self.appendages == other.appendages
            && self.height == other.height
            && self.confirmations == other.confirmations
    }
}

impl Eq for Transaction {}

impl Transaction {
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Seconds since the network epoch.
    pub fn timestamp(&self) -> i32 {
        self.timestamp
    }

    /// Minutes the transaction stays valid after its timestamp.
    pub fn deadline(&self) -> i16 {
        self.deadline
    }

    /// Epoch second after which the transaction can no longer be included.
    pub fn expiration(&self) -> i64 {
        i64::from(self.timestamp) + i64::from(self.deadline) * 60
    }

    pub fn sender_public_key(&self) -> &PublicKey {
        &self.sender_public_key
    }

    pub fn sender_id(&self) -> u64 {
        self.sender_public_key.account_id()
    }

    /// `None` for types that have no recipient.
    pub fn recipient_id(&self) -> Option<u64> {
        self.transaction_type
            .has_recipient()
            .then_some(self.recipient_id)
    }

    pub fn amount_nqt(&self) -> i64 {
        self.amount_nqt
    }

    pub fn fee_nqt(&self) -> i64 {
        self.fee_nqt
    }

    pub fn referenced_transaction_full_hash(&self) -> Option<&[u8; HASH_LENGTH]> {
        self.referenced_transaction_full_hash.as_ref()
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn ec_block_height(&self) -> i32 {
        self.ec_block_height
    }

    pub fn ec_block_id(&self) -> u64 {
        self.ec_block_id
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub fn attachment_version(&self) -> u8 {
        self.attachment_version
    }

    pub fn message(&self) -> Option<&Message> {
        self.appendages.iter().find_map(|a| match a {
            Appendage::Message(m) => Some(m),
            _ => None,
        })
    }

    pub fn encrypted_message(&self) -> Option<&EncryptedMessage> {
        self.appendages.iter().find_map(|a| match a {
            Appendage::EncryptedMessage(m) => Some(m),
            _ => None,
        })
    }

    pub fn public_key_announcement(&self) -> Option<&PublicKeyAnnouncement> {
        self.appendages.iter().find_map(|a| match a {
            Appendage::PublicKeyAnnouncement(a) => Some(a),
            _ => None,
        })
    }

    pub fn encrypt_to_self_message(&self) -> Option<&EncryptToSelfMessage> {
        self.appendages.iter().find_map(|a| match a {
            Appendage::EncryptToSelfMessage(m) => Some(m),
            _ => None,
        })
    }

    /// Ledger height, when supplied by the ledger.
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn confirmations(&self) -> Option<u32> {
        self.confirmations
    }

    /// Present appendages in wire order.
    pub fn appendages(&self) -> &[Appendage] {
        &self.appendages
    }

    /// Presence bitmask written in version 1 headers.
    pub fn flags(&self) -> u32 {
        self.appendages.iter().fold(0, |flags, a| flags | a.flag())
    }

    fn attachment_size(&self) -> usize {
        if self.attachment.is_empty() {
            return 0;
        }
        usize::from(self.attachment_version > 0) + self.attachment.body_size(self.attachment_version)
    }

    /// Bytes after the header: the attachment and every appendage, each
    /// with its version prefix. This is the size the fee rule charges for.
    pub fn appendages_size(&self) -> usize {
        self.attachment_size() + self.appendages.iter().map(Appendage::size).sum::<usize>()
    }

    /// Total serialized size.
    pub fn size(&self) -> usize {
        let extension = if self.version > 0 {
            TRANSACTION_V1_EXTENSION_LENGTH
        } else {
            0
        };
        TRANSACTION_HEADER_LENGTH + extension + self.appendages_size()
    }

    /// The full binary form, including the signature if present.
    pub fn bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        let recipient = if self.transaction_type.has_recipient() {
            self.recipient_id
        } else {
            GENESIS_CREATOR_ID
        };
        buf.push(self.transaction_type.type_code());
        buf.push((self.version << 4) | self.transaction_type.subtype());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&self.deadline.to_le_bytes());
        buf.extend_from_slice(self.sender_public_key.as_bytes());
        buf.extend_from_slice(&recipient.to_le_bytes());
        buf.extend_from_slice(&self.amount_nqt.to_le_bytes());
        buf.extend_from_slice(&self.fee_nqt.to_le_bytes());
        buf.extend_from_slice(
            self.referenced_transaction_full_hash
                .as_ref()
                .unwrap_or(&[0u8; HASH_LENGTH]),
        );
        match &self.signature {
            Some(signature) => buf.extend_from_slice(signature.as_bytes()),
            None => buf.extend_from_slice(&[0u8; SIGNATURE_LENGTH]),
        }
        if self.version > 0 {
            buf.extend_from_slice(&self.flags().to_le_bytes());
            buf.extend_from_slice(&self.ec_block_height.to_le_bytes());
            buf.extend_from_slice(&self.ec_block_id.to_le_bytes());
        }
        if !self.attachment.is_empty() {
            if self.attachment_version > 0 {
                buf.push(self.attachment_version);
            }
            self.attachment.put_body(&mut buf, self.attachment_version);
        }
        for appendage in &self.appendages {
            appendage.put(&mut buf);
        }
        buf
    }

    /// The binary form with the signature bytes zeroed: what gets signed.
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut buf = self.bytes();
        buf[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_LENGTH].fill(0);
        buf
    }

    /// Signs with `private_key`, which must belong to the sender. A
    /// transaction can be signed only once.
    pub fn sign(&mut self, private_key: &PrivateKey) -> Result<(), TransactionError> {
        super::signing::sign_transaction(self, private_key).map(|_| ())
    }

    /// Stores a signature and drops any cached identity.
    pub(super) fn set_signature(&mut self, signature: Signature) {
        self.signature = Some(signature);
        self.identity = OnceLock::new();
    }

    /// Whether the signature verifies against the sender key, with
    /// canonical encodings enforced. False for unsigned transactions.
    pub fn verify_signature(&self) -> bool {
        match &self.signature {
            Some(signature) => crypto::verify(
                signature,
                &self.unsigned_bytes(),
                &self.sender_public_key,
                true,
            ),
            None => false,
        }
    }

    fn identity(&self) -> Result<&Identity, TransactionError> {
        if let Some(identity) = self.identity.get() {
            return Ok(identity);
        }
        let signature = match (&self.signature, self.transaction_type.is_signed()) {
            (Some(signature), _) => Some(signature),
            (None, false) => None,
            (None, true) => return Err(TransactionError::NotSigned),
        };
        let identity = derive_identity(&self.unsigned_bytes(), signature);
        Ok(self.identity.get_or_init(|| identity))
    }

    /// The 64-bit transaction id.
    pub fn id(&self) -> Result<u64, TransactionError> {
        Ok(self.identity()?.id)
    }

    /// The id as an unsigned decimal string.
    pub fn string_id(&self) -> Result<String, TransactionError> {
        Ok(self.id()?.to_string())
    }

    pub fn full_hash(&self) -> Result<[u8; HASH_LENGTH], TransactionError> {
        Ok(self.identity()?.full_hash)
    }

    pub fn full_hash_hex(&self) -> Result<String, TransactionError> {
        Ok(to_hex(&self.full_hash()?))
    }

    // -- Binary parsing -----------------------------------------------------

    /// Parses the binary form under the default [`ChainParams`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        Self::parse(bytes, &ChainParams::default())
    }

    /// Parses the binary form. Every byte must be consumed and the result
    /// must pass the same checks as [`TransactionBuilder::build`].
    pub fn parse(bytes: &[u8], params: &ChainParams) -> Result<Self, TransactionError> {
        Self::parse_inner(bytes, params).map_err(|error| {
            debug!(%error, length = bytes.len(), "rejected transaction bytes");
            error
        })
    }

    fn parse_inner(bytes: &[u8], params: &ChainParams) -> Result<Self, TransactionError> {
        let mut reader = Reader::new(bytes);
        let type_code = reader.u8("type")?;
        let version_and_subtype = reader.u8("subtype")?;
        let version = version_and_subtype >> 4;
        let subtype = version_and_subtype & 0x0f;
        let transaction_type = TransactionType::from_codes(type_code, subtype)
            .ok_or(TransactionError::UnknownType { type_code, subtype })?;
        if version > CURRENT_TRANSACTION_VERSION {
            return Err(TransactionError::UnsupportedVersion(version));
        }

        let mut builder = TransactionBuilder::new(transaction_type)
            .version(version)
            .chain_params(*params)
            .timestamp(reader.i32("timestamp")?)
            .deadline(reader.i16("deadline")?)
            .sender_public_key(PublicKey::from_bytes(
                reader.array::<PUBLIC_KEY_LENGTH>("senderPublicKey")?,
            ));
        let recipient = reader.u64("recipient")?;
        if transaction_type.has_recipient() {
            builder = builder.recipient(recipient);
        }
        builder = builder
            .amount(reader.i64("amountNQT")?)
            .fee(reader.i64("feeNQT")?)
            .referenced_transaction_full_hash(reader.array::<HASH_LENGTH>("referencedTransactionFullHash")?)
            .signature(Signature::from_bytes(reader.array::<SIGNATURE_LENGTH>("signature")?));

        let mut flags = 0;
        if version > 0 {
            flags = reader.u32("flags")?;
            if flags & !KNOWN_FLAGS != 0 {
                return Err(TransactionError::InvalidField {
                    field: "flags",
                    reason: format!("unknown appendage bits {:#x}", flags & !KNOWN_FLAGS),
                });
            }
            let ec_block_height = reader.i32("ecBlockHeight")?;
            let ec_block_id = reader.u64("ecBlockId")?;
            builder = builder.ec_block(ec_block_height, ec_block_id);
        }

        let attachment_version = if transaction_type.has_empty_attachment() {
            0
        } else {
            read_version(&mut reader, version)?
        };
        let attachment = Attachment::parse_body(transaction_type, &mut reader, attachment_version)?;
        builder = builder
            .attachment(attachment)
            .attachment_version(attachment_version);

        let legacy_message = version == 0 && transaction_type == TransactionType::ArbitraryMessage;
        if legacy_message || flags & MESSAGE_FLAG != 0 {
            builder = builder.message(Message::parse(&mut reader, version)?);
        }
        if flags & ENCRYPTED_MESSAGE_FLAG != 0 {
            builder = builder.encrypted_message(EncryptedMessage::parse(&mut reader, version)?);
        }
        if flags & PUBLIC_KEY_ANNOUNCEMENT_FLAG != 0 {
            builder = builder.public_key_announcement(PublicKeyAnnouncement::parse(&mut reader, version)?);
        }
        if flags & ENCRYPT_TO_SELF_MESSAGE_FLAG != 0 {
            builder = builder.encrypt_to_self_message(EncryptToSelfMessage::parse(&mut reader, version)?);
        }
        reader.finish()?;
        builder.build()
    }

    // -- JSON -----------------------------------------------------------------

    /// The JSON record exchanged with nodes and wallets.
    pub fn to_json(&self) -> Result<Value, TransactionError> {
        Ok(serde_json::to_value(self.to_dto())?)
    }

    /// Parses the JSON record under `params`.
    pub fn from_json(value: Value, params: &ChainParams) -> Result<Self, TransactionError> {
        let dto: TransactionJson = serde_json::from_value(value)?;
        Self::from_dto(dto, params)
    }

    /// Parses JSON text under `params`.
    pub fn from_json_str(text: &str, params: &ChainParams) -> Result<Self, TransactionError> {
        let dto: TransactionJson = serde_json::from_str(text)?;
        Self::from_dto(dto, params)
    }

    fn to_dto(&self) -> TransactionJson {
        let mut attachment = JsonMap::new();
        self.attachment.put_json(&mut attachment, self.attachment_version);
        if !self.attachment.is_empty() {
            put_version(&mut attachment, self.attachment.name(), self.attachment_version);
        }
        for appendage in &self.appendages {
            appendage.put_json(&mut attachment);
        }
        TransactionJson {
            type_code: self.transaction_type.type_code(),
            subtype: self.transaction_type.subtype(),
            timestamp: self.timestamp,
            deadline: self.deadline,
            sender_public_key: self.sender_public_key.to_hex(),
            recipient: self
                .recipient_id()
                .map(|id| to_unsigned_long(id as i64)),
            amount_nqt: self.amount_nqt,
            fee_nqt: self.fee_nqt,
            referenced_transaction_full_hash: self.referenced_transaction_full_hash.map(|h| to_hex(&h)),
            signature: self.signature.map(|s| s.to_hex()),
            version: self.version,
            ec_block_height: self.ec_block_height,
            ec_block_id: (self.version > 0).then(|| to_unsigned_long(self.ec_block_id as i64)),
            attachment: (!attachment.is_empty()).then_some(attachment),
            height: self.height,
            confirmations: self.confirmations,
        }
    }

    fn from_dto(dto: TransactionJson, params: &ChainParams) -> Result<Self, TransactionError> {
        let transaction_type = TransactionType::from_codes(dto.type_code, dto.subtype).ok_or(
            TransactionError::UnknownType {
                type_code: dto.type_code,
                subtype: dto.subtype,
            },
        )?;
        let map = dto.attachment.unwrap_or_default();
        let attachment_version = if transaction_type.has_empty_attachment() {
            0
        } else {
            get_version(&map, transaction_type.name())?
        };

        let mut builder = TransactionBuilder::new(transaction_type)
            .version(dto.version)
            .chain_params(*params)
            .timestamp(dto.timestamp)
            .deadline(dto.deadline)
            .sender_public_key(PublicKey::from_hex(&dto.sender_public_key)?)
            .amount(dto.amount_nqt)
            .fee(dto.fee_nqt)
            .attachment(Attachment::from_json(transaction_type, &map, attachment_version)?)
            .attachment_version(attachment_version);

        if transaction_type.has_recipient() {
            if let Some(recipient) = &dto.recipient {
                builder = builder.recipient(parse_unsigned_long(recipient)?);
            }
        }
        if let Some(hash) = &dto.referenced_transaction_full_hash {
            builder = builder.referenced_transaction_full_hash(parse_hex_array(hash)?);
        }
        if let Some(signature) = &dto.signature {
            builder = builder.signature(Signature::from_hex(signature)?);
        }
        if dto.version > 0 {
            let ec_block_id = match &dto.ec_block_id {
                Some(id) => parse_unsigned_long(id)?,
                None => 0,
            };
            builder = builder.ec_block(dto.ec_block_height, ec_block_id);
        }
        if let Some(message) = Message::from_json(&map)? {
            builder = builder.message(message);
        }
        if let Some(message) = EncryptedMessage::from_json(&map)? {
            builder = builder.encrypted_message(message);
        }
        if let Some(announcement) = PublicKeyAnnouncement::from_json(&map)? {
            builder = builder.public_key_announcement(announcement);
        }
        if let Some(message) = EncryptToSelfMessage::from_json(&map)? {
            builder = builder.encrypt_to_self_message(message);
        }
        if let Some(height) = dto.height {
            builder = builder.height(height);
        }
        if let Some(confirmations) = dto.confirmations {
            builder = builder.confirmations(confirmations);
        }
        builder.build()
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dto().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Transaction {
    /// Deserializes under the default [`ChainParams`].
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dto = TransactionJson::deserialize(deserializer)?;
        Self::from_dto(dto, &ChainParams::default()).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Transaction`].
///
/// Unset fields default to: the current version, the current epoch time,
/// a 1440 minute deadline, no recipient, zero amount, and a zero fee which
/// `build()` replaces with the type's minimum fee.
///
/// ```
/// use nxt_protocol::crypto::KeyPair;
/// use nxt_protocol::config::ONE_NXT;
/// use nxt_protocol::transaction::{TransactionBuilder, TransactionType};
///
/// let keys = KeyPair::from_secret_phrase("builder doc").unwrap();
/// let mut tx = TransactionBuilder::new(TransactionType::OrdinaryPayment)
///     .sender_public_key(keys.public_key())
///     .recipient(12345)
///     .amount(5 * ONE_NXT)
///     .build()
///     .unwrap();
/// assert_eq!(tx.fee_nqt(), ONE_NXT);
///
/// tx.sign(keys.private_key()).unwrap();
/// assert!(tx.verify_signature());
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    transaction_type: TransactionType,
    version: u8,
    timestamp: Option<i32>,
    deadline: i16,
    sender_public_key: Option<PublicKey>,
    recipient_id: u64,
    amount_nqt: i64,
    fee_nqt: i64,
    referenced_transaction_full_hash: Option<[u8; HASH_LENGTH]>,
    signature: Option<Signature>,
    ec_block_height: i32,
    ec_block_id: u64,
    attachment: Option<Attachment>,
    attachment_version: Option<u8>,
    /// Sorted by flag, at most one of each kind.
    appendages: Vec<Appendage>,
    height: Option<u32>,
    confirmations: Option<u32>,
    params: ChainParams,
}

impl TransactionBuilder {
    pub fn new(transaction_type: TransactionType) -> Self {
        Self {
            transaction_type,
            version: CURRENT_TRANSACTION_VERSION,
            timestamp: None,
            deadline: DEFAULT_DEADLINE_MINUTES,
            sender_public_key: None,
            recipient_id: 0,
            amount_nqt: 0,
            fee_nqt: 0,
            referenced_transaction_full_hash: None,
            signature: None,
            ec_block_height: 0,
            ec_block_id: 0,
            attachment: None,
            attachment_version: None,
            appendages: Vec::new(),
            height: None,
            confirmations: None,
            params: ChainParams::default(),
        }
    }

    /// A builder holding every field of `tx`, signature included.
    pub fn from_transaction(tx: &Transaction) -> Self {
        Self {
            transaction_type: tx.transaction_type,
            version: tx.version,
            timestamp: Some(tx.timestamp),
            deadline: tx.deadline,
            sender_public_key: Some(tx.sender_public_key),
            recipient_id: tx.recipient_id,
            amount_nqt: tx.amount_nqt,
            fee_nqt: tx.fee_nqt,
            referenced_transaction_full_hash: tx.referenced_transaction_full_hash,
            signature: tx.signature,
            ec_block_height: tx.ec_block_height,
            ec_block_id: tx.ec_block_id,
            attachment: Some(tx.attachment.clone()),
            attachment_version: Some(tx.attachment_version),
            appendages: tx.appendages.clone(),
            height: tx.height,
            confirmations: tx.confirmations,
            params: ChainParams::default(),
        }
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn timestamp(mut self, timestamp: i32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn deadline(mut self, minutes: i16) -> Self {
        self.deadline = minutes;
        self
    }

    pub fn sender_public_key(mut self, public_key: PublicKey) -> Self {
        self.sender_public_key = Some(public_key);
        self
    }

    pub fn recipient(mut self, account_id: u64) -> Self {
        self.recipient_id = account_id;
        self
    }

    pub fn amount(mut self, amount_nqt: i64) -> Self {
        self.amount_nqt = amount_nqt;
        self
    }

    /// Zero means "use the minimum fee".
    pub fn fee(mut self, fee_nqt: i64) -> Self {
        self.fee_nqt = fee_nqt;
        self
    }

    pub fn referenced_transaction_full_hash(mut self, full_hash: [u8; HASH_LENGTH]) -> Self {
        self.referenced_transaction_full_hash = Some(full_hash);
        self
    }

    /// A signature obtained elsewhere. All zeros means unsigned.
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Economic clustering reference. Version 1 only.
    pub fn ec_block(mut self, height: i32, block_id: u64) -> Self {
        self.ec_block_height = height;
        self.ec_block_id = block_id;
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Defaults to 1 for non-empty attachments in version 1 transactions
    /// and 0 otherwise.
    pub fn attachment_version(mut self, version: u8) -> Self {
        self.attachment_version = Some(version);
        self
    }

    /// Adds an appendage, replacing any earlier one of the same kind.
    pub fn appendage(mut self, appendage: impl Into<Appendage>) -> Self {
        let appendage = appendage.into();
        let flag = appendage.flag();
        self.appendages.retain(|a| a.flag() != flag);
        self.appendages.push(appendage);
        self.appendages.sort_by_key(Appendage::flag);
        self
    }

    pub fn message(self, message: Message) -> Self {
        self.appendage(message)
    }

    pub fn encrypted_message(self, message: EncryptedMessage) -> Self {
        self.appendage(message)
    }

    pub fn public_key_announcement(self, announcement: PublicKeyAnnouncement) -> Self {
        self.appendage(announcement)
    }

    pub fn encrypt_to_self_message(self, message: EncryptToSelfMessage) -> Self {
        self.appendage(message)
    }

    /// Ledger height; also selects the fee schedule.
    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn confirmations(mut self, confirmations: u32) -> Self {
        self.confirmations = Some(confirmations);
        self
    }

    pub fn chain_params(mut self, params: ChainParams) -> Self {
        self.params = params;
        self
    }

    /// Validates and freezes the transaction.
    pub fn build(self) -> Result<Transaction, TransactionError> {
        let transaction_type = self.transaction_type;
        let version = self.version;
        if version > CURRENT_TRANSACTION_VERSION {
            return Err(TransactionError::UnsupportedVersion(version));
        }
        let sender_public_key = self
            .sender_public_key
            .ok_or(TransactionError::MissingField("senderPublicKey"))?;
        let attachment = match self.attachment {
            Some(attachment) => attachment,
            None => Attachment::empty_for(transaction_type)
                .ok_or(TransactionError::MissingField("attachment"))?,
        };
        if attachment.transaction_type() != transaction_type {
            return Err(TransactionError::AttachmentTypeMismatch {
                transaction: transaction_type,
                attachment: attachment.transaction_type(),
            });
        }
        let attachment_version = match self.attachment_version {
            _ if attachment.is_empty() => 0,
            Some(v) => v,
            None if version > 0 => 1,
            None => 0,
        };

        let mut tx = Transaction {
            transaction_type,
            version,
            timestamp: self.timestamp.unwrap_or_else(epoch_now),
            deadline: self.deadline,
            sender_public_key,
            recipient_id: self.recipient_id,
            amount_nqt: self.amount_nqt,
            fee_nqt: self.fee_nqt,
            referenced_transaction_full_hash: self
                .referenced_transaction_full_hash
                .filter(|h| h.iter().any(|&b| b != 0)),
            signature: self
                .signature
                .filter(|s| s.as_bytes().iter().any(|&b| b != 0)),
            ec_block_height: self.ec_block_height,
            ec_block_id: self.ec_block_id,
            attachment,
            attachment_version,
            appendages: self.appendages,
            height: self.height,
            confirmations: self.confirmations,
            identity: OnceLock::new(),
        };

        let effective_height = match tx.height {
            Some(h) => i32::try_from(h).unwrap_or(i32::MAX),
            None => self.params.unconfirmed_fee_height,
        };
        let minimum_fee =
            transaction_type.minimum_fee(effective_height, tx.appendages_size(), &self.params)?;
        if tx.fee_nqt == 0 {
            debug!(
                transaction_type = %transaction_type,
                fee = minimum_fee,
                "no fee given, using the minimum fee"
            );
            tx.fee_nqt = minimum_fee;
        } else if tx.fee_nqt > 0 && tx.fee_nqt < minimum_fee {
            return Err(TransactionError::FeeBelowMinimum {
                fee: tx.fee_nqt,
                minimum: minimum_fee,
            });
        }

        validate(&tx)?;
        Ok(tx)
    }
}

/// Checks on a transaction whose fee is already settled.
fn validate(tx: &Transaction) -> Result<(), TransactionError> {
    if tx.transaction_type.is_signed() {
        check_bounds(tx)?;
    }
    validate_structure(tx)
}

/// Deadline, fee and amount limits. Unsigned entries are exempt.
fn check_bounds(tx: &Transaction) -> Result<(), TransactionError> {
    if tx.deadline < 1 {
        return Err(TransactionError::InvalidDeadline(tx.deadline));
    }
    if !(0..=MAX_BALANCE_NQT).contains(&tx.fee_nqt) {
        return Err(TransactionError::FeeOutOfRange(tx.fee_nqt));
    }
    if !(0..=MAX_BALANCE_NQT).contains(&tx.amount_nqt) {
        return Err(TransactionError::AmountOutOfRange(tx.amount_nqt));
    }
    Ok(())
}

fn validate_structure(tx: &Transaction) -> Result<(), TransactionError> {
    let transaction_type = tx.transaction_type;
    if !transaction_type.has_recipient() {
        if tx.recipient_id != 0 {
            return Err(TransactionError::UnexpectedRecipient {
                transaction_type,
                recipient: tx.recipient_id,
            });
        }
        if tx.amount_nqt != 0 {
            return Err(TransactionError::UnexpectedAmount {
                transaction_type,
                amount: tx.amount_nqt,
            });
        }
    }

    if !tx.attachment.is_empty() {
        check_version(tx.attachment.name(), tx.attachment_version, tx.version)?;
    }
    tx.attachment.validate(tx.attachment_version)?;

    for appendage in &tx.appendages {
        appendage.verify_version(tx.version)?;
        appendage.validate(transaction_type, tx.recipient_id)?;
    }

    if tx.version == 0 {
        validate_legacy(tx)?;
    }
    Ok(())
}

/// Version 0 transactions carry no flags and no EC block reference, so the
/// only appendage they can hold is the message implied by an arbitrary
/// message transaction.
fn validate_legacy(tx: &Transaction) -> Result<(), TransactionError> {
    let transaction_type = tx.transaction_type;
    for appendage in &tx.appendages {
        let implied = matches!(
            (appendage, transaction_type),
            (Appendage::Message(_), TransactionType::ArbitraryMessage)
        );
        if !implied {
            return Err(TransactionError::AppendageNotAllowed {
                appendage: appendage.name(),
                transaction_type,
            });
        }
    }
    if transaction_type == TransactionType::ArbitraryMessage && tx.message().is_none() {
        return Err(TransactionError::MissingField("message"));
    }
    if tx.ec_block_height != 0 || tx.ec_block_id != 0 {
        return Err(TransactionError::InvalidField {
            field: "ecBlockHeight",
            reason: "not carried by version 0 transactions".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ONE_NXT;
    use crate::crypto::{EncryptedPayload, KeyPair};
    use crate::transaction::attachment::{AliasAssignment, AssetIssuance};

    fn keys() -> KeyPair {
        KeyPair::from_secret_phrase("builder tests").unwrap()
    }

    fn payment() -> TransactionBuilder {
        TransactionBuilder::new(TransactionType::OrdinaryPayment)
            .sender_public_key(keys().public_key())
            .recipient(12345)
            .amount(ONE_NXT)
            .timestamp(0)
    }

    #[test]
    fn zero_fee_becomes_minimum() {
        let tx = payment().build().unwrap();
        assert_eq!(tx.fee_nqt(), ONE_NXT);
    }

    #[test]
    fn fee_below_minimum_fails() {
        let err = payment().fee(ONE_NXT - 1).build().unwrap_err();
        assert!(matches!(err, TransactionError::FeeBelowMinimum { minimum, .. } if minimum == ONE_NXT));
    }

    #[test]
    fn negative_fee_is_out_of_range() {
        assert!(matches!(
            payment().fee(-1).build(),
            Err(TransactionError::FeeOutOfRange(-1))
        ));
    }

    #[test]
    fn fee_schedule_follows_height() {
        let tx = payment().height(0).build().unwrap();
        assert_eq!(tx.fee_nqt(), 0);
        let issuance = TransactionBuilder::new(TransactionType::AssetIssuance)
            .sender_public_key(keys().public_key())
            .attachment(Attachment::AssetIssuance(AssetIssuance {
                name: "GOLD".into(),
                description: String::new(),
                quantity_qnt: 1,
                decimals: 0,
            }))
            .build()
            .unwrap();
        assert_eq!(issuance.fee_nqt(), 1000 * ONE_NXT);
    }

    #[test]
    fn amount_bounds() {
        assert!(matches!(
            payment().amount(-1).build(),
            Err(TransactionError::AmountOutOfRange(-1))
        ));
        assert!(matches!(
            payment().amount(MAX_BALANCE_NQT + 1).build(),
            Err(TransactionError::AmountOutOfRange(_))
        ));
        assert!(payment().amount(MAX_BALANCE_NQT).build().is_ok());
    }

    #[test]
    fn deadline_must_be_positive() {
        assert!(matches!(
            payment().deadline(0).build(),
            Err(TransactionError::InvalidDeadline(0))
        ));
    }

    #[test]
    fn recipientless_types_reject_recipient_and_amount() {
        let alias = || {
            TransactionBuilder::new(TransactionType::AliasAssignment)
                .sender_public_key(keys().public_key())
                .attachment(Attachment::AliasAssignment(AliasAssignment {
                    alias: "name".into(),
                    uri: "uri".into(),
                }))
        };
        assert!(alias().build().is_ok());
        assert!(matches!(
            alias().recipient(7).build(),
            Err(TransactionError::UnexpectedRecipient { recipient: 7, .. })
        ));
        assert!(matches!(
            alias().amount(7).build(),
            Err(TransactionError::UnexpectedAmount { amount: 7, .. })
        ));
    }

    #[test]
    fn attachment_must_match_type() {
        let err = payment()
            .attachment(Attachment::ArbitraryMessage)
            .build()
            .unwrap_err();
        assert!(matches!(err, TransactionError::AttachmentTypeMismatch { .. }));
    }

    #[test]
    fn missing_attachment_for_non_empty_type() {
        let err = TransactionBuilder::new(TransactionType::AliasBuy)
            .sender_public_key(keys().public_key())
            .build()
            .unwrap_err();
        assert!(matches!(err, TransactionError::MissingField("attachment")));
    }

    #[test]
    fn appendage_versions_follow_transaction_version() {
        assert!(payment().message(Message::text("hi")).build().is_ok());
        assert!(matches!(
            payment().message(Message::text("hi").with_version(0)).build(),
            Err(TransactionError::AppendageVersionMismatch { appendage: "Message", .. })
        ));
        assert!(matches!(
            payment()
                .version(0)
                .message(Message::text("hi").with_version(0))
                .build(),
            Err(TransactionError::AppendageNotAllowed { .. })
        ));
    }

    #[test]
    fn legacy_arbitrary_message_needs_its_message() {
        let base = || {
            TransactionBuilder::new(TransactionType::ArbitraryMessage)
                .version(0)
                .sender_public_key(keys().public_key())
                .recipient(1)
                .timestamp(0)
        };
        assert!(matches!(
            base().build(),
            Err(TransactionError::MissingField("message"))
        ));
        let tx = base()
            .message(Message::text("legacy").with_version(0))
            .build()
            .unwrap();
        let parsed = Transaction::from_bytes(&tx.bytes()).unwrap();
        assert_eq!(parsed, tx);
    }

    #[test]
    fn size_counts_header_extension_and_appendages() {
        let tx = payment().build().unwrap();
        assert_eq!(tx.size(), 176);
        assert_eq!(tx.bytes().len(), 176);

        let tx = payment().message(Message::text("hi")).build().unwrap();
        assert_eq!(tx.appendages_size(), 1 + 4 + 2);
        assert_eq!(tx.bytes().len(), tx.size());
        assert_eq!(tx.flags(), MESSAGE_FLAG);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        assert!(matches!(
            payment().version(2).build(),
            Err(TransactionError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn id_requires_signature_and_is_cached_after_signing() {
        let keys = keys();
        let mut tx = payment().build().unwrap();
        assert!(matches!(tx.id(), Err(TransactionError::NotSigned)));
        tx.sign(keys.private_key()).unwrap();
        let id = tx.id().unwrap();
        assert_eq!(tx.id().unwrap(), id);
        assert_eq!(tx.string_id().unwrap(), id.to_string());
        assert_eq!(tx.full_hash_hex().unwrap().len(), 64);
    }

    #[test]
    fn parse_rejects_unknown_flags_and_trailing_bytes() {
        let tx = payment().build().unwrap();
        let mut bytes = tx.bytes();
        bytes.push(0);
        assert!(matches!(
            Transaction::from_bytes(&bytes),
            Err(TransactionError::TrailingBytes(1))
        ));

        let mut bytes = tx.bytes();
        bytes[TRANSACTION_HEADER_LENGTH] = 0x10;
        assert!(matches!(
            Transaction::from_bytes(&bytes),
            Err(TransactionError::InvalidField { field: "flags", .. })
        ));
    }

    #[test]
    fn parse_rejects_unknown_type() {
        let mut bytes = payment().build().unwrap().bytes();
        bytes[0] = 9;
        assert!(matches!(
            Transaction::from_bytes(&bytes),
            Err(TransactionError::UnknownType { type_code: 9, .. })
        ));
    }

    #[test]
    fn json_round_trip_with_appendages() {
        let keys = keys();
        let mut tx = payment()
            .message(Message::binary(vec![1, 2, 3]))
            .public_key_announcement(PublicKeyAnnouncement::new(keys.public_key()))
            .recipient(keys.account_id())
            .ec_block(100, u64::MAX)
            .height(5)
            .confirmations(2)
            .build()
            .unwrap();
        tx.sign(keys.private_key()).unwrap();

        let json = tx.to_json().unwrap();
        assert_eq!(json["ecBlockId"], Value::from(u64::MAX.to_string()));
        assert_eq!(json["attachment"]["version.Message"], Value::from(1));
        let parsed = Transaction::from_json(json, &ChainParams::default()).unwrap();
        assert_eq!(parsed, tx);
        assert!(parsed.verify_signature());
    }

    #[test]
    fn appendages_are_written_in_flag_order() {
        let keys = keys();
        let tx = payment()
            .recipient(keys.account_id())
            .encrypt_to_self_message(EncryptToSelfMessage::new(EncryptedPayload::EMPTY, true))
            .public_key_announcement(PublicKeyAnnouncement::new(keys.public_key()))
            .encrypted_message(EncryptedMessage::new(EncryptedPayload::EMPTY, false))
            .message(Message::text("first"))
            .message(Message::text("second"))
            .build()
            .unwrap();
        assert_eq!(tx.flags(), 0b1111);
        assert_eq!(tx.appendages().len(), 4);
        assert_eq!(tx.message().and_then(Message::as_text), Some("second"));
        let parsed = Transaction::from_bytes(&tx.bytes()).unwrap();
        assert_eq!(parsed, tx);
    }

    #[test]
    fn empty_encrypted_message_round_trips() {
        let tx = payment()
            .encrypted_message(EncryptedMessage::new(EncryptedPayload::EMPTY, true))
            .build()
            .unwrap();
        assert_eq!(Transaction::from_bytes(&tx.bytes()).unwrap(), tx);

        let json = tx.to_json().unwrap();
        assert_eq!(json["attachment"]["encryptedMessage"]["nonce"], Value::from(""));
        let parsed = Transaction::from_json(json.clone(), &ChainParams::default()).unwrap();
        assert_eq!(parsed, tx);

        // a nonce without data has no byte form
        let mut json = json;
        json["attachment"]["encryptedMessage"]["nonce"] = Value::from("07".repeat(32));
        assert!(matches!(
            Transaction::from_json(json, &ChainParams::default()),
            Err(TransactionError::Crypto(_))
        ));
    }

    #[test]
    fn bounds_are_checked_apart_from_structure() {
        let mut tx = payment().build().unwrap();
        tx.deadline = 0;
        tx.fee_nqt = -1;
        assert!(matches!(
            check_bounds(&tx),
            Err(TransactionError::InvalidDeadline(0))
        ));
        assert!(validate_structure(&tx).is_ok());

        tx.deadline = 1;
        assert!(matches!(
            check_bounds(&tx),
            Err(TransactionError::FeeOutOfRange(-1))
        ));
        tx.fee_nqt = ONE_NXT;
        assert!(validate(&tx).is_ok());
    }
}
