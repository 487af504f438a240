//! Optional appendages carried after the attachment.
//!
//! A transaction may carry up to four appendages, always serialized in the
//! same order: a plain [`Message`], an [`EncryptedMessage`] to the
//! recipient, a [`PublicKeyAnnouncement`] of the recipient's key, and an
//! [`EncryptToSelfMessage`]. In version 1 transactions their presence is
//! signalled by the flag bits in the header, and the wire order is the order
//! of those bits.
//!
//! Every appendage has its own version. A version above zero is written as
//! a one-byte prefix and counted in [`Appendage::size`]; version 0 writes
//! nothing. Version 0 appendages belong to version 0 transactions only.

use serde_json::{json, Value};

use super::codec::{put_flagged_length, Reader};
use super::json::{get_bool, get_hex, get_version, put_version, JsonMap};
use super::types::TransactionType;
use super::verification::TransactionError;
use crate::config::{MAX_ARBITRARY_MESSAGE_LENGTH, MAX_ENCRYPTED_MESSAGE_LENGTH, PUBLIC_KEY_LENGTH};
use crate::crypto::{EncryptedPayload, PublicKey};
use crate::numeric::{parse_hex_array, to_hex};

pub const MESSAGE_FLAG: u32 = 1;
pub const ENCRYPTED_MESSAGE_FLAG: u32 = 2;
pub const PUBLIC_KEY_ANNOUNCEMENT_FLAG: u32 = 4;
pub const ENCRYPT_TO_SELF_MESSAGE_FLAG: u32 = 8;

/// Default version given to newly constructed appendages.
const DEFAULT_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Appendage
// ---------------------------------------------------------------------------

/// One of the four appendages a transaction can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Appendage {
    Message(Message),
    EncryptedMessage(EncryptedMessage),
    PublicKeyAnnouncement(PublicKeyAnnouncement),
    EncryptToSelfMessage(EncryptToSelfMessage),
}

impl Appendage {
    /// Name used in `version.<name>` JSON keys and in errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Message(_) => "Message",
            Self::EncryptedMessage(_) => "EncryptedMessage",
            Self::PublicKeyAnnouncement(_) => "PublicKeyAnnouncement",
            Self::EncryptToSelfMessage(_) => "EncryptToSelfMessage",
        }
    }

    /// Header flag bit. Appendages are written in ascending flag order.
    pub fn flag(&self) -> u32 {
        match self {
            Self::Message(_) => MESSAGE_FLAG,
            Self::EncryptedMessage(_) => ENCRYPTED_MESSAGE_FLAG,
            Self::PublicKeyAnnouncement(_) => PUBLIC_KEY_ANNOUNCEMENT_FLAG,
            Self::EncryptToSelfMessage(_) => ENCRYPT_TO_SELF_MESSAGE_FLAG,
        }
    }

    pub fn version(&self) -> u8 {
        match self {
            Self::Message(m) => m.version,
            Self::EncryptedMessage(m) => m.0.version,
            Self::PublicKeyAnnouncement(a) => a.version,
            Self::EncryptToSelfMessage(m) => m.0.version,
        }
    }

    fn body_size(&self) -> usize {
        match self {
            Self::Message(m) => 4 + m.message.len(),
            Self::EncryptedMessage(m) => m.0.body_size(),
            Self::PublicKeyAnnouncement(_) => PUBLIC_KEY_LENGTH,
            Self::EncryptToSelfMessage(m) => m.0.body_size(),
        }
    }

    /// Bytes on the wire, including the version prefix when present.
    pub fn size(&self) -> usize {
        usize::from(self.version() > 0) + self.body_size()
    }

    pub fn put(&self, buf: &mut Vec<u8>) {
        if self.version() > 0 {
            buf.push(self.version());
        }
        match self {
            Self::Message(m) => {
                put_flagged_length(buf, m.message.len(), m.is_text);
                buf.extend_from_slice(&m.message);
            }
            Self::EncryptedMessage(m) => m.0.put_body(buf),
            Self::PublicKeyAnnouncement(a) => buf.extend_from_slice(a.public_key.as_bytes()),
            Self::EncryptToSelfMessage(m) => m.0.put_body(buf),
        }
    }

    /// Adds this appendage's keys to the shared attachment object.
    pub fn put_json(&self, map: &mut JsonMap) {
        match self {
            Self::Message(m) => {
                let message = match m.as_text() {
                    Some(text) => text.to_string(),
                    None => to_hex(&m.message),
                };
                map.insert("message".into(), message.into());
                map.insert("messageIsText".into(), m.is_text.into());
            }
            Self::EncryptedMessage(m) => {
                map.insert("encryptedMessage".into(), m.0.to_json());
            }
            Self::PublicKeyAnnouncement(a) => {
                map.insert("recipientPublicKey".into(), a.public_key.to_hex().into());
            }
            Self::EncryptToSelfMessage(m) => {
                map.insert("encryptToSelfMessage".into(), m.0.to_json());
            }
        }
        put_version(map, self.name(), self.version());
    }

    /// Version 0 transactions take version 0 appendages; anything newer
    /// takes versions above zero.
    pub fn verify_version(&self, transaction_version: u8) -> Result<(), TransactionError> {
        check_version(self.name(), self.version(), transaction_version)
    }

    /// Length limits plus the rules tying an appendage to its transaction.
    pub(crate) fn validate(
        &self,
        transaction_type: TransactionType,
        recipient: u64,
    ) -> Result<(), TransactionError> {
        match self {
            Self::Message(m) => m.validate(),
            Self::EncryptedMessage(m) => {
                if !transaction_type.has_recipient() {
                    return Err(TransactionError::AppendageNotAllowed {
                        appendage: self.name(),
                        transaction_type,
                    });
                }
                m.validate()
            }
            Self::PublicKeyAnnouncement(a) => a.validate(transaction_type, recipient),
            Self::EncryptToSelfMessage(m) => m.validate(),
        }
    }
}

impl From<Message> for Appendage {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

impl From<EncryptedMessage> for Appendage {
    fn from(message: EncryptedMessage) -> Self {
        Self::EncryptedMessage(message)
    }
}

impl From<PublicKeyAnnouncement> for Appendage {
    fn from(announcement: PublicKeyAnnouncement) -> Self {
        Self::PublicKeyAnnouncement(announcement)
    }
}

impl From<EncryptToSelfMessage> for Appendage {
    fn from(message: EncryptToSelfMessage) -> Self {
        Self::EncryptToSelfMessage(message)
    }
}

pub(crate) fn check_version(
    appendage: &'static str,
    version: u8,
    transaction_version: u8,
) -> Result<(), TransactionError> {
    let valid = if transaction_version == 0 {
        version == 0
    } else {
        version > 0
    };
    if valid {
        Ok(())
    } else {
        Err(TransactionError::AppendageVersionMismatch {
            appendage,
            version,
            transaction_version,
        })
    }
}

/// Version byte of an appendage being parsed. Version 0 transactions carry
/// none.
pub(crate) fn read_version(
    reader: &mut Reader<'_>,
    transaction_version: u8,
) -> Result<u8, TransactionError> {
    if transaction_version == 0 {
        Ok(0)
    } else {
        reader.u8("version")
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A plain message, either UTF-8 text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    message: Vec<u8>,
    is_text: bool,
    version: u8,
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            message: text.into().into_bytes(),
            is_text: true,
            version: DEFAULT_VERSION,
        }
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            message: bytes.into(),
            is_text: false,
            version: DEFAULT_VERSION,
        }
    }

    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// The message as text, if it was sent as text.
    pub fn as_text(&self) -> Option<&str> {
        if self.is_text {
            std::str::from_utf8(&self.message).ok()
        } else {
            None
        }
    }

    pub fn is_text(&self) -> bool {
        self.is_text
    }

    pub(crate) fn validate(&self) -> Result<(), TransactionError> {
        if self.message.len() > MAX_ARBITRARY_MESSAGE_LENGTH {
            return Err(TransactionError::FieldTooLong {
                field: "message",
                length: self.message.len(),
                max: MAX_ARBITRARY_MESSAGE_LENGTH,
            });
        }
        Ok(())
    }

    pub(crate) fn parse(
        reader: &mut Reader<'_>,
        transaction_version: u8,
    ) -> Result<Self, TransactionError> {
        let version = read_version(reader, transaction_version)?;
        let (length, is_text) = reader.flagged_length("message")?;
        if length > MAX_ARBITRARY_MESSAGE_LENGTH {
            return Err(TransactionError::FieldTooLong {
                field: "message",
                length,
                max: MAX_ARBITRARY_MESSAGE_LENGTH,
            });
        }
        let message = reader.bytes(length, "message")?;
        if is_text && std::str::from_utf8(&message).is_err() {
            return Err(TransactionError::InvalidUtf8 { field: "message" });
        }
        Ok(Self {
            message,
            is_text,
            version,
        })
    }

    pub(crate) fn from_json(map: &JsonMap) -> Result<Option<Self>, TransactionError> {
        let is_text = get_bool(map, "messageIsText");
        let message = match map.get("message") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) if is_text => s.clone().into_bytes(),
            Some(Value::String(_)) => get_hex(map, "message")?,
            Some(other) => {
                return Err(TransactionError::InvalidField {
                    field: "message",
                    reason: other.to_string(),
                })
            }
        };
        Ok(Some(Self {
            message,
            is_text,
            version: get_version(map, "Message")?,
        }))
    }
}

// ---------------------------------------------------------------------------
// Encrypted messages
// ---------------------------------------------------------------------------

/// Ciphertext shared by both encrypted message appendages.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Sealed {
    payload: EncryptedPayload,
    is_text: bool,
    version: u8,
}

impl Sealed {
    fn body_size(&self) -> usize {
        4 + self.payload.size()
    }

    fn put_body(&self, buf: &mut Vec<u8>) {
        put_flagged_length(buf, self.payload.data().len(), self.is_text);
        self.payload.put(buf);
    }

    fn validate(&self, field: &'static str) -> Result<(), TransactionError> {
        if self.payload.data().len() > MAX_ENCRYPTED_MESSAGE_LENGTH {
            return Err(TransactionError::FieldTooLong {
                field,
                length: self.payload.data().len(),
                max: MAX_ENCRYPTED_MESSAGE_LENGTH,
            });
        }
        Ok(())
    }

    fn parse(
        reader: &mut Reader<'_>,
        transaction_version: u8,
        field: &'static str,
    ) -> Result<Self, TransactionError> {
        let version = read_version(reader, transaction_version)?;
        let (length, is_text) = reader.flagged_length(field)?;
        let payload = reader.encrypted_payload(length, MAX_ENCRYPTED_MESSAGE_LENGTH, field)?;
        Ok(Self {
            payload,
            is_text,
            version,
        })
    }

    fn to_json(&self) -> Value {
        json!({
            "data": to_hex(self.payload.data()),
            "nonce": to_hex(self.payload.nonce()),
            "isText": self.is_text,
        })
    }

    fn from_json(
        map: &JsonMap,
        key: &'static str,
        name: &str,
    ) -> Result<Option<Self>, TransactionError> {
        let object = match map.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(object)) => object,
            Some(other) => {
                return Err(TransactionError::InvalidField {
                    field: key,
                    reason: other.to_string(),
                })
            }
        };
        let payload = EncryptedPayload::from_parts(get_hex(object, "data")?, get_hex(object, "nonce")?)?;
        Ok(Some(Self {
            payload,
            is_text: get_bool(object, "isText"),
            version: get_version(map, name)?,
        }))
    }
}

/// A message encrypted to the transaction's recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage(Sealed);

/// A message the sender encrypted to their own key, as a private note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptToSelfMessage(Sealed);

macro_rules! sealed_appendage {
    ($ty:ident, $name:literal, $key:literal) => {
        impl $ty {
            pub fn new(payload: EncryptedPayload, is_text: bool) -> Self {
                Self(Sealed {
                    payload,
                    is_text,
                    version: DEFAULT_VERSION,
                })
            }

            pub fn with_version(mut self, version: u8) -> Self {
                self.0.version = version;
                self
            }

            pub fn version(&self) -> u8 {
                self.0.version
            }

            pub fn payload(&self) -> &EncryptedPayload {
                &self.0.payload
            }

            pub fn is_text(&self) -> bool {
                self.0.is_text
            }

            pub(crate) fn validate(&self) -> Result<(), TransactionError> {
                self.0.validate($key)
            }

            pub(crate) fn parse(
                reader: &mut Reader<'_>,
                transaction_version: u8,
            ) -> Result<Self, TransactionError> {
                Sealed::parse(reader, transaction_version, $key).map(Self)
            }

            pub(crate) fn from_json(map: &JsonMap) -> Result<Option<Self>, TransactionError> {
                Ok(Sealed::from_json(map, $key, $name)?.map(Self))
            }
        }
    };
}

sealed_appendage!(EncryptedMessage, "EncryptedMessage", "encryptedMessage");
sealed_appendage!(EncryptToSelfMessage, "EncryptToSelfMessage", "encryptToSelfMessage");

// ---------------------------------------------------------------------------
// Public key announcement
// ---------------------------------------------------------------------------

/// Announces the recipient's public key so the account can later be
/// verified without a transaction of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyAnnouncement {
    public_key: PublicKey,
    version: u8,
}

impl PublicKeyAnnouncement {
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            version: DEFAULT_VERSION,
        }
    }

    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The key must be canonical and must belong to `recipient`.
    pub(crate) fn validate(
        &self,
        transaction_type: TransactionType,
        recipient: u64,
    ) -> Result<(), TransactionError> {
        if !transaction_type.has_recipient() {
            return Err(TransactionError::InvalidField {
                field: "recipientPublicKey",
                reason: format!("{transaction_type} transactions have no recipient"),
            });
        }
        if !self.public_key.is_canonical() {
            return Err(TransactionError::InvalidField {
                field: "recipientPublicKey",
                reason: "not a canonical public key".into(),
            });
        }
        if self.public_key.account_id() != recipient {
            return Err(TransactionError::InvalidField {
                field: "recipientPublicKey",
                reason: format!("key does not belong to recipient {recipient}"),
            });
        }
        Ok(())
    }

    pub(crate) fn parse(
        reader: &mut Reader<'_>,
        transaction_version: u8,
    ) -> Result<Self, TransactionError> {
        let version = read_version(reader, transaction_version)?;
        let public_key = PublicKey::from_bytes(reader.array::<PUBLIC_KEY_LENGTH>("recipientPublicKey")?);
        Ok(Self {
            public_key,
            version,
        })
    }

    pub(crate) fn from_json(map: &JsonMap) -> Result<Option<Self>, TransactionError> {
        let text = match map.get("recipientPublicKey") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(TransactionError::InvalidField {
                    field: "recipientPublicKey",
                    reason: other.to_string(),
                })
            }
        };
        Ok(Some(Self {
            public_key: PublicKey::from_bytes(parse_hex_array(text)?),
            version: get_version(map, "PublicKeyAnnouncement")?,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn encode(appendage: impl Into<Appendage>) -> Vec<u8> {
        let appendage = appendage.into();
        let mut out = Vec::new();
        appendage.put(&mut out);
        assert_eq!(out.len(), appendage.size());
        out
    }

    #[test]
    fn text_message_layout() {
        let bytes = encode(Message::text("hi"));
        // version, then length with the text bit set, then the bytes
        assert_eq!(bytes, vec![1, 2, 0, 0, 0x80, b'h', b'i']);
    }

    #[test]
    fn version_zero_has_no_prefix() {
        let message = Message::binary(vec![7u8; 3]).with_version(0);
        assert_eq!(Appendage::from(message.clone()).size(), 4 + 3);
        let bytes = encode(message.clone());
        let mut reader = Reader::new(&bytes);
        assert_eq!(Message::parse(&mut reader, 0).unwrap(), message);
        reader.finish().unwrap();
    }

    #[test]
    fn version_rule() {
        let current = Appendage::from(Message::text("a"));
        let legacy = Appendage::from(Message::text("a").with_version(0));
        assert!(current.verify_version(1).is_ok());
        assert!(current.verify_version(0).is_err());
        assert!(legacy.verify_version(0).is_ok());
        assert!(legacy.verify_version(1).is_err());
    }

    #[test]
    fn flags_follow_wire_order() {
        let keys = KeyPair::from_secret_phrase("flags").unwrap();
        let mut appendages = vec![
            Appendage::from(EncryptToSelfMessage::new(EncryptedPayload::EMPTY, true)),
            Appendage::from(PublicKeyAnnouncement::new(keys.public_key())),
            Appendage::from(Message::text("m")),
            Appendage::from(EncryptedMessage::new(EncryptedPayload::EMPTY, true)),
        ];
        appendages.sort_by_key(Appendage::flag);
        let names: Vec<_> = appendages.iter().map(Appendage::name).collect();
        assert_eq!(
            names,
            ["Message", "EncryptedMessage", "PublicKeyAnnouncement", "EncryptToSelfMessage"]
        );
    }

    #[test]
    fn oversized_message_is_rejected() {
        let message = Message::binary(vec![0u8; MAX_ARBITRARY_MESSAGE_LENGTH + 1]);
        assert!(message.validate().is_err());
        let bytes = encode(message);
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            Message::parse(&mut reader, 1),
            Err(TransactionError::FieldTooLong { field: "message", .. })
        ));
    }

    #[test]
    fn encrypted_message_round_trips() {
        let payload = EncryptedPayload::from_parts(vec![9u8; 32], vec![3u8; 32]).unwrap();
        let message = EncryptedMessage::new(payload, true);
        let appendage = Appendage::from(message.clone());
        assert_eq!(appendage.size(), 1 + 4 + 64);
        let bytes = encode(message.clone());
        let mut reader = Reader::new(&bytes);
        assert_eq!(EncryptedMessage::parse(&mut reader, 1).unwrap(), message);

        let mut map = JsonMap::new();
        appendage.put_json(&mut map);
        assert_eq!(map["encryptedMessage"]["isText"], Value::Bool(true));
        assert_eq!(EncryptedMessage::from_json(&map).unwrap(), Some(message));
        assert_eq!(EncryptToSelfMessage::from_json(&map).unwrap(), None);
    }

    #[test]
    fn empty_encrypted_message_is_four_bytes() {
        let message = EncryptedMessage::new(EncryptedPayload::EMPTY, false);
        let bytes = encode(message.clone());
        assert_eq!(bytes, vec![1, 0, 0, 0, 0]);
        let mut reader = Reader::new(&bytes);
        assert_eq!(EncryptedMessage::parse(&mut reader, 1).unwrap(), message);
        reader.finish().unwrap();
    }

    #[test]
    fn binary_message_json_is_hex() {
        let message = Message::binary(vec![0xde, 0xad]);
        let mut map = JsonMap::new();
        Appendage::from(message.clone()).put_json(&mut map);
        assert_eq!(map["message"], Value::from("dead"));
        assert_eq!(map["messageIsText"], Value::Bool(false));
        assert_eq!(Message::from_json(&map).unwrap(), Some(message));
    }

    #[test]
    fn encrypted_message_needs_a_recipient() {
        let appendage = Appendage::from(EncryptedMessage::new(EncryptedPayload::EMPTY, true));
        assert!(appendage.validate(TransactionType::OrdinaryPayment, 1).is_ok());
        assert!(matches!(
            appendage.validate(TransactionType::AliasAssignment, 0),
            Err(TransactionError::AppendageNotAllowed {
                appendage: "EncryptedMessage",
                ..
            })
        ));
        let to_self = Appendage::from(EncryptToSelfMessage::new(EncryptedPayload::EMPTY, true));
        assert!(to_self.validate(TransactionType::AliasAssignment, 0).is_ok());
    }

    #[test]
    fn announcement_must_match_recipient() {
        let keys = KeyPair::from_secret_phrase("announce").unwrap();
        let announcement = PublicKeyAnnouncement::new(keys.public_key());
        let t = TransactionType::OrdinaryPayment;
        assert!(announcement.validate(t, keys.account_id()).is_ok());
        assert!(announcement.validate(t, keys.account_id() ^ 1).is_err());
        assert!(announcement
            .validate(TransactionType::AliasAssignment, keys.account_id())
            .is_err());
    }
}
