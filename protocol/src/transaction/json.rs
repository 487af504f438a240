//! JSON form of a transaction.
//!
//! The top-level record is a serde DTO. The `attachment` object is a flat
//! map shared by the attachment and every appendage, each contributing its
//! own keys plus a `version.<Name>` entry when its version is above zero,
//! so it is assembled by hand from [`serde_json::Map`].
//!
//! Numbers are read leniently: node responses quote 64-bit amounts and ids
//! as strings, so both `123` and `"123"` are accepted wherever a number is
//! expected.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::verification::TransactionError;
use crate::numeric::parse_unsigned_long;

pub type JsonMap = Map<String, Value>;

/// The transaction record as exchanged with nodes and wallets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionJson {
    #[serde(rename = "type")]
    pub type_code: u8,
    pub subtype: u8,
    #[serde(deserialize_with = "lenient_i32")]
    pub timestamp: i32,
    #[serde(deserialize_with = "lenient_i16")]
    pub deadline: i16,
    pub sender_public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(rename = "amountNQT", deserialize_with = "lenient_i64")]
    pub amount_nqt: i64,
    #[serde(rename = "feeNQT", deserialize_with = "lenient_i64")]
    pub fee_nqt: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_transaction_full_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub version: u8,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub ec_block_height: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ec_block_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u32>,
}

// ---------------------------------------------------------------------------
// Lenient numbers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    use serde::de::Error;
    let value = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => s.trim().parse::<i64>().map_err(D::Error::custom)?,
    };
    T::try_from(value).map_err(|_| D::Error::custom(format!("{value} is out of range")))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    lenient(deserializer)
}

fn lenient_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    lenient(deserializer)
}

fn lenient_i16<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i16, D::Error> {
    lenient(deserializer)
}

// ---------------------------------------------------------------------------
// Attachment map accessors
// ---------------------------------------------------------------------------

fn invalid(field: &'static str, reason: impl Into<String>) -> TransactionError {
    TransactionError::InvalidField {
        field,
        reason: reason.into(),
    }
}

/// Signed integer given as a JSON number or decimal string, narrowed to `T`.
pub(crate) fn get_int<T: TryFrom<i64>>(map: &JsonMap, key: &'static str) -> Result<T, TransactionError> {
    let value = match map.get(key) {
        None | Some(Value::Null) => return Err(TransactionError::MissingField(key)),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| invalid(key, n.to_string()))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(key, s.clone()))?,
        Some(other) => return Err(invalid(key, other.to_string())),
    };
    T::try_from(value).map_err(|_| invalid(key, format!("{value} is out of range")))
}

/// Unsigned 64-bit id given as a decimal string (or a non-negative number).
pub(crate) fn get_unsigned(map: &JsonMap, key: &'static str) -> Result<u64, TransactionError> {
    match map.get(key) {
        None | Some(Value::Null) => Err(TransactionError::MissingField(key)),
        Some(Value::String(s)) => Ok(parse_unsigned_long(s)?),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| invalid(key, n.to_string())),
        Some(other) => Err(invalid(key, other.to_string())),
    }
}

/// String value; a missing or null key reads as empty.
pub(crate) fn get_string(map: &JsonMap, key: &'static str) -> Result<String, TransactionError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(invalid(key, other.to_string())),
    }
}

/// Boolean value; anything but `true` reads as false.
pub(crate) fn get_bool(map: &JsonMap, key: &str) -> bool {
    matches!(map.get(key), Some(Value::Bool(true)))
}

/// Array of strings.
pub(crate) fn get_string_array(map: &JsonMap, key: &'static str) -> Result<Vec<String>, TransactionError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(invalid(key, other.to_string())),
            })
            .collect(),
        Some(other) => Err(invalid(key, other.to_string())),
    }
}

/// Hex string decoded to bytes; missing reads as empty.
pub(crate) fn get_hex(map: &JsonMap, key: &'static str) -> Result<Vec<u8>, TransactionError> {
    let text = get_string(map, key)?;
    Ok(crate::numeric::parse_hex(&text)?)
}

/// `version.<name>`, zero when absent.
pub(crate) fn get_version(map: &JsonMap, name: &str) -> Result<u8, TransactionError> {
    match map.get(&version_key(name)) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| invalid("version", n.to_string())),
        Some(other) => Err(invalid("version", other.to_string())),
    }
}

/// Writes `version.<name>` when the version is above zero.
pub(crate) fn put_version(map: &mut JsonMap, name: &str, version: u8) {
    if version > 0 {
        map.insert(version_key(name), Value::from(version));
    }
}

fn version_key(name: &str) -> String {
    format!("version.{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> JsonMap {
        match value {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn numbers_accept_strings() {
        let m = map(json!({ "a": 5, "b": "6", "c": " -7 " }));
        assert_eq!(get_int::<i64>(&m, "a").unwrap(), 5);
        assert_eq!(get_int::<i64>(&m, "b").unwrap(), 6);
        assert_eq!(get_int::<i32>(&m, "c").unwrap(), -7);
        assert!(matches!(
            get_int::<i64>(&m, "missing"),
            Err(TransactionError::MissingField("missing"))
        ));
    }

    #[test]
    fn narrowing_is_range_checked() {
        let m = map(json!({ "big": 70000 }));
        assert!(get_int::<i16>(&m, "big").is_err());
        assert_eq!(get_int::<i32>(&m, "big").unwrap(), 70000);
    }

    #[test]
    fn unsigned_ids_parse_from_strings() {
        let m = map(json!({ "id": "18446744073709551615", "neg": "-1" }));
        assert_eq!(get_unsigned(&m, "id").unwrap(), u64::MAX);
        assert!(get_unsigned(&m, "neg").is_err());
    }

    #[test]
    fn version_keys() {
        let mut m = JsonMap::new();
        put_version(&mut m, "Message", 0);
        assert!(m.is_empty());
        put_version(&mut m, "Message", 1);
        assert_eq!(m.get("version.Message"), Some(&json!(1)));
        assert_eq!(get_version(&m, "Message").unwrap(), 1);
        assert_eq!(get_version(&m, "EncryptedMessage").unwrap(), 0);
    }

    #[test]
    fn dto_accepts_quoted_amounts() {
        let dto: TransactionJson = serde_json::from_value(json!({
            "type": 0,
            "subtype": 0,
            "timestamp": 10,
            "deadline": 1440,
            "senderPublicKey": "00",
            "amountNQT": "100000000",
            "feeNQT": 100000000,
        }))
        .unwrap();
        assert_eq!(dto.amount_nqt, 100_000_000);
        assert_eq!(dto.fee_nqt, 100_000_000);
        assert_eq!(dto.version, 0);
        assert!(dto.attachment.is_none());
    }
}
