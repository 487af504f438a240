//! # Numeric Safety
//!
//! Overflow-checked 64-bit arithmetic plus the hex and unsigned-decimal
//! conversions every other module leans on.
//!
//! Fees and amounts are signed 64-bit NQT values on the wire. A silent
//! wraparound in a fee computation is a transaction that pays the wrong
//! fee, so every operation here either returns the exact result or a
//! [`NumericError::Overflow`] naming the operation and its operands.
//!
//! Account and block ids are 64-bit values that the ledger prints as
//! *unsigned* decimals. In Rust they are simply `u64`; the helpers at the
//! bottom exist for the boundary where they arrive as signed Java-style
//! longs or as decimal strings.

use thiserror::Error;

/// Errors from checked arithmetic and text conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumericError {
    /// The exact result does not fit in a signed 64-bit integer.
    #[error("arithmetic overflow: {op}({left}, {right})")]
    Overflow {
        op: &'static str,
        left: i64,
        right: i64,
    },

    /// Division by zero.
    #[error("division by zero: {left} / 0")]
    DivisionByZero { left: i64 },

    /// Hex input with an odd number of digits.
    #[error("invalid hex string: odd length {0}")]
    OddHexLength(usize),

    /// Hex input containing a character outside `0-9a-fA-F`.
    #[error("invalid hex character {character:?} at position {index}")]
    InvalidHexCharacter { character: char, index: usize },

    /// Hex input that decodes to the wrong number of bytes.
    #[error("expected {expected} hex-encoded bytes, got {actual}")]
    HexLength { expected: usize, actual: usize },

    /// Decimal input that is not an unsigned 64-bit value.
    #[error("not an unsigned 64-bit decimal: {0:?}")]
    InvalidUnsigned(String),
}

// ---------------------------------------------------------------------------
// Checked arithmetic
// ---------------------------------------------------------------------------

/// `left + right`, failing instead of wrapping.
pub fn safe_add(left: i64, right: i64) -> Result<i64, NumericError> {
    if (right > 0 && left > i64::MAX - right) || (right < 0 && left < i64::MIN - right) {
        return Err(overflow("add", left, right));
    }
    Ok(left + right)
}

/// `left - right`, failing instead of wrapping.
pub fn safe_subtract(left: i64, right: i64) -> Result<i64, NumericError> {
    if (right > 0 && left < i64::MIN + right) || (right < 0 && left > i64::MAX + right) {
        return Err(overflow("subtract", left, right));
    }
    Ok(left - right)
}

/// `left * right`, failing instead of wrapping.
pub fn safe_multiply(left: i64, right: i64) -> Result<i64, NumericError> {
    let overflows = if right > 0 {
        left > i64::MAX / right || left < i64::MIN / right
    } else if right < -1 {
        left > i64::MIN / right || left < i64::MAX / right
    } else {
        right == -1 && left == i64::MIN
    };
    if overflows {
        return Err(overflow("multiply", left, right));
    }
    Ok(left * right)
}

/// `left / right` (truncating), failing on `MIN / -1` and on a zero divisor.
pub fn safe_divide(left: i64, right: i64) -> Result<i64, NumericError> {
    if right == 0 {
        return Err(NumericError::DivisionByZero { left });
    }
    if left == i64::MIN && right == -1 {
        return Err(overflow("divide", left, right));
    }
    Ok(left / right)
}

/// `-value`, failing on `i64::MIN`.
pub fn safe_negate(value: i64) -> Result<i64, NumericError> {
    if value == i64::MIN {
        return Err(overflow("negate", value, 0));
    }
    Ok(-value)
}

/// `|value|`, failing on `i64::MIN`.
pub fn safe_abs(value: i64) -> Result<i64, NumericError> {
    if value == i64::MIN {
        return Err(overflow("abs", value, 0));
    }
    Ok(value.abs())
}

fn overflow(op: &'static str, left: i64, right: i64) -> NumericError {
    NumericError::Overflow { op, left, right }
}

// ---------------------------------------------------------------------------
// Hex
// ---------------------------------------------------------------------------

/// Lowercase hex encoding.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Strict hex decoding: exactly two digits per byte, either case.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, NumericError> {
    hex::decode(text).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => NumericError::InvalidHexCharacter {
            character: c,
            index,
        },
        _ => NumericError::OddHexLength(text.len()),
    })
}

/// Hex-decodes into a fixed-size array, rejecting any other length.
pub fn parse_hex_array<const N: usize>(text: &str) -> Result<[u8; N], NumericError> {
    let bytes = parse_hex(text)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| NumericError::HexLength { expected: N, actual })
}

// ---------------------------------------------------------------------------
// Unsigned 64-bit ids
// ---------------------------------------------------------------------------

/// Renders a signed 64-bit id as its unsigned decimal form (adds 2^64 to
/// negative values).
pub fn to_unsigned_long(value: i64) -> String {
    (value as u64).to_string()
}

/// Parses an unsigned decimal id. Surrounding whitespace is ignored;
/// negative values and values of 2^64 or more are rejected.
pub fn parse_unsigned_long(text: &str) -> Result<u64, NumericError> {
    let trimmed = text.trim();
    if trimmed.starts_with('-') {
        return Err(NumericError::InvalidUnsigned(text.to_string()));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| NumericError::InvalidUnsigned(text.to_string()))
}

/// Reads the first eight bytes of a hash as a little-endian id. This is the
/// "byte-reversed big-endian" interpretation used for transaction and
/// account ids.
pub fn full_hash_to_id(hash: &[u8; 32]) -> u64 {
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(head)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
