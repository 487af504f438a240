//! Little-endian wire primitives.
//!
//! [`Reader`] wraps a byte slice with bounds-checked getters so a truncated
//! or hostile input becomes a [`TransactionError::Truncated`] instead of a
//! panic inside `bytes::Buf`. The `put_*` helpers are the matching writers.

use bytes::{Buf, BufMut};

use super::verification::TransactionError;
use crate::config::ENCRYPTION_NONCE_LENGTH;
use crate::crypto::EncryptedPayload;

pub(crate) struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize, field: &'static str) -> Result<(), TransactionError> {
        if self.buf.remaining() < needed {
            return Err(TransactionError::Truncated {
                field,
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8, TransactionError> {
        self.ensure(1, field)?;
        Ok(self.buf.get_u8())
    }

    pub fn i16(&mut self, field: &'static str) -> Result<i16, TransactionError> {
        self.ensure(2, field)?;
        Ok(self.buf.get_i16_le())
    }

    pub fn i32(&mut self, field: &'static str) -> Result<i32, TransactionError> {
        self.ensure(4, field)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32, TransactionError> {
        self.ensure(4, field)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn i64(&mut self, field: &'static str) -> Result<i64, TransactionError> {
        self.ensure(8, field)?;
        Ok(self.buf.get_i64_le())
    }

    pub fn u64(&mut self, field: &'static str) -> Result<u64, TransactionError> {
        self.ensure(8, field)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], TransactionError> {
        self.ensure(N, field)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    pub fn bytes(&mut self, length: usize, field: &'static str) -> Result<Vec<u8>, TransactionError> {
        self.ensure(length, field)?;
        let mut out = vec![0u8; length];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    /// A UTF-8 string of `length` bytes. Anything over three bytes per
    /// allowed character is rejected before reading.
    pub fn string(
        &mut self,
        length: usize,
        max_chars: usize,
        field: &'static str,
    ) -> Result<String, TransactionError> {
        if length > 3 * max_chars {
            return Err(TransactionError::FieldTooLong {
                field,
                length,
                max: 3 * max_chars,
            });
        }
        let raw = self.bytes(length, field)?;
        String::from_utf8(raw).map_err(|_| TransactionError::InvalidUtf8 { field })
    }

    /// String with a one-byte length prefix.
    pub fn short_string(&mut self, max_chars: usize, field: &'static str) -> Result<String, TransactionError> {
        let length = self.u8(field)? as usize;
        self.string(length, max_chars, field)
    }

    /// String with a two-byte length prefix.
    pub fn long_string(&mut self, max_chars: usize, field: &'static str) -> Result<String, TransactionError> {
        let length = self.i16(field)?;
        let length = usize::try_from(length).map_err(|_| TransactionError::InvalidField {
            field,
            reason: format!("negative length {length}"),
        })?;
        self.string(length, max_chars, field)
    }

    /// A 32-bit length whose sign bit is the "is text" flag.
    pub fn flagged_length(&mut self, field: &'static str) -> Result<(usize, bool), TransactionError> {
        let raw = self.i32(field)?;
        let is_text = raw < 0;
        Ok(((raw & i32::MAX) as usize, is_text))
    }

    /// `length` bytes of ciphertext followed by a 32-byte nonce, or nothing
    /// at all when `length` is zero.
    pub fn encrypted_payload(
        &mut self,
        length: usize,
        max_length: usize,
        field: &'static str,
    ) -> Result<EncryptedPayload, TransactionError> {
        if length == 0 {
            return Ok(EncryptedPayload::EMPTY);
        }
        if length > max_length {
            return Err(TransactionError::FieldTooLong {
                field,
                length,
                max: max_length,
            });
        }
        let data = self.bytes(length, field)?;
        let nonce = self.bytes(ENCRYPTION_NONCE_LENGTH, field)?;
        Ok(EncryptedPayload::from_parts(data, nonce)?)
    }

    /// Fails if anything is left over.
    pub fn finish(&self) -> Result<(), TransactionError> {
        match self.buf.remaining() {
            0 => Ok(()),
            n => Err(TransactionError::TrailingBytes(n)),
        }
    }
}

pub(crate) fn put_short_string<B: BufMut>(buf: &mut B, value: &str) {
    buf.put_u8(value.len() as u8);
    buf.put_slice(value.as_bytes());
}

pub(crate) fn put_long_string<B: BufMut>(buf: &mut B, value: &str) {
    buf.put_i16_le(value.len() as i16);
    buf.put_slice(value.as_bytes());
}

pub(crate) fn put_flagged_length<B: BufMut>(buf: &mut B, length: usize, is_text: bool) {
    let mut raw = length as i32;
    if is_text {
        raw |= i32::MIN;
    }
    buf.put_i32_le(raw);
}

/// Wire size of a string with a one-byte prefix.
pub(crate) fn short_string_size(value: &str) -> usize {
    1 + value.len()
}

/// Wire size of a string with a two-byte prefix.
pub(crate) fn long_string_size(value: &str) -> usize {
    2 + value.len()
}

/// Rejects strings longer than `max_chars` characters or too long in bytes
/// for their length prefix.
pub(crate) fn check_string(
    value: &str,
    max_chars: usize,
    prefix_capacity: usize,
    field: &'static str,
) -> Result<(), TransactionError> {
    let chars = value.chars().count();
    if chars > max_chars {
        return Err(TransactionError::FieldTooLong {
            field,
            length: chars,
            max: max_chars,
        });
    }
    if value.len() > prefix_capacity {
        return Err(TransactionError::FieldTooLong {
            field,
            length: value.len(),
            max: prefix_capacity,
        });
    }
    Ok(())
}

pub(crate) const SHORT_PREFIX_CAPACITY: usize = u8::MAX as usize;
pub(crate) const LONG_PREFIX_CAPACITY: usize = i16::MAX as usize;
