//! Reed-Solomon account addresses.
//!
//! A 64-bit account id is written as 13 base-32 digits plus 4 parity
//! symbols of a Reed-Solomon code over GF(32), shuffled and grouped as
//! `XXXX-XXXX-XXXX-XXXXX`. The parity lets a wallet reject a mistyped
//! address instead of paying a stranger.
//!
//! The alphabet leaves out `0`, `1`, `I` and `O` to avoid confusion with
//! letters that look alike.

use super::CryptoError;

const ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

const DATA_LENGTH: usize = 13;
const CODEWORD_LENGTH: usize = 17;

/// Position in the codeword of the i-th printed symbol.
const CODEWORD_MAP: [usize; CODEWORD_LENGTH] = [3, 2, 1, 0, 7, 6, 5, 4, 13, 14, 15, 16, 12, 8, 9, 10, 11];

const GEXP: [u8; 32] = [
    1, 2, 4, 8, 16, 5, 10, 20, 13, 26, 17, 7, 14, 28, 29, 31, 27, 19, 3, 6, 12, 24, 21, 15, 30, 25,
    23, 11, 22, 9, 18, 1,
];

const GLOG: [u8; 32] = [
    0, 0, 1, 18, 2, 5, 19, 11, 3, 29, 6, 27, 20, 8, 12, 23, 4, 10, 30, 17, 7, 22, 28, 26, 21, 25,
    9, 16, 13, 14, 24, 15,
];

fn gmult(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let index = (GLOG[a as usize] as usize + GLOG[b as usize] as usize) % 31;
    GEXP[index]
}

/// Encodes an account id, without the `NXT-` prefix.
///
/// ```
/// use nxt_protocol::crypto::reed_solomon;
///
/// assert_eq!(reed_solomon::encode(1739068987193023818), "MRCC-2YLS-8M54-3CMAJ");
/// ```
pub fn encode(id: u64) -> String {
    let mut codeword = [0u8; CODEWORD_LENGTH];
    for (i, digit) in codeword.iter_mut().take(DATA_LENGTH).enumerate() {
        *digit = ((id >> (5 * i)) & 31) as u8;
    }

    let mut parity = [0u8; 4];
    for i in (0..DATA_LENGTH).rev() {
        let feedback = codeword[i] ^ parity[3];
        parity[3] = parity[2] ^ gmult(30, feedback);
        parity[2] = parity[1] ^ gmult(6, feedback);
        parity[1] = parity[0] ^ gmult(9, feedback);
        parity[0] = gmult(17, feedback);
    }
    codeword[DATA_LENGTH..].copy_from_slice(&parity);

    let mut out = String::with_capacity(CODEWORD_LENGTH + 3);
    for (i, &position) in CODEWORD_MAP.iter().enumerate() {
        out.push(ALPHABET[codeword[position] as usize] as char);
        if i & 3 == 3 && i < DATA_LENGTH {
            out.push('-');
        }
    }
    out
}

/// Decodes an address without the `NXT-` prefix. Case is ignored.
///
/// Characters outside the alphabet (the dashes, typically) are skipped,
/// but the result must re-encode to exactly the uppercased input, so a
/// sloppily formatted address is still rejected.
pub fn decode(address: &str) -> Result<u64, CryptoError> {
    let address = address.to_ascii_uppercase();

    let mut codeword = [0u8; CODEWORD_LENGTH];
    let mut length = 0usize;
    for c in address.chars() {
        let Some(symbol) = ALPHABET.iter().position(|&a| a as char == c) else {
            continue;
        };
        if length < CODEWORD_LENGTH {
            codeword[CODEWORD_MAP[length]] = symbol as u8;
        }
        length += 1;
    }
    if length != CODEWORD_LENGTH {
        return Err(CryptoError::InvalidAddressLength(length));
    }
    if !is_codeword_valid(&codeword) {
        return Err(CryptoError::AddressChecksum);
    }

    let mut value: u128 = 0;
    for &digit in codeword[..DATA_LENGTH].iter().rev() {
        value = (value << 5) | digit as u128;
    }
    let id = u64::try_from(value).map_err(|_| CryptoError::AddressMismatch(address.clone()))?;

    if encode(id) != address {
        return Err(CryptoError::AddressMismatch(address));
    }
    Ok(id)
}

fn is_codeword_valid(codeword: &[u8; CODEWORD_LENGTH]) -> bool {
    let mut sum = 0u8;
    for i in 1..5 {
        let mut t = 0u8;
        for j in 0..31usize {
            if j > 12 && j < 27 {
                continue;
            }
            let position = if j > 26 { j - 14 } else { j };
            t ^= gmult(codeword[position], GEXP[(i * j) % 31]);
        }
        sum |= t;
    }
    sum == 0
}
