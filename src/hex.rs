use core::fmt;
use heapless::{String, Vec};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Render `bytes` as uppercase hex, most significant nibble first.
///
/// Fails with `fmt::Error` if `N` is smaller than `2 * bytes.len()`.
pub fn encode_upper<const N: usize>(bytes: &[u8]) -> Result<String<N>, fmt::Error> {
    let mut s = String::new();
    for &b in bytes {
        s.push(HEX_DIGITS[(b >> 4) as usize] as char)
            .map_err(|_| fmt::Error)?;
        s.push(HEX_DIGITS[(b & 0x0f) as usize] as char)
            .map_err(|_| fmt::Error)?;
    }
    Ok(s)
}

pub fn decode<const N: usize>(s: &str) -> Result<Vec<u8, N>, DecodeHexError> {
    if s.len() % 2 != 0 {
        return Err(DecodeHexError::OddLength);
    }

    let mut out = Vec::new();
    for pair in s.as_bytes().chunks(2) {
        let byte = (nibble(pair[0])? << 4) | nibble(pair[1])?;
        out.push(byte).map_err(|_| DecodeHexError::Overflow)?;
    }
    Ok(out)
}

fn nibble(c: u8) -> Result<u8, DecodeHexError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(DecodeHexError::InvalidDigit),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeHexError {
    OddLength,
    InvalidDigit,
    Overflow,
}

impl fmt::Display for DecodeHexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeHexError::OddLength => f.write_str("input string has an odd number of bytes"),
            DecodeHexError::InvalidDigit => f.write_str("input string contains a non-hex digit"),
            DecodeHexError::Overflow => f.write_str("decoded bytes do not fit the output buffer"),
        }
    }
}
