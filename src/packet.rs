//! Telemetry packet encoding.
//!
//! A packet on the wire is a MessagePack-compatible sequence:
//!
//! ```text
//! 0xCE <device id: u32 BE> <length prefix> <message bytes> [0x80 + cipher padding]
//! ```
//!
//! The length prefix picks the smallest of three size classes. When encryption
//! is enabled everything after the device header is encrypted, and the
//! declared length reflects the ciphertext.

use heapless::{String, Vec};

use crate::error::EncodeError;
use crate::hex;
use crate::traits::{Cipher, DeviceIdentity};

/// Largest message accepted for framing
pub const MAX_MESSAGE_LEN: usize = 504;

/// Largest packet body, the module's maximum UDP payload
pub const MAX_BODY_LEN: usize = 512;

/// Device header: marker byte plus a big-endian u32
pub const HEADER_LEN: usize = 5;

pub const MAX_PACKET_LEN: usize = MAX_BODY_LEN + HEADER_LEN;

/// Capacity needed for the hex rendering of the largest packet
pub const MAX_HEX_LEN: usize = 2 * MAX_PACKET_LEN;

const HEADER_MARKER: u8 = 0xCE;
const FIX_MARKER: u8 = 0xA0;
const SIZED_MARKER: u8 = 0xD9;
const END_MARKER: u8 = 0x80;

/// Packet ready to go on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPacket {
    bytes: Vec<u8, MAX_PACKET_LEN>,
}

impl EncodedPacket {
    /// Declared wire length in bytes, header included
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Packet body without the device header
    pub fn body(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }

    pub fn to_hex(&self) -> Result<String<MAX_HEX_LEN>, EncodeError> {
        hex::encode_upper(&self.bytes).map_err(|_| EncodeError::Overflow)
    }
}

/// Write the size-class length prefix for a message of `len` bytes.
pub fn length_prefix(len: usize) -> Result<Vec<u8, 3>, EncodeError> {
    let mut prefix = Vec::new();
    let res = match len {
        0..=31 => prefix.push(FIX_MARKER + len as u8).map_err(drop),
        32..=255 => prefix.extend_from_slice(&[SIZED_MARKER, len as u8]),
        256..=MAX_MESSAGE_LEN => {
            prefix.extend_from_slice(&[SIZED_MARKER, (len >> 8) as u8, (len & 0xff) as u8])
        }
        _ => return Err(EncodeError::MessageTooLong),
    };
    res.map_err(|_| EncodeError::Overflow)?;
    Ok(prefix)
}

/// Frame `message`, optionally encrypt it, and prepend the device header.
pub fn encode<I, C>(
    message: &[u8],
    encrypt: bool,
    identity: &I,
    cipher: &mut C,
) -> Result<EncodedPacket, EncodeError>
where
    I: DeviceIdentity + ?Sized,
    C: Cipher + ?Sized,
{
    let mut body: Vec<u8, MAX_BODY_LEN> = Vec::new();
    body.extend_from_slice(&length_prefix(message.len())?)
        .map_err(|_| EncodeError::Overflow)?;
    body.extend_from_slice(message)
        .map_err(|_| EncodeError::Overflow)?;

    if encrypt {
        body.push(END_MARKER).map_err(|_| EncodeError::Overflow)?;
        body = cipher.encrypt(&body);
        if body.is_empty() {
            return Err(EncodeError::EncryptionUnavailable);
        }
    }

    let mut bytes = Vec::new();
    bytes.push(HEADER_MARKER).map_err(|_| EncodeError::Overflow)?;
    bytes.extend_from_slice(&identity.id().to_be_bytes())
        .map_err(|_| EncodeError::Overflow)?;
    bytes.extend_from_slice(&body)
        .map_err(|_| EncodeError::Overflow)?;

    trace!(
        "Encoded {} byte message into {} byte packet (encrypted: {})",
        message.len(),
        bytes.len(),
        encrypt
    );

    Ok(EncodedPacket { bytes })
}
