pub use crate::hex::DecodeHexError;

/// Reasons the packet encoder refuses a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Message is 505 bytes or longer and does not fit a single datagram
    MessageTooLong,
    /// Encryption was requested but the cipher returned nothing
    EncryptionUnavailable,
    /// Output does not fit the wire buffer
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    // Transport errors
    Io(embedded_io::ErrorKind),
    EndOfStream,

    // Buffer capacity exceeded while building a command
    Overflow,

    // Send path errors
    Encode(EncodeError),
    NoDestination,
    SocketOpen,
    Transmit,
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::Overflow
    }
}

impl From<embedded_io::ErrorKind> for Error {
    fn from(e: embedded_io::ErrorKind) -> Self {
        Self::Io(e)
    }
}
