//! Prelude - Include traits and the types most drivers need
#[cfg(feature = "aes")]
pub use crate::cipher::Aes128Cipher;
pub use crate::client::{AtClient, FinalResultCode, ResponseTerminator};
pub use crate::command::{AtCommand, Prefix};
pub use crate::config::{Apn, AttachConfig, OperatorSelection, SessionConfig};
pub use crate::error::{EncodeError, Error};
pub use crate::traits::{Cipher, DeviceIdentity, NoCipher, StaticIdentity};
pub use crate::Modem;
