use heapless::Vec;

use crate::packet::MAX_BODY_LEN;

/// Source of the identity stamped into every outgoing packet.
///
/// On hardware this is backed by the board's serial number and the
/// provisioning secret.
pub trait DeviceIdentity {
    fn id(&self) -> u32;

    /// Shared secret, only ever shown to the user. Never put on the wire.
    fn secret(&self) -> u32;
}

/// Block cipher applied to the framed packet body.
pub trait Cipher {
    /// Encrypt `plaintext`, padding it up to the cipher's block size.
    ///
    /// An empty result means encryption is not available on this device.
    fn encrypt(&mut self, plaintext: &[u8]) -> Vec<u8, MAX_BODY_LEN>;
}

impl<T: DeviceIdentity + ?Sized> DeviceIdentity for &T {
    fn id(&self) -> u32 {
        (**self).id()
    }

    fn secret(&self) -> u32 {
        (**self).secret()
    }
}

impl<T: Cipher + ?Sized> Cipher for &mut T {
    fn encrypt(&mut self, plaintext: &[u8]) -> Vec<u8, MAX_BODY_LEN> {
        (**self).encrypt(plaintext)
    }
}

/// Fixed identity, for tests and for boards without a serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StaticIdentity {
    pub id: u32,
    pub secret: u32,
}

impl StaticIdentity {
    pub const fn new(id: u32, secret: u32) -> Self {
        Self { id, secret }
    }
}

impl DeviceIdentity for StaticIdentity {
    fn id(&self) -> u32 {
        self.id
    }

    fn secret(&self) -> u32 {
        self.secret
    }
}

/// Cipher for devices without crypto support. Always reports unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCipher;

impl Cipher for NoCipher {
    fn encrypt(&mut self, _plaintext: &[u8]) -> Vec<u8, MAX_BODY_LEN> {
        Vec::new()
    }
}
