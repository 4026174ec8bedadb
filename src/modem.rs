use embedded_hal::delay::DelayNs;
use embedded_io::{Read, Write};

use crate::client::{AtClient, Line, Response};
use crate::command::general::GetImei;
use crate::command::AtCommand;
use crate::config::{AttachConfig, SessionConfig};
use crate::error::Error;
use crate::network::NetworkAttach;
use crate::traits::{Cipher, DeviceIdentity};
use crate::udp::UdpSession;

/// Handle for a BC95 module: the AT client, the telemetry session and the
/// attach parameters in one place.
pub struct Modem<'a, T, D, I, C>
where
    T: Read + Write,
    D: DelayNs,
{
    client: AtClient<T, D>,
    session: UdpSession<I, C>,
    attach: NetworkAttach<'a>,
}

impl<'a, T, D, I, C> Modem<'a, T, D, I, C>
where
    T: Read + Write,
    D: DelayNs,
    I: DeviceIdentity,
    C: Cipher,
{
    pub fn new(
        client: AtClient<T, D>,
        session: SessionConfig,
        attach: AttachConfig<'a>,
        identity: I,
        cipher: C,
    ) -> Self {
        Self {
            client,
            session: UdpSession::new(session, identity, cipher),
            attach: NetworkAttach::new(attach),
        }
    }

    /// Bring the module onto the network. See [`NetworkAttach::run`].
    pub fn attach(&mut self) -> Result<(), Error> {
        self.attach.run(&mut self.client)
    }

    pub fn is_attached(&mut self) -> Result<bool, Error> {
        self.attach.is_attached(&mut self.client)
    }

    /// Read the IMEI, without the `+CGSN:` prefix.
    pub fn imei(&mut self) -> Result<Line, Error> {
        let mut imei = self.client.expect_at(&GetImei.to_command()?)?;
        if let Some(stripped) = imei.strip_prefix(GetImei::RESPONSE_PREFIX) {
            imei = Line::try_from(stripped.trim()).map_err(|_| Error::Overflow)?;
        }
        Ok(imei)
    }

    pub fn send(&mut self, message: &[u8]) -> Result<(), Error> {
        self.session.send(&mut self.client, message)
    }

    pub fn send_from(&mut self, message: &[u8], receive_port: u16) -> Result<(), Error> {
        self.session.send_from(&mut self.client, message, receive_port)
    }

    pub fn send_number(&mut self, key: &str, value: i32) -> Result<(), Error> {
        self.session.send_number(&mut self.client, key, value)
    }

    pub fn send_string(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.session.send_string(&mut self.client, key, value)
    }

    pub fn send_ok(&mut self) -> bool {
        self.session.send_ok()
    }

    pub fn set_destination(&mut self, host: &str, port: u16) -> Result<(), Error> {
        self.session.set_destination(host, port)
    }

    pub fn clear_destination(&mut self) {
        self.session.clear_destination();
    }

    pub fn set_encryption(&mut self, encrypt: bool) {
        self.session.set_encryption(encrypt);
    }

    pub fn send_at(&mut self, command: &str) -> Result<Response, Error> {
        self.client.send_at(command)
    }

    pub fn expect_at(&mut self, command: &str) -> Result<Line, Error> {
        self.client.expect_at(command)
    }

    pub fn expect_ok(&mut self, command: &str) -> Result<bool, Error> {
        self.client.expect_ok(command)
    }

    pub fn push_at(&mut self, command: &str) -> Result<(), Error> {
        self.client.push_at(command)
    }

    pub fn client(&mut self) -> &mut AtClient<T, D> {
        &mut self.client
    }

    pub fn session(&self) -> &UdpSession<I, C> {
        &self.session
    }

    pub fn release(self) -> (T, D) {
        self.client.release()
    }
}
