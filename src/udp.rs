//! One-shot UDP telemetry.
//!
//! Every send opens a socket, transmits a single datagram and closes the
//! socket again. The module's socket pool is tiny, so a socket is never kept
//! around between sends.

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use embedded_io::{Read, Write};
use heapless::String;

use crate::client::AtClient;
use crate::command::socket::{CloseSocket, CreateSocket, SendTo, SocketHandle};
use crate::command::AtCommand;
use crate::config::{Destination, SessionConfig};
use crate::error::{EncodeError, Error};
use crate::packet::{self, EncodedPacket, MAX_MESSAGE_LEN};
use crate::traits::{Cipher, DeviceIdentity};

/// Outcome of the most recent send.
///
/// Set to failed at the start of every send and to success only once the
/// module accepted the datagram. Reading it with [`take_ok`](Self::take_ok)
/// clears it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusLatch {
    failed: bool,
}

impl StatusLatch {
    pub const fn new() -> Self {
        Self { failed: false }
    }

    pub fn fail(&mut self) {
        self.failed = true;
    }

    pub fn succeed(&mut self) {
        self.failed = false;
    }

    /// Peek without clearing
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// `true` unless a send failed since the last call. Resets to success.
    pub fn take_ok(&mut self) -> bool {
        let ok = !self.failed;
        self.failed = false;
        ok
    }
}

/// An open module socket. Closed on drop.
pub struct UdpSocket<'c, T, D>
where
    T: Read + Write,
    D: DelayNs,
{
    client: &'c mut AtClient<T, D>,
    handle: SocketHandle,
    closed: bool,
}

impl<'c, T, D> UdpSocket<'c, T, D>
where
    T: Read + Write,
    D: DelayNs,
{
    /// Create a socket receiving on `local_port`.
    ///
    /// The module answers with the socket number followed by `OK`; anything
    /// else is treated as a failed open and nothing needs closing.
    pub fn open(client: &'c mut AtClient<T, D>, local_port: u16) -> Result<Self, Error> {
        let response = client.send_at(&CreateSocket { local_port }.to_command()?)?;
        if !response.is_ok() {
            warn!("Socket open rejected");
            return Err(Error::SocketOpen);
        }

        let handle = response
            .first()
            .and_then(|first| SocketHandle::try_from(first).ok())
            .ok_or_else(|| {
                warn!("No socket number in open response");
                Error::SocketOpen
            })?;

        debug!("Opened socket {}", handle.as_str());
        Ok(Self {
            client,
            handle,
            closed: false,
        })
    }

    pub fn handle(&self) -> &SocketHandle {
        &self.handle
    }

    /// Transmit `packet` to `destination`. Returns whether the module
    /// accepted it.
    pub fn send_to(&mut self, destination: &Destination, packet: &EncodedPacket) -> Result<bool, Error> {
        let data = packet.to_hex()?;
        let cmd = SendTo {
            socket: &self.handle,
            host: &destination.host,
            port: destination.port,
            length: packet.len(),
            data: &data,
        }
        .to_command()?;

        self.client.expect_ok(&cmd)
    }

    /// Close the socket, reporting whether the module confirmed it.
    pub fn close(mut self) -> Result<bool, Error> {
        self.closed = true;
        self.close_inner()
    }

    fn close_inner(&mut self) -> Result<bool, Error> {
        let cmd = CloseSocket {
            socket: &self.handle,
        }
        .to_command()?;
        let ok = self.client.expect_ok(&cmd)?;
        if !ok {
            warn!("Failed to close socket {}", self.handle.as_str());
        }
        Ok(ok)
    }
}

impl<T, D> Drop for UdpSocket<'_, T, D>
where
    T: Read + Write,
    D: DelayNs,
{
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.close_inner() {
                error!("Error closing socket {}: {:?}", self.handle.as_str(), e);
            }
        }
    }
}

/// Sends telemetry messages to the configured destination.
pub struct UdpSession<I, C> {
    config: SessionConfig,
    identity: I,
    cipher: C,
    status: StatusLatch,
}

impl<I, C> UdpSession<I, C>
where
    I: DeviceIdentity,
    C: Cipher,
{
    pub fn new(config: SessionConfig, identity: I, cipher: C) -> Self {
        Self {
            config,
            identity,
            cipher,
            status: StatusLatch::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn set_destination(&mut self, host: &str, port: u16) -> Result<(), Error> {
        self.config.set_destination(host, port)
    }

    pub fn clear_destination(&mut self) {
        self.config.clear_destination();
    }

    pub fn set_encryption(&mut self, encrypt: bool) {
        self.config.set_encryption(encrypt);
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// Send `message`, receiving replies on the configured port.
    pub fn send<T, D>(&mut self, client: &mut AtClient<T, D>, message: &[u8]) -> Result<(), Error>
    where
        T: Read + Write,
        D: DelayNs,
    {
        let port = self.config.receive_port;
        self.send_from(client, message, port)
    }

    /// Send `message` from a socket bound to `receive_port`.
    ///
    /// The outcome is latched for [`send_ok`](Self::send_ok) as well as
    /// returned.
    pub fn send_from<T, D>(
        &mut self,
        client: &mut AtClient<T, D>,
        message: &[u8],
        receive_port: u16,
    ) -> Result<(), Error>
    where
        T: Read + Write,
        D: DelayNs,
    {
        self.status.fail();

        let Some(destination) = self.config.destination.as_ref() else {
            warn!("No destination configured, dropping message");
            return Err(Error::NoDestination);
        };

        let mut socket = UdpSocket::open(client, receive_port)?;

        let packet = packet::encode(message, self.config.encrypt, &self.identity, &mut self.cipher)
            .map_err(|e| {
                warn!("Cannot encode message: {:?}", e);
                e
            })?;

        if !socket.send_to(destination, &packet)? {
            warn!("Module rejected datagram");
            return Err(Error::Transmit);
        }

        self.status.succeed();
        debug!(
            "Sent {} bytes to {}:{}",
            packet.len(),
            destination.host.as_str(),
            destination.port
        );

        // Close result does not affect the outcome
        if let Err(e) = socket.close() {
            error!("Error closing socket: {:?}", e);
        }
        Ok(())
    }

    /// Send `{"<key>":<value>}`
    pub fn send_number<T, D>(
        &mut self,
        client: &mut AtClient<T, D>,
        key: &str,
        value: i32,
    ) -> Result<(), Error>
    where
        T: Read + Write,
        D: DelayNs,
    {
        let json = self.build_json(|w| {
            w.write_str("{\"")?;
            write_escaped(w, key)?;
            write!(w, "\":{}}}", value)
        })?;
        self.send(client, json.as_bytes())
    }

    /// Send `{"<key>":"<value>"}`
    pub fn send_string<T, D>(
        &mut self,
        client: &mut AtClient<T, D>,
        key: &str,
        value: &str,
    ) -> Result<(), Error>
    where
        T: Read + Write,
        D: DelayNs,
    {
        let json = self.build_json(|w| {
            w.write_str("{\"")?;
            write_escaped(w, key)?;
            w.write_str("\":\"")?;
            write_escaped(w, value)?;
            w.write_str("\"}")
        })?;
        self.send(client, json.as_bytes())
    }

    /// `true` if the last send went through. Reading resets it to `true`.
    pub fn send_ok(&mut self) -> bool {
        self.status.take_ok()
    }

    pub fn status(&self) -> &StatusLatch {
        &self.status
    }

    fn build_json<F>(&mut self, f: F) -> Result<String<MAX_MESSAGE_LEN>, Error>
    where
        F: FnOnce(&mut String<MAX_MESSAGE_LEN>) -> core::fmt::Result,
    {
        let mut json = String::new();
        if f(&mut json).is_err() {
            self.status.fail();
            return Err(EncodeError::MessageTooLong.into());
        }
        Ok(json)
    }
}

fn write_escaped<W: core::fmt::Write>(w: &mut W, s: &str) -> core::fmt::Result {
    for c in s.chars() {
        match c {
            '"' => w.write_str("\\\"")?,
            '\\' => w.write_str("\\\\")?,
            c => w.write_char(c)?,
        }
    }
    Ok(())
}
