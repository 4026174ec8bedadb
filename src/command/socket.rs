//! UDP socket commands
//!
//! The BC95 keeps a small pool of sockets. Every socket created with
//! [`CreateSocket`] has to be released with [`CloseSocket`].
use core::fmt::Write;

use heapless::String;

use super::AtCommand;

/// Socket number as reported by `+NSOCR`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketHandle(String<8>);

impl SocketHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for SocketHandle {
    type Error = ();

    /// Accepts the plain decimal socket number the module prints.
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(());
        }
        String::try_from(s).map(Self)
    }
}

/// `+NSOCR`, create a UDP socket bound to `local_port`
///
/// With receive control set to 1 the module reports incoming datagrams with
/// `+NSONMI` URCs.
#[derive(Debug, Clone, Copy)]
pub struct CreateSocket {
    pub local_port: u16,
}

impl AtCommand for CreateSocket {
    fn write_body<W: Write>(&self, w: &mut W) -> core::fmt::Result {
        write!(w, "+NSOCR=DGRAM,17,{},1", self.local_port)
    }
}

/// `+NSOST`, send a hex encoded datagram
#[derive(Debug, Clone, Copy)]
pub struct SendTo<'a> {
    pub socket: &'a SocketHandle,
    pub host: &'a str,
    pub port: u16,
    /// Payload length in bytes, half the length of `data`
    pub length: usize,
    pub data: &'a str,
}

impl AtCommand for SendTo<'_> {
    fn write_body<W: Write>(&self, w: &mut W) -> core::fmt::Result {
        write!(
            w,
            "+NSOST={},{},{},{},{}",
            self.socket.as_str(),
            self.host,
            self.port,
            self.length,
            self.data
        )
    }
}

/// `+NSOCL`, close a socket
#[derive(Debug, Clone, Copy)]
pub struct CloseSocket<'a> {
    pub socket: &'a SocketHandle,
}

impl AtCommand for CloseSocket<'_> {
    fn write_body<W: Write>(&self, w: &mut W) -> core::fmt::Result {
        write!(w, "+NSOCL={}", self.socket.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_handle() {
        assert_eq!(SocketHandle::try_from("0").unwrap().as_str(), "0");
        assert_eq!(SocketHandle::try_from("12").unwrap().as_str(), "12");
        assert!(SocketHandle::try_from("").is_err());
        assert!(SocketHandle::try_from("OK").is_err());
        assert!(SocketHandle::try_from("+NSOCR:1").is_err());
        assert!(SocketHandle::try_from("123456789").is_err());
    }

    #[test]
    fn create_socket() {
        let cmd = CreateSocket { local_port: 44567 }.to_command().unwrap();
        assert_eq!(cmd.as_str(), "+NSOCR=DGRAM,17,44567,1");
    }

    #[test]
    fn send_to() {
        let socket = SocketHandle::try_from("1").unwrap();
        let cmd = SendTo {
            socket: &socket,
            host: "46.23.86.61",
            port: 5883,
            length: 8,
            data: "CE00000001A26869",
        }
        .to_command()
        .unwrap();
        assert_eq!(
            cmd.as_str(),
            "+NSOST=1,46.23.86.61,5883,8,CE00000001A26869"
        );
    }

    #[test]
    fn close_socket() {
        let socket = SocketHandle::try_from("3").unwrap();
        let cmd = CloseSocket { socket: &socket }.to_command().unwrap();
        assert_eq!(cmd.as_str(), "+NSOCL=3");
    }
}
