//! AT commands for the Quectel BC95 NB-IoT module family.
//!
//! Only the commands the driver issues on its own are modelled here. Anything
//! else can be sent as a plain string through [`AtClient::send_at`].
//!
//! [`AtClient::send_at`]: crate::client::AtClient::send_at

pub mod general;
pub mod network;
pub mod socket;

use core::fmt::Write;

use heapless::String;

use crate::error::Error;
use crate::packet::MAX_HEX_LEN;

/// Room for the largest command body, a `+NSOST` carrying a full packet
pub const COMMAND_CAPACITY: usize = MAX_HEX_LEN + 128;

/// Command body without the `AT` prefix
pub type Command = String<COMMAND_CAPACITY>;

/// A command the driver knows how to render.
pub trait AtCommand {
    /// Write the command body, without `AT` and without line termination.
    fn write_body<W: Write>(&self, w: &mut W) -> core::fmt::Result;

    fn to_command(&self) -> Result<Command, Error> {
        let mut cmd = Command::new();
        self.write_body(&mut cmd)?;
        Ok(cmd)
    }
}

/// How a command body is framed on the wire.
///
/// Firmware revisions differ in how much whitespace they need around a
/// command before they reliably enter command mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prefix {
    /// `\r\nAT<command>\r\n`
    #[default]
    Standard,
    /// `\rAT<command>`, no line termination
    CarriageReturn,
}

impl Prefix {
    pub const fn lead(&self) -> &'static str {
        match self {
            Prefix::Standard => "\r\nAT",
            Prefix::CarriageReturn => "\rAT",
        }
    }

    pub const fn trail(&self) -> &'static str {
        match self {
            Prefix::Standard => "\r\n",
            Prefix::CarriageReturn => "",
        }
    }

    /// Frame `command` into a single buffer.
    pub fn frame<const N: usize>(&self, command: &str) -> Result<String<N>, Error> {
        let mut framed = String::new();
        framed.push_str(self.lead()).map_err(|_| Error::Overflow)?;
        framed.push_str(command).map_err(|_| Error::Overflow)?;
        framed.push_str(self.trail()).map_err(|_| Error::Overflow)?;
        Ok(framed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_prefix() {
        let framed: String<32> = Prefix::Standard.frame("+CGATT?").unwrap();
        assert_eq!(framed.as_str(), "\r\nAT+CGATT?\r\n");
    }

    #[test]
    fn carriage_return_prefix() {
        let framed: String<32> = Prefix::CarriageReturn.frame("+CGATT?").unwrap();
        assert_eq!(framed.as_str(), "\rAT+CGATT?");
    }

    #[test]
    fn empty_command() {
        let framed: String<32> = Prefix::default().frame("").unwrap();
        assert_eq!(framed.as_str(), "\r\nAT\r\n");
    }

    #[test]
    fn frame_overflow() {
        assert_eq!(
            Prefix::Standard.frame::<8>("+CGATT?"),
            Err(Error::Overflow)
        );
    }
}
