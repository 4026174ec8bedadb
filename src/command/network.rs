//! Network attach commands
use core::fmt::Write;

use super::AtCommand;
use crate::config::OperatorSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Functionality {
    /// Radio off, SIM still accessible
    Minimum = 0,
    Full = 1,
}

/// 3GPP `+CFUN`, set phone functionality
#[derive(Debug, Clone, Copy)]
pub struct SetModuleFunctionality {
    pub fun: Functionality,
}

impl AtCommand for SetModuleFunctionality {
    fn write_body<W: Write>(&self, w: &mut W) -> core::fmt::Result {
        write!(w, "+CFUN={}", self.fun as u8)
    }
}

/// 3GPP `+COPS`, PLMN selection
#[derive(Debug, Clone, Copy)]
pub struct SetOperatorSelection<'a> {
    pub selection: OperatorSelection<'a>,
}

impl AtCommand for SetOperatorSelection<'_> {
    fn write_body<W: Write>(&self, w: &mut W) -> core::fmt::Result {
        match self.selection {
            OperatorSelection::Automatic => w.write_str("+COPS=0"),
            OperatorSelection::Manual { plmn } => write!(w, "+COPS=1,2,\"{}\"", plmn),
        }
    }
}

/// 3GPP `+CGDCONT`, define an IP PDP context
#[derive(Debug, Clone, Copy)]
pub struct SetPdpContextDefinition<'a> {
    pub cid: u8,
    pub apn: &'a str,
}

impl AtCommand for SetPdpContextDefinition<'_> {
    fn write_body<W: Write>(&self, w: &mut W) -> core::fmt::Result {
        write!(w, "+CGDCONT={},\"IP\",\"{}\"", self.cid, self.apn)
    }
}
