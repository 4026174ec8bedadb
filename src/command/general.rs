//! General commands
use core::fmt::Write;

use super::AtCommand;

/// `+CGSN=1`, request the IMEI. Answered with `+CGSN:<imei>`.
#[derive(Debug, Clone, Copy)]
pub struct GetImei;

impl GetImei {
    pub const RESPONSE_PREFIX: &'static str = "+CGSN:";
}

impl AtCommand for GetImei {
    fn write_body<W: Write>(&self, w: &mut W) -> core::fmt::Result {
        w.write_str("+CGSN=1")
    }
}
