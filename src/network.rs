//! Network attach.
//!
//! Powers the radio up, selects an operator and then polls the attach state a
//! bounded number of times. Failing to attach is not an error: the module
//! keeps trying in the background and later sends simply fail.

use embedded_hal::delay::DelayNs;
use embedded_io::{Read, Write};

use crate::client::AtClient;
use crate::command::network::{
    Functionality, SetModuleFunctionality, SetOperatorSelection, SetPdpContextDefinition,
};
use crate::command::AtCommand;
use crate::config::{Apn, AttachConfig};
use crate::error::Error;

/// Context id used for the APN set through [`Apn::Given`]
const DEFAULT_CONTEXT_ID: u8 = 1;

pub struct NetworkAttach<'a> {
    config: AttachConfig<'a>,
}

impl<'a> NetworkAttach<'a> {
    pub fn new(config: AttachConfig<'a>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AttachConfig<'a> {
        &self.config
    }

    /// Run the attach sequence once.
    ///
    /// Returns `Ok(())` whether or not the module attached; only transport
    /// faults are errors. Use [`is_attached`](Self::is_attached) to find out.
    pub fn run<T, D>(&self, client: &mut AtClient<T, D>) -> Result<(), Error>
    where
        T: Read + Write,
        D: DelayNs,
    {
        let cfun = SetModuleFunctionality {
            fun: Functionality::Full,
        }
        .to_command()?;
        if !client.expect_ok(&cfun)? {
            warn!("Setting full functionality failed");
        }

        let cops = SetOperatorSelection {
            selection: self.config.operator,
        }
        .to_command()?;
        if !client.expect_ok(&cops)? {
            warn!("Operator selection rejected, not waiting for attach");
            return Ok(());
        }

        if let Apn::Given { name } = self.config.apn {
            let cgdcont = SetPdpContextDefinition {
                cid: DEFAULT_CONTEXT_ID,
                apn: name,
            }
            .to_command()?;
            if !client.expect_ok(&cgdcont)? {
                warn!("Failed to set APN {}", name);
            }
        }

        for attempt in 1..=self.config.attempts {
            if self.is_attached(client)? {
                info!("Network attached after {} poll(s)", attempt);
                return Ok(());
            }
            debug!("Not attached yet ({}/{})", attempt, self.config.attempts);
            client.pause(self.config.poll_interval);
        }

        warn!(
            "Network not attached after {} poll(s), continuing",
            self.config.attempts
        );
        Ok(())
    }

    /// Query the attach state once.
    pub fn is_attached<T, D>(&self, client: &mut AtClient<T, D>) -> Result<bool, Error>
    where
        T: Read + Write,
        D: DelayNs,
    {
        let first = client.expect_at(self.config.status_query)?;
        Ok(first.as_str() == self.config.attached_response)
    }
}
