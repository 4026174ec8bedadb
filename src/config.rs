use embassy_time::Duration;
use heapless::String;

use crate::error::Error;
use crate::module_timing::{attach_poll_attempts, attach_poll_interval};

/// Local port the module listens on for replies, unless overridden per send
pub const DEFAULT_RECEIVE_PORT: u16 = 44567;

pub const MAX_HOST_LEN: usize = 64;

/// Remote end of the telemetry path
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Destination {
    pub host: String<MAX_HOST_LEN>,
    pub port: u16,
}

impl Destination {
    pub fn new(host: &str, port: u16) -> Result<Self, Error> {
        Ok(Self {
            host: String::try_from(host).map_err(|_| Error::Overflow)?,
            port,
        })
    }
}

/// Settings read by [`UdpSession`] at send time.
///
/// [`UdpSession`]: crate::udp::UdpSession
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionConfig {
    pub(crate) destination: Option<Destination>,
    pub(crate) receive_port: u16,
    pub(crate) encrypt: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            destination: None,
            receive_port: DEFAULT_RECEIVE_PORT,
            encrypt: false,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_destination(self, host: &str, port: u16) -> Result<Self, Error> {
        Ok(Self {
            destination: Some(Destination::new(host, port)?),
            ..self
        })
    }

    pub fn with_receive_port(self, receive_port: u16) -> Self {
        Self {
            receive_port,
            ..self
        }
    }

    pub fn with_encryption(self) -> Self {
        Self {
            encrypt: true,
            ..self
        }
    }

    pub fn set_destination(&mut self, host: &str, port: u16) -> Result<(), Error> {
        self.destination = Some(Destination::new(host, port)?);
        Ok(())
    }

    pub fn clear_destination(&mut self) {
        self.destination = None;
    }

    pub fn set_encryption(&mut self, encrypt: bool) {
        self.encrypt = encrypt;
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn receive_port(&self) -> u16 {
        self.receive_port
    }

    pub fn encryption(&self) -> bool {
        self.encrypt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Apn<'a> {
    /// Leave the PDP context as provisioned on the module
    #[default]
    None,
    Given {
        name: &'a str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatorSelection<'a> {
    #[default]
    Automatic,
    /// Register on a fixed PLMN, given as numeric MCC+MNC, eg. `"26201"`
    Manual { plmn: &'a str },
}

/// Query sent to poll the attach state
pub const ATTACH_STATUS_QUERY: &str = "+CGATT?";

/// First response line of [`ATTACH_STATUS_QUERY`] once attached
pub const ATTACHED_RESPONSE: &str = "+CGATT:1";

/// Parameters of the attach sequence run at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttachConfig<'a> {
    pub(crate) attempts: u8,
    pub(crate) poll_interval: Duration,
    pub(crate) operator: OperatorSelection<'a>,
    pub(crate) status_query: &'a str,
    pub(crate) attached_response: &'a str,
    pub(crate) apn: Apn<'a>,
}

impl Default for AttachConfig<'_> {
    fn default() -> Self {
        Self {
            attempts: attach_poll_attempts(),
            poll_interval: attach_poll_interval(),
            operator: OperatorSelection::Automatic,
            status_query: ATTACH_STATUS_QUERY,
            attached_response: ATTACHED_RESPONSE,
            apn: Apn::None,
        }
    }
}

impl<'a> AttachConfig<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attempts(self, attempts: u8) -> Self {
        Self { attempts, ..self }
    }

    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..self
        }
    }

    pub fn with_operator(self, operator: OperatorSelection<'a>) -> Self {
        Self { operator, ..self }
    }

    /// Replace the attach state query and the line that signals success.
    pub fn with_status_query(self, query: &'a str, attached_response: &'a str) -> Self {
        Self {
            status_query: query,
            attached_response,
            ..self
        }
    }

    pub fn with_apn(self, apn: Apn<'a>) -> Self {
        Self { apn, ..self }
    }

    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_defaults() {
        let config = SessionConfig::default();
        assert!(config.destination().is_none());
        assert_eq!(config.receive_port(), 44567);
        assert!(!config.encryption());
    }

    #[test]
    fn session_builder() {
        let config = SessionConfig::new()
            .with_destination("46.23.86.61", 5883)
            .unwrap()
            .with_receive_port(4587)
            .with_encryption();

        let dest = config.destination().unwrap();
        assert_eq!(dest.host.as_str(), "46.23.86.61");
        assert_eq!(dest.port, 5883);
        assert_eq!(config.receive_port(), 4587);
        assert!(config.encryption());
    }

    #[test]
    fn host_too_long() {
        let host = [b'a'; MAX_HOST_LEN + 1];
        let host = core::str::from_utf8(&host).unwrap();
        assert_eq!(
            SessionConfig::new().with_destination(host, 1),
            Err(Error::Overflow)
        );
    }

    #[test]
    fn reconfigure_destination() {
        let mut config = SessionConfig::new();
        config.set_destination("10.0.0.1", 1).unwrap();
        config.set_destination("10.0.0.2", 2).unwrap();
        assert_eq!(
            config.destination(),
            Some(&Destination::new("10.0.0.2", 2).unwrap())
        );

        config.clear_destination();
        assert!(config.destination().is_none());
    }

    #[test]
    fn attach_defaults() {
        let config = AttachConfig::default();
        assert_eq!(config.attempts(), 6);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.operator, OperatorSelection::Automatic);
        assert_eq!(config.status_query, "+CGATT?");
        assert_eq!(config.attached_response, "+CGATT:1");
        assert_eq!(config.apn, Apn::None);
    }
}
