//! AT transaction engine.
//!
//! One transaction writes a framed command and then collects reply lines
//! until a terminal line arrives. There is no timeout: a module that never
//! answers `OK` or `ERROR` blocks the caller. Bounded waits are built on top
//! by polling, see [`NetworkAttach`].
//!
//! [`NetworkAttach`]: crate::network::NetworkAttach

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_io::{Error as _, Read, Write};
use heapless::{String, Vec};

use crate::command::Prefix;
use crate::error::Error;
use crate::module_timing::command_settle_time;

pub const MAX_LINE_LEN: usize = 128;
pub const MAX_RESPONSE_LINES: usize = 16;

const INGRESS_BUF_SIZE: usize = 64;

/// A single response line, terminator stripped
pub type Line = String<MAX_LINE_LEN>;

/// Decides which raw line ends a transaction.
///
/// Raw lines still carry their trailing `\r`.
pub trait ResponseTerminator {
    fn is_terminal(&self, line: &str) -> bool;
}

impl<F: Fn(&str) -> bool> ResponseTerminator for F {
    fn is_terminal(&self, line: &str) -> bool {
        self(line)
    }
}

/// The standard `OK` / `ERROR` final result codes
#[derive(Debug, Clone, Copy)]
pub struct FinalResultCode;

impl ResponseTerminator for FinalResultCode {
    fn is_terminal(&self, line: &str) -> bool {
        line == "OK\r" || line == "ERROR\r"
    }
}

/// Lines received during one transaction, in order, terminal line last.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Response {
    lines: Vec<Line, MAX_RESPONSE_LINES>,
}

impl Response {
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.as_str())
    }

    pub fn first(&self) -> Option<&str> {
        self.lines.first().map(|l| l.as_str())
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(|l| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `true` if the transaction ended with `OK`
    pub fn is_ok(&self) -> bool {
        self.last() == Some("OK")
    }

    /// Append a line. Once full, further intermediate lines are dropped but a
    /// terminal line always takes the last slot.
    fn push(&mut self, line: Line, terminal: bool) {
        if self.lines.is_full() {
            if !terminal {
                warn!("Response full, dropping line: {}", line.as_str());
                return;
            }
            self.lines.pop();
        }
        // Cannot fail, room was made above
        let _ = self.lines.push(line);
    }
}

/// Splits the transport byte stream into `\n` terminated lines.
struct Ingress {
    buf: [u8; INGRESS_BUF_SIZE],
    pos: usize,
    len: usize,
}

impl Ingress {
    const fn new() -> Self {
        Self {
            buf: [0; INGRESS_BUF_SIZE],
            pos: 0,
            len: 0,
        }
    }

    /// Read one line, without the `\n` but with any `\r` still in place.
    /// Overlong lines are truncated to [`MAX_LINE_LEN`].
    fn read_line<R: Read>(&mut self, rx: &mut R) -> Result<Line, Error> {
        let mut line = Line::new();
        let mut truncated = false;

        loop {
            if self.pos == self.len {
                let n = rx.read(&mut self.buf).map_err(|e| Error::Io(e.kind()))?;
                if n == 0 {
                    return Err(Error::EndOfStream);
                }
                self.pos = 0;
                self.len = n;
            }

            let b = self.buf[self.pos];
            self.pos += 1;

            if b == b'\n' {
                break;
            }
            if line.push(b as char).is_err() {
                truncated = true;
            }
        }

        if truncated {
            warn!("Truncated response line to {} bytes", MAX_LINE_LEN);
        }
        Ok(line)
    }
}

/// Client for the AT interface of the module.
///
/// Owns the serial transport and the delay used to pace commands.
pub struct AtClient<T, D> {
    transport: T,
    delay: D,
    prefix: Prefix,
    settle_time: Duration,
    ingress: Ingress,
}

impl<T, D> AtClient<T, D>
where
    T: Read + Write,
    D: DelayNs,
{
    pub fn new(transport: T, delay: D) -> Self {
        Self {
            transport,
            delay,
            prefix: Prefix::default(),
            settle_time: command_settle_time(),
            ingress: Ingress::new(),
        }
    }

    pub fn with_prefix(self, prefix: Prefix) -> Self {
        Self { prefix, ..self }
    }

    pub fn with_settle_time(self, settle_time: Duration) -> Self {
        Self {
            settle_time,
            ..self
        }
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn set_prefix(&mut self, prefix: Prefix) {
        self.prefix = prefix;
    }

    /// Give back the transport and delay
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    /// Block for `duration`
    pub fn pause(&mut self, duration: Duration) {
        self.delay.delay_ms(duration.as_millis() as u32);
    }

    /// Send `command` (without the `AT` prefix) and collect the response up to
    /// and including the final `OK` or `ERROR`.
    pub fn send_at(&mut self, command: &str) -> Result<Response, Error> {
        self.pause(self.settle_time);

        trace!("-> AT{}", command);
        self.write_str(self.prefix.lead())?;
        self.write_str(command)?;
        self.write_str(self.prefix.trail())?;
        self.transport.flush().map_err(|e| Error::Io(e.kind()))?;

        self.collect(&FinalResultCode)
    }

    /// Collect lines without sending anything, until `terminator` accepts one.
    ///
    /// Used to wait for unsolicited notifications that do not end in
    /// `OK`/`ERROR`.
    pub fn receive_response<P>(&mut self, terminator: P) -> Result<Response, Error>
    where
        P: ResponseTerminator,
    {
        self.collect(&terminator)
    }

    /// Send `command` and return the first response line, or an empty line if
    /// nothing came back.
    pub fn expect_at(&mut self, command: &str) -> Result<Line, Error> {
        let response = self.send_at(command)?;
        Ok(response
            .first()
            .and_then(|l| Line::try_from(l).ok())
            .unwrap_or_default())
    }

    /// Send `command` and report whether it ended with `OK`.
    pub fn expect_ok(&mut self, command: &str) -> Result<bool, Error> {
        Ok(self.send_at(command)?.is_ok())
    }

    /// Send `command` and ignore the response.
    pub fn push_at(&mut self, command: &str) -> Result<(), Error> {
        self.send_at(command).map(drop)
    }

    fn write_str(&mut self, s: &str) -> Result<(), Error> {
        self.transport
            .write_all(s.as_bytes())
            .map_err(|e| Error::Io(e.kind()))
    }

    fn collect<P>(&mut self, terminator: &P) -> Result<Response, Error>
    where
        P: ResponseTerminator + ?Sized,
    {
        let mut response = Response::new();

        loop {
            let raw = self.ingress.read_line(&mut self.transport)?;
            let terminal = terminator.is_terminal(&raw);

            let line = raw.strip_suffix('\r').unwrap_or(raw.as_str());
            if !line.is_empty() {
                trace!("<- {}", line);
                // `line` is a prefix of `raw`, so it always fits
                if let Ok(line) = Line::try_from(line) {
                    response.push(line, terminal);
                }
            }

            if terminal {
                return Ok(response);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn delay(&self) -> &D {
        &self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockDelay, MockTransport};

    fn client(rx: &str) -> AtClient<MockTransport, MockDelay> {
        AtClient::new(MockTransport::new(rx), MockDelay::new())
    }

    #[test]
    fn send_at_collects_until_ok() {
        let mut at = client("\r\n901405800006425\r\n\r\nOK\r\n");

        let response = at.send_at("+CIMI").unwrap();

        assert_eq!(response.len(), 2);
        assert_eq!(response.first(), Some("901405800006425"));
        assert_eq!(response.last(), Some("OK"));
        assert!(response.is_ok());
        assert_eq!(at.transport().written(), "\r\nAT+CIMI\r\n");
    }

    #[test]
    fn send_at_stops_at_error() {
        let mut at = client("ERROR\r\nOK\r\n");

        let response = at.send_at("+NBAND=99").unwrap();
        assert_eq!(response.lines().collect::<std::vec::Vec<_>>(), ["ERROR"]);
        assert!(!response.is_ok());

        // The trailing OK belongs to the next transaction
        assert!(at.expect_ok("").unwrap());
    }

    #[test]
    fn settle_delay_before_every_command() {
        let mut at = client("OK\r\nOK\r\n");

        at.push_at("+CSQ").unwrap();
        at.push_at("+NUESTATS").unwrap();

        assert_eq!(at.delay().delays(), &[100, 100]);
    }

    #[test]
    fn custom_settle_time() {
        let mut at = client("OK\r\n").with_settle_time(Duration::from_millis(250));
        at.push_at("").unwrap();
        assert_eq!(at.delay().delays(), &[250]);
    }

    #[test]
    fn only_exact_sentinels_terminate() {
        let mut at = client("OK, but not quite\r\nOKAY\r\nOK\r\n");

        let response = at.send_at("+CGMI").unwrap();
        assert_eq!(
            response.lines().collect::<std::vec::Vec<_>>(),
            ["OK, but not quite", "OKAY", "OK"]
        );
    }

    #[test]
    fn bare_lf_sentinel_does_not_terminate() {
        let mut at = client("OK\n\r\nERROR\r\n");

        let response = at.send_at("+CGMM").unwrap();
        assert_eq!(response.lines().collect::<std::vec::Vec<_>>(), ["OK", "ERROR"]);
    }

    #[test]
    fn empty_lines_are_dropped() {
        let mut at = client("\r\n\r\n\n+CGATT:1\r\n\r\nOK\r\n");

        let response = at.send_at("+CGATT?").unwrap();
        assert_eq!(response.lines().collect::<std::vec::Vec<_>>(), ["+CGATT:1", "OK"]);
    }

    #[test]
    fn expect_at_first_line() {
        let mut at = client("+NBAND:8\r\nOK\r\n");
        assert_eq!(at.expect_at("+NBAND?").unwrap().as_str(), "+NBAND:8");
    }

    #[test]
    fn expect_at_sentinel_only() {
        let mut at = client("ERROR\r\n");
        assert_eq!(at.expect_at("+CGATT?").unwrap().as_str(), "ERROR");
    }

    #[test]
    fn expect_ok() {
        let mut at = client("OK\r\n+CME ERROR: 4\r\nERROR\r\n");
        assert!(at.expect_ok("+CFUN=1").unwrap());
        assert!(!at.expect_ok("+CFUN=9").unwrap());
    }

    #[test]
    fn carriage_return_prefix() {
        let mut at = client("OK\r\n").with_prefix(Prefix::CarriageReturn);
        at.push_at("+NRB").unwrap();
        assert_eq!(at.transport().written(), "\rAT+NRB");
    }

    #[test]
    fn switch_prefix() {
        let mut at = client("OK\r\nOK\r\n");
        at.push_at("").unwrap();
        at.set_prefix(Prefix::CarriageReturn);
        at.push_at("").unwrap();

        assert_eq!(at.prefix(), Prefix::CarriageReturn);
        assert_eq!(at.transport().written(), "\r\nAT\r\n\rAT");
    }

    #[test]
    fn receive_response_with_closure() {
        let mut at = client("+CEREG:2\r\n+CSCON:1\r\n+CEREG:1\r\nOK\r\n");

        let response = at
            .receive_response(|line: &str| line.starts_with("+CEREG:1"))
            .unwrap();

        assert_eq!(
            response.lines().collect::<std::vec::Vec<_>>(),
            ["+CEREG:2", "+CSCON:1", "+CEREG:1"]
        );
        // Nothing sent, no settle delay
        assert_eq!(at.transport().written(), "");
        assert!(at.delay().delays().is_empty());
    }

    #[test]
    fn chunked_reads() {
        let mut at = AtClient::new(
            MockTransport::new("+NSOCR\r\n1\r\nOK\r\n").with_chunk_size(3),
            MockDelay::new(),
        );

        let response = at.send_at("+NSOCR=DGRAM,17,44567,1").unwrap();
        assert_eq!(
            response.lines().collect::<std::vec::Vec<_>>(),
            ["+NSOCR", "1", "OK"]
        );
    }

    #[test]
    fn overlong_line_is_truncated() {
        let mut rx = std::string::String::new();
        rx.push_str(&"A".repeat(MAX_LINE_LEN + 40));
        rx.push_str("\r\nOK\r\n");
        let mut at = client(&rx);

        let response = at.send_at("+NUESTATS").unwrap();
        assert_eq!(response.len(), 2);
        assert_eq!(response.first().unwrap().len(), MAX_LINE_LEN);
        assert!(response.is_ok());
    }

    #[test]
    fn full_response_keeps_terminal_line() {
        let mut rx = std::string::String::new();
        for i in 0..(MAX_RESPONSE_LINES + 4) {
            rx.push_str(&std::format!("line {}\r\n", i));
        }
        rx.push_str("OK\r\n");
        let mut at = client(&rx);

        let response = at.send_at("+NUESTATS").unwrap();
        assert_eq!(response.len(), MAX_RESPONSE_LINES);
        assert_eq!(response.first(), Some("line 0"));
        assert!(response.is_ok());
    }

    #[test]
    fn end_of_stream() {
        let mut at = client("+CGATT:0\r\n");
        assert_eq!(at.send_at("+CGATT?"), Err(Error::EndOfStream));
    }

    #[test]
    fn release() {
        let at = client("");
        let (transport, _delay) = at.release();
        assert_eq!(transport.written(), "");
    }
}
