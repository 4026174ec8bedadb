use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::packet::MAX_BODY_LEN;
use crate::traits::Cipher;

/// Serial port replaying a canned module transcript and recording what the
/// driver writes.
pub struct MockTransport {
    rx: std::vec::Vec<u8>,
    cursor: usize,
    chunk_size: usize,
    tx: std::vec::Vec<u8>,
}

impl MockTransport {
    pub fn new(rx: &str) -> Self {
        Self {
            rx: rx.as_bytes().to_vec(),
            cursor: 0,
            chunk_size: usize::MAX,
            tx: std::vec::Vec::new(),
        }
    }

    /// Hand out at most `chunk_size` bytes per read
    pub fn with_chunk_size(self, chunk_size: usize) -> Self {
        Self { chunk_size, ..self }
    }

    pub fn written(&self) -> &str {
        core::str::from_utf8(&self.tx).unwrap()
    }

    /// Bytes of the transcript not consumed yet
    pub fn remaining(&self) -> usize {
        self.rx.len() - self.cursor
    }
}

impl embedded_io::ErrorType for MockTransport {
    type Error = Infallible;
}

impl embedded_io::Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.chunk_size).min(self.remaining());
        buf[..n].copy_from_slice(&self.rx[self.cursor..self.cursor + n]);
        self.cursor += n;
        Ok(n)
    }
}

impl embedded_io::Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Delay that returns immediately and records every requested pause in ms.
#[derive(Default)]
pub struct MockDelay {
    delays: std::vec::Vec<u32>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> &[u32] {
        &self.delays
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays.push(ns / 1_000_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.delays.push(us / 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }
}

/// Byte-wise XOR, so tests can see exactly what was handed to the cipher.
pub struct XorCipher {
    key: u8,
    pub last_plaintext: Vec<u8, MAX_BODY_LEN>,
}

impl XorCipher {
    pub fn new(key: u8) -> Self {
        Self {
            key,
            last_plaintext: Vec::new(),
        }
    }
}

impl Cipher for XorCipher {
    fn encrypt(&mut self, plaintext: &[u8]) -> Vec<u8, MAX_BODY_LEN> {
        self.last_plaintext = Vec::from_slice(plaintext).unwrap();
        plaintext.iter().map(|b| b ^ self.key).collect()
    }
}
