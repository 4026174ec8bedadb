use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;
use heapless::Vec;

use crate::packet::MAX_BODY_LEN;
use crate::traits::Cipher;

const BLOCK_LEN: usize = 16;

/// AES-128 in ECB mode, the scheme the telemetry backend decrypts.
///
/// Input is zero padded to a whole number of blocks. The packet encoder has
/// already appended the `0x80` end marker, so the receiver can strip the
/// padding.
pub struct Aes128Cipher {
    inner: Aes128,
}

impl Aes128Cipher {
    pub fn new(key: [u8; 16]) -> Self {
        Self {
            inner: Aes128::new(GenericArray::from_slice(&key)),
        }
    }
}

impl Cipher for Aes128Cipher {
    fn encrypt(&mut self, plaintext: &[u8]) -> Vec<u8, MAX_BODY_LEN> {
        let mut out = Vec::new();

        for chunk in plaintext.chunks(BLOCK_LEN) {
            let mut block = aes::Block::default();
            block[..chunk.len()].copy_from_slice(chunk);
            self.inner.encrypt_block(&mut block);

            if out.extend_from_slice(&block).is_err() {
                warn!("Plaintext of {} bytes exceeds cipher capacity", plaintext.len());
                return Vec::new();
            }
        }

        out
    }
}
