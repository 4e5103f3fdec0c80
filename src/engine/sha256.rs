// src/engine/sha256.rs
//! Incremental double-SHA-256 with midstate export
//!
//! The legacy mining path hands miners the hash midstate after the first
//! 448 block bytes so each share only needs the remaining compression
//! steps instead of re-hashing the whole block. The high-level `sha2`
//! API cannot expose its internal state, so this digest drives
//! [`compress256`] directly and keeps the state words visible; the
//! second hashing pass goes through `sha2::Sha256` as usual.

use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha256, compress256};

use crate::types::Hash256;

const BLOCK_BYTES: usize = 64;

/// SHA-256 initial hash values (FIPS 180-4).
const IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

/// A partially-consumed double-SHA-256 computation
///
/// Cloneable so one retained per-round state can finish many shares:
/// each share clones the state, appends its 32 reversed payload bytes
/// and finalizes, leaving the round's state untouched.
#[derive(Clone, Debug)]
pub struct DigestState {
    state: [u32; 8],
    buffer: [u8; BLOCK_BYTES],
    buffered: usize,
    length: u64,
}

impl Default for DigestState {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestState {
    /// Creates an empty digest state.
    pub fn new() -> Self {
        DigestState {
            state: IV,
            buffer: [0u8; BLOCK_BYTES],
            buffered: 0,
            length: 0,
        }
    }

    /// Consumes more input bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.length += data.len() as u64;
        self.absorb(data);
    }

    /// Exports the current 256-bit midstate (big-endian state words).
    ///
    /// Only meaningful at a 64-byte block boundary; the legacy task
    /// format guarantees this by exporting after exactly 448 bytes.
    pub fn midstate(&self) -> Hash256 {
        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.state.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    /// Finalizes the double SHA-256: pads and finishes the first pass,
    /// then hashes the 32-byte digest once more.
    pub fn finish_double(mut self) -> Hash256 {
        let bit_length = self.length.wrapping_mul(8);

        // Standard merkle-damgard padding: 0x80, zeros, 64-bit length.
        let mut tail = [0u8; 2 * BLOCK_BYTES];
        tail[0] = 0x80;
        let pad_len = if self.buffered < 56 {
            56 - self.buffered
        } else {
            120 - self.buffered
        };
        tail[pad_len..pad_len + 8].copy_from_slice(&bit_length.to_be_bytes());
        self.absorb(&tail[..pad_len + 8]);

        let first = self.midstate();
        Sha256::digest(first).into()
    }

    fn absorb(&mut self, mut data: &[u8]) {
        if self.buffered > 0 {
            let take = (BLOCK_BYTES - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];
            if self.buffered == BLOCK_BYTES {
                let block = GenericArray::clone_from_slice(&self.buffer);
                compress256(&mut self.state, core::slice::from_ref(&block));
                self.buffered = 0;
            }
        }

        let mut chunks = data.chunks_exact(BLOCK_BYTES);
        for chunk in &mut chunks {
            let block = GenericArray::clone_from_slice(chunk);
            compress256(&mut self.state, core::slice::from_ref(&block));
        }

        let remainder = chunks.remainder();
        self.buffer[..remainder.len()].copy_from_slice(remainder);
        self.buffered = remainder.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn reference_double_sha256(data: &[u8]) -> Hash256 {
        let first = Sha256::digest(data);
        Sha256::digest(first).into()
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_matches_reference_across_lengths() {
        for len in [0, 1, 55, 56, 63, 64, 65, 127, 128, 448, 480, 512] {
            let data = sample(len);
            let mut digest = DigestState::new();
            digest.update(&data);
            assert_eq!(
                digest.finish_double(),
                reference_double_sha256(&data),
                "mismatch at input length {}",
                len
            );
        }
    }

    #[test]
    fn test_known_answer_vectors() {
        assert_eq!(
            DigestState::new().finish_double(),
            hex!("5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456")
        );
        let mut abc = DigestState::new();
        abc.update(b"abc");
        assert_eq!(
            abc.finish_double(),
            hex!("4f8b42c22dd3729b519ba6f68d2da7cc5b2d606d05daed5ad5128cc03e6c6358")
        );
    }

    #[test]
    fn test_split_updates_equal_single_update() {
        let data = sample(512);
        let mut whole = DigestState::new();
        whole.update(&data);

        let mut split = DigestState::new();
        split.update(&data[..448]);
        split.update(&data[448..480]);
        split.update(&data[480..]);

        assert_eq!(whole.finish_double(), split.finish_double());
    }

    #[test]
    fn test_empty_midstate_is_iv() {
        let digest = DigestState::new();
        let midstate = digest.midstate();
        for (chunk, word) in midstate.chunks_exact(4).zip(IV.iter()) {
            assert_eq!(chunk, word.to_be_bytes());
        }
    }

    #[test]
    fn test_midstate_advances_at_block_boundary() {
        let mut digest = DigestState::new();
        digest.update(&sample(448));
        assert_ne!(digest.midstate(), DigestState::new().midstate());
    }

    #[test]
    fn test_clone_finishes_independently() {
        let data = sample(480);
        let mut retained = DigestState::new();
        retained.update(&data);

        let share_a = [0x11u8; 32];
        let share_b = [0x22u8; 32];

        let mut a = retained.clone();
        a.update(&share_a);
        let mut b = retained.clone();
        b.update(&share_b);

        let mut whole_a = data.clone();
        whole_a.extend_from_slice(&share_a);
        let mut whole_b = data.clone();
        whole_b.extend_from_slice(&share_b);

        assert_eq!(a.finish_double(), reference_double_sha256(&whole_a));
        assert_eq!(b.finish_double(), reference_double_sha256(&whole_b));
        // The retained state is still usable afterwards.
        let mut c = retained.clone();
        c.update(&share_a);
        assert_eq!(c.finish_double(), reference_double_sha256(&whole_a));
    }
}
