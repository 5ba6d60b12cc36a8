//! Streaming content-defined chunker.
//!
//! The chunker rolls a 64-byte window across the input and computes a
//! Rabin fingerprint of the window modulo the database polynomial,
//! using precomputed tables so each byte costs two xors. A boundary is
//! cut where the low fingerprint bits are all zero, once the minimum
//! size has been reached; a cut is forced at the maximum size. Equal
//! content therefore chunks identically wherever it appears, which is
//! what lets shifted or appended data deduplicate against earlier
//! ingests.

use std::io::{ErrorKind, Read};

use crate::error::{ChunkError, ChunkResult};
use crate::polynomial::Pol;

/// Width of the rolling window in bytes.
pub const WINDOW_SIZE: usize = 64;

/// Default minimum chunk size: 512 KiB.
pub const DEFAULT_MIN_SIZE: usize = 512 * 1024;

/// Default maximum chunk size: 8 MiB.
pub const DEFAULT_MAX_SIZE: usize = 8 * 1024 * 1024;

// Internal read buffer size.
const BUF_SIZE: usize = 64 * 1024;

/// Boundary parameters for a chunker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Irreducible polynomial driving the rolling fingerprint.
    pub polynomial: Pol,
    /// No boundary is cut before this many bytes.
    pub min_size: usize,
    /// A cut is forced at this many bytes.
    pub max_size: usize,
}

impl ChunkerConfig {
    /// Configuration with the default size bounds.
    pub fn new(polynomial: Pol) -> Self {
        Self::with_bounds(polynomial, DEFAULT_MIN_SIZE, DEFAULT_MAX_SIZE)
    }

    pub fn with_bounds(polynomial: Pol, min_size: usize, max_size: usize) -> Self {
        Self {
            polynomial,
            min_size,
            max_size,
        }
    }

    pub fn validate(&self) -> ChunkResult<()> {
        if self.polynomial.deg() < 8 {
            return Err(ChunkError::InvalidPolynomial {
                reason: format!("degree {} is below the table width", self.polynomial.deg()),
            });
        }
        if self.min_size < WINDOW_SIZE {
            return Err(self.bounds_error("minimum is below the window size"));
        }
        if self.max_size < self.min_size {
            return Err(self.bounds_error("maximum is below the minimum"));
        }
        Ok(())
    }

    fn bounds_error(&self, reason: &str) -> ChunkError {
        ChunkError::InvalidBounds {
            min: self.min_size,
            max: self.max_size,
            reason: reason.to_string(),
        }
    }

    // Mask selecting the low fingerprint bits that must all be zero at
    // a boundary. Derived from the midpoint of the size bounds so the
    // expected chunk size lands between them.
    fn split_mask(&self) -> u64 {
        let midpoint = (self.min_size + self.max_size) / 2;
        let bits = usize::BITS - 1 - midpoint.leading_zeros();
        (1u64 << bits) - 1
    }
}

/// A single content-defined chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Offset of the chunk's first byte in the source stream.
    pub offset: u64,
    /// The chunk payload.
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Precomputed per-byte tables for the rolling fingerprint.
//
// `out[b]` is the residual contribution of byte `b` after it has been
// shifted through the whole window, removed by xor when the byte leaves.
// `modulo[b]` reduces the fingerprint's top byte once it crosses the
// polynomial degree, keeping the fingerprint below 2^deg.
struct Tables {
    out: [u64; 256],
    modulo: [u64; 256],
}

impl Tables {
    fn build(polynomial: Pol) -> Tables {
        let deg = polynomial.deg() as u32;
        let mut out = [0u64; 256];
        let mut modulo = [0u64; 256];
        for byte in 0..256usize {
            let mut hash = append_byte(Pol::from_raw(0), byte as u8, polynomial);
            for _ in 0..WINDOW_SIZE - 1 {
                hash = append_byte(hash, 0, polynomial);
            }
            out[byte] = hash.as_u64();

            let shifted = (byte as u64) << deg;
            modulo[byte] = Pol::from_raw(shifted).modulo(polynomial).as_u64() | shifted;
        }
        Tables { out, modulo }
    }
}

fn append_byte(hash: Pol, byte: u8, polynomial: Pol) -> Pol {
    Pol::from_raw((hash.as_u64() << 8) | byte as u64).modulo(polynomial)
}

/// Streaming chunker over any reader.
pub struct Chunker<R> {
    reader: R,
    tables: Tables,
    split_mask: u64,
    min_size: usize,
    max_size: usize,
    poly_shift: u32,
    window: [u8; WINDOW_SIZE],
    window_pos: usize,
    digest: u64,
    buf: Vec<u8>,
    buf_len: usize,
    buf_pos: usize,
    offset: u64,
    eof: bool,
}

impl<R: Read> Chunker<R> {
    /// Wrap `reader` with the given boundary parameters.
    pub fn new(reader: R, config: ChunkerConfig) -> ChunkResult<Self> {
        config.validate()?;
        Ok(Self {
            reader,
            tables: Tables::build(config.polynomial),
            split_mask: config.split_mask(),
            min_size: config.min_size,
            max_size: config.max_size,
            poly_shift: (config.polynomial.deg() - 8) as u32,
            window: [0; WINDOW_SIZE],
            window_pos: 0,
            digest: 0,
            buf: vec![0; BUF_SIZE],
            buf_len: 0,
            buf_pos: 0,
            offset: 0,
            eof: false,
        })
    }

    /// Produce the next chunk, or `None` once the input is exhausted.
    pub fn next_chunk(&mut self) -> ChunkResult<Option<Chunk>> {
        let start = self.offset;
        let mut data = Vec::new();
        self.digest = 0;
        self.window = [0; WINDOW_SIZE];
        self.window_pos = 0;
        // Seed the window so a run of zero bytes still rolls.
        self.slide(1);

        loop {
            let byte = match self.next_byte()? {
                Some(byte) => byte,
                None => {
                    if data.is_empty() {
                        return Ok(None);
                    }
                    break;
                }
            };
            data.push(byte);
            self.slide(byte);
            if data.len() >= self.max_size {
                break;
            }
            if data.len() >= self.min_size && self.digest & self.split_mask == 0 {
                break;
            }
        }

        self.offset += data.len() as u64;
        Ok(Some(Chunk {
            offset: start,
            data,
        }))
    }

    fn next_byte(&mut self) -> ChunkResult<Option<u8>> {
        if self.buf_pos >= self.buf_len {
            if self.eof {
                return Ok(None);
            }
            self.buf_len = loop {
                match self.reader.read(&mut self.buf) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            };
            self.buf_pos = 0;
            if self.buf_len == 0 {
                self.eof = true;
                return Ok(None);
            }
        }
        let byte = self.buf[self.buf_pos];
        self.buf_pos += 1;
        Ok(Some(byte))
    }

    // Roll one byte through the window: remove the leaving byte's
    // residual contribution, then append the new byte with a single
    // table-driven reduction.
    fn slide(&mut self, byte: u8) {
        let leaving = self.window[self.window_pos];
        self.window[self.window_pos] = byte;
        self.window_pos = (self.window_pos + 1) % WINDOW_SIZE;

        self.digest ^= self.tables.out[leaving as usize];
        let index = (self.digest >> self.poly_shift) as usize;
        self.digest <<= 8;
        self.digest |= byte as u64;
        self.digest ^= self.tables.modulo[index];
    }
}

impl<R: Read> Iterator for Chunker<R> {
    type Item = ChunkResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::*;

    const TEST_POL: Pol = Pol::from_raw(0x3DA3358B4DC173);

    fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
        let mut data = vec![0u8; len];
        StdRng::seed_from_u64(seed).fill_bytes(&mut data);
        data
    }

    fn chunk_all(data: &[u8], config: ChunkerConfig) -> Vec<Chunk> {
        Chunker::new(data, config)
            .unwrap()
            .collect::<ChunkResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let mut chunker = Chunker::new(&[][..], ChunkerConfig::new(TEST_POL)).unwrap();
        assert!(chunker.next_chunk().unwrap().is_none());
        assert!(chunker.next_chunk().unwrap().is_none());
    }

    #[test]
    fn input_below_minimum_is_a_single_chunk() {
        let data = pseudo_random(100, 1);
        let chunks = chunk_all(&data, ChunkerConfig::with_bounds(TEST_POL, 256, 1024));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(chunks[0].data, data);
    }

    #[test]
    fn chunks_respect_bounds_and_reassemble() {
        let data = pseudo_random(50_000, 2);
        let config = ChunkerConfig::with_bounds(TEST_POL, 64, 512);
        let chunks = chunk_all(&data, config);

        assert!(chunks.len() > 1);
        let mut reassembled = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.offset, reassembled.len() as u64);
            assert!(chunk.len() <= 512);
            if i + 1 < chunks.len() {
                assert!(chunk.len() >= 64);
            }
            reassembled.extend_from_slice(&chunk.data);
        }
        assert_eq!(reassembled, data);
    }

    #[test]
    fn chunks_span_read_buffer_refills() {
        // Minimum above the internal read buffer, so every chunk but
        // the last crosses at least one refill.
        let data = pseudo_random(3 * BUF_SIZE + 123, 5);
        let config = ChunkerConfig::with_bounds(TEST_POL, BUF_SIZE + 1, 3 * BUF_SIZE / 2);
        let chunks = chunk_all(&data, config);

        assert!(chunks.len() > 1);
        let mut reassembled = Vec::new();
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.len() > BUF_SIZE);
            reassembled.extend_from_slice(&chunk.data);
        }
        reassembled.extend_from_slice(&chunks[chunks.len() - 1].data);
        assert_eq!(reassembled, data);
    }

    #[test]
    fn boundaries_are_reproducible() {
        let data = pseudo_random(30_000, 3);
        let config = ChunkerConfig::with_bounds(TEST_POL, 64, 1024);
        let first = chunk_all(&data, config);
        let second = chunk_all(&data, config);
        assert_eq!(first, second);
    }

    #[test]
    fn equal_bounds_force_fixed_size_chunks() {
        let data = pseudo_random(1000, 4);
        let chunks = chunk_all(&data, ChunkerConfig::with_bounds(TEST_POL, 256, 256));
        let lengths: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        assert_eq!(lengths, vec![256, 256, 256, 232]);
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        assert!(matches!(
            ChunkerConfig::with_bounds(TEST_POL, 16, 1024).validate(),
            Err(ChunkError::InvalidBounds { .. })
        ));
        assert!(matches!(
            ChunkerConfig::with_bounds(TEST_POL, 1024, 512).validate(),
            Err(ChunkError::InvalidBounds { .. })
        ));
        assert!(matches!(
            ChunkerConfig::with_bounds(Pol::from_raw(0x13), 64, 512).validate(),
            Err(ChunkError::InvalidPolynomial { .. })
        ));
    }

    #[test]
    fn zero_runs_cut_at_the_minimum() {
        let data = vec![0u8; 1000];
        let chunks = chunk_all(&data, ChunkerConfig::with_bounds(TEST_POL, 256, 4096));
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.len(), 256);
        }
        let total: usize = chunks.iter().map(Chunk::len).sum();
        assert_eq!(total, 1000);
    }

    proptest! {
        #[test]
        fn reassembly_matches_input(data in proptest::collection::vec(any::<u8>(), 0..8192)) {
            let config = ChunkerConfig::with_bounds(TEST_POL, 64, 1024);
            let chunks = chunk_all(&data, config);
            let reassembled: Vec<u8> =
                chunks.iter().flat_map(|chunk| chunk.data.clone()).collect();
            prop_assert_eq!(reassembled, data);
        }
    }
}
