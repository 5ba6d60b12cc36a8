//! Streaming hash engines.

use std::io;

use sha2::{Digest as _, Sha256, Sha512};

use arbor_types::{Algorithm, Digest};

/// A streaming digest engine for a runtime-selected algorithm.
///
/// Wraps the sha2 hashers behind one type so callers can pick the
/// algorithm at runtime without generics. Implements [`io::Write`] so
/// bytes can be teed into it with `io::copy`.
pub enum HashEngine {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl HashEngine {
    pub fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Sha256 => HashEngine::Sha256(Sha256::new()),
            Algorithm::Sha512 => HashEngine::Sha512(Sha512::new()),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            HashEngine::Sha256(_) => Algorithm::Sha256,
            HashEngine::Sha512(_) => Algorithm::Sha512,
        }
    }

    /// Feed bytes into the engine.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            HashEngine::Sha256(hasher) => hasher.update(data),
            HashEngine::Sha512(hasher) => hasher.update(data),
        }
    }

    /// Consume the engine and produce the digest.
    pub fn finalize(self) -> Digest {
        let (algorithm, bytes) = match self {
            HashEngine::Sha256(hasher) => (Algorithm::Sha256, hasher.finalize().to_vec()),
            HashEngine::Sha512(hasher) => (Algorithm::Sha512, hasher.finalize().to_vec()),
        };
        Digest::new(algorithm, bytes).expect("digest width matches its algorithm")
    }
}

impl io::Write for HashEngine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One-shot hash of a byte slice.
pub fn hash(algorithm: Algorithm, data: &[u8]) -> Digest {
    let mut engine = HashEngine::new(algorithm);
    engine.update(data);
    engine.finalize()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SHA256_EMPTY: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const SHA256_HELLO_WORLD: &str =
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn matches_known_sha256_vectors() {
        assert_eq!(hash(Algorithm::Sha256, b"").to_hex(), SHA256_EMPTY);
        assert_eq!(
            hash(Algorithm::Sha256, b"hello world").to_hex(),
            SHA256_HELLO_WORLD
        );
    }

    #[test]
    fn streaming_equals_one_shot() {
        let mut engine = HashEngine::new(Algorithm::Sha256);
        engine.update(b"hello ");
        engine.update(b"world");
        assert_eq!(engine.finalize(), hash(Algorithm::Sha256, b"hello world"));
    }

    #[test]
    fn write_trait_feeds_the_engine() {
        let mut engine = HashEngine::new(Algorithm::Sha512);
        engine.write_all(b"hello world").unwrap();
        engine.flush().unwrap();
        assert_eq!(engine.finalize(), hash(Algorithm::Sha512, b"hello world"));
    }

    #[test]
    fn algorithms_produce_distinct_digests() {
        let sha256 = hash(Algorithm::Sha256, b"same content");
        let sha512 = hash(Algorithm::Sha512, b"same content");
        assert_ne!(sha256.as_bytes(), sha512.as_bytes());
        assert_eq!(sha256.algorithm(), Algorithm::Sha256);
        assert_eq!(sha512.algorithm(), Algorithm::Sha512);
    }

    #[test]
    fn engine_reports_its_algorithm() {
        assert_eq!(
            HashEngine::new(Algorithm::Sha512).algorithm(),
            Algorithm::Sha512
        );
    }
}
