//! Polynomials over GF(2).
//!
//! A polynomial is represented by a `u64` whose bit `i` is the
//! coefficient of `x^i`. Addition is xor; multiplication and division
//! are carry-less. The chunker needs one irreducible polynomial of
//! degree [`CHUNKING_DEGREE`] per database, generated at creation time
//! and persisted, because chunk boundaries depend on it.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ChunkError, ChunkResult};

/// Degree of the polynomials generated for chunking.
pub const CHUNKING_DEGREE: u32 = 53;

/// A polynomial over GF(2).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pol(u64);

impl Pol {
    pub const fn from_raw(value: u64) -> Self {
        Pol(value)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Degree: index of the highest set coefficient, or -1 for the zero
    /// polynomial.
    pub fn deg(&self) -> i32 {
        if self.0 == 0 {
            -1
        } else {
            63 - self.0.leading_zeros() as i32
        }
    }

    /// Addition over GF(2) is xor.
    pub fn add(self, other: Pol) -> Pol {
        Pol(self.0 ^ other.0)
    }

    /// Remainder of dividing `self` by `m`.
    pub fn modulo(self, m: Pol) -> Pol {
        assert!(!m.is_zero(), "polynomial division by zero");
        let mut rem = self;
        while rem.deg() >= m.deg() {
            let shift = (rem.deg() - m.deg()) as u32;
            rem = Pol(rem.0 ^ (m.0 << shift));
        }
        rem
    }

    /// Multiply by `other` modulo `m`, keeping every intermediate value
    /// reduced below `m`'s degree so the computation stays in 64 bits.
    pub fn mulmod(self, other: Pol, m: Pol) -> Pol {
        let mut result = Pol(0);
        let mut shifted = self.modulo(m);
        let mut remaining = other.0;
        while remaining != 0 {
            if remaining & 1 == 1 {
                result = result.add(shifted);
            }
            remaining >>= 1;
            shifted = shifted.times_x(m);
        }
        result
    }

    // Requires self already reduced below m's degree.
    fn times_x(self, m: Pol) -> Pol {
        let shifted = Pol(self.0 << 1);
        if shifted.deg() == m.deg() {
            shifted.add(m)
        } else {
            shifted
        }
    }

    /// Greatest common divisor by Euclid's algorithm.
    pub fn gcd(self, other: Pol) -> Pol {
        let (mut a, mut b) = (self, other);
        while !b.is_zero() {
            let rem = a.modulo(b);
            a = b;
            b = rem;
        }
        a
    }

    /// Ben-Or irreducibility test.
    ///
    /// A reducible polynomial of degree `d` has an irreducible factor of
    /// degree at most `d/2`, and every irreducible polynomial of degree
    /// `i` divides `x^(2^i) - x`; a gcd check against those products
    /// covers all candidate factors.
    pub fn irreducible(&self) -> bool {
        if self.deg() < 1 {
            return false;
        }
        for i in 1..=(self.deg() / 2) {
            let qp = x_to_pow2(i as u32, *self).add(Pol(2));
            if self.gcd(qp) != Pol(1) {
                return false;
            }
        }
        true
    }

    /// Generate a random irreducible polynomial of degree
    /// [`CHUNKING_DEGREE`].
    pub fn generate<R: Rng>(rng: &mut R) -> Pol {
        loop {
            // Top and bottom coefficients set, random in between. About
            // one candidate in fifty-three is irreducible.
            let raw = (rng.gen::<u64>() & ((1u64 << CHUNKING_DEGREE) - 1))
                | (1u64 << CHUNKING_DEGREE)
                | 1;
            let candidate = Pol(raw);
            if candidate.irreducible() {
                return candidate;
            }
        }
    }

    /// Parse the lowercase hex form used in configuration files.
    pub fn from_hex(s: &str) -> ChunkResult<Pol> {
        let value = u64::from_str_radix(s, 16).map_err(|_| ChunkError::InvalidPolynomial {
            reason: format!("not a hex-encoded polynomial: {s:?}"),
        })?;
        Ok(Pol(value))
    }

    /// Lowercase hex rendering, the configuration file form.
    pub fn to_hex(&self) -> String {
        format!("{:x}", self.0)
    }
}

// x^(2^p) mod m, by squaring x p times.
fn x_to_pow2(p: u32, m: Pol) -> Pol {
    let mut result = Pol(2);
    for _ in 0..p {
        result = result.mulmod(result, m);
    }
    result
}

impl fmt::Debug for Pol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pol({:#x})", self.0)
    }
}

impl fmt::Display for Pol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Pol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Pol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Pol::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
