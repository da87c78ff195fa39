//! Messages and the signature values exchanged while signing.

use core::mem;

use alloc::vec::Vec;
use digest::Digest;
use num_bigint::BigUint;

use crate::encoding::Record;
use crate::errors::Result;

/// The integer `m` to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord(BigUint);

impl MessageRecord {
    /// Wraps `m` as given.
    pub fn new(m: BigUint) -> Self {
        MessageRecord(m)
    }

    /// Hashes `data` with `D` and reads the digest as a big-endian integer.
    ///
    /// The result is below `2^(8 * output size)`, so it fits under any
    /// sub-modulus with more bits than the digest.
    pub fn from_digest<D: Digest>(data: &[u8]) -> Self {
        let digest = D::digest(data);
        MessageRecord(BigUint::from_bytes_be(&digest))
    }

    /// The message integer.
    pub fn m(&self) -> &BigUint {
        &self.0
    }

    /// Unwraps the message integer.
    pub fn into_inner(self) -> BigUint {
        self.0
    }
}

impl Record for MessageRecord {
    const NAME: &'static str = "message.txt";
    const LINES: usize = 1;

    fn to_values(&self) -> Vec<&BigUint> {
        vec![&self.0]
    }

    fn from_values(values: &mut [BigUint]) -> Result<Self> {
        Ok(MessageRecord(mem::take(&mut values[0])))
    }
}

/// The client's signature share `(m, y)` with `y = m^d1_client mod n1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialSignature {
    m: BigUint,
    y: BigUint,
}

impl PartialSignature {
    /// Pairs the message with the client's share.
    pub fn new(m: BigUint, y: BigUint) -> Self {
        PartialSignature { m, y }
    }

    /// Message `m`.
    pub fn m(&self) -> &BigUint {
        &self.m
    }

    /// Client share `y`.
    pub fn y(&self) -> &BigUint {
        &self.y
    }
}

impl Record for PartialSignature {
    const NAME: &'static str = "client.sig";
    const LINES: usize = 2;

    fn to_values(&self) -> Vec<&BigUint> {
        vec![&self.m, &self.y]
    }

    fn from_values(values: &mut [BigUint]) -> Result<Self> {
        Ok(PartialSignature {
            m: mem::take(&mut values[0]),
            y: mem::take(&mut values[1]),
        })
    }
}

/// The combined signature `(m, s)` valid under `N = n1 * n2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    m: BigUint,
    s: BigUint,
}

impl Signature {
    /// Pairs the message with its combined signature.
    pub fn new(m: BigUint, s: BigUint) -> Self {
        Signature { m, s }
    }

    /// Message `m`.
    pub fn m(&self) -> &BigUint {
        &self.m
    }

    /// Combined signature `s`.
    pub fn s(&self) -> &BigUint {
        &self.s
    }
}

impl Record for Signature {
    const NAME: &'static str = "final.sig";
    const LINES: usize = 2;

    fn to_values(&self) -> Vec<&BigUint> {
        vec![&self.m, &self.s]
    }

    fn from_values(values: &mut [BigUint]) -> Result<Self> {
        Ok(Signature {
            m: mem::take(&mut values[0]),
            s: mem::take(&mut values[1]),
        })
    }
}
