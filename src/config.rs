//! Protocol-wide constants and the configuration value handed to every component.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;

use crate::errors::{Error, Result};

/// Public exponent shared by both parties.
pub const RSA_PUBLIC_EXP: u32 = 65537;

/// Bit length of each party's sub-modulus. The combined modulus is twice as long.
pub const RSA_MODULUS_BITS: usize = 2048;

/// Default number of self-test iterations.
pub const TEST_COUNT: usize = 1000;

/// Message signed by the self-test, in decimal.
pub const TEST_MESSAGE: &str = "48654681406840615136541141350146514654630436044654674266181";

/// Attempts a caller makes at regenerating its own sub-key when the
/// generated modulus violates a bit-length or coprimality invariant.
pub const GENERATION_ATTEMPTS: usize = 64;

/// Smallest sub-modulus size accepted. Below this the prime source runs out of
/// primes with the top two bits set.
pub const MIN_MODULUS_BITS: usize = 16;

/// Immutable protocol parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    public_exponent: BigUint,
    modulus_bits: usize,
    test_iterations: usize,
    test_message: BigUint,
    generation_attempts: usize,
}

impl ProtocolConfig {
    /// Builds a configuration with the given exponent and sub-modulus size,
    /// keeping the default self-test parameters.
    pub fn new(public_exponent: BigUint, modulus_bits: usize) -> Result<Self> {
        let config = ProtocolConfig {
            public_exponent,
            modulus_bits,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy with a different sub-modulus size.
    pub fn with_modulus_bits(mut self, modulus_bits: usize) -> Result<Self> {
        self.modulus_bits = modulus_bits;
        self.validate()?;
        Ok(self)
    }

    /// Returns a copy with a different self-test iteration count.
    pub fn with_test_iterations(mut self, iterations: usize) -> Self {
        self.test_iterations = iterations;
        self
    }

    /// Returns a copy with a different bound on key regeneration attempts.
    /// A value of 1 disables regeneration entirely.
    pub fn with_generation_attempts(mut self, attempts: usize) -> Self {
        self.generation_attempts = attempts.max(1);
        self
    }

    /// Returns a copy with a different self-test message.
    pub fn with_test_message(mut self, message: BigUint) -> Result<Self> {
        self.test_message = message;
        self.check_test_message()?;
        Ok(self)
    }

    /// Checks the parameters against each other.
    pub fn validate(&self) -> Result<()> {
        let e = &self.public_exponent;
        if e <= &BigUint::one() || e.is_even() {
            return Err(Error::InvalidConfig(format!(
                "public exponent must be odd and greater than 1, got {}",
                e
            )));
        }
        if self.modulus_bits < MIN_MODULUS_BITS || self.modulus_bits % 2 != 0 {
            return Err(Error::InvalidConfig(format!(
                "modulus size must be even and at least {} bits, got {}",
                MIN_MODULUS_BITS, self.modulus_bits
            )));
        }
        Ok(())
    }

    /// Checks that the self-test message fits below every `B`-bit modulus.
    /// Only the self-test needs this, so [`validate`](Self::validate) leaves
    /// it out.
    pub fn check_test_message(&self) -> Result<()> {
        // every B-bit modulus is at least 2^(B-1)
        if self.test_message.bits() >= self.modulus_bits {
            return Err(Error::InvalidConfig(format!(
                "test message has {} bits and does not fit below a {}-bit modulus",
                self.test_message.bits(),
                self.modulus_bits
            )));
        }
        Ok(())
    }

    /// Public exponent `e`.
    pub fn public_exponent(&self) -> &BigUint {
        &self.public_exponent
    }

    /// Sub-modulus bit length `B`.
    pub fn modulus_bits(&self) -> usize {
        self.modulus_bits
    }

    /// Bit length of each prime factor, `B / 2`.
    pub fn prime_bits(&self) -> usize {
        self.modulus_bits / 2
    }

    /// Bit length of the combined modulus, `2B`.
    pub fn public_modulus_bits(&self) -> usize {
        self.modulus_bits * 2
    }

    /// Self-test iteration count.
    pub fn test_iterations(&self) -> usize {
        self.test_iterations
    }

    /// Message signed by the self-test.
    pub fn test_message(&self) -> &BigUint {
        &self.test_message
    }

    /// Bound on server sub-key regeneration, at least 1.
    pub fn generation_attempts(&self) -> usize {
        self.generation_attempts
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            public_exponent: BigUint::from(RSA_PUBLIC_EXP),
            modulus_bits: RSA_MODULUS_BITS,
            test_iterations: TEST_COUNT,
            test_message: BigUint::parse_bytes(TEST_MESSAGE.as_bytes(), 10)
                .unwrap_or_else(|| BigUint::from(42u32)),
            generation_attempts: GENERATION_ATTEMPTS,
        }
    }
}
