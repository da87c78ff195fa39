//! Traits related to the key components

use num_bigint::BigUint;

/// Components of the combined RSA public key.
pub trait PublicKeyParts {
    /// Returns the modulus of the key.
    fn n(&self) -> &BigUint;

    /// Returns the public exponent of the key.
    fn e(&self) -> &BigUint;

    /// Returns the modulus size in bytes. Raw signatures for this public key
    /// have the same size.
    fn size(&self) -> usize {
        (self.n().bits() + 7) / 8
    }
}

/// A private exponent, or an additive share of one, bound to the sub-modulus
/// it works under.
pub trait PrivateKeyParts {
    /// Returns the sub-modulus.
    fn n(&self) -> &BigUint;

    /// Returns the private exponent or exponent share.
    fn d(&self) -> &BigUint;

    /// Raises `m` to the held exponent modulo the sub-modulus.
    fn exponentiate(&self, m: &BigUint) -> BigUint {
        crate::algorithms::rsa::rsa_sign_raw(m, self.d(), self.n())
    }
}
