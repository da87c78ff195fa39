//! Combination of the two sub-moduli into the public modulus.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use tracing::debug;

use crate::config::ProtocolConfig;
use crate::errors::{Error, Result};
use crate::key::RsaPublicKey;
use crate::keygen::check_num_bits;

/// Forms the public key `(e, N = n1 * n2)` from the client modulus `n1` and
/// the server modulus `n2`.
///
/// Both sub-moduli must have exactly `B` bits, be coprime, and multiply to a
/// modulus of exactly `2B` bits. Any violation is an
/// [`Error::InvariantViolation`]; this function never retries.
pub fn combine_moduli(config: &ProtocolConfig, n1: &BigUint, n2: &BigUint) -> Result<RsaPublicKey> {
    let bits = config.modulus_bits();
    check_num_bits(n1, bits, "client modulus")?;
    check_num_bits(n2, bits, "server modulus")?;

    if !n1.gcd(n2).is_one() {
        return Err(Error::invariant("client and server moduli are not coprime"));
    }

    let n = n1 * n2;
    check_num_bits(&n, config.public_modulus_bits(), "combined modulus")?;
    debug!(bits = n.bits(), "combined moduli");

    Ok(RsaPublicKey::new_unchecked(
        config.public_exponent().clone(),
        n,
    ))
}
