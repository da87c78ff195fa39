//! Generate the balanced prime pair behind one party's sub-modulus

use num_bigint::{BigUint, RandPrime};
use num_integer::Integer;
use num_traits::One;
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{Error, Result};

/// Two distinct primes whose product has exactly the requested bit size.
pub struct BalancedPrimes {
    pub p: BigUint,
    pub q: BigUint,
}

impl Zeroize for BalancedPrimes {
    fn zeroize(&mut self) {
        self.p.zeroize();
        self.q.zeroize();
    }
}

impl Drop for BalancedPrimes {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Generates two primes of `bit_size / 2` bits each, both coprime to `exp`
/// after subtracting one, so that `exp` is invertible modulo `(p-1)(q-1)`.
///
/// `RandPrime` sets the top two bits of every prime, so the product of two
/// `bit_size / 2` primes is never one bit short. Candidate pairs that share a
/// factor with `exp` or collide are discarded and redrawn.
pub(crate) fn generate_balanced_primes<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    bit_size: usize,
    exp: &BigUint,
) -> Result<BalancedPrimes> {
    if bit_size < 16 || bit_size % 2 != 0 {
        return Err(Error::invariant(format!(
            "cannot split a {}-bit modulus into two balanced primes",
            bit_size
        )));
    }

    let prime_bits = bit_size / 2;

    loop {
        let p = Zeroizing::new(rng.gen_prime(prime_bits));
        if !coprime_to_totient_factor(&p, exp) {
            continue;
        }

        let q = Zeroizing::new(rng.gen_prime(prime_bits));
        if *p == *q || !coprime_to_totient_factor(&q, exp) {
            continue;
        }

        return Ok(BalancedPrimes {
            p: (*p).clone(),
            q: (*q).clone(),
        });
    }
}

fn coprime_to_totient_factor(prime: &BigUint, exp: &BigUint) -> bool {
    let phi = Zeroizing::new(prime - BigUint::one());
    phi.gcd(exp).is_one()
}
