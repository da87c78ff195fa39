//! Per-role generation of RSA key material.
//!
//! Both roles derive a fresh `n = p * q` of exactly `B` bits and the private
//! exponent `d = e^-1 mod φ(n)`. The client then splits `d` additively into
//! `d1_client + d1_server ≡ d (mod φ)` and forgets `d`; the server keeps `d`
//! whole.
//!
//! Violated invariants are reported, never retried here. Callers that want
//! to regenerate on [`Error::InvariantViolation`] do so explicitly, see
//! [`KeyShareGenerator::generate_server_with_retry`].

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use rand_core::CryptoRngCore;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::algorithms::generate::{generate_balanced_primes, BalancedPrimes};
use crate::algorithms::rsa::{compute_private_exponent, split_exponent};
use crate::config::ProtocolConfig;
use crate::errors::{Error, Result};
use crate::key::{ClientKeyMaterial, ClientKeyShare, KeyMaterial, ServerShare, ServerSubKey};

/// Which side of the protocol a process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Holds `n1` and one additive share of `d1`.
    Client,
    /// Holds `n2`, its whole exponent `d2`, and the other share of `d1`.
    Server,
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Role::Client => f.write_str("client"),
            Role::Server => f.write_str("server"),
        }
    }
}

/// Checks that `num` is exactly `bits` long.
pub fn check_num_bits(num: &BigUint, bits: usize, what: &str) -> Result<()> {
    if num.bits() != bits {
        return Err(Error::invariant(format!(
            "{} is not a {}-bit number, it has {} bits",
            what,
            bits,
            num.bits()
        )));
    }
    Ok(())
}

/// Derives per-role key material under a fixed [`ProtocolConfig`].
#[derive(Debug, Clone)]
pub struct KeyShareGenerator {
    config: ProtocolConfig,
}

impl KeyShareGenerator {
    /// Generator bound to `config`.
    pub fn new(config: ProtocolConfig) -> Self {
        KeyShareGenerator { config }
    }

    /// Parameters every derived key satisfies.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Generates key material for `role`.
    pub fn generate<R: CryptoRngCore + ?Sized>(
        &self,
        rng: &mut R,
        role: Role,
    ) -> Result<KeyMaterial> {
        match role {
            Role::Client => self.generate_client(rng).map(KeyMaterial::Client),
            Role::Server => self.generate_server(rng).map(KeyMaterial::Server),
        }
    }

    /// Client key generation: `n1` with `d1` split into two shares.
    pub fn generate_client<R: CryptoRngCore + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<ClientKeyMaterial> {
        let primes = self.primes(rng)?;
        self.client_from_primes(rng, &primes.p, &primes.q)
    }

    /// Server key generation: `n2` with its whole exponent `d2`.
    pub fn generate_server<R: CryptoRngCore + ?Sized>(&self, rng: &mut R) -> Result<ServerSubKey> {
        let primes = self.primes(rng)?;
        self.server_from_primes(&primes.p, &primes.q)
    }

    /// Generates the server sub-key and hands it to `accept`, regenerating
    /// while either step reports a retryable error, at most
    /// [`ProtocolConfig::generation_attempts`] times.
    ///
    /// `accept` typically combines the new `n2` with the client's `n1`; a
    /// combined modulus one bit short is the usual reason to try again.
    pub fn generate_server_with_retry<R, T, F>(&self, rng: &mut R, mut accept: F) -> Result<T>
    where
        R: CryptoRngCore + ?Sized,
        F: FnMut(&ServerSubKey) -> Result<T>,
    {
        let attempts = self.config.generation_attempts();
        let mut attempt = 1;
        loop {
            match self.generate_server(rng).and_then(|key| accept(&key)) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(attempt, error = %err, "server key rejected, regenerating");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Derives key material for `role` from a given prime pair.
    pub fn from_primes<R: CryptoRngCore + ?Sized>(
        &self,
        rng: &mut R,
        role: Role,
        p: &BigUint,
        q: &BigUint,
    ) -> Result<KeyMaterial> {
        match role {
            Role::Client => self.client_from_primes(rng, p, q).map(KeyMaterial::Client),
            Role::Server => self.server_from_primes(p, q).map(KeyMaterial::Server),
        }
    }

    fn client_from_primes<R: CryptoRngCore + ?Sized>(
        &self,
        rng: &mut R,
        p: &BigUint,
        q: &BigUint,
    ) -> Result<ClientKeyMaterial> {
        let (n, phi, d) = self.derive(p, q)?;
        let (d_client, d_server) = split_exponent(rng, &d, &phi, self.config.modulus_bits());
        debug!(role = %Role::Client, bits = n.bits(), "split private exponent");

        Ok(ClientKeyMaterial {
            client: ClientKeyShare::new((*d_client).clone(), n.clone()),
            server: ServerShare::new((*d_server).clone(), n),
        })
    }

    fn server_from_primes(&self, p: &BigUint, q: &BigUint) -> Result<ServerSubKey> {
        let (n, _, d) = self.derive(p, q)?;
        debug!(role = %Role::Server, bits = n.bits(), "derived private exponent");

        Ok(ServerSubKey::new((*d).clone(), n))
    }

    fn primes<R: CryptoRngCore + ?Sized>(&self, rng: &mut R) -> Result<BalancedPrimes> {
        generate_balanced_primes(
            rng,
            self.config.modulus_bits(),
            self.config.public_exponent(),
        )
    }

    /// Checks every structural invariant of `(p, q)` and returns
    /// `(n, φ(n), d)`.
    fn derive(
        &self,
        p: &BigUint,
        q: &BigUint,
    ) -> Result<(BigUint, Zeroizing<BigUint>, Zeroizing<BigUint>)> {
        let e = self.config.public_exponent();

        check_num_bits(p, self.config.prime_bits(), "prime p")?;
        check_num_bits(q, self.config.prime_bits(), "prime q")?;
        if p == q {
            return Err(Error::invariant("primes p and q are equal"));
        }
        for (name, prime) in [("p", p), ("q", q)] {
            let factor = Zeroizing::new(prime - BigUint::one());
            if !factor.gcd(e).is_one() {
                return Err(Error::invariant(format!(
                    "{} - 1 is not coprime with the public exponent",
                    name
                )));
            }
        }

        let n = p * q;
        check_num_bits(&n, self.config.modulus_bits(), "modulus")?;

        let (phi, d) = compute_private_exponent(p, q, e)?;
        Ok((n, phi, d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PrivateKeyParts;
    use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

    fn generator(bits: usize) -> KeyShareGenerator {
        let config = ProtocolConfig::default()
            .with_test_message(BigUint::from(42u32))
            .unwrap()
            .with_modulus_bits(bits)
            .unwrap();
        KeyShareGenerator::new(config)
    }

    fn totient(p: &BigUint, q: &BigUint) -> BigUint {
        (p - 1u32) * (q - 1u32)
    }

    #[test]
    fn test_client_split() {
        let mut rng = ChaCha8Rng::from_seed([42; 32]);
        let generator = generator(256);
        let e = generator.config().public_exponent().clone();

        for _ in 0..5 {
            let primes = generate_balanced_primes(&mut rng, 256, &e).unwrap();
            let phi = totient(&primes.p, &primes.q);
            let d = crate::algorithms::rsa::inverse_mod(&e, &phi).unwrap();

            let material = generator
                .from_primes(&mut rng, Role::Client, &primes.p, &primes.q)
                .unwrap();
            let KeyMaterial::Client(material) = material else {
                panic!("expected client material");
            };

            assert_eq!(material.n(), &(&primes.p * &primes.q));
            assert_eq!(material.n().bits(), 256);
            let sum = material.client_share().d() + material.server_share().d();
            assert_eq!(sum % &phi, d);
            assert_eq!((&e * &d) % &phi, BigUint::one());
        }
    }

    #[test]
    fn test_server_whole_exponent() {
        let mut rng = ChaCha8Rng::from_seed([1; 32]);
        let generator = generator(128);
        let key = generator.generate_server(&mut rng).unwrap();
        assert_eq!(key.n().bits(), 128);

        let m = BigUint::from(42u32);
        let s = key.exponentiate(&m);
        assert_eq!(s.modpow(generator.config().public_exponent(), key.n()), m);
    }

    #[test]
    fn test_prime_one_bit_short() {
        let mut rng = ChaCha8Rng::from_seed([2; 32]);
        let generator = generator(256);
        let e = generator.config().public_exponent().clone();
        let primes = generate_balanced_primes(&mut rng, 256, &e).unwrap();
        let short = generate_balanced_primes(&mut rng, 254, &e).unwrap();

        let err = generator
            .from_primes(&mut rng, Role::Server, &primes.p, &short.p)
            .unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_modulus_one_bit_short() {
        let mut rng = ChaCha8Rng::from_seed([3; 32]);
        let generator = generator(16);
        // 131 * 137 = 17947 has 15 bits, 193 * 197 = 38021 has 16
        let err = generator
            .from_primes(&mut rng, Role::Server, &BigUint::from(131u32), &BigUint::from(137u32))
            .unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)), "{}", err);

        let key = generator
            .from_primes(&mut rng, Role::Server, &BigUint::from(193u32), &BigUint::from(197u32))
            .unwrap();
        assert_eq!(key.n(), &BigUint::from(38021u32));
    }

    #[test]
    fn test_exponent_not_coprime() {
        let mut rng = ChaCha8Rng::from_seed([4; 32]);
        let generator = KeyShareGenerator::new(
            ProtocolConfig::new(BigUint::from(3u32), 256)
                .and_then(|c| c.with_test_message(BigUint::from(2u32)))
                .and_then(|c| c.with_modulus_bits(16))
                .unwrap(),
        );
        let (p, q) = (BigUint::from(193u32), BigUint::from(197u32));

        // 3 divides 193 - 1
        let err = generator
            .from_primes(&mut rng, Role::Client, &p, &q)
            .unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));

        // 65537 divides neither 192 nor 196
        assert!(self::generator(16)
            .from_primes(&mut rng, Role::Client, &p, &q)
            .is_ok());
    }

    #[test]
    fn test_equal_primes() {
        let mut rng = ChaCha8Rng::from_seed([5; 32]);
        let generator = generator(16);
        let p = BigUint::from(197u32);
        assert!(generator
            .from_primes(&mut rng, Role::Server, &p, &p)
            .is_err());
    }

    #[test]
    fn test_retry_gives_up() {
        let mut rng = ChaCha8Rng::from_seed([6; 32]);
        let config = ProtocolConfig::default()
            .with_test_message(BigUint::from(42u32))
            .unwrap()
            .with_modulus_bits(64)
            .unwrap()
            .with_generation_attempts(3);
        let generator = KeyShareGenerator::new(config);

        let mut calls = 0;
        let err = generator
            .generate_server_with_retry(&mut rng, |_| -> Result<()> {
                calls += 1;
                Err(Error::invariant("combined modulus is one bit short"))
            })
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(calls, 3);

        let mut calls = 0;
        let err = generator
            .generate_server_with_retry(&mut rng, |_| -> Result<()> {
                calls += 1;
                Err(Error::FraudDetected)
            })
            .unwrap_err();
        assert!(matches!(err, Error::FraudDetected));
        assert_eq!(calls, 1);

        let n = generator
            .generate_server_with_retry(&mut rng, |key| Ok(key.n().clone()))
            .unwrap();
        assert_eq!(n.bits(), 64);
    }
}
