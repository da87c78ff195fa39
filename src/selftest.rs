//! Repeated end-to-end exercise of both roles in one process.

use num_bigint::BigUint;
use rand_core::CryptoRngCore;
use tracing::{info, info_span, warn};

use crate::combine::combine_moduli;
use crate::config::ProtocolConfig;
use crate::errors::{Error, Result};
use crate::key::{RsaPublicKey, ServerKey, ServerSubKey};
use crate::keygen::KeyShareGenerator;
use crate::sign::SigningSession;
use crate::traits::PrivateKeyParts;

/// Outcome of a [`SelfTest`] run.
#[derive(Debug, Default)]
pub struct SelfTestReport {
    /// Iterations attempted.
    pub iterations: usize,
    /// Failed iterations, by index, with the error that stopped them.
    pub failures: Vec<(usize, Error)>,
}

impl SelfTestReport {
    /// True when every iteration produced a verified signature.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs generate, combine, sign, complete and verify
/// [`ProtocolConfig::test_iterations`] times over the configured test message.
#[derive(Debug, Clone)]
pub struct SelfTest {
    config: ProtocolConfig,
}

impl SelfTest {
    /// Fails with [`Error::InvalidConfig`] unless the test message fits
    /// below a `B`-bit modulus.
    pub fn new(config: ProtocolConfig) -> Result<Self> {
        config.check_test_message()?;
        Ok(SelfTest { config })
    }

    /// Runs every iteration, calling `progress` with the iteration index and
    /// its outcome. A failed iteration does not stop the run.
    pub fn run<R, F>(&self, rng: &mut R, progress: F) -> SelfTestReport
    where
        R: CryptoRngCore + ?Sized,
        F: FnMut(usize, &Result<()>),
    {
        let report = collect(
            self.config.test_iterations(),
            |_| self.iteration(rng),
            progress,
        );

        info!(
            iterations = report.iterations,
            failures = report.failures.len(),
            "self-test finished"
        );
        report
    }

    /// One full protocol run with fresh keys.
    pub fn iteration<R: CryptoRngCore + ?Sized>(&self, rng: &mut R) -> Result<()> {
        self.sign_and_verify(rng, self.config.test_message())
    }

    fn sign_and_verify<R: CryptoRngCore + ?Sized>(&self, rng: &mut R, m: &BigUint) -> Result<()> {
        let generator = KeyShareGenerator::new(self.config.clone());

        let (client, for_server) = generator.generate_client(rng)?.into_shares();
        let n1 = client.n().clone();
        let (own, public): (ServerSubKey, RsaPublicKey) = generator
            .generate_server_with_retry(rng, |own| {
                let public = combine_moduli(&self.config, &n1, own.n())?;
                Ok((own.clone(), public))
            })?;
        let server = ServerKey::new(for_server, own);

        let mut session = SigningSession::new(self.config.clone());
        session.client_sign(&client, m)?;
        session.server_sign(&server)?;
        session.verify(&public)
    }
}

fn collect<S, F>(iterations: usize, mut step: S, mut progress: F) -> SelfTestReport
where
    S: FnMut(usize) -> Result<()>,
    F: FnMut(usize, &Result<()>),
{
    let mut report = SelfTestReport::default();

    for i in 0..iterations {
        let _span = info_span!("self_test", iteration = i).entered();
        let result = step(i);
        progress(i, &result);

        report.iterations += 1;
        if let Err(err) = result {
            warn!(error = %err, "iteration failed");
            report.failures.push((i, err));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

    #[test]
    fn test_self_test_passes() {
        let mut rng = ChaCha8Rng::from_seed([7; 32]);
        let config = ProtocolConfig::default()
            .with_modulus_bits(256)
            .unwrap()
            .with_test_iterations(4);

        let mut seen = Vec::new();
        let report = SelfTest::new(config).unwrap().run(&mut rng, |i, result| {
            seen.push((i, result.is_ok()));
        });

        assert_eq!(report.iterations, 4);
        assert!(report.passed(), "{:?}", report.failures);
        assert_eq!(seen, vec![(0, true), (1, true), (2, true), (3, true)]);
    }

    #[test]
    fn test_message_must_fit() {
        let config = ProtocolConfig::default().with_modulus_bits(128).unwrap();
        assert!(matches!(SelfTest::new(config.clone()), Err(Error::InvalidConfig(_))));

        let config = config.with_test_message(BigUint::from(42u32)).unwrap();
        assert!(SelfTest::new(config).is_ok());
    }

    #[test]
    fn test_failures_do_not_stop_the_run() {
        let mut seen = Vec::new();
        let report = collect(
            5,
            |i| match i {
                1 => Err(Error::FraudDetected),
                3 => Err(Error::invariant("combined modulus is one bit short")),
                _ => Ok(()),
            },
            |i, result| seen.push((i, result.is_ok())),
        );

        assert_eq!(report.iterations, 5);
        assert!(!report.passed());
        let failed: Vec<usize> = report.failures.iter().map(|(i, _)| *i).collect();
        assert_eq!(failed, vec![1, 3]);
        assert!(matches!(report.failures[0].1, Error::FraudDetected));
        assert_eq!(seen.len(), 5);
        assert!(seen[4].1);
    }

    #[test]
    fn test_sign_and_verify_other_message() {
        let mut rng = ChaCha8Rng::from_seed([8; 32]);
        let config = ProtocolConfig::default()
            .with_test_message(BigUint::from(42u32))
            .and_then(|c| c.with_modulus_bits(64))
            .unwrap();
        let test = SelfTest::new(config).unwrap();

        for m in [0u32, 1, 42, u32::MAX] {
            test.sign_and_verify(&mut rng, &BigUint::from(m)).unwrap();
        }
    }
}
