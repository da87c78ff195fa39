//! Two-party signing: the client's partial signature, the server's
//! completion and CRT combination, and verification.
//!
//! Every step is available as a free function for callers that carry the
//! intermediate values themselves (the parties exchange them through a
//! [`Channel`](crate::Channel)), and bundled into [`SigningSession`] which
//! tracks the protocol state explicitly.

use num_bigint::BigUint;
use tracing::{debug, error, info};

use crate::algorithms::rsa::{
    check_client_share, complete_client_share, crt_combine, rsa_verify_raw,
};
use crate::config::ProtocolConfig;
use crate::errors::{Error, Result};
use crate::key::{ClientKeyShare, RsaPublicKey, ServerKey};
use crate::keygen::check_num_bits;
use crate::signature::{PartialSignature, Signature};
use crate::traits::{PrivateKeyParts, PublicKeyParts};

/// Stateless check of `s^e mod n == m`.
pub fn verify(m: &BigUint, s: &BigUint, e: &BigUint, n: &BigUint) -> bool {
    rsa_verify_raw(m, s, e, n)
}

/// Client step: `y = m^d1_client mod n1`.
pub fn client_sign(
    config: &ProtocolConfig,
    key: &ClientKeyShare,
    m: &BigUint,
) -> Result<PartialSignature> {
    let n1 = key.n();
    check_num_bits(n1, config.modulus_bits(), "client modulus")?;
    if m >= n1 {
        return Err(Error::invariant("message is not below the client modulus"));
    }

    let y = key.exponentiate(m);
    debug!(bits = n1.bits(), "computed client partial signature");
    Ok(PartialSignature::new(m.clone(), y))
}

/// Server step: completes the client's share under `n1`, checks it against
/// `m`, signs under `n2` with the server's own exponent and combines both
/// into a signature under `N = n1 * n2`.
///
/// `y` is taken modulo `n1`. A completed share that does not map back to `m`
/// under `e` is reported as [`Error::FraudDetected`].
pub fn server_sign(
    config: &ProtocolConfig,
    key: &ServerKey,
    partial: &PartialSignature,
) -> Result<Signature> {
    let share = key.client_share();
    let own = key.own();
    let (n1, n2) = (share.n(), own.n());
    let m = partial.m();

    check_num_bits(n1, config.modulus_bits(), "client modulus")?;
    check_num_bits(n2, config.modulus_bits(), "server modulus")?;
    if m >= n1 || m >= n2 {
        return Err(Error::invariant("message is not below both sub-moduli"));
    }

    let s1 = complete_client_share(m, partial.y(), share.d(), n1);
    if let Err(err) = check_client_share(m, &s1, config.public_exponent(), n1) {
        error!("client partial signature failed the fraud check");
        return Err(err);
    }

    let s2 = own.exponentiate(m);
    let s = crt_combine(&s1, n1, &s2, n2)?;
    debug!(bits = (n1 * n2).bits(), "combined signature shares");

    Ok(Signature::new(m.clone(), s))
}

/// Verifies `signature` against a stored public key, also checking that the
/// key matches the configured exponent and combined size.
pub fn verify_signature(
    config: &ProtocolConfig,
    public: &RsaPublicKey,
    signature: &Signature,
) -> Result<()> {
    if public.e() != config.public_exponent() {
        return Err(Error::invariant("public key exponent differs from the configured one"));
    }
    check_num_bits(public.n(), config.public_modulus_bits(), "combined modulus")?;
    public.verify(signature)
}

/// Where a [`SigningSession`] stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing signed yet.
    AwaitingMessage,
    /// The client's share `y` is available.
    ClientPartialSigned,
    /// The combined signature under `N` is available.
    ServerCombined,
    /// The combined signature verified under the public key.
    Verified,
    /// A step failed. Terminal.
    Rejected,
}

/// One signing run, from message to verified signature.
///
/// Transitions out of order fail with [`Error::InvariantViolation`]. Any
/// failed transition leaves the session in [`SessionState::Rejected`], which
/// is terminal.
#[derive(Debug, Clone)]
pub struct SigningSession {
    config: ProtocolConfig,
    state: SessionState,
    partial: Option<PartialSignature>,
    signature: Option<Signature>,
}

impl SigningSession {
    /// Starts a session awaiting the client's step.
    pub fn new(config: ProtocolConfig) -> Self {
        SigningSession {
            config,
            state: SessionState::AwaitingMessage,
            partial: None,
            signature: None,
        }
    }

    /// Resumes a session at the server, from a received client share.
    pub fn from_partial(config: ProtocolConfig, partial: PartialSignature) -> Self {
        SigningSession {
            config,
            state: SessionState::ClientPartialSigned,
            partial: Some(partial),
            signature: None,
        }
    }

    /// Resumes a session at a verifier, from a received final signature.
    pub fn from_signature(config: ProtocolConfig, signature: Signature) -> Self {
        SigningSession {
            config,
            state: SessionState::ServerCombined,
            partial: None,
            signature: Some(signature),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Client share, once produced or received.
    pub fn partial(&self) -> Option<&PartialSignature> {
        self.partial.as_ref()
    }

    /// Combined signature, once produced or received.
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// `AwaitingMessage → ClientPartialSigned`
    pub fn client_sign(&mut self, key: &ClientKeyShare, m: &BigUint) -> Result<&PartialSignature> {
        self.expect(SessionState::AwaitingMessage)?;
        let partial = self.track(|config| client_sign(config, key, m))?;
        self.state = SessionState::ClientPartialSigned;
        Ok(self.partial.insert(partial))
    }

    /// `ClientPartialSigned → ServerCombined`
    pub fn server_sign(&mut self, key: &ServerKey) -> Result<&Signature> {
        self.expect(SessionState::ClientPartialSigned)?;
        let partial = self
            .partial
            .take()
            .ok_or_else(|| Error::invariant("no client share in session"))?;
        let signature = self.track(|config| server_sign(config, key, &partial))?;
        self.partial = Some(partial);
        self.state = SessionState::ServerCombined;
        Ok(self.signature.insert(signature))
    }

    /// `ServerCombined → Verified`
    pub fn verify(&mut self, public: &RsaPublicKey) -> Result<()> {
        self.expect(SessionState::ServerCombined)?;
        let signature = self
            .signature
            .take()
            .ok_or_else(|| Error::invariant("no signature in session"))?;
        let result = self.track(|config| verify_signature(config, public, &signature));
        self.signature = Some(signature);
        result?;

        self.state = SessionState::Verified;
        info!("signature verified");
        Ok(())
    }

    fn expect(&mut self, state: SessionState) -> Result<()> {
        if self.state == state {
            return Ok(());
        }
        let err = Error::invariant(format!(
            "signing step expects state {:?}, session is {:?}",
            state, self.state
        ));
        self.state = SessionState::Rejected;
        Err(err)
    }

    fn track<T>(&mut self, step: impl FnOnce(&ProtocolConfig) -> Result<T>) -> Result<T> {
        let result = step(&self.config);
        if result.is_err() {
            self.state = SessionState::Rejected;
        }
        result
    }
}
