//! The two roles as concrete implementations of one operation set.

use rand_core::CryptoRngCore;
use tracing::info;

use crate::combine::combine_moduli;
use crate::config::ProtocolConfig;
use crate::errors::Result;
use crate::key::{ClientKeyShare, RsaPublicKey, ServerKey, ServerShare};
use crate::keygen::{check_num_bits, KeyShareGenerator, Role};
use crate::sign::{client_sign, server_sign, verify_signature};
use crate::signature::{MessageRecord, PartialSignature, Signature};
use crate::traits::{Channel, PrivateKeyParts};

/// Operations every role offers. All inputs and outputs travel through a
/// [`Channel`].
pub trait Party {
    /// Which side this party plays.
    fn role(&self) -> Role;

    /// Parameters shared with the counterpart.
    fn config(&self) -> &ProtocolConfig;

    /// Whether this role's key records are already in `channel`.
    fn keys_exist<C: Channel>(&self, channel: &C) -> bool;

    /// Generates this role's key material and publishes it.
    fn generate<C, R>(&self, channel: &mut C, rng: &mut R) -> Result<()>
    where
        C: Channel,
        R: CryptoRngCore + ?Sized;

    /// Runs this role's signing step.
    fn sign<C: Channel>(&self, channel: &mut C) -> Result<()>;

    /// Checks the final signature against the public key.
    fn verify<C: Channel>(&self, channel: &mut C) -> Result<()> {
        let public: RsaPublicKey = channel.receive()?;
        let signature: Signature = channel.receive()?;
        verify_signature(self.config(), &public, &signature)?;
        info!(role = %self.role(), "final signature verified");
        Ok(())
    }
}

/// Holds `n1` and `d1_client`; splits `d1` at generation.
#[derive(Debug, Clone)]
pub struct Client {
    config: ProtocolConfig,
}

impl Client {
    /// Client party under `config`.
    pub fn new(config: ProtocolConfig) -> Self {
        Client { config }
    }
}

impl Party for Client {
    fn role(&self) -> Role {
        Role::Client
    }

    fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    fn keys_exist<C: Channel>(&self, channel: &C) -> bool {
        channel.contains::<ClientKeyShare>() || channel.contains::<ServerShare>()
    }

    fn generate<C, R>(&self, channel: &mut C, rng: &mut R) -> Result<()>
    where
        C: Channel,
        R: CryptoRngCore + ?Sized,
    {
        let material = KeyShareGenerator::new(self.config.clone()).generate_client(rng)?;
        let (client, server) = material.into_shares();

        channel.send(&client)?;
        channel.send(&server)?;
        info!(bits = client.n().bits(), "client key shares generated");
        Ok(())
    }

    fn sign<C: Channel>(&self, channel: &mut C) -> Result<()> {
        let message: MessageRecord = channel.receive()?;
        let key: ClientKeyShare = channel.receive()?;

        let partial = client_sign(&self.config, &key, message.m())?;
        channel.send(&partial)?;
        info!("client partial signature written");
        Ok(())
    }
}

/// Holds `n2` with its whole exponent `d2`, plus `d1_server`; completes and
/// combines signatures.
#[derive(Debug, Clone)]
pub struct Server {
    config: ProtocolConfig,
}

impl Server {
    /// Server party under `config`.
    pub fn new(config: ProtocolConfig) -> Self {
        Server { config }
    }
}

impl Party for Server {
    fn role(&self) -> Role {
        Role::Server
    }

    fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    fn keys_exist<C: Channel>(&self, channel: &C) -> bool {
        channel.contains::<ServerKey>() || channel.contains::<RsaPublicKey>()
    }

    /// Needs the client's `for_server.key`. Regenerates its own sub-key while
    /// the combination with `n1` fails on a bit-length invariant. A malformed
    /// `n1` fails before any server key is generated.
    fn generate<C, R>(&self, channel: &mut C, rng: &mut R) -> Result<()>
    where
        C: Channel,
        R: CryptoRngCore + ?Sized,
    {
        let share: ServerShare = channel.receive()?;
        check_num_bits(share.n(), self.config.modulus_bits(), "client modulus")?;
        let generator = KeyShareGenerator::new(self.config.clone());

        let (own, public) = generator.generate_server_with_retry(rng, |own| {
            let public = combine_moduli(&self.config, share.n(), own.n())?;
            Ok((own.clone(), public))
        })?;

        channel.send(&ServerKey::new(share, own))?;
        channel.send(&public)?;
        info!(
            bits = self.config.public_modulus_bits(),
            "server key and public key generated"
        );
        Ok(())
    }

    /// Writes `final.sig` only when the client share passes the fraud check
    /// and the combination succeeds. A stale `final.sig` is withdrawn first.
    fn sign<C: Channel>(&self, channel: &mut C) -> Result<()> {
        let key: ServerKey = channel.receive()?;
        let partial: PartialSignature = channel.receive()?;
        channel.remove::<Signature>()?;

        let signature = server_sign(&self.config, &key, &partial)?;
        channel.send(&signature)?;
        info!("final signature written");
        Ok(())
    }
}
