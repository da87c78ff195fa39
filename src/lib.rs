#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Protocol
//!
//! Each party owns one RSA sub-modulus of `B` bits: the client `n1`, the
//! server `n2`. The public key is `(e, N = n1 * n2)`.
//!
//! - The client's private exponent `d1` is split additively into
//!   `d1_client` (kept by the client) and `d1_server` (handed to the server).
//! - The server keeps its own exponent `d2` whole.
//! - To sign `m`, the client publishes `y = m^d1_client mod n1`. The server
//!   completes it to `s1 = m^d1_server * y mod n1`, rejects it unless
//!   `s1^e mod n1 == m`, computes `s2 = m^d2 mod n2`, and combines both
//!   residues into `s mod N` with Garner's formula.
//!
//! # Usage
//!
//! ```
//! use rsa_cosign::{Channel, Client, MemoryChannel, MessageRecord, Party, ProtocolConfig, Server};
//! use rsa_cosign::rand_core::OsRng;
//! use rsa_cosign::BigUint;
//!
//! let config = ProtocolConfig::default().with_modulus_bits(256)?;
//! let (client, server) = (Client::new(config.clone()), Server::new(config));
//! let mut channel = MemoryChannel::new();
//!
//! client.generate(&mut channel, &mut OsRng)?;
//! server.generate(&mut channel, &mut OsRng)?;
//!
//! channel.send(&MessageRecord::new(BigUint::from(42u32)))?;
//! client.sign(&mut channel)?;
//! server.sign(&mut channel)?;
//! client.verify(&mut channel)?;
//! # Ok::<(), rsa_cosign::Error>(())
//! ```

extern crate alloc;

pub use num_bigint::BigUint;
pub use rand_core;

mod algorithms;
pub mod channel;
pub mod cli;
mod combine;
pub mod config;
mod encoding;
pub mod errors;
pub mod hazmat;
mod key;
pub mod keygen;
pub mod party;
pub mod selftest;
pub mod sign;
mod signature;
pub mod traits;

pub use crate::{
    channel::{FileChannel, MemoryChannel},
    combine::combine_moduli,
    config::ProtocolConfig,
    encoding::{decode, encode, parse_uint, Record},
    errors::{Error, Result},
    key::{
        ClientKeyMaterial, ClientKeyShare, KeyMaterial, RsaPublicKey, ServerKey, ServerShare,
        ServerSubKey,
    },
    keygen::{KeyShareGenerator, Role},
    party::{Client, Party, Server},
    selftest::{SelfTest, SelfTestReport},
    sign::{verify, SessionState, SigningSession},
    signature::{MessageRecord, PartialSignature, Signature},
    traits::{Channel, PrivateKeyParts, PublicKeyParts},
};
