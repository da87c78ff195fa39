//! Useful algorithms related to two-party RSA.

pub(crate) mod generate;
pub mod rsa;
