//! ⚠️ Low-level "hazmat" two-party RSA functions.
//!
//! # ☢️️ WARNING: HAZARDOUS API ☢️
//!
//! These are the raw steps of the co-signing protocol, without the bit-length,
//! coprimality and message-range checks that [`SigningSession`] and the
//! parties perform. They are meant for composing other transports or
//! protocol flows on top of the same arithmetic.
//!
//! [`SigningSession`]: crate::SigningSession

pub use crate::algorithms::rsa::{
    check_client_share, complete_client_share, compute_private_exponent, crt_combine,
    rsa_sign_raw, rsa_verify_raw, split_exponent,
};
