//! Error types.

use thiserror::Error;

/// Alias for [`core::result::Result`] with the `rsa-cosign` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    /// A persisted record could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A structural property of the key material or message does not hold:
    /// wrong bit length, non-coprime moduli, message not below a modulus.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The client's signature share does not complete to a valid signature
    /// under the client modulus.
    #[error("fraudulent or corrupt client signature detected")]
    FraudDetected,

    /// An arithmetic primitive had no result, e.g. a missing modular inverse.
    #[error("arithmetic failure: {0}")]
    Arithmetic(String),

    /// A record is present but its content is malformed.
    #[error("parse error in {record}: {reason}")]
    Parse {
        /// Name of the record being decoded.
        record: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// A record the operation depends on has not been produced yet.
    #[error("{0} is missing, has the counterpart run its step?")]
    MissingRecord(&'static str),

    /// Protocol configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn invariant(reason: impl Into<String>) -> Self {
        Error::InvariantViolation(reason.into())
    }

    pub(crate) fn arithmetic(reason: impl Into<String>) -> Self {
        Error::Arithmetic(reason.into())
    }

    /// Whether regenerating key material may clear this error.
    ///
    /// Only invariant violations qualify. A detected fraud is a protocol
    /// violation and must never be retried silently.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::InvariantViolation(_))
    }
}
