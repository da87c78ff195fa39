//! Key-part and channel trait definitions.

mod channel;
pub(crate) mod keys;

pub use channel::Channel;
pub use keys::{PrivateKeyParts, PublicKeyParts};
