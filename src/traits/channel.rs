//! Exchange of records between the two parties.

use crate::encoding::Record;
use crate::errors::Result;

/// Carries typed records from one party to the other.
///
/// The protocol only ever names records, so a directory of files, a socket
/// or an in-process map all fit behind this interface.
pub trait Channel {
    /// Publishes `record`, replacing any earlier record of the same kind.
    fn send<T: Record>(&mut self, record: &T) -> Result<()>;

    /// Fetches the latest record of kind `T`.
    ///
    /// Fails with [`Error::MissingRecord`](crate::Error::MissingRecord) when
    /// no such record has been sent.
    fn receive<T: Record>(&mut self) -> Result<T>;

    /// Whether a record of kind `T` is available.
    fn contains<T: Record>(&self) -> bool;

    /// Withdraws the record of kind `T`. Removing an absent record is not an
    /// error.
    fn remove<T: Record>(&mut self) -> Result<()>;
}
