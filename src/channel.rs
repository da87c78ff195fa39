//! [`Channel`] implementations: a directory of record files and an
//! in-process map.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use alloc::string::String;
use tracing::debug;
use zeroize::Zeroizing;

use crate::encoding::{decode, encode, Record};
use crate::errors::{Error, Result};
use crate::traits::Channel;

/// Stores each record as a file named after [`Record::NAME`] in one
/// directory shared by both parties.
#[derive(Debug, Clone)]
pub struct FileChannel {
    dir: PathBuf,
}

impl FileChannel {
    /// Opens `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileChannel { dir })
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the record of kind `T` is stored at.
    pub fn path_of<T: Record>(&self) -> PathBuf {
        self.dir.join(T::NAME)
    }

    /// Writes `contents` next to `path` and renames it into place, so readers
    /// never observe a half-written record.
    fn write_atomic(path: &Path, contents: &str, secret: bool) -> io::Result<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let result = (|| {
            let mut file = open_for_write(&tmp, secret)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

#[cfg(unix)]
fn open_for_write(path: &Path, secret: bool) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if secret {
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path, _secret: bool) -> io::Result<fs::File> {
    fs::File::create(path)
}

impl Channel for FileChannel {
    fn send<T: Record>(&mut self, record: &T) -> Result<()> {
        let path = self.path_of::<T>();
        Self::write_atomic(&path, &encode(record), T::SECRET)?;
        debug!(record = T::NAME, dir = %self.dir.display(), "wrote record");
        Ok(())
    }

    fn receive<T: Record>(&mut self) -> Result<T> {
        let path = self.path_of::<T>();
        let text = match fs::read_to_string(&path) {
            Ok(text) => Zeroizing::new(text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::MissingRecord(T::NAME))
            }
            Err(err) => return Err(err.into()),
        };
        debug!(record = T::NAME, dir = %self.dir.display(), "read record");
        decode(&text)
    }

    fn contains<T: Record>(&self) -> bool {
        self.path_of::<T>().is_file()
    }

    fn remove<T: Record>(&mut self) -> Result<()> {
        match fs::remove_file(self.path_of::<T>()) {
            Ok(()) => {
                debug!(record = T::NAME, dir = %self.dir.display(), "removed record");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Keeps encoded records in memory. Records go through the same text
/// encoding as [`FileChannel`].
#[derive(Debug, Default)]
pub struct MemoryChannel {
    records: HashMap<&'static str, Zeroizing<String>>,
}

impl MemoryChannel {
    /// Empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored text of a record, bypassing encoding.
    pub fn insert_raw<T: Record>(&mut self, text: impl Into<String>) {
        self.records.insert(T::NAME, Zeroizing::new(text.into()));
    }
}

impl Channel for MemoryChannel {
    fn send<T: Record>(&mut self, record: &T) -> Result<()> {
        self.records.insert(T::NAME, encode(record));
        Ok(())
    }

    fn receive<T: Record>(&mut self) -> Result<T> {
        let text = self
            .records
            .get(T::NAME)
            .ok_or(Error::MissingRecord(T::NAME))?;
        decode(text)
    }

    fn contains<T: Record>(&self) -> bool {
        self.records.contains_key(T::NAME)
    }

    fn remove<T: Record>(&mut self) -> Result<()> {
        self.records.remove(T::NAME);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{PartialSignature, Signature};
    use num_bigint::BigUint;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rsa-cosign-channel-{}-{}",
            std::process::id(),
            name
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_file_channel() {
        let dir = scratch_dir("roundtrip");
        let mut channel = FileChannel::open(&dir).unwrap();
        assert!(!channel.contains::<PartialSignature>());
        assert!(matches!(
            channel.receive::<PartialSignature>(),
            Err(Error::MissingRecord("client.sig"))
        ));

        let sig = PartialSignature::new(BigUint::from(7u32), BigUint::from(0x8fu32));
        channel.send(&sig).unwrap();
        assert!(channel.contains::<PartialSignature>());
        assert_eq!(fs::read_to_string(dir.join("client.sig")).unwrap(), "7\n8F\n");
        assert_eq!(channel.receive::<PartialSignature>().unwrap(), sig);
        assert!(!dir.join("client.sig.tmp").exists());

        channel.remove::<PartialSignature>().unwrap();
        assert!(!channel.contains::<PartialSignature>());
        channel.remove::<PartialSignature>().unwrap();

        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_secret_permissions() {
        use crate::key::ClientKeyShare;
        use std::os::unix::fs::PermissionsExt;

        let dir = scratch_dir("secret");
        let mut channel = FileChannel::open(&dir).unwrap();
        channel
            .send(&ClientKeyShare::new(BigUint::from(20u32), BigUint::from(143u32)))
            .unwrap();

        let mode = fs::metadata(dir.join("client_card.key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o077, 0);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_memory_channel() {
        let mut channel = MemoryChannel::new();
        let sig = Signature::new(BigUint::from(7u32), BigUint::from(1234u32));
        channel.send(&sig).unwrap();
        assert_eq!(channel.receive::<Signature>().unwrap(), sig);

        channel.insert_raw::<Signature>("7\n");
        assert!(matches!(
            channel.receive::<Signature>(),
            Err(Error::Parse { record: "final.sig", .. })
        ));

        channel.remove::<Signature>().unwrap();
        assert!(!channel.contains::<Signature>());
    }
}
