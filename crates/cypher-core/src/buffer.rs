//! Owned key material
//!
//! A [`KeyBuffer`] is the single owner of its bytes and wipes them when
//! dropped. Borrowed access is a plain `&[u8]`.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};

/// Exclusively owned key bytes, zeroized on drop
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyBuffer(Vec<u8>);

impl KeyBuffer {
    /// Take ownership of `bytes`
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Copy `bytes` into a new buffer
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Borrow the key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes held
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no bytes are held
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Release the bytes to the caller, who becomes responsible for them
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }

    /// Read a whole key file.
    ///
    /// An empty file is rejected since no key has zero length.
    pub fn import(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            return Err(CoreError::InvalidArgument(format!(
                "key file {} is empty",
                path.display()
            )));
        }
        debug!(path = %path.display(), len = bytes.len(), "imported key buffer");
        Ok(Self(bytes))
    }

    /// Write the key bytes to `path`, replacing any existing file.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path)?;
        file.write_all(&self.0)?;
        file.sync_all()?;
        debug!(path = %path.display(), len = self.0.len(), "exported key buffer");
        Ok(())
    }
}

impl AsRef<[u8]> for KeyBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for KeyBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for KeyBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyBuffer(<{} bytes>)", self.0.len())
    }
}
