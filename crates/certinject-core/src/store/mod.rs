//! The hierarchical key/value store seam.
//!
//! Injection and the expiry sweep only ever talk to the store through
//! [`CertStore`] and [`StoreKey`], so the same code runs against the
//! directory-backed store the CLI ships with and the in-memory store the
//! tests use. Handles release on drop; there is no explicit close.

use std::time::SystemTime;

mod dir;
mod memory;

pub use dir::{DirKey, DirStore};
pub use memory::{MemoryKey, MemoryStore};

/// Root hive a store location hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootHive {
    CurrentUser,
    LocalMachine,
}

impl RootHive {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CurrentUser => "HKEY_CURRENT_USER",
            Self::LocalMachine => "HKEY_LOCAL_MACHINE",
        }
    }
}

impl std::fmt::Display for RootHive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access requested when opening a key. The directory-backed store treats
/// this as advisory; a registry-backed store would map it to ACL flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    ReadWrite,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("'{0}' was not found")]
    NotFound(String),
    #[error("permission denied for '{0}'")]
    PermissionDenied(String),
    #[error("store i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            Self::PermissionDenied(_) => false,
        }
    }
}

/// A hierarchical store holding containers ("keys") addressed by a
/// backslash-separated path under a root hive.
pub trait CertStore {
    type Key: StoreKey;

    /// Opens an existing key. The key must pre-exist; opening never creates.
    fn open_key(&self, hive: RootHive, path: &str, access: Access)
        -> Result<Self::Key, StoreError>;
}

/// An open container. Values and subkeys live side by side; the store
/// maintains a last-modified timestamp per key that advances on structural
/// change (value or subkey created or deleted), not on same-bytes overwrite.
pub trait StoreKey: Sized {
    /// Creates the named subkey, or opens it if it already exists.
    fn create_subkey(&self, name: &str) -> Result<Self, StoreError>;

    fn open_subkey(&self, name: &str, access: Access) -> Result<Self, StoreError>;

    /// Names of immediate subkeys, in unspecified order.
    fn subkey_names(&self) -> Result<Vec<String>, StoreError>;

    /// Deletes the named subkey and everything beneath it.
    fn delete_subkey(&self, name: &str) -> Result<(), StoreError>;

    /// Fails with a not-found error when the value is absent.
    fn get_u32_value(&self, name: &str) -> Result<u32, StoreError>;

    fn set_u32_value(&self, name: &str, value: u32) -> Result<(), StoreError>;

    fn get_binary_value(&self, name: &str) -> Result<Vec<u8>, StoreError>;

    fn set_binary_value(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Fails with a not-found error when the value is absent.
    fn delete_value(&self, name: &str) -> Result<(), StoreError>;

    /// Deletes the named value if present, swallowing the outcome. Used
    /// where absence is the expected steady state and intentional, not an
    /// ignored failure.
    fn delete_value_best_effort(&self, name: &str) {
        let _ = self.delete_value(name);
    }

    /// Store-maintained last-modified timestamp for this key.
    fn last_modified(&self) -> Result<SystemTime, StoreError>;
}
