//! Directory-backed store: keys are directories, values are files.
//!
//! The filesystem gives us the registry's timestamp semantics for free: a
//! directory's mtime advances when an entry inside it is created or removed,
//! but not when an existing file is rewritten in place.

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    time::SystemTime,
};

use super::{Access, CertStore, RootHive, StoreError, StoreKey};

#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the directory chain for a store container so that `open_key`
    /// succeeds for it afterwards. Setup only; the injection and sweep paths
    /// never create containers themselves.
    pub fn create_container(&self, hive: RootHive, path: &str) -> Result<(), StoreError> {
        let dir = self.key_dir(hive, path);
        fs::create_dir_all(&dir).map_err(|err| map_io(err, &dir))?;
        Ok(())
    }

    fn key_dir(&self, hive: RootHive, path: &str) -> PathBuf {
        let mut dir = self.root.join(hive.as_str());
        for component in path.split('\\').filter(|c| !c.is_empty()) {
            dir.push(component);
        }
        dir
    }
}

impl CertStore for DirStore {
    type Key = DirKey;

    fn open_key(
        &self,
        hive: RootHive,
        path: &str,
        _access: Access,
    ) -> Result<Self::Key, StoreError> {
        let dir = self.key_dir(hive, path);
        if !dir.is_dir() {
            return Err(StoreError::NotFound(format!("{hive}\\{path}")));
        }
        Ok(DirKey { dir })
    }
}

#[derive(Debug)]
pub struct DirKey {
    dir: PathBuf,
}

impl StoreKey for DirKey {
    fn create_subkey(&self, name: &str) -> Result<Self, StoreError> {
        let dir = self.dir.join(name);
        if !dir.is_dir() {
            fs::create_dir(&dir).map_err(|err| map_io(err, &dir))?;
        }
        Ok(Self { dir })
    }

    fn open_subkey(&self, name: &str, _access: Access) -> Result<Self, StoreError> {
        let dir = self.dir.join(name);
        if !dir.is_dir() {
            return Err(StoreError::NotFound(dir.display().to_string()));
        }
        Ok(Self { dir })
    }

    fn subkey_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|err| map_io(err, &self.dir))? {
            let entry = entry.map_err(StoreError::Io)?;
            if entry.file_type().map_err(StoreError::Io)?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn delete_subkey(&self, name: &str) -> Result<(), StoreError> {
        let dir = self.dir.join(name);
        fs::remove_dir_all(&dir).map_err(|err| map_io(err, &dir))
    }

    fn get_u32_value(&self, name: &str) -> Result<u32, StoreError> {
        let path = self.dir.join(name);
        let bytes = fs::read(&path).map_err(|err| map_io(err, &path))?;
        let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
            StoreError::Io(io::Error::new(
                ErrorKind::InvalidData,
                format!("value '{name}' is {} bytes, expected 4", bytes.len()),
            ))
        })?;
        Ok(u32::from_le_bytes(raw))
    }

    fn set_u32_value(&self, name: &str, value: u32) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        fs::write(&path, value.to_le_bytes()).map_err(|err| map_io(err, &path))
    }

    fn get_binary_value(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.dir.join(name);
        fs::read(&path).map_err(|err| map_io(err, &path))
    }

    fn set_binary_value(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        fs::write(&path, bytes).map_err(|err| map_io(err, &path))
    }

    fn delete_value(&self, name: &str) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        fs::remove_file(&path).map_err(|err| map_io(err, &path))
    }

    fn last_modified(&self) -> Result<SystemTime, StoreError> {
        let metadata = fs::metadata(&self.dir).map_err(|err| map_io(err, &self.dir))?;
        metadata.modified().map_err(StoreError::Io)
    }
}

fn map_io(err: io::Error, path: &Path) -> StoreError {
    match err.kind() {
        ErrorKind::NotFound => StoreError::NotFound(path.display().to_string()),
        ErrorKind::PermissionDenied => StoreError::PermissionDenied(path.display().to_string()),
        _ => StoreError::Io(err),
    }
}
