//! In-memory store used by the core tests.
//!
//! Besides the [`CertStore`] surface it exposes two test knobs: timestamps
//! can be set directly (`set_last_modified`) and individual subkeys can be
//! made to fail on open (`deny_subkey`), which is how the sweep's per-entry
//! isolation gets exercised.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    io::{self, ErrorKind},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use super::{Access, CertStore, RootHive, StoreError, StoreKey};

#[derive(Debug, Clone)]
enum Value {
    Dword(u32),
    Binary(Vec<u8>),
}

#[derive(Debug)]
struct Node {
    values: BTreeMap<String, Value>,
    subkeys: BTreeMap<String, Arc<Mutex<Node>>>,
    modified: SystemTime,
}

impl Node {
    fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            subkeys: BTreeMap::new(),
            modified: SystemTime::now(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    hives: Arc<Mutex<HashMap<RootHive, Arc<Mutex<Node>>>>>,
    denied: Arc<Mutex<HashSet<String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the key chain for a container path (test setup).
    pub fn create_container(&self, hive: RootHive, path: &str) {
        let mut hives = lock(&self.hives);
        let mut node = Arc::clone(
            hives
                .entry(hive)
                .or_insert_with(|| Arc::new(Mutex::new(Node::new()))),
        );
        for component in path.split('\\').filter(|c| !c.is_empty()) {
            let next = {
                let mut guard = lock(&node);
                Arc::clone(
                    guard
                        .subkeys
                        .entry(component.to_string())
                        .or_insert_with(|| Arc::new(Mutex::new(Node::new()))),
                )
            };
            node = next;
        }
    }

    /// Overrides the last-modified timestamp of the key at `path`.
    pub fn set_last_modified(&self, hive: RootHive, path: &str, when: SystemTime) {
        if let Some(node) = self.walk(hive, path) {
            lock(&node).modified = when;
        }
    }

    /// All subsequent opens of a subkey with this name fail with a
    /// permission error.
    pub fn deny_subkey(&self, name: &str) {
        lock(&self.denied).insert(name.to_string());
    }

    fn walk(&self, hive: RootHive, path: &str) -> Option<Arc<Mutex<Node>>> {
        let hives = lock(&self.hives);
        let mut node = Arc::clone(hives.get(&hive)?);
        drop(hives);
        for component in path.split('\\').filter(|c| !c.is_empty()) {
            let next = {
                let guard = lock(&node);
                Arc::clone(guard.subkeys.get(component)?)
            };
            node = next;
        }
        Some(node)
    }
}

impl CertStore for MemoryStore {
    type Key = MemoryKey;

    fn open_key(
        &self,
        hive: RootHive,
        path: &str,
        _access: Access,
    ) -> Result<Self::Key, StoreError> {
        let node = self
            .walk(hive, path)
            .ok_or_else(|| StoreError::NotFound(format!("{hive}\\{path}")))?;
        Ok(MemoryKey {
            node,
            denied: Arc::clone(&self.denied),
        })
    }
}

#[derive(Debug)]
pub struct MemoryKey {
    node: Arc<Mutex<Node>>,
    denied: Arc<Mutex<HashSet<String>>>,
}

impl StoreKey for MemoryKey {
    fn create_subkey(&self, name: &str) -> Result<Self, StoreError> {
        let mut guard = lock(&self.node);
        let created = !guard.subkeys.contains_key(name);
        let child = Arc::clone(
            guard
                .subkeys
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Node::new()))),
        );
        if created {
            guard.modified = SystemTime::now();
        }
        drop(guard);
        Ok(Self {
            node: child,
            denied: Arc::clone(&self.denied),
        })
    }

    fn open_subkey(&self, name: &str, _access: Access) -> Result<Self, StoreError> {
        if lock(&self.denied).contains(name) {
            return Err(StoreError::PermissionDenied(name.to_string()));
        }
        let guard = lock(&self.node);
        let child = guard
            .subkeys
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        Ok(Self {
            node: Arc::clone(child),
            denied: Arc::clone(&self.denied),
        })
    }

    fn subkey_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(lock(&self.node).subkeys.keys().cloned().collect())
    }

    fn delete_subkey(&self, name: &str) -> Result<(), StoreError> {
        let mut guard = lock(&self.node);
        guard
            .subkeys
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        guard.modified = SystemTime::now();
        Ok(())
    }

    fn get_u32_value(&self, name: &str) -> Result<u32, StoreError> {
        match lock(&self.node).values.get(name) {
            Some(Value::Dword(value)) => Ok(*value),
            Some(Value::Binary(_)) => Err(StoreError::Io(io::Error::new(
                ErrorKind::InvalidData,
                format!("value '{name}' is not a dword"),
            ))),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    fn set_u32_value(&self, name: &str, value: u32) -> Result<(), StoreError> {
        self.set_value(name, Value::Dword(value));
        Ok(())
    }

    fn get_binary_value(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        match lock(&self.node).values.get(name) {
            Some(Value::Binary(bytes)) => Ok(bytes.clone()),
            Some(Value::Dword(_)) => Err(StoreError::Io(io::Error::new(
                ErrorKind::InvalidData,
                format!("value '{name}' is not binary"),
            ))),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    fn set_binary_value(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.set_value(name, Value::Binary(bytes.to_vec()));
        Ok(())
    }

    fn delete_value(&self, name: &str) -> Result<(), StoreError> {
        let mut guard = lock(&self.node);
        guard
            .values
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        guard.modified = SystemTime::now();
        Ok(())
    }

    fn last_modified(&self) -> Result<SystemTime, StoreError> {
        Ok(lock(&self.node).modified)
    }
}

impl MemoryKey {
    fn set_value(&self, name: &str, value: Value) {
        let mut guard = lock(&self.node);
        // A fresh value name is a structural change; rewriting an existing
        // value is not, mirroring the registry's timestamp behavior.
        let created = !guard.values.contains_key(name);
        guard.values.insert(name.to_string(), value);
        if created {
            guard.modified = SystemTime::now();
        }
    }
}
