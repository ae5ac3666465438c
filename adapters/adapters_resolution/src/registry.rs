//! Name registries
//!
//! Thread-safe name-to-pid tables. A [`NameRegistry`] serves one node's
//! locally registered names; a [`GlobalRegistry`] serves cluster-wide
//! registrations with the same surface.

use entities_terms::Pid;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The name is already bound to a live pid
    AlreadyRegistered(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AlreadyRegistered(name) => {
                write!(f, "name already registered: {}", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// A node-local name registry
///
/// Shared ownership: clones address the same underlying table.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: Arc<RwLock<HashMap<String, Pid>>>,
}

impl NameRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name to a pid
    pub fn register(&self, name: &str, pid: Pid) -> Result<(), RegistryError> {
        let mut names = self.names.write().unwrap();
        if names.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        names.insert(name.to_string(), pid);
        Ok(())
    }

    /// Remove a binding; true if one existed
    pub fn unregister(&self, name: &str) -> bool {
        self.names.write().unwrap().remove(name).is_some()
    }

    /// Look a name up
    pub fn whereis(&self, name: &str) -> Option<Pid> {
        self.names.read().unwrap().get(name).cloned()
    }

    /// All registered names, unordered
    pub fn names(&self) -> Vec<String> {
        self.names.read().unwrap().keys().cloned().collect()
    }
}

/// The cluster-wide registry
///
/// Same table surface as [`NameRegistry`]; kept as its own type because
/// the two name spaces are distinct.
#[derive(Debug, Clone, Default)]
pub struct GlobalRegistry {
    inner: NameRegistry,
}

impl GlobalRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name to a pid
    pub fn register(&self, name: &str, pid: Pid) -> Result<(), RegistryError> {
        self.inner.register(name, pid)
    }

    /// Remove a binding; true if one existed
    pub fn unregister(&self, name: &str) -> bool {
        self.inner.unregister(name)
    }

    /// Look a name up
    pub fn whereis(&self, name: &str) -> Option<Pid> {
        self.inner.whereis(name)
    }
}
