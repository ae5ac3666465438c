//! The pattern table
//!
//! A shared key-value store of encoded filter programs, owned by the
//! control process and handed to readers as a cloneable handle. Keys in
//! the reserved space are the runtime-assigned small integers and the
//! three built-in symbolic ids; anything else is foreign and invisible
//! to the saved-pattern listing.

use entities_trace::PatternId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

/// A pattern table key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternKey {
    /// A runtime-assigned saved id
    Id(u32),
    /// Built-in: capture caller context
    Caller,
    /// Built-in: capture exception/return
    Exception,
    /// Built-in: capture both
    CallerException,
    /// An entry installed around this layer
    Foreign(String),
}

impl PatternKey {
    /// The key a saved-pattern id lives under
    pub fn from_id(id: PatternId) -> Self {
        match id {
            PatternId::Saved(n) => PatternKey::Id(n),
            PatternId::Caller => PatternKey::Caller,
            PatternId::Exception => PatternKey::Exception,
            PatternId::CallerException => PatternKey::CallerException,
        }
    }

    /// The saved-pattern id this key denotes, if it is in the reserved space
    pub fn to_id(&self) -> Option<PatternId> {
        match self {
            PatternKey::Id(n) => Some(PatternId::Saved(*n)),
            PatternKey::Caller => Some(PatternId::Caller),
            PatternKey::Exception => Some(PatternId::Exception),
            PatternKey::CallerException => Some(PatternId::CallerException),
            PatternKey::Foreign(_) => None,
        }
    }
}

/// The shared pattern table handle
///
/// Clones address the same underlying table; the handle itself is what
/// the control process hands out over the request protocol.
#[derive(Debug, Clone)]
pub struct PatternTable {
    entries: Arc<RwLock<HashMap<PatternKey, Vec<u8>>>>,
    next_id: Arc<AtomicU32>,
}

impl PatternTable {
    /// Create an empty table; assigned ids start at 1
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU32::new(1)),
        }
    }

    /// Claim the next unused saved id
    pub fn alloc_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::AcqRel)
    }

    /// Store an entry, replacing any previous one under the key
    pub fn insert(&self, key: PatternKey, bytes: Vec<u8>) {
        self.entries.write().unwrap().insert(key, bytes);
    }

    /// Fetch an entry's bytes
    pub fn get(&self, key: &PatternKey) -> Option<Vec<u8>> {
        self.entries.read().unwrap().get(key).cloned()
    }

    /// Snapshot every entry, unordered
    pub fn entries(&self) -> Vec<(PatternKey, Vec<u8>)> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// True if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
