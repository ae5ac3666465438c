//! Cluster membership
//!
//! The named set of node engines. The cluster is the transport for
//! remote name lookups and the fabric broadcast commands fan out over;
//! tracing membership (which nodes are traced) is control-process state,
//! not kept here.

use crate::engine::NodeEngine;
use adapters_resolution::RemoteLookup;
use entities_terms::{NodeName, Pid, Term};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The named node set
#[derive(Default)]
pub struct Cluster {
    nodes: RwLock<HashMap<NodeName, Arc<NodeEngine>>>,
}

impl Cluster {
    /// Create an empty cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; its engine name is its membership name
    pub fn add(&self, engine: Arc<NodeEngine>) -> Result<(), Term> {
        let mut nodes = self.nodes.write().unwrap();
        let name = engine.name().to_string();
        if nodes.contains_key(&name) {
            return Err(Term::atom("already_member"));
        }
        nodes.insert(name, engine);
        Ok(())
    }

    /// Remove a node; true if it was a member
    pub fn remove(&self, name: &str) -> bool {
        self.nodes.write().unwrap().remove(name).is_some()
    }

    /// The engine of a member node
    pub fn get(&self, name: &str) -> Option<Arc<NodeEngine>> {
        self.nodes.read().unwrap().get(name).cloned()
    }

    /// True if the node is a member
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.read().unwrap().contains_key(name)
    }

    /// Member names, sorted
    pub fn names(&self) -> Vec<NodeName> {
        let mut names: Vec<NodeName> = self.nodes.read().unwrap().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl RemoteLookup for Cluster {
    fn whereis_on(&self, node: &NodeName, name: &str) -> Result<Option<Pid>, Term> {
        let engine = self.get(node).ok_or_else(|| Term::atom("nodedown"))?;
        Ok(engine.registry().whereis(name))
    }
}
