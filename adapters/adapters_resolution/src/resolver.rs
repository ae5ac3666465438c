//! Reference resolution
//!
//! Maps a [`ProcessRef`] to a concrete [`Pid`]. Every lookup failure,
//! including remote communication failure, collapses to
//! [`ResolveError::NotFound`]: callers only need to know the reference
//! did not name a live process.

use crate::registry::{GlobalRegistry, NameRegistry};
use entities_terms::{NodeName, Pid, Term};
use entities_trace::ProcessRef;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Resolution errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// The reference does not name a live process
    NotFound,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound => write!(f, "no such process"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// A pluggable name resolver
///
/// Implementations own their registration scheme; resolution asks them
/// for the pid bound to an opaque key.
pub trait NameResolver: Send + Sync {
    /// The pid bound to `key`, if any
    fn whereis(&self, key: &Term) -> Option<Pid>;
}

/// Named resolver plug-ins
#[derive(Clone, Default)]
pub struct ResolverMap {
    resolvers: HashMap<String, Arc<dyn NameResolver>>,
}

impl ResolverMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver under a name
    pub fn register(&mut self, name: &str, resolver: Arc<dyn NameResolver>) {
        self.resolvers.insert(name.to_string(), resolver);
    }

    /// Look a resolver up
    pub fn get(&self, name: &str) -> Option<&Arc<dyn NameResolver>> {
        self.resolvers.get(name)
    }
}

impl fmt::Debug for ResolverMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ResolverMap").field("names", &names).finish()
    }
}

/// The remote-lookup boundary
///
/// Implemented by the cluster transport; performs the equivalent local
/// lookup on another node. A communication failure is an `Err` whose
/// reason term the resolver discards.
pub trait RemoteLookup {
    /// Look `name` up on `node`
    fn whereis_on(&self, node: &NodeName, name: &str) -> Result<Option<Pid>, Term>;
}

/// A remote-lookup stub for single-node use: every node is unreachable
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteLookup for NoRemote {
    fn whereis_on(&self, _node: &NodeName, _name: &str) -> Result<Option<Pid>, Term> {
        Err(Term::atom("nodedown"))
    }
}

/// Everything resolution needs to see
pub struct ResolveCx<'a> {
    /// Name of the node resolution runs on
    pub local_node: NodeName,
    /// The local node's registry
    pub registry: &'a NameRegistry,
    /// The cluster-wide registry
    pub global: &'a GlobalRegistry,
    /// Transport for remote lookups
    pub remote: &'a dyn RemoteLookup,
    /// Pluggable resolvers for `via` references
    pub resolvers: &'a ResolverMap,
}

/// Resolve a process reference to a pid
///
/// A concrete pid is returned unchanged. A `{name, node}` pair naming
/// the local node short-circuits to a local lookup; a remote node goes
/// through the blocking remote lookup, where any failure collapses to
/// not-found.
pub fn resolve(reference: &ProcessRef, cx: &ResolveCx<'_>) -> Result<Pid, ResolveError> {
    match reference {
        ProcessRef::Pid(pid) => Ok(pid.clone()),
        ProcessRef::Name(name) => cx.registry.whereis(name).ok_or(ResolveError::NotFound),
        ProcessRef::NameOn { name, node } => {
            if *node == cx.local_node {
                cx.registry.whereis(name).ok_or(ResolveError::NotFound)
            } else {
                match cx.remote.whereis_on(node, name) {
                    Ok(Some(pid)) => Ok(pid),
                    Ok(None) | Err(_) => Err(ResolveError::NotFound),
                }
            }
        }
        ProcessRef::Global(name) => cx.global.whereis(name).ok_or(ResolveError::NotFound),
        ProcessRef::Via { resolver, key } => cx
            .resolvers
            .get(resolver)
            .and_then(|r| r.whereis(key))
            .ok_or(ResolveError::NotFound),
    }
}
