//! Adapters Layer: Process Resolution
//!
//! Maps heterogeneous process references to concrete process handles.
//! Resolution is a pure lookup: names may be re-registered between
//! calls, so nothing here caches.
//!
//! ## Modules
//!
//! - **[`registry`]**: local and global name registries
//! - **[`resolver`]**: the five-way reference resolution, the
//!   [`NameResolver`] plug-in trait and the [`RemoteLookup`] boundary to
//!   the cluster

pub mod registry;
pub mod resolver;

pub use registry::{GlobalRegistry, NameRegistry, RegistryError};
pub use resolver::{
    resolve, NameResolver, NoRemote, RemoteLookup, ResolveCx, ResolveError, ResolverMap,
};
