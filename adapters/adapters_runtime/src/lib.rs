//! Adapters Layer: Tracer Runtime
//!
//! The boundary to the tracer runtime proper: per-node engines that hold
//! flag tables, installed filters and buffered event output, and the
//! cluster fabric that names them. The control layer only ever talks to
//! these through the command surface; what the engines do between
//! commands (observe calls, emit events) belongs to the runtime.
//!
//! ## Modules
//!
//! - **[`engine`]**: one node's tracer state ([`NodeEngine`])
//! - **[`sink`]**: buffered event output destinations ([`TraceSink`])
//! - **[`cluster`]**: the named node set ([`Cluster`])

pub mod cluster;
pub mod engine;
pub mod sink;

pub use cluster::Cluster;
pub use engine::NodeEngine;
pub use sink::TraceSink;
