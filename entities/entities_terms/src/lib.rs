//! Entities Layer: Terms
//!
//! Provides the runtime term model shared by every layer of the trace
//! control system. Commands sent to the tracer, per-node error payloads,
//! filter-program fragments and recorded trace events are all expressed
//! as [`Term`] values.
//!
//! ## Modules
//!
//! - **[`term`]**: the `Term` value enum, constructors and shape accessors
//! - **[`pid`]**: process identifiers and node names

pub mod pid;
pub mod term;

pub use pid::{NodeName, Pid};
pub use term::Term;
