//! API Facades Layer
//!
//! The public operations of the trace control system. A [`TraceControl`]
//! composes the resolver, the normalizer, the control protocol and the
//! reply aggregator behind the operation surface callers use:
//! `trace`, `clear`, `call`, `local_call`, `cancel`, `patterns`,
//! `reset`, `flush`, `node`, `nodes`, `clear_node` and `inspect_file`.
//!
//! ## Modules
//!
//! - **[`trace_facades`]**: the [`TraceControl`] facade and its
//!   three-outcome error taxonomy
//! - **[`inspect`]**: the trace-file replay client and event formatter

pub mod inspect;
pub mod trace_facades;

pub use inspect::{replay, InspectError};
pub use trace_facades::{StopError, TraceControl};
