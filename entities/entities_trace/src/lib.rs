//! Entities Layer: Trace Vocabulary
//!
//! Provides the closed set of input and output shapes the trace control
//! layer works with. Every loosely-shaped value accepted at the outer
//! boundary is parsed into one of these types before anything else
//! happens; the tracer runtime only ever sees the canonical forms.
//!
//! ## Modules
//!
//! - **[`flags`]**: trace categories ([`TraceFlag`])
//! - **[`item`]**: trace-target selectors ([`TraceItem`], [`ProcessRef`],
//!   [`FlagTarget`])
//! - **[`target`]**: callable surfaces ([`FunTarget`], [`CallTarget`])
//! - **[`pattern`]**: call-filter programs ([`Pattern`], [`MatchClause`],
//!   [`PatternId`], [`CanonicalPattern`])
//! - **[`result`]**: per-node replies and the aggregated [`TraceResult`]

pub mod flags;
pub mod item;
pub mod pattern;
pub mod result;
pub mod target;

pub use flags::TraceFlag;
pub use item::{FlagTarget, ProcessRef, TraceItem};
pub use pattern::{CanonicalPattern, MatchClause, Pattern, PatternId, TraceOption};
pub use result::{NodeReply, TraceResult};
pub use target::{CallTarget, FunRef, FunTarget};
