//! Use Cases Layer: Command Normalization
//!
//! Maps the many legal input shapes for flag sets, filter targets and
//! filter patterns into the small canonical command vocabulary the
//! tracer runtime accepts. Every malformed input is rejected here,
//! before any runtime interaction happens.
//!
//! ## Modules
//!
//! - **[`flags`]**: shorthand expansion and de-duplication of trace flags
//! - **[`target`]**: canonicalization of filter targets
//! - **[`pattern`]**: compilation of every pattern shape into a saved-id
//!   reference or a clause program
//! - **[`clause_source`]**: scanner and parser for program source text
//! - **[`parse`]**: fallible constructors from loose [`Term`] input for
//!   every input family
//!
//! [`Term`]: entities_terms::Term

pub mod clause_source;
pub mod flags;
pub mod parse;
pub mod pattern;
pub mod target;

pub use flags::{normalize_flag_names, normalize_flags, FlagError};
pub use pattern::{normalize_pattern, PatternError};
pub use target::{normalize_target, TargetError};
