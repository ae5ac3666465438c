//! Trace flags
//!
//! Provides the trace-category flags that can be enabled on a process.
//! Each flag has exactly one canonical name; shorthand spellings are
//! resolved during normalization, never stored.

use std::fmt;

/// A trace category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceFlag {
    /// Message sends
    Send,
    /// Message receives
    Receive,
    /// Function calls matching an installed filter
    Call,
    /// Return-to points for tail calls
    ReturnTo,
    /// Scheduling in/out
    Running,
    /// Garbage collection start/end
    GarbageCollection,
    /// Spawned processes inherit the tracee's flags
    SetOnSpawn,
    /// Only the first spawned process inherits the flags
    SetOnFirstSpawn,
    /// Linked processes inherit the tracee's flags
    SetOnLink,
    /// Only the first linked process inherits the flags
    SetOnFirstLink,
    /// Suppress event emission while keeping the flags set
    Silent,
    /// Attach wall-clock timestamps to events
    Timestamp,
    /// Record call arity instead of call arguments
    Arity,
}

impl TraceFlag {
    /// All flags, in canonical declaration order
    pub const ALL: [TraceFlag; 13] = [
        TraceFlag::Send,
        TraceFlag::Receive,
        TraceFlag::Call,
        TraceFlag::ReturnTo,
        TraceFlag::Running,
        TraceFlag::GarbageCollection,
        TraceFlag::SetOnSpawn,
        TraceFlag::SetOnFirstSpawn,
        TraceFlag::SetOnLink,
        TraceFlag::SetOnFirstLink,
        TraceFlag::Silent,
        TraceFlag::Timestamp,
        TraceFlag::Arity,
    ];

    /// The canonical long-form name of this flag
    pub fn canonical_name(&self) -> &'static str {
        match self {
            TraceFlag::Send => "send",
            TraceFlag::Receive => "receive",
            TraceFlag::Call => "call",
            TraceFlag::ReturnTo => "return_to",
            TraceFlag::Running => "running",
            TraceFlag::GarbageCollection => "garbage_collection",
            TraceFlag::SetOnSpawn => "set_on_spawn",
            TraceFlag::SetOnFirstSpawn => "set_on_first_spawn",
            TraceFlag::SetOnLink => "set_on_link",
            TraceFlag::SetOnFirstLink => "set_on_first_link",
            TraceFlag::Silent => "silent",
            TraceFlag::Timestamp => "timestamp",
            TraceFlag::Arity => "arity",
        }
    }
}

impl fmt::Display for TraceFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}
