//! Trace-target selectors
//!
//! Provides the selector shapes a caller can pass to the flag-setting
//! operations: class selectors covering whole process populations, or a
//! reference to one process. A [`ProcessRef`] is resolved to a concrete
//! [`Pid`] before any command is issued; [`FlagTarget`] is the canonical,
//! resolved form the control process operates on.

use entities_terms::{NodeName, Pid, Term};
use std::fmt;

/// Heterogeneous process reference, resolved but never stored
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessRef {
    /// A concrete process handle
    Pid(Pid),
    /// A locally registered name
    Name(String),
    /// A name registered on a specific node
    NameOn { name: String, node: NodeName },
    /// A globally registered name
    Global(String),
    /// A name held by a pluggable resolver module
    Via { resolver: String, key: Term },
}

impl fmt::Display for ProcessRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessRef::Pid(pid) => write!(f, "{}", pid),
            ProcessRef::Name(name) => write!(f, "{}", name),
            ProcessRef::NameOn { name, node } => write!(f, "{{{},{}}}", name, node),
            ProcessRef::Global(name) => write!(f, "{{global,{}}}", name),
            ProcessRef::Via { resolver, key } => write!(f, "{{via,{},{}}}", resolver, key),
        }
    }
}

/// Trace-target selector as accepted from the caller
#[derive(Debug, Clone, PartialEq)]
pub enum TraceItem {
    /// Every current and future process
    All,
    /// Future processes only
    New,
    /// Current processes only
    Existing,
    /// One process
    Proc(ProcessRef),
}

/// Canonical flag-command target: a class, or one resolved process
#[derive(Debug, Clone, PartialEq)]
pub enum FlagTarget {
    /// Every current and future process
    All,
    /// Future processes only
    New,
    /// Current processes only
    Existing,
    /// One resolved process
    One(Pid),
}

impl FlagTarget {
    /// True for the class selectors, false for a concrete process
    pub fn is_class(&self) -> bool {
        !matches!(self, FlagTarget::One(_))
    }
}
