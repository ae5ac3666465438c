//! Call-filter patterns
//!
//! Provides every legal shape of the filter argument to the call-filter
//! operations, the canonical form handed to the tracer, and the clause
//! structure of a compiled filter program.
//!
//! A filter program is an ordered list of [`MatchClause`]s. The head
//! matches the call's argument list, the guards constrain the match, and
//! the body names the trace-time side effects to perform.

use entities_terms::Term;
use std::fmt;

/// A trace-time side effect requested by an option-list pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOption {
    /// Turn call tracing on for the calling process when the filter hits
    Trace,
    /// Turn call tracing off for the calling process when the filter hits
    Clear,
    /// Toggle event suppression for the calling process
    Silent(bool),
    /// Capture the full call stack with the event
    Stacktrace,
    /// Capture the calling function with the event
    Caller,
    /// Emit a matching return event
    Return,
    /// Emit a matching exception-or-return event
    Exception,
}

impl TraceOption {
    /// The body term this option compiles to
    pub fn body_term(&self) -> Term {
        match self {
            TraceOption::Trace => Term::atom("trace"),
            TraceOption::Clear => Term::atom("clear"),
            TraceOption::Silent(on) => Term::tuple(vec![
                Term::atom("silent"),
                Term::atom(if *on { "true" } else { "false" }),
            ]),
            TraceOption::Stacktrace => Term::atom("stacktrace"),
            TraceOption::Caller => Term::atom("caller"),
            TraceOption::Return => Term::atom("return"),
            TraceOption::Exception => Term::atom("exception"),
        }
    }
}

/// One clause of a filter program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchClause {
    /// Argument-list pattern
    pub head: Term,
    /// Guard terms, all of which must hold
    pub guards: Vec<Term>,
    /// Side-effect body terms
    pub body: Vec<Term>,
}

impl MatchClause {
    /// The always-true clause with the given body
    pub fn wildcard(body: Vec<Term>) -> Self {
        Self {
            head: Term::wildcard(),
            guards: Vec::new(),
            body,
        }
    }
}

/// Identifier of a previously saved filter program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternId {
    /// A runtime-assigned small integer
    Saved(u32),
    /// Built-in: capture caller context
    Caller,
    /// Built-in: capture exception/return
    Exception,
    /// Built-in: capture both
    CallerException,
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternId::Saved(n) => write!(f, "{}", n),
            PatternId::Caller => write!(f, "c"),
            PatternId::Exception => write!(f, "x"),
            PatternId::CallerException => write!(f, "cx"),
        }
    }
}

/// A caller-supplied filter pattern, any legal shape
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Reuse a saved program by id
    Id(PatternId),
    /// A single side-effect option
    Option(TraceOption),
    /// A list of side-effect options
    Options(Vec<TraceOption>),
    /// An already-structured program
    Clauses(Vec<MatchClause>),
    /// Program source text, parsed at normalization time
    Source(String),
    /// A transform producing the program from a representative
    /// argument-list binding
    Build(fn(&Term) -> Vec<MatchClause>),
}

/// The canonical pattern the tracer accepts
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalPattern {
    /// A saved-program reference, interpreted by the runtime
    Ref(PatternId),
    /// A compiled program
    Program(Vec<MatchClause>),
}
