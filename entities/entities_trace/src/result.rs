//! Command results
//!
//! Provides the per-node reply shapes the tracer produces and the
//! aggregated result structure every command returns to the caller.

use crate::pattern::PatternId;
use entities_terms::{NodeName, Term};
use std::collections::HashMap;

/// One node's reply to a broadcast command
#[derive(Debug, Clone, PartialEq)]
pub enum NodeReply {
    /// The command matched `count` processes or functions on `node`
    Matched { node: NodeName, count: u64 },
    /// The command failed on `node` with the given reason
    Failed { node: NodeName, reason: Term },
    /// The runtime assigned a reusable id to the installed program
    Saved(PatternId),
}

/// The aggregated outcome of one command
///
/// A node appears in `counts` or in `errors`, never both. `saved` is
/// present only when the command produced a reusable filter program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraceResult {
    /// Per-node match counts
    pub counts: HashMap<NodeName, u64>,
    /// Per-node failure reasons
    pub errors: HashMap<NodeName, Term>,
    /// Reusable program id, if one was assigned
    pub saved: Option<PatternId>,
}

impl TraceResult {
    /// An empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Total match count across all nodes
    pub fn total_matched(&self) -> u64 {
        self.counts.values().sum()
    }
}
