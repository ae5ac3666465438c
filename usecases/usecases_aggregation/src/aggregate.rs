//! Reply folding
//!
//! A match-count entry records into `counts`, a failure entry records
//! into `errors`, and a saved-id entry fills the result's `saved` field.
//! A node never lands in both maps: each node produces exactly one entry
//! per command, and the entry's own shape decides the map.

use entities_trace::{NodeReply, TraceResult};

/// Fold a per-node reply list into one result
///
/// At most one saved-id entry is expected per call; if several arrive,
/// the last one wins. When none arrives the `saved` field stays absent,
/// and callers read absence as "no reusable filter id was produced".
///
/// # Examples
/// ```
/// use usecases_aggregation::aggregate;
/// use entities_trace::NodeReply;
///
/// let result = aggregate(vec![
///     NodeReply::Matched { node: "alpha@host".to_string(), count: 2 },
/// ]);
/// assert_eq!(result.counts["alpha@host"], 2);
/// assert!(result.errors.is_empty());
/// assert!(result.saved.is_none());
/// ```
pub fn aggregate(replies: Vec<NodeReply>) -> TraceResult {
    let mut result = TraceResult::new();
    for reply in replies {
        match reply {
            NodeReply::Matched { node, count } => {
                result.counts.insert(node, count);
            }
            NodeReply::Failed { node, reason } => {
                result.errors.insert(node, reason);
            }
            NodeReply::Saved(id) => {
                result.saved = Some(id);
            }
        }
    }
    result
}
