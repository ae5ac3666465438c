//! Saved-pattern listing
//!
//! Enumerates the reserved key space of a pattern table and decodes each
//! entry back into its clause program. An entry that fails to decode is
//! omitted, not surfaced: entries may have been installed directly
//! through the runtime without this layer's encoding convention, and one
//! foreign entry must not abort the whole listing.

use crate::codec::decode_program;
use crate::table::PatternTable;
use entities_trace::{MatchClause, PatternId};
use std::collections::HashMap;

/// List every decodable saved pattern
pub fn saved_patterns(table: &PatternTable) -> HashMap<PatternId, Vec<MatchClause>> {
    let mut patterns = HashMap::new();
    for (key, bytes) in table.entries() {
        let id = match key.to_id() {
            Some(id) => id,
            None => continue,
        };
        if let Ok(clauses) = decode_program(&bytes) {
            patterns.insert(id, clauses);
        }
    }
    patterns
}
