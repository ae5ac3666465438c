//! Flag normalization
//!
//! Expands shorthand flag spellings to their canonical long forms and
//! collapses duplicates. The output order is the first-occurrence order
//! of the expanded input, which makes normalization idempotent.
//!
//! The clear-all sentinel never passes through here; clearing is its own
//! canonical command.

use entities_trace::TraceFlag;
use std::fmt;

/// Flag normalization errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// The name is not a flag or a shorthand
    Unknown(String),
    /// The input shape is not a flag name or a list of flag names
    BadShape(String),
}

impl fmt::Display for FlagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagError::Unknown(name) => write!(f, "unknown trace flag: {}", name),
            FlagError::BadShape(what) => write!(f, "bad flag input: {}", what),
        }
    }
}

impl std::error::Error for FlagError {}

/// Expand one flag name to the flags it denotes
///
/// Accepts canonical long forms and every shorthand. The `m` shorthand
/// denotes two flags; everything else denotes one.
pub fn expand_alias(name: &str) -> Result<Vec<TraceFlag>, FlagError> {
    let flags = match name {
        "s" | "send" => vec![TraceFlag::Send],
        "r" | "receive" => vec![TraceFlag::Receive],
        "m" | "messages" => vec![TraceFlag::Send, TraceFlag::Receive],
        "c" | "call" => vec![TraceFlag::Call],
        "return_to" => vec![TraceFlag::ReturnTo],
        "running" => vec![TraceFlag::Running],
        "gc" | "garbage_collection" => vec![TraceFlag::GarbageCollection],
        "sos" | "set_on_spawn" => vec![TraceFlag::SetOnSpawn],
        "sofs" | "set_on_first_spawn" => vec![TraceFlag::SetOnFirstSpawn],
        "sol" | "set_on_link" => vec![TraceFlag::SetOnLink],
        "sofl" | "set_on_first_link" => vec![TraceFlag::SetOnFirstLink],
        "silent" => vec![TraceFlag::Silent],
        "ts" | "timestamp" => vec![TraceFlag::Timestamp],
        "arity" => vec![TraceFlag::Arity],
        other => return Err(FlagError::Unknown(other.to_string())),
    };
    Ok(flags)
}

/// Collapse duplicates, keeping the first occurrence of each flag
pub fn normalize_flags(flags: &[TraceFlag]) -> Vec<TraceFlag> {
    let mut seen = Vec::with_capacity(flags.len());
    for flag in flags {
        if !seen.contains(flag) {
            seen.push(*flag);
        }
    }
    seen
}

/// Normalize a list of flag names
///
/// Expands every shorthand, then de-duplicates. An unrecognized name is
/// a caller error.
///
/// # Examples
/// ```
/// use usecases_normalization::normalize_flag_names;
/// use entities_trace::TraceFlag;
///
/// let flags = normalize_flag_names(&["m", "send"]).unwrap();
/// assert_eq!(flags, vec![TraceFlag::Send, TraceFlag::Receive]);
///
/// assert!(normalize_flag_names(&["sideways"]).is_err());
/// ```
pub fn normalize_flag_names(names: &[&str]) -> Result<Vec<TraceFlag>, FlagError> {
    let mut expanded = Vec::with_capacity(names.len());
    for name in names {
        expanded.extend(expand_alias(name)?);
    }
    Ok(normalize_flags(&expanded))
}
