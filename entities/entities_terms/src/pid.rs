//! Process identifiers
//!
//! Provides the process identifier type used to address processes across
//! the cluster. A pid is always qualified by the name of the node that
//! owns the process.

use std::fmt;

/// Name of a cluster node
pub type NodeName = String;

/// Process identifier
///
/// Identifies one process on one node. The numeric part is unique within
/// the owning node only; equality therefore compares both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pid {
    /// Name of the node the process lives on
    pub node: NodeName,
    /// Process number, unique within the node
    pub num: u64,
}

impl Pid {
    /// Create a new pid
    pub fn new(node: &str, num: u64) -> Self {
        Self {
            node: node.to_string(),
            num,
        }
    }

    /// True if the process lives on the given node
    pub fn is_on(&self, node: &str) -> bool {
        self.node == node
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}.{}>", self.node, self.num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_new() {
        let pid = Pid::new("alpha@host", 7);
        assert_eq!(pid.node, "alpha@host");
        assert_eq!(pid.num, 7);
    }

    #[test]
    fn test_pid_is_on() {
        let pid = Pid::new("alpha@host", 1);
        assert!(pid.is_on("alpha@host"));
        assert!(!pid.is_on("beta@host"));
    }

    #[test]
    fn test_pid_display() {
        let pid = Pid::new("alpha@host", 42);
        assert_eq!(pid.to_string(), "<alpha@host.42>");
    }
}
