//! Callable-surface targets
//!
//! Provides the shapes a caller can use to name the functions a filter
//! applies to, plus the canonical module/function/arity form with
//! explicit wildcards.

use std::fmt;

/// A function reference, as captured from a caller
///
/// External references carry their defining module; a reference without
/// one has no stable module-qualified identity and cannot be used as a
/// filter target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunRef {
    /// Defining module, present only for external references
    pub module: Option<String>,
    /// Function name
    pub function: String,
    /// Number of arguments
    pub arity: u32,
}

/// Caller-supplied filter target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunTarget {
    /// Every function in a module
    Module(String),
    /// Every arity of one function
    Function { module: String, function: String },
    /// One fully qualified function
    Qualified {
        module: String,
        function: String,
        arity: u32,
    },
    /// A captured function reference (must be external)
    FunRef(FunRef),
}

/// Canonical filter target; `None` fields are wildcards
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallTarget {
    /// Module name
    pub module: String,
    /// Function name, or every function
    pub function: Option<String>,
    /// Arity, or every arity
    pub arity: Option<u32>,
}

impl CallTarget {
    /// Target every function in a module
    pub fn module(module: &str) -> Self {
        Self {
            module: module.to_string(),
            function: None,
            arity: None,
        }
    }

    /// Target every arity of one function
    pub fn function(module: &str, function: &str) -> Self {
        Self {
            module: module.to_string(),
            function: Some(function.to_string()),
            arity: None,
        }
    }

    /// Target one fully qualified function
    pub fn qualified(module: &str, function: &str, arity: u32) -> Self {
        Self {
            module: module.to_string(),
            function: Some(function.to_string()),
            arity: Some(arity),
        }
    }

    /// True if `other` falls inside this target's wildcard range
    pub fn covers(&self, other: &CallTarget) -> bool {
        if self.module != other.module {
            return false;
        }
        if let Some(f) = &self.function {
            if other.function.as_ref() != Some(f) {
                return false;
            }
        }
        if let Some(a) = self.arity {
            if other.arity != Some(a) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let function = self.function.as_deref().unwrap_or("_");
        match self.arity {
            Some(a) => write!(f, "{}:{}/{}", self.module, function, a),
            None => write!(f, "{}:{}/_", self.module, function),
        }
    }
}
