//! Target normalization
//!
//! Maps every caller-supplied filter-target shape to the canonical
//! module/function/arity form with explicit wildcards.

use entities_trace::{CallTarget, FunTarget};
use std::fmt;

/// Target normalization errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The function reference carries no defining module
    LocalFunRef(String),
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::LocalFunRef(name) => {
                write!(f, "function reference {} is not external", name)
            }
        }
    }
}

impl std::error::Error for TargetError {}

/// Normalize a filter target
///
/// A bare module widens to full wildcards, a module/function pair widens
/// to every arity, a qualified triple passes through unchanged, and an
/// external function reference resolves to its one qualified triple. A
/// reference that is not external is rejected: it has no stable
/// module-qualified identity.
///
/// # Examples
/// ```
/// use usecases_normalization::normalize_target;
/// use entities_trace::{CallTarget, FunTarget};
///
/// let t = normalize_target(&FunTarget::Module("lists".to_string())).unwrap();
/// assert_eq!(t, CallTarget::module("lists"));
/// ```
pub fn normalize_target(target: &FunTarget) -> Result<CallTarget, TargetError> {
    match target {
        FunTarget::Module(module) => Ok(CallTarget::module(module)),
        FunTarget::Function { module, function } => Ok(CallTarget::function(module, function)),
        FunTarget::Qualified {
            module,
            function,
            arity,
        } => Ok(CallTarget::qualified(module, function, *arity)),
        FunTarget::FunRef(fun_ref) => match &fun_ref.module {
            Some(module) => Ok(CallTarget::qualified(module, &fun_ref.function, fun_ref.arity)),
            None => Err(TargetError::LocalFunRef(format!(
                "{}/{}",
                fun_ref.function, fun_ref.arity
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_trace::FunRef;

    #[test]
    fn test_module_widens_to_wildcards() {
        let t = normalize_target(&FunTarget::Module("lists".to_string())).unwrap();
        assert_eq!(t.function, None);
        assert_eq!(t.arity, None);
    }

    #[test]
    fn test_pair_widens_arity() {
        let t = normalize_target(&FunTarget::Function {
            module: "lists".to_string(),
            function: "map".to_string(),
        })
        .unwrap();
        assert_eq!(t, CallTarget::function("lists", "map"));
    }

    #[test]
    fn test_triple_is_identity() {
        let t = normalize_target(&FunTarget::Qualified {
            module: "lists".to_string(),
            function: "map".to_string(),
            arity: 2,
        })
        .unwrap();
        assert_eq!(t, CallTarget::qualified("lists", "map", 2));
    }

    #[test]
    fn test_external_fun_ref_resolves() {
        let t = normalize_target(&FunTarget::FunRef(FunRef {
            module: Some("lists".to_string()),
            function: "seq".to_string(),
            arity: 2,
        }))
        .unwrap();
        assert_eq!(t, CallTarget::qualified("lists", "seq", 2));
    }

    #[test]
    fn test_local_fun_ref_rejected() {
        let err = normalize_target(&FunTarget::FunRef(FunRef {
            module: None,
            function: "loop".to_string(),
            arity: 1,
        }))
        .unwrap_err();
        assert_eq!(err, TargetError::LocalFunRef("loop/1".to_string()));
    }
}
