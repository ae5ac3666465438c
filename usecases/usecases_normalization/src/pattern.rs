//! Pattern normalization
//!
//! Compiles every legal pattern shape into the canonical form the
//! tracer accepts: a saved-id reference, or a clause program. Saved ids
//! pass through untouched; the runtime already knows how to interpret
//! them.

use crate::clause_source;
use entities_terms::Term;
use entities_trace::{CanonicalPattern, MatchClause, Pattern, TraceOption};
use std::fmt;

/// Pattern normalization errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A term that is not a side-effect option
    BadOption(String),
    /// A term that is not a head/guards/body clause
    BadClause(String),
    /// Source text that does not parse to one program
    Source(String),
    /// A term that is neither an option list nor a clause list
    BadShape(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::BadOption(what) => write!(f, "bad pattern option: {}", what),
            PatternError::BadClause(what) => write!(f, "bad filter clause: {}", what),
            PatternError::Source(what) => write!(f, "bad pattern source: {}", what),
            PatternError::BadShape(what) => write!(f, "bad pattern shape: {}", what),
        }
    }
}

impl std::error::Error for PatternError {}

/// Compile an option list into its one-clause program
///
/// The match is the wildcard, the guard is empty, and the body is
/// exactly the given options.
pub fn options_program(options: &[TraceOption]) -> Vec<MatchClause> {
    vec![MatchClause::wildcard(
        options.iter().map(TraceOption::body_term).collect(),
    )]
}

/// Decode a clause-list term into a program
///
/// The term must be a list of `{head, guards, body}` 3-tuples with
/// list-shaped guards and body.
pub fn clauses_from_term(term: &Term) -> Result<Vec<MatchClause>, PatternError> {
    let elements = term
        .as_list()
        .ok_or_else(|| PatternError::BadShape(term.to_string()))?;
    let mut clauses = Vec::with_capacity(elements.len());
    for element in elements {
        let parts = element
            .as_tuple()
            .filter(|parts| parts.len() == 3)
            .ok_or_else(|| PatternError::BadClause(element.to_string()))?;
        let guards = parts[1]
            .as_list()
            .ok_or_else(|| PatternError::BadClause(element.to_string()))?;
        let body = parts[2]
            .as_list()
            .ok_or_else(|| PatternError::BadClause(element.to_string()))?;
        clauses.push(MatchClause {
            head: parts[0].clone(),
            guards: guards.to_vec(),
            body: body.to_vec(),
        });
    }
    Ok(clauses)
}

/// Normalize a filter pattern
///
/// - a saved or built-in id passes through as a reference
/// - absence means the empty option list
/// - a single option becomes a singleton option list
/// - an option list compiles to one wildcard clause carrying the options
/// - structured clauses compile as given
/// - source text must parse to exactly one clause-list term
/// - a transform is applied to the wildcard argument binding
///
/// # Examples
/// ```
/// use usecases_normalization::normalize_pattern;
/// use entities_trace::{CanonicalPattern, Pattern, TraceOption};
///
/// let p = normalize_pattern(Some(&Pattern::Option(TraceOption::Return))).unwrap();
/// match p {
///     CanonicalPattern::Program(clauses) => assert_eq!(clauses.len(), 1),
///     CanonicalPattern::Ref(_) => unreachable!(),
/// }
/// ```
pub fn normalize_pattern(pattern: Option<&Pattern>) -> Result<CanonicalPattern, PatternError> {
    let pattern = match pattern {
        None => return Ok(CanonicalPattern::Program(options_program(&[]))),
        Some(p) => p,
    };
    match pattern {
        Pattern::Id(id) => Ok(CanonicalPattern::Ref(*id)),
        Pattern::Option(option) => Ok(CanonicalPattern::Program(options_program(&[*option]))),
        Pattern::Options(options) => Ok(CanonicalPattern::Program(options_program(options))),
        Pattern::Clauses(clauses) => Ok(CanonicalPattern::Program(clauses.clone())),
        Pattern::Source(src) => {
            let term = clause_source::parse_one(src)
                .map_err(|e| PatternError::Source(e.to_string()))?;
            Ok(CanonicalPattern::Program(clauses_from_term(&term)?))
        }
        Pattern::Build(build) => {
            let clauses = build(&Term::wildcard());
            Ok(CanonicalPattern::Program(clauses))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_trace::PatternId;

    fn program(p: CanonicalPattern) -> Vec<MatchClause> {
        match p {
            CanonicalPattern::Program(clauses) => clauses,
            CanonicalPattern::Ref(id) => panic!("expected program, got ref {}", id),
        }
    }

    #[test]
    fn test_saved_id_passes_through() {
        let p = normalize_pattern(Some(&Pattern::Id(PatternId::Saved(4)))).unwrap();
        assert_eq!(p, CanonicalPattern::Ref(PatternId::Saved(4)));

        let p = normalize_pattern(Some(&Pattern::Id(PatternId::CallerException))).unwrap();
        assert_eq!(p, CanonicalPattern::Ref(PatternId::CallerException));
    }

    #[test]
    fn test_absent_is_empty_option_list() {
        let clauses = program(normalize_pattern(None).unwrap());
        assert_eq!(clauses, vec![MatchClause::wildcard(vec![])]);
    }

    #[test]
    fn test_single_option_wraps() {
        let single = normalize_pattern(Some(&Pattern::Option(TraceOption::Caller))).unwrap();
        let list = normalize_pattern(Some(&Pattern::Options(vec![TraceOption::Caller]))).unwrap();
        assert_eq!(single, list);
    }

    #[test]
    fn test_option_list_compiles_to_wildcard_clause() {
        let clauses = program(
            normalize_pattern(Some(&Pattern::Options(vec![
                TraceOption::Return,
                TraceOption::Silent(true),
            ])))
            .unwrap(),
        );
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].head, Term::wildcard());
        assert!(clauses[0].guards.is_empty());
        assert_eq!(
            clauses[0].body,
            vec![
                Term::atom("return"),
                Term::tuple(vec![Term::atom("silent"), Term::atom("true")]),
            ]
        );
    }

    #[test]
    fn test_clauses_pass_through() {
        let given = vec![MatchClause {
            head: Term::list(vec![Term::var("$1")]),
            guards: vec![Term::tuple(vec![
                Term::atom(">"),
                Term::var("$1"),
                Term::int(3),
            ])],
            body: vec![Term::atom("return")],
        }];
        let clauses =
            program(normalize_pattern(Some(&Pattern::Clauses(given.clone()))).unwrap());
        assert_eq!(clauses, given);
    }

    #[test]
    fn test_source_compiles() {
        let clauses = program(
            normalize_pattern(Some(&Pattern::Source(
                "[{'_',[],[return]}]".to_string(),
            )))
            .unwrap(),
        );
        assert_eq!(clauses, vec![MatchClause::wildcard(vec![Term::atom("return")])]);
    }

    #[test]
    fn test_source_must_be_one_program() {
        let err = normalize_pattern(Some(&Pattern::Source("[] []".to_string()))).unwrap_err();
        assert!(matches!(err, PatternError::Source(_)));

        let err = normalize_pattern(Some(&Pattern::Source("return".to_string()))).unwrap_err();
        assert!(matches!(err, PatternError::BadShape(_)));
    }

    #[test]
    fn test_source_bad_clause_shape() {
        let err =
            normalize_pattern(Some(&Pattern::Source("[{a,b}]".to_string()))).unwrap_err();
        assert!(matches!(err, PatternError::BadClause(_)));
    }

    #[test]
    fn test_build_applies_wildcard_binding() {
        fn build(args: &Term) -> Vec<MatchClause> {
            vec![MatchClause {
                head: args.clone(),
                guards: vec![],
                body: vec![Term::atom("caller")],
            }]
        }
        let clauses = program(normalize_pattern(Some(&Pattern::Build(build))).unwrap());
        assert_eq!(clauses, vec![MatchClause::wildcard(vec![Term::atom("caller")])]);
    }
}
