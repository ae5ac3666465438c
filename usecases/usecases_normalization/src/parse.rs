//! Loose-input parsers
//!
//! Fallible constructors from untyped [`Term`] input for every input
//! family. Outer boundaries (shells, APIs) hand their loosest
//! representation to these parsers; everything past this point works on
//! the closed typed shapes only.
//!
//! The option-list / clause-literal split for patterns is decided by the
//! shape of the list's first element alone: a bare option atom or a
//! keyed pair tagged `silent`/`trace`/`clear` selects the option branch,
//! a 3-tuple selects the clause branch. The two forms stay mutually
//! exclusive only as long as no option kind is itself a 3-tuple.

use crate::flags::{expand_alias, normalize_flags, FlagError};
use crate::pattern::{clauses_from_term, PatternError};
use entities_terms::Term;
use entities_trace::{FunTarget, Pattern, PatternId, ProcessRef, TraceFlag, TraceItem, TraceOption};
use std::fmt;

/// Loose-input parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not a trace-target selector
    BadItem(String),
    /// Not a filter target
    BadTarget(String),
    /// Not a filter pattern
    BadPattern(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadItem(what) => write!(f, "bad trace item: {}", what),
            ParseError::BadTarget(what) => write!(f, "bad filter target: {}", what),
            ParseError::BadPattern(what) => write!(f, "bad filter pattern: {}", what),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a trace-target selector
///
/// Accepts the class atoms, a pid, a registered-name atom, a
/// `{name, node}` pair, `{global, name}` and `{via, resolver, key}`.
pub fn item_from_term(term: &Term) -> Result<TraceItem, ParseError> {
    match term {
        Term::Atom(a) if a == "all" => Ok(TraceItem::All),
        Term::Atom(a) if a == "new" => Ok(TraceItem::New),
        Term::Atom(a) if a == "existing" => Ok(TraceItem::Existing),
        Term::Atom(name) => Ok(TraceItem::Proc(ProcessRef::Name(name.clone()))),
        Term::Pid(pid) => Ok(TraceItem::Proc(ProcessRef::Pid(pid.clone()))),
        Term::Tuple(parts) => match parts.as_slice() {
            [Term::Atom(tag), Term::Atom(name)] if tag == "global" => {
                Ok(TraceItem::Proc(ProcessRef::Global(name.clone())))
            }
            [Term::Atom(tag), Term::Atom(resolver), key] if tag == "via" => {
                Ok(TraceItem::Proc(ProcessRef::Via {
                    resolver: resolver.clone(),
                    key: key.clone(),
                }))
            }
            [Term::Atom(name), Term::Atom(node)] => Ok(TraceItem::Proc(ProcessRef::NameOn {
                name: name.clone(),
                node: node.clone(),
            })),
            _ => Err(ParseError::BadItem(term.to_string())),
        },
        _ => Err(ParseError::BadItem(term.to_string())),
    }
}

/// Parse a flag set: one flag name, or a list of flag names
pub fn flags_from_term(term: &Term) -> Result<Vec<TraceFlag>, FlagError> {
    match term {
        Term::Atom(name) => Ok(normalize_flags(&expand_alias(name)?)),
        Term::List(elements) => {
            let mut expanded = Vec::with_capacity(elements.len());
            for element in elements {
                match element {
                    Term::Atom(name) => expanded.extend(expand_alias(name)?),
                    other => return Err(FlagError::BadShape(other.to_string())),
                }
            }
            Ok(normalize_flags(&expanded))
        }
        other => Err(FlagError::BadShape(other.to_string())),
    }
}

/// Parse a filter target: a module atom, `{m,f}` or `{m,f,a}`
pub fn target_from_term(term: &Term) -> Result<FunTarget, ParseError> {
    match term {
        Term::Atom(module) => Ok(FunTarget::Module(module.clone())),
        Term::Tuple(parts) => match parts.as_slice() {
            [Term::Atom(module), Term::Atom(function)] => Ok(FunTarget::Function {
                module: module.clone(),
                function: function.clone(),
            }),
            [Term::Atom(module), Term::Atom(function), Term::Int(arity)] if *arity >= 0 => {
                Ok(FunTarget::Qualified {
                    module: module.clone(),
                    function: function.clone(),
                    arity: *arity as u32,
                })
            }
            _ => Err(ParseError::BadTarget(term.to_string())),
        },
        _ => Err(ParseError::BadTarget(term.to_string())),
    }
}

/// True if this term can head an option list
fn is_option_head(term: &Term) -> bool {
    match term {
        Term::Atom(_) => true,
        Term::Tuple(parts) if parts.len() == 2 => matches!(
            parts[0].as_atom(),
            Some("silent") | Some("trace") | Some("clear")
        ),
        _ => false,
    }
}

fn option_from_term(term: &Term) -> Result<TraceOption, ParseError> {
    match term {
        Term::Atom(a) => match a.as_str() {
            "trace" => Ok(TraceOption::Trace),
            "clear" => Ok(TraceOption::Clear),
            "silent" => Ok(TraceOption::Silent(true)),
            "stacktrace" => Ok(TraceOption::Stacktrace),
            "caller" => Ok(TraceOption::Caller),
            "return" => Ok(TraceOption::Return),
            "exception" => Ok(TraceOption::Exception),
            _ => Err(ParseError::BadPattern(term.to_string())),
        },
        Term::Tuple(parts) => match parts.as_slice() {
            [Term::Atom(tag), Term::Atom(value)] if tag == "silent" => match value.as_str() {
                "true" => Ok(TraceOption::Silent(true)),
                "false" => Ok(TraceOption::Silent(false)),
                _ => Err(ParseError::BadPattern(term.to_string())),
            },
            _ => Err(ParseError::BadPattern(term.to_string())),
        },
        _ => Err(ParseError::BadPattern(term.to_string())),
    }
}

/// Parse a filter pattern from its loose form
///
/// Positive integers and the `c`/`x`/`cx` atoms are saved ids; `[]` is
/// the empty option list; a bare option or an option-headed list is an
/// option list; a clause-headed list is a structured program; a binary
/// is program source text.
pub fn pattern_from_term(term: &Term) -> Result<Pattern, ParseError> {
    match term {
        Term::Int(n) if *n > 0 => Ok(Pattern::Id(PatternId::Saved(*n as u32))),
        Term::Int(_) => Err(ParseError::BadPattern(term.to_string())),
        Term::Atom(a) if a == "c" => Ok(Pattern::Id(PatternId::Caller)),
        Term::Atom(a) if a == "x" => Ok(Pattern::Id(PatternId::Exception)),
        Term::Atom(a) if a == "cx" => Ok(Pattern::Id(PatternId::CallerException)),
        Term::Nil => Ok(Pattern::Options(vec![])),
        Term::Atom(_) | Term::Tuple(_) => Ok(Pattern::Option(option_from_term(term)?)),
        Term::Binary(bytes) => match String::from_utf8(bytes.clone()) {
            Ok(src) => Ok(Pattern::Source(src)),
            Err(_) => Err(ParseError::BadPattern(term.to_string())),
        },
        Term::List(elements) => {
            if elements.is_empty() {
                return Ok(Pattern::Options(vec![]));
            }
            if is_option_head(&elements[0]) {
                let mut options = Vec::with_capacity(elements.len());
                for element in elements {
                    options.push(option_from_term(element)?);
                }
                Ok(Pattern::Options(options))
            } else if matches!(&elements[0], Term::Tuple(parts) if parts.len() == 3) {
                let clauses = clauses_from_term(term).map_err(|e: PatternError| {
                    ParseError::BadPattern(e.to_string())
                })?;
                Ok(Pattern::Clauses(clauses))
            } else {
                Err(ParseError::BadPattern(term.to_string()))
            }
        }
        _ => Err(ParseError::BadPattern(term.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_terms::Pid;
    use entities_trace::MatchClause;

    #[test]
    fn test_item_classes() {
        assert_eq!(item_from_term(&Term::atom("all")).unwrap(), TraceItem::All);
        assert_eq!(item_from_term(&Term::atom("new")).unwrap(), TraceItem::New);
        assert_eq!(
            item_from_term(&Term::atom("existing")).unwrap(),
            TraceItem::Existing
        );
    }

    #[test]
    fn test_item_process_shapes() {
        let pid = Pid::new("alpha@host", 3);
        assert_eq!(
            item_from_term(&Term::Pid(pid.clone())).unwrap(),
            TraceItem::Proc(ProcessRef::Pid(pid))
        );
        assert_eq!(
            item_from_term(&Term::atom("logger")).unwrap(),
            TraceItem::Proc(ProcessRef::Name("logger".to_string()))
        );
        assert_eq!(
            item_from_term(&Term::tuple(vec![
                Term::atom("logger"),
                Term::atom("beta@host")
            ]))
            .unwrap(),
            TraceItem::Proc(ProcessRef::NameOn {
                name: "logger".to_string(),
                node: "beta@host".to_string()
            })
        );
        assert_eq!(
            item_from_term(&Term::tuple(vec![Term::atom("global"), Term::atom("boss")]))
                .unwrap(),
            TraceItem::Proc(ProcessRef::Global("boss".to_string()))
        );
        assert_eq!(
            item_from_term(&Term::tuple(vec![
                Term::atom("via"),
                Term::atom("shards"),
                Term::int(4)
            ]))
            .unwrap(),
            TraceItem::Proc(ProcessRef::Via {
                resolver: "shards".to_string(),
                key: Term::int(4)
            })
        );
    }

    #[test]
    fn test_item_rejects_junk() {
        assert!(item_from_term(&Term::int(1)).is_err());
        assert!(item_from_term(&Term::tuple(vec![Term::int(1), Term::int(2)])).is_err());
    }

    #[test]
    fn test_flags_bare_and_list() {
        assert_eq!(
            flags_from_term(&Term::atom("m")).unwrap(),
            vec![TraceFlag::Send, TraceFlag::Receive]
        );
        assert_eq!(
            flags_from_term(&Term::list(vec![Term::atom("s"), Term::atom("send")])).unwrap(),
            vec![TraceFlag::Send]
        );
        assert!(flags_from_term(&Term::int(1)).is_err());
        assert!(flags_from_term(&Term::list(vec![Term::int(1)])).is_err());
    }

    #[test]
    fn test_target_shapes() {
        assert_eq!(
            target_from_term(&Term::atom("lists")).unwrap(),
            FunTarget::Module("lists".to_string())
        );
        assert_eq!(
            target_from_term(&Term::tuple(vec![Term::atom("lists"), Term::atom("map")]))
                .unwrap(),
            FunTarget::Function {
                module: "lists".to_string(),
                function: "map".to_string()
            }
        );
        assert_eq!(
            target_from_term(&Term::tuple(vec![
                Term::atom("lists"),
                Term::atom("map"),
                Term::int(2)
            ]))
            .unwrap(),
            FunTarget::Qualified {
                module: "lists".to_string(),
                function: "map".to_string(),
                arity: 2
            }
        );
        assert!(target_from_term(&Term::tuple(vec![
            Term::atom("lists"),
            Term::atom("map"),
            Term::int(-1)
        ]))
        .is_err());
    }

    #[test]
    fn test_pattern_ids() {
        assert_eq!(
            pattern_from_term(&Term::int(7)).unwrap(),
            Pattern::Id(PatternId::Saved(7))
        );
        assert_eq!(
            pattern_from_term(&Term::atom("c")).unwrap(),
            Pattern::Id(PatternId::Caller)
        );
        assert_eq!(
            pattern_from_term(&Term::atom("x")).unwrap(),
            Pattern::Id(PatternId::Exception)
        );
        assert_eq!(
            pattern_from_term(&Term::atom("cx")).unwrap(),
            Pattern::Id(PatternId::CallerException)
        );
        assert!(pattern_from_term(&Term::int(0)).is_err());
    }

    #[test]
    fn test_pattern_option_branch() {
        assert_eq!(
            pattern_from_term(&Term::atom("return")).unwrap(),
            Pattern::Option(TraceOption::Return)
        );
        assert_eq!(
            pattern_from_term(&Term::list(vec![
                Term::atom("return"),
                Term::tuple(vec![Term::atom("silent"), Term::atom("false")])
            ]))
            .unwrap(),
            Pattern::Options(vec![TraceOption::Return, TraceOption::Silent(false)])
        );
    }

    #[test]
    fn test_pattern_clause_branch() {
        let term = Term::list(vec![Term::tuple(vec![
            Term::wildcard(),
            Term::List(vec![]),
            Term::list(vec![Term::atom("return")]),
        ])]);
        assert_eq!(
            pattern_from_term(&term).unwrap(),
            Pattern::Clauses(vec![MatchClause::wildcard(vec![Term::atom("return")])])
        );
    }

    #[test]
    fn test_pattern_branch_disambiguation_is_head_only() {
        // option-headed list with a malformed later element is still
        // routed to the option branch and rejected there
        let term = Term::list(vec![Term::atom("return"), Term::int(5)]);
        assert!(matches!(
            pattern_from_term(&term),
            Err(ParseError::BadPattern(_))
        ));

        // a keyed silent pair heads an option list, not a clause list
        let term = Term::list(vec![Term::tuple(vec![
            Term::atom("silent"),
            Term::atom("true"),
        ])]);
        assert_eq!(
            pattern_from_term(&term).unwrap(),
            Pattern::Options(vec![TraceOption::Silent(true)])
        );
    }

    #[test]
    fn test_pattern_empty_list_is_empty_options() {
        assert_eq!(
            pattern_from_term(&Term::Nil).unwrap(),
            Pattern::Options(vec![])
        );
        assert_eq!(
            pattern_from_term(&Term::List(vec![])).unwrap(),
            Pattern::Options(vec![])
        );
    }

    #[test]
    fn test_pattern_source_from_binary() {
        assert_eq!(
            pattern_from_term(&Term::Binary(b"[{'_',[],[return]}]".to_vec())).unwrap(),
            Pattern::Source("[{'_',[],[return]}]".to_string())
        );
    }

    #[test]
    fn test_pattern_rejects_mixed_head() {
        let term = Term::list(vec![Term::int(1), Term::int(2)]);
        assert!(pattern_from_term(&term).is_err());
    }
}
