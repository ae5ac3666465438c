//! Per-node tracer engine
//!
//! One node's tracer state: its process population and their trace
//! flags, the module index filters match against, the installed filter
//! set, and the buffered event output waiting for a drain.
//!
//! The engine answers the canonical commands with plain match counts;
//! turning those into per-node replies is the control process's job.

use crate::sink::TraceSink;
use adapters_resolution::NameRegistry;
use entities_terms::{NodeName, Pid, Term};
use entities_trace::{CallTarget, FlagTarget, MatchClause, TraceFlag};
use infrastructure_pattern_store::codec::encode_frame;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

/// One installed call filter
#[derive(Debug, Clone)]
pub struct InstalledFilter {
    /// The functions the filter applies to
    pub target: CallTarget,
    /// The compiled program
    pub program: Vec<MatchClause>,
    /// Whether local (non-exported) calls match too
    pub local: bool,
}

struct ProcState {
    flags: HashSet<TraceFlag>,
}

/// One node's tracer state
pub struct NodeEngine {
    name: NodeName,
    registry: NameRegistry,
    procs: RwLock<HashMap<u64, ProcState>>,
    next_pid: AtomicU64,
    spawn_flags: RwLock<HashSet<TraceFlag>>,
    modules: RwLock<HashMap<String, Vec<(String, u32)>>>,
    installed: RwLock<Vec<InstalledFilter>>,
    buffer: Mutex<Vec<Term>>,
    sink: RwLock<Option<TraceSink>>,
}

impl NodeEngine {
    /// Create an engine for the named node
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            registry: NameRegistry::new(),
            procs: RwLock::new(HashMap::new()),
            next_pid: AtomicU64::new(1),
            spawn_flags: RwLock::new(HashSet::new()),
            modules: RwLock::new(HashMap::new()),
            installed: RwLock::new(Vec::new()),
            buffer: Mutex::new(Vec::new()),
            sink: RwLock::new(None),
        }
    }

    /// The node's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node's name registry
    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    /// Start a process; it inherits the node's spawn-default flags
    pub fn spawn_proc(&self) -> Pid {
        let num = self.next_pid.fetch_add(1, Ordering::AcqRel);
        let flags = self.spawn_flags.read().unwrap().clone();
        self.procs.write().unwrap().insert(num, ProcState { flags });
        Pid::new(&self.name, num)
    }

    /// Terminate a process; true if it existed
    pub fn kill_proc(&self, pid: &Pid) -> bool {
        pid.is_on(&self.name) && self.procs.write().unwrap().remove(&pid.num).is_some()
    }

    /// Number of live processes
    pub fn proc_count(&self) -> u64 {
        self.procs.read().unwrap().len() as u64
    }

    /// A process's current flags, canonical order
    pub fn proc_flags(&self, pid: &Pid) -> Option<Vec<TraceFlag>> {
        let procs = self.procs.read().unwrap();
        let state = procs.get(&pid.num)?;
        Some(
            TraceFlag::ALL
                .iter()
                .copied()
                .filter(|f| state.flags.contains(f))
                .collect(),
        )
    }

    /// Register a module and its functions in the match index
    pub fn define_module(&self, module: &str, functions: &[(&str, u32)]) {
        self.modules.write().unwrap().insert(
            module.to_string(),
            functions
                .iter()
                .map(|(f, a)| (f.to_string(), *a))
                .collect(),
        );
    }

    /// Number of indexed functions a target matches
    pub fn match_count(&self, target: &CallTarget) -> u64 {
        let modules = self.modules.read().unwrap();
        let functions = match modules.get(&target.module) {
            Some(functions) => functions,
            None => return 0,
        };
        functions
            .iter()
            .filter(|(name, arity)| {
                target.function.as_deref().map_or(true, |f| f == name)
                    && target.arity.map_or(true, |a| a == *arity)
            })
            .count() as u64
    }

    /// Enable trace flags on the selected processes
    ///
    /// Returns the number of processes affected. The class selectors
    /// also adjust the spawn-default flag set: `All` and `New` make
    /// future processes inherit the flags.
    pub fn apply_flags(&self, target: &FlagTarget, flags: &[TraceFlag]) -> Result<u64, Term> {
        match target {
            FlagTarget::One(pid) => {
                let mut procs = self.procs.write().unwrap();
                let state = procs
                    .get_mut(&pid.num)
                    .filter(|_| pid.is_on(&self.name))
                    .ok_or_else(|| Term::atom("no_such_process"))?;
                state.flags.extend(flags.iter().copied());
                Ok(1)
            }
            FlagTarget::New => {
                self.spawn_flags.write().unwrap().extend(flags.iter().copied());
                Ok(0)
            }
            FlagTarget::Existing => Ok(self.flag_all(flags)),
            FlagTarget::All => {
                self.spawn_flags.write().unwrap().extend(flags.iter().copied());
                Ok(self.flag_all(flags))
            }
        }
    }

    fn flag_all(&self, flags: &[TraceFlag]) -> u64 {
        let mut procs = self.procs.write().unwrap();
        for state in procs.values_mut() {
            state.flags.extend(flags.iter().copied());
        }
        procs.len() as u64
    }

    /// Remove every trace flag from the selected processes
    pub fn clear_flags(&self, target: &FlagTarget) -> Result<u64, Term> {
        match target {
            FlagTarget::One(pid) => {
                let mut procs = self.procs.write().unwrap();
                let state = procs
                    .get_mut(&pid.num)
                    .filter(|_| pid.is_on(&self.name))
                    .ok_or_else(|| Term::atom("no_such_process"))?;
                state.flags.clear();
                Ok(1)
            }
            FlagTarget::New => {
                self.spawn_flags.write().unwrap().clear();
                Ok(0)
            }
            FlagTarget::Existing => Ok(self.unflag_all()),
            FlagTarget::All => {
                self.spawn_flags.write().unwrap().clear();
                Ok(self.unflag_all())
            }
        }
    }

    fn unflag_all(&self) -> u64 {
        let mut procs = self.procs.write().unwrap();
        for state in procs.values_mut() {
            state.flags.clear();
        }
        procs.len() as u64
    }

    /// Install a call filter, replacing any filter on the same target
    pub fn install(&self, target: &CallTarget, program: Vec<MatchClause>, local: bool) -> u64 {
        let mut installed = self.installed.write().unwrap();
        installed.retain(|filter| filter.target != *target);
        installed.push(InstalledFilter {
            target: target.clone(),
            program,
            local,
        });
        self.match_count(target)
    }

    /// Remove every filter the target covers
    pub fn remove(&self, target: &CallTarget) -> u64 {
        let mut installed = self.installed.write().unwrap();
        installed.retain(|filter| !target.covers(&filter.target));
        self.match_count(target)
    }

    /// Number of installed filters
    pub fn installed_count(&self) -> usize {
        self.installed.read().unwrap().len()
    }

    /// Observe a call; buffers an event if the call is traced
    ///
    /// Returns true when an event was buffered. The process must carry
    /// the call flag, some installed filter must cover the function, and
    /// the filter's program head must match the argument list. A silent
    /// process matches without emitting.
    pub fn record_call(&self, pid: &Pid, module: &str, function: &str, args: &[Term]) -> bool {
        let (traced, silent, arity_only) = {
            let procs = self.procs.read().unwrap();
            match procs.get(&pid.num).filter(|_| pid.is_on(&self.name)) {
                Some(state) => (
                    state.flags.contains(&TraceFlag::Call),
                    state.flags.contains(&TraceFlag::Silent),
                    state.flags.contains(&TraceFlag::Arity),
                ),
                None => return false,
            }
        };
        if !traced {
            return false;
        }
        let call = CallTarget::qualified(module, function, args.len() as u32);
        let matched = {
            let installed = self.installed.read().unwrap();
            installed.iter().any(|filter| {
                filter.target.covers(&call)
                    && filter
                        .program
                        .iter()
                        .any(|clause| head_matches(&clause.head, args))
            })
        };
        if !matched || silent {
            return false;
        }
        let payload = if arity_only {
            Term::int(args.len() as i64)
        } else {
            Term::list(args.to_vec())
        };
        let event = Term::tuple(vec![
            Term::atom("trace"),
            Term::Pid(pid.clone()),
            Term::atom("call"),
            Term::tuple(vec![
                Term::atom(module),
                Term::atom(function),
                payload,
            ]),
        ]);
        self.buffer.lock().unwrap().push(event);
        true
    }

    /// Number of buffered events
    pub fn buffered_count(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    /// Point drained output at a sink (or detach it)
    pub fn set_sink(&self, sink: Option<TraceSink>) {
        *self.sink.write().unwrap() = sink;
    }

    /// Deliver buffered events to the sink
    ///
    /// A no-op returning zero when no sink is attached. On a sink
    /// failure the buffer is kept so a later drain can retry.
    pub fn drain(&self) -> Result<usize, Term> {
        let sink = match self.sink.read().unwrap().clone() {
            Some(sink) => sink,
            None => return Ok(0),
        };
        let mut buffer = self.buffer.lock().unwrap();
        if buffer.is_empty() {
            return Ok(0);
        }
        let mut bytes = Vec::new();
        for event in buffer.iter() {
            bytes.extend_from_slice(&encode_frame(event));
        }
        sink.write_all(&bytes)?;
        let drained = buffer.len();
        buffer.clear();
        Ok(drained)
    }
}

fn head_matches(head: &Term, args: &[Term]) -> bool {
    match head {
        Term::Var(_) => true,
        Term::Nil => args.is_empty(),
        Term::List(patterns) => {
            patterns.len() == args.len()
                && patterns
                    .iter()
                    .zip(args.iter())
                    .all(|(pattern, value)| term_matches(pattern, value))
        }
        _ => false,
    }
}

fn term_matches(pattern: &Term, value: &Term) -> bool {
    match pattern {
        Term::Var(_) => true,
        Term::Tuple(patterns) => match value.as_tuple() {
            Some(values) => {
                patterns.len() == values.len()
                    && patterns
                        .iter()
                        .zip(values.iter())
                        .all(|(p, v)| term_matches(p, v))
            }
            None => false,
        },
        Term::List(patterns) => match value {
            Term::List(values) => {
                patterns.len() == values.len()
                    && patterns
                        .iter()
                        .zip(values.iter())
                        .all(|(p, v)| term_matches(p, v))
            }
            Term::Nil => patterns.is_empty(),
            _ => false,
        },
        other => other == value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_module() -> NodeEngine {
        let engine = NodeEngine::new("alpha@host");
        engine.define_module("lists", &[("map", 2), ("seq", 2), ("seq", 3)]);
        engine
    }

    #[test]
    fn test_spawn_and_flags() {
        let engine = engine_with_module();
        let pid = engine.spawn_proc();
        assert_eq!(engine.proc_count(), 1);
        assert_eq!(engine.proc_flags(&pid), Some(vec![]));

        let n = engine
            .apply_flags(&FlagTarget::One(pid.clone()), &[TraceFlag::Send])
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(engine.proc_flags(&pid), Some(vec![TraceFlag::Send]));
    }

    #[test]
    fn test_unknown_pid_is_an_error() {
        let engine = engine_with_module();
        let err = engine
            .apply_flags(
                &FlagTarget::One(Pid::new("alpha@host", 99)),
                &[TraceFlag::Send],
            )
            .unwrap_err();
        assert_eq!(err, Term::atom("no_such_process"));
    }

    #[test]
    fn test_class_selectors() {
        let engine = engine_with_module();
        engine.spawn_proc();
        engine.spawn_proc();

        assert_eq!(
            engine
                .apply_flags(&FlagTarget::Existing, &[TraceFlag::Call])
                .unwrap(),
            2
        );
        assert_eq!(
            engine.apply_flags(&FlagTarget::New, &[TraceFlag::Send]).unwrap(),
            0
        );
        // a process spawned after "new" inherits the spawn flags
        let pid = engine.spawn_proc();
        assert_eq!(engine.proc_flags(&pid), Some(vec![TraceFlag::Send]));

        assert_eq!(
            engine.apply_flags(&FlagTarget::All, &[TraceFlag::Receive]).unwrap(),
            3
        );
        let later = engine.spawn_proc();
        let flags = engine.proc_flags(&later).unwrap();
        assert!(flags.contains(&TraceFlag::Send));
        assert!(flags.contains(&TraceFlag::Receive));
    }

    #[test]
    fn test_clear_removes_everything() {
        let engine = engine_with_module();
        let pid = engine.spawn_proc();
        engine
            .apply_flags(&FlagTarget::All, &[TraceFlag::Send, TraceFlag::Call])
            .unwrap();
        assert_eq!(engine.clear_flags(&FlagTarget::All).unwrap(), 1);
        assert_eq!(engine.proc_flags(&pid), Some(vec![]));
        // spawn defaults are gone too
        let fresh = engine.spawn_proc();
        assert_eq!(engine.proc_flags(&fresh), Some(vec![]));
    }

    #[test]
    fn test_match_count_wildcards() {
        let engine = engine_with_module();
        assert_eq!(engine.match_count(&CallTarget::module("lists")), 3);
        assert_eq!(engine.match_count(&CallTarget::function("lists", "seq")), 2);
        assert_eq!(engine.match_count(&CallTarget::qualified("lists", "map", 2)), 1);
        assert_eq!(engine.match_count(&CallTarget::module("dict")), 0);
    }

    #[test]
    fn test_install_replaces_same_target() {
        let engine = engine_with_module();
        let target = CallTarget::function("lists", "seq");
        engine.install(&target, vec![MatchClause::wildcard(vec![])], false);
        engine.install(&target, vec![MatchClause::wildcard(vec![])], true);
        assert_eq!(engine.installed_count(), 1);
    }

    #[test]
    fn test_remove_covers_narrower_targets() {
        let engine = engine_with_module();
        engine.install(
            &CallTarget::qualified("lists", "map", 2),
            vec![MatchClause::wildcard(vec![])],
            false,
        );
        engine.install(
            &CallTarget::qualified("lists", "seq", 2),
            vec![MatchClause::wildcard(vec![])],
            false,
        );
        let n = engine.remove(&CallTarget::module("lists"));
        assert_eq!(n, 3);
        assert_eq!(engine.installed_count(), 0);
    }

    #[test]
    fn test_record_call_needs_flag_and_filter() {
        let engine = engine_with_module();
        let pid = engine.spawn_proc();

        // no call flag yet
        assert!(!engine.record_call(&pid, "lists", "map", &[Term::int(1), Term::Nil]));

        engine
            .apply_flags(&FlagTarget::One(pid.clone()), &[TraceFlag::Call])
            .unwrap();
        // no filter yet
        assert!(!engine.record_call(&pid, "lists", "map", &[Term::int(1), Term::Nil]));

        engine.install(
            &CallTarget::module("lists"),
            vec![MatchClause::wildcard(vec![])],
            false,
        );
        assert!(engine.record_call(&pid, "lists", "map", &[Term::int(1), Term::Nil]));
        assert_eq!(engine.buffered_count(), 1);
    }

    #[test]
    fn test_record_call_head_match() {
        let engine = engine_with_module();
        let pid = engine.spawn_proc();
        engine
            .apply_flags(&FlagTarget::One(pid.clone()), &[TraceFlag::Call])
            .unwrap();
        engine.install(
            &CallTarget::function("lists", "seq"),
            vec![MatchClause {
                head: Term::list(vec![Term::int(1), Term::var("$2")]),
                guards: vec![],
                body: vec![],
            }],
            false,
        );
        assert!(engine.record_call(&pid, "lists", "seq", &[Term::int(1), Term::int(9)]));
        assert!(!engine.record_call(&pid, "lists", "seq", &[Term::int(2), Term::int(9)]));
    }

    #[test]
    fn test_silent_process_matches_without_event() {
        let engine = engine_with_module();
        let pid = engine.spawn_proc();
        engine
            .apply_flags(
                &FlagTarget::One(pid.clone()),
                &[TraceFlag::Call, TraceFlag::Silent],
            )
            .unwrap();
        engine.install(
            &CallTarget::module("lists"),
            vec![MatchClause::wildcard(vec![])],
            false,
        );
        assert!(!engine.record_call(&pid, "lists", "map", &[Term::Nil, Term::Nil]));
        assert_eq!(engine.buffered_count(), 0);
    }

    #[test]
    fn test_arity_flag_records_count_not_args() {
        let engine = engine_with_module();
        let pid = engine.spawn_proc();
        engine
            .apply_flags(
                &FlagTarget::One(pid.clone()),
                &[TraceFlag::Call, TraceFlag::Arity],
            )
            .unwrap();
        engine.install(
            &CallTarget::module("lists"),
            vec![MatchClause::wildcard(vec![])],
            false,
        );
        engine.record_call(&pid, "lists", "map", &[Term::int(1), Term::int(2)]);

        let (sink, buffer) = TraceSink::memory();
        engine.set_sink(Some(sink));
        assert_eq!(engine.drain().unwrap(), 1);

        let bytes = buffer.lock().unwrap().clone();
        let mut index = 0;
        let event = infrastructure_pattern_store::codec::next_frame(&bytes, &mut index)
            .unwrap()
            .unwrap();
        let parts = event.as_tuple().unwrap();
        let mfa = parts[3].as_tuple().unwrap();
        assert_eq!(mfa[2], Term::int(2));
    }

    #[test]
    fn test_drain_without_sink_is_noop() {
        let engine = engine_with_module();
        let pid = engine.spawn_proc();
        engine
            .apply_flags(&FlagTarget::One(pid.clone()), &[TraceFlag::Call])
            .unwrap();
        engine.install(
            &CallTarget::module("lists"),
            vec![MatchClause::wildcard(vec![])],
            false,
        );
        engine.record_call(&pid, "lists", "map", &[Term::Nil, Term::Nil]);
        assert_eq!(engine.drain().unwrap(), 0);
        assert_eq!(engine.buffered_count(), 1);
    }

    #[test]
    fn test_drain_failure_keeps_buffer() {
        let engine = engine_with_module();
        let pid = engine.spawn_proc();
        engine
            .apply_flags(&FlagTarget::One(pid.clone()), &[TraceFlag::Call])
            .unwrap();
        engine.install(
            &CallTarget::module("lists"),
            vec![MatchClause::wildcard(vec![])],
            false,
        );
        engine.record_call(&pid, "lists", "map", &[Term::Nil, Term::Nil]);

        let dir = tempfile::tempdir().unwrap();
        engine.set_sink(Some(TraceSink::file(dir.path())));
        assert!(engine.drain().is_err());
        assert_eq!(engine.buffered_count(), 1);
    }

    #[test]
    fn test_kill_proc() {
        let engine = engine_with_module();
        let pid = engine.spawn_proc();
        assert!(engine.kill_proc(&pid));
        assert!(!engine.kill_proc(&pid));
        assert_eq!(engine.proc_count(), 0);
    }
}
