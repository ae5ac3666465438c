//! Trace control facade
//!
//! The operation surface callers use. Every operation builds canonical
//! arguments through the resolver and the normalizer, performs one
//! synchronous exchange with the control process, and folds the
//! per-node reply list into a [`TraceResult`].
//!
//! Operations distinguish three failing outcomes: a reference that
//! named no process, a command the runtime rejected outright, and a
//! control process that died mid-request. Malformed input never reaches
//! the control process; it is rejected at normalization time.

use adapters_resolution::{resolve, GlobalRegistry, NameResolver, ResolveCx, ResolverMap};
use adapters_runtime::{Cluster, NodeEngine};
use entities_terms::{NodeName, Term};
use entities_trace::{
    FlagTarget, FunTarget, MatchClause, Pattern, PatternId, TraceFlag, TraceItem, TraceResult,
};
use infrastructure_control::flush::flush as flush_cluster;
use infrastructure_control::protocol::{self, Reply, Request, RequestError};
use infrastructure_control::server::{start, ControlConfig};
use infrastructure_control::ControlHandle;
use infrastructure_pattern_store::reader::saved_patterns;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use usecases_aggregation::aggregate;
use usecases_normalization::flags::normalize_flags;
use usecases_normalization::parse;
use usecases_normalization::{normalize_pattern, normalize_target};

/// Fatal operation outcomes
#[derive(Debug, Clone, PartialEq)]
pub enum StopError {
    /// The reference named no live process
    NoProcess { op: &'static str, args: String },
    /// The runtime rejected the command
    Runtime { op: &'static str, reason: Term },
    /// The control process terminated mid-request
    Crashed { op: &'static str },
    /// The input was malformed; nothing was sent anywhere
    BadInput { op: &'static str, detail: String },
}

impl fmt::Display for StopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopError::NoProcess { op, args } => {
                write!(f, "{}: no such process: {}", op, args)
            }
            StopError::Runtime { op, reason } => write!(f, "{}: rejected: {}", op, reason),
            StopError::Crashed { op } => write!(f, "{}: control process terminated", op),
            StopError::BadInput { op, detail } => write!(f, "{}: bad input: {}", op, detail),
        }
    }
}

impl std::error::Error for StopError {}

static CONTROL_SEQ: AtomicU64 = AtomicU64::new(1);

/// The trace control facade
///
/// Holds the cluster fabric, the local engine and the name-resolution
/// context. The control process itself is rediscovered by name on every
/// operation, so [`reset`](TraceControl::reset) is transparent to
/// subsequent calls.
pub struct TraceControl {
    cluster: Arc<Cluster>,
    local: Arc<NodeEngine>,
    global: GlobalRegistry,
    resolvers: ResolverMap,
    control_name: String,
}

impl TraceControl {
    /// Create a facade for the named local node
    pub fn new(local_node: &str) -> Self {
        let seq = CONTROL_SEQ.fetch_add(1, Ordering::AcqRel);
        Self {
            cluster: Arc::new(Cluster::new()),
            local: Arc::new(NodeEngine::new(local_node)),
            global: GlobalRegistry::new(),
            resolvers: ResolverMap::new(),
            control_name: format!("trace_control_{}", seq),
        }
    }

    /// The local node's engine
    pub fn local_engine(&self) -> &Arc<NodeEngine> {
        &self.local
    }

    /// The cluster fabric
    pub fn cluster(&self) -> &Arc<Cluster> {
        &self.cluster
    }

    /// The cluster-wide name registry
    pub fn global_registry(&self) -> &GlobalRegistry {
        &self.global
    }

    /// The name the control process registers under
    pub fn control_name(&self) -> &str {
        &self.control_name
    }

    /// Plug in a custom name resolver
    pub fn register_resolver(&mut self, name: &str, resolver: Arc<dyn NameResolver>) {
        self.resolvers.register(name, resolver);
    }

    /// Enable trace flags on the selected processes
    pub fn trace(
        &self,
        item: &TraceItem,
        flags: &[TraceFlag],
    ) -> Result<TraceResult, StopError> {
        let flags = normalize_flags(flags);
        let target = self.resolve_item("trace", item)?;
        let reply = self.exchange("trace", Request::SetFlags { target, flags })?;
        command_result("trace", reply)
    }

    /// Loose-input variant of [`trace`](TraceControl::trace)
    pub fn trace_term(&self, item: &Term, flags: &Term) -> Result<TraceResult, StopError> {
        let item = parse::item_from_term(item).map_err(|e| StopError::BadInput {
            op: "trace",
            detail: e.to_string(),
        })?;
        let flags = parse::flags_from_term(flags).map_err(|e| StopError::BadInput {
            op: "trace",
            detail: e.to_string(),
        })?;
        self.trace(&item, &flags)
    }

    /// Remove every trace flag from the selected processes
    ///
    /// The clear-all sentinel is its own canonical command; no flag
    /// normalization is involved.
    pub fn clear(&self, item: &TraceItem) -> Result<TraceResult, StopError> {
        let target = self.resolve_item("clear", item)?;
        let reply = self.exchange("clear", Request::ClearFlags { target })?;
        command_result("clear", reply)
    }

    /// Install a call filter on globally visible calls
    pub fn call(
        &self,
        target: &FunTarget,
        pattern: Option<&Pattern>,
    ) -> Result<TraceResult, StopError> {
        self.install_filter("call", target, pattern, false)
    }

    /// Install a call filter that matches local calls too
    pub fn local_call(
        &self,
        target: &FunTarget,
        pattern: Option<&Pattern>,
    ) -> Result<TraceResult, StopError> {
        self.install_filter("local_call", target, pattern, true)
    }

    /// Loose-input variant of [`call`](TraceControl::call)
    pub fn call_term(
        &self,
        target: &Term,
        pattern: Option<&Term>,
    ) -> Result<TraceResult, StopError> {
        let target = parse::target_from_term(target).map_err(|e| StopError::BadInput {
            op: "call",
            detail: e.to_string(),
        })?;
        let pattern = match pattern {
            Some(term) => Some(parse::pattern_from_term(term).map_err(|e| {
                StopError::BadInput {
                    op: "call",
                    detail: e.to_string(),
                }
            })?),
            None => None,
        };
        self.call(&target, pattern.as_ref())
    }

    /// Remove the filters a target covers
    pub fn cancel(&self, target: &FunTarget) -> Result<TraceResult, StopError> {
        let target = normalize_target(target).map_err(|e| StopError::BadInput {
            op: "cancel",
            detail: e.to_string(),
        })?;
        let reply = self.exchange("cancel", Request::Remove { target })?;
        command_result("cancel", reply)
    }

    /// List every decodable saved pattern
    pub fn patterns(&self) -> Result<HashMap<PatternId, Vec<MatchClause>>, StopError> {
        let reply = self.exchange("patterns", Request::GetTable)?;
        match reply {
            Reply::Table(table) => Ok(saved_patterns(&table)),
            other => Err(StopError::Runtime {
                op: "patterns",
                reason: protocol::unexpected_reply(&other),
            }),
        }
    }

    /// Add a node to the traced set
    pub fn node(&self, name: &str) -> Result<NodeName, StopError> {
        let reply = self.exchange("node", Request::AddNode(name.to_string()))?;
        match reply {
            Reply::NodeAdded(node) => Ok(node),
            Reply::Error(reason) => Err(StopError::Runtime { op: "node", reason }),
            other => Err(StopError::Runtime {
                op: "node",
                reason: protocol::unexpected_reply(&other),
            }),
        }
    }

    /// Remove a node from the traced set
    pub fn clear_node(&self, name: &str) -> Result<(), StopError> {
        let reply = self.exchange("clear_node", Request::RemoveNode(name.to_string()))?;
        match reply {
            Reply::Done => Ok(()),
            Reply::Error(reason) => Err(StopError::Runtime {
                op: "clear_node",
                reason,
            }),
            other => Err(StopError::Runtime {
                op: "clear_node",
                reason: protocol::unexpected_reply(&other),
            }),
        }
    }

    /// The current traced-node set
    pub fn nodes(&self) -> Result<Vec<NodeName>, StopError> {
        let reply = self.exchange("nodes", Request::GetNodes)?;
        match reply {
            Reply::Nodes(nodes) => Ok(nodes),
            other => Err(StopError::Runtime {
                op: "nodes",
                reason: protocol::unexpected_reply(&other),
            }),
        }
    }

    /// Drain trace output across the traced cluster, best effort
    pub fn flush(&self) {
        // an unreachable control process reads as zero traced nodes
        let _ = self.ensure_control();
        flush_cluster(&self.control_name, &self.cluster, &self.local);
    }

    /// Flush, then stop and recreate the control process
    ///
    /// Saved patterns and the traced-node set do not survive a reset.
    pub fn reset(&self) -> Result<(), StopError> {
        self.flush();
        if let Some(handle) = protocol::lookup(&self.control_name) {
            let _ = protocol::request(&handle, Request::Stop);
        }
        protocol::unregister(&self.control_name);
        self.ensure_control()?;
        Ok(())
    }

    /// The traced-node set plus the number of saved patterns
    pub fn session_info(&self) -> Result<(Vec<NodeName>, usize), StopError> {
        let nodes = self.nodes()?;
        let patterns = self.patterns()?;
        Ok((nodes, patterns.len()))
    }

    /// Replay a recorded trace file onto a device
    ///
    /// Runs the file client to completion; returns the number of events
    /// replayed or the client's abnormal termination.
    pub fn inspect_file<W: Write>(
        &self,
        device: &mut W,
        path: &Path,
    ) -> Result<usize, crate::inspect::InspectError> {
        crate::inspect::replay(device, path)
    }

    fn install_filter(
        &self,
        op: &'static str,
        target: &FunTarget,
        pattern: Option<&Pattern>,
        local: bool,
    ) -> Result<TraceResult, StopError> {
        let target = normalize_target(target).map_err(|e| StopError::BadInput {
            op,
            detail: e.to_string(),
        })?;
        let pattern = normalize_pattern(pattern).map_err(|e| StopError::BadInput {
            op,
            detail: e.to_string(),
        })?;
        let reply = self.exchange(
            op,
            Request::Install {
                target,
                pattern,
                local,
            },
        )?;
        command_result(op, reply)
    }

    fn resolve_item(&self, op: &'static str, item: &TraceItem) -> Result<FlagTarget, StopError> {
        let reference = match item {
            TraceItem::All => return Ok(FlagTarget::All),
            TraceItem::New => return Ok(FlagTarget::New),
            TraceItem::Existing => return Ok(FlagTarget::Existing),
            TraceItem::Proc(reference) => reference,
        };
        let cx = ResolveCx {
            local_node: self.local.name().to_string(),
            registry: self.local.registry(),
            global: &self.global,
            remote: self.cluster.as_ref(),
            resolvers: &self.resolvers,
        };
        resolve(reference, &cx)
            .map(FlagTarget::One)
            .map_err(|_| StopError::NoProcess {
                op,
                args: reference.to_string(),
            })
    }

    fn ensure_control(&self) -> Result<ControlHandle, StopError> {
        if let Some(handle) = protocol::lookup(&self.control_name) {
            if !handle.board().is_down() {
                return Ok(handle);
            }
            protocol::unregister(&self.control_name);
        }
        let handle = start(ControlConfig {
            cluster: Arc::clone(&self.cluster),
            local: Arc::clone(&self.local),
        })
        .map_err(|e| StopError::Runtime {
            op: "start",
            reason: Term::tuple(vec![
                Term::atom("spawn_failed"),
                Term::Binary(e.to_string().into_bytes()),
            ]),
        })?;
        protocol::register(&self.control_name, handle.clone());
        Ok(handle)
    }

    fn exchange(&self, op: &'static str, req: Request) -> Result<Reply, StopError> {
        let handle = self.ensure_control()?;
        match protocol::request(&handle, req) {
            Ok(reply) => Ok(reply),
            Err(RequestError::Crashed) | Err(RequestError::NotRunning) => {
                Err(StopError::Crashed { op })
            }
        }
    }
}

fn command_result(op: &'static str, reply: Reply) -> Result<TraceResult, StopError> {
    match reply {
        Reply::Replies(replies) => Ok(aggregate(replies)),
        Reply::Error(reason) => Err(StopError::Runtime { op, reason }),
        other => Err(StopError::Runtime {
            op,
            reason: protocol::unexpected_reply(&other),
        }),
    }
}
