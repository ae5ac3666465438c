//! The control server
//!
//! A named thread owning the traced-node set, the pattern table and the
//! saved-id counter. Requests are handled one at a time, so command
//! effects are applied in the order the server processes them. Every
//! exit path posts a down notice: the normal stop posts it explicitly,
//! anything else is caught by the drop guard.

use crate::debug::ControlDebug;
use crate::liveness::{DownGuard, DownReason, MonitorBoard};
use crate::protocol::{ControlHandle, Envelope, Reply, Request, Wake};
use adapters_runtime::{Cluster, NodeEngine};
use entities_terms::{NodeName, Term};
use entities_trace::{
    CallTarget, CanonicalPattern, FlagTarget, MatchClause, NodeReply, PatternId, TraceFlag,
};
use infrastructure_pattern_store::{decode_program, encode_program, PatternKey, PatternTable};
use std::collections::BTreeSet;
use std::sync::{mpsc, Arc};
use std::thread;

/// What a control server needs to run
pub struct ControlConfig {
    /// The cluster fabric commands fan out over
    pub cluster: Arc<Cluster>,
    /// The engine of the node the server runs on
    pub local: Arc<NodeEngine>,
}

/// Start a control server thread and return its handle
///
/// The pattern table starts seeded with the three built-in symbolic
/// patterns, so saved-id references to them resolve from the first
/// request on.
pub fn start(config: ControlConfig) -> std::io::Result<ControlHandle> {
    let (tx, rx) = mpsc::channel::<Envelope>();
    let board = Arc::new(MonitorBoard::new());
    let thread_board = Arc::clone(&board);

    thread::Builder::new()
        .name("trace_control".to_string())
        .spawn(move || {
            let _guard = DownGuard::new(
                Arc::clone(&thread_board),
                DownReason::Crashed("killed".to_string()),
            );
            let mut state = ServerState::new(config);
            while let Ok(envelope) = rx.recv() {
                let stopping = matches!(envelope.req, Request::Stop);
                let reply = state.handle(envelope.req);
                let _ = envelope.reply_to.send(Wake::Reply(reply));
                if stopping {
                    break;
                }
            }
            thread_board.notify_down(DownReason::Normal);
        })?;

    Ok(ControlHandle::new(tx, board))
}

struct ServerState {
    cluster: Arc<Cluster>,
    local: Arc<NodeEngine>,
    traced: BTreeSet<NodeName>,
    table: PatternTable,
}

impl ServerState {
    fn new(config: ControlConfig) -> Self {
        let table = PatternTable::new();
        seed_builtin(&table, PatternKey::Caller, &[Term::atom("caller")]);
        seed_builtin(&table, PatternKey::Exception, &[Term::atom("exception")]);
        seed_builtin(
            &table,
            PatternKey::CallerException,
            &[Term::atom("caller"), Term::atom("exception")],
        );
        Self {
            cluster: config.cluster,
            local: config.local,
            traced: BTreeSet::new(),
            table,
        }
    }

    fn handle(&mut self, req: Request) -> Reply {
        match req {
            Request::SetFlags { target, flags } => {
                ControlDebug::log(&format!("set flags on {:?}", target));
                Reply::Replies(self.flag_command(&target, Some(&flags)))
            }
            Request::ClearFlags { target } => {
                ControlDebug::log(&format!("clear flags on {:?}", target));
                Reply::Replies(self.flag_command(&target, None))
            }
            Request::Install {
                target,
                pattern,
                local,
            } => self.install(&target, pattern, local),
            Request::Remove { target } => {
                ControlDebug::log(&format!("remove filters on {}", target));
                let replies = self
                    .broadcast_nodes()
                    .into_iter()
                    .map(|node| match self.engine_of(&node) {
                        Some(engine) => NodeReply::Matched {
                            node,
                            count: engine.remove(&target),
                        },
                        None => down_reply(node),
                    })
                    .collect();
                Reply::Replies(replies)
            }
            Request::AddNode(node) => {
                if node == self.local.name() {
                    return Reply::Error(Term::atom("cant_add_local_node"));
                }
                if !self.cluster.contains(&node) {
                    return Reply::Error(Term::atom("nodedown"));
                }
                self.traced.insert(node.clone());
                Reply::NodeAdded(node)
            }
            Request::RemoveNode(node) => {
                self.traced.remove(&node);
                Reply::Done
            }
            Request::GetNodes => Reply::Nodes(self.traced.iter().cloned().collect()),
            Request::GetTable => Reply::Table(self.table.clone()),
            Request::Stop => Reply::Stopped,
        }
    }

    /// Nodes a broadcast command runs on: local first, then the traced set
    fn broadcast_nodes(&self) -> Vec<NodeName> {
        let mut nodes = vec![self.local.name().to_string()];
        nodes.extend(self.traced.iter().cloned());
        nodes
    }

    fn engine_of(&self, node: &str) -> Option<Arc<NodeEngine>> {
        if node == self.local.name() {
            Some(Arc::clone(&self.local))
        } else {
            self.cluster.get(node)
        }
    }

    /// Apply or clear flags; a concrete pid routes to its home node only
    fn flag_command(
        &self,
        target: &FlagTarget,
        flags: Option<&[TraceFlag]>,
    ) -> Vec<NodeReply> {
        let nodes = match target {
            FlagTarget::One(pid) => vec![pid.node.clone()],
            _ => self.broadcast_nodes(),
        };
        nodes
            .into_iter()
            .map(|node| {
                let engine = match self.engine_of(&node) {
                    Some(engine) => engine,
                    None => return down_reply(node),
                };
                let outcome = match flags {
                    Some(flags) => engine.apply_flags(target, flags),
                    None => engine.clear_flags(target),
                };
                match outcome {
                    Ok(count) => NodeReply::Matched { node, count },
                    Err(reason) => NodeReply::Failed { node, reason },
                }
            })
            .collect()
    }

    fn install(&mut self, target: &CallTarget, pattern: CanonicalPattern, local: bool) -> Reply {
        let (program, saved) = match pattern {
            CanonicalPattern::Ref(id) => {
                let bytes = match self.table.get(&PatternKey::from_id(id)) {
                    Some(bytes) => bytes,
                    None => {
                        return Reply::Error(Term::tuple(vec![
                            Term::atom("unknown_pattern"),
                            id_term(id),
                        ]))
                    }
                };
                match decode_program(&bytes) {
                    Ok(program) => (program, None),
                    Err(_) => {
                        return Reply::Error(Term::tuple(vec![
                            Term::atom("bad_saved_pattern"),
                            id_term(id),
                        ]))
                    }
                }
            }
            CanonicalPattern::Program(program) => {
                let id = self.table.alloc_id();
                self.table.insert(PatternKey::Id(id), encode_program(&program));
                (program, Some(PatternId::Saved(id)))
            }
        };
        ControlDebug::log(&format!("install filter on {}", target));
        let mut replies: Vec<NodeReply> = self
            .broadcast_nodes()
            .into_iter()
            .map(|node| match self.engine_of(&node) {
                Some(engine) => NodeReply::Matched {
                    node,
                    count: engine.install(target, program.clone(), local),
                },
                None => down_reply(node),
            })
            .collect();
        if let Some(id) = saved {
            replies.push(NodeReply::Saved(id));
        }
        Reply::Replies(replies)
    }
}

fn seed_builtin(table: &PatternTable, key: PatternKey, body: &[Term]) {
    let program = vec![MatchClause::wildcard(body.to_vec())];
    table.insert(key, encode_program(&program));
}

fn down_reply(node: NodeName) -> NodeReply {
    NodeReply::Failed {
        node,
        reason: Term::atom("nodedown"),
    }
}

fn id_term(id: PatternId) -> Term {
    match id {
        PatternId::Saved(n) => Term::int(n as i64),
        PatternId::Caller => Term::atom("c"),
        PatternId::Exception => Term::atom("x"),
        PatternId::CallerException => Term::atom("cx"),
    }
}
