//! The request protocol
//!
//! A synchronous, crash-safe exchange with the control process. The
//! caller registers a liveness watch before sending, then blocks on one
//! channel that receives whichever comes first: the tagged reply, or the
//! down notice. Without the watch a crash mid-request would hang the
//! caller forever; with it every request terminates within the lifetime
//! of the control process. The watch is cancelled once a reply is
//! observed so nothing leaks on the success path.
//!
//! Handles are rediscovered by name from the process-wide registry on
//! every request, which makes a control-process restart transparent to
//! later calls.

use crate::debug::ControlDebug;
use crate::liveness::{DownReason, MonitorBoard};
use entities_terms::{NodeName, Term};
use entities_trace::{CallTarget, CanonicalPattern, FlagTarget, NodeReply, TraceFlag};
use infrastructure_pattern_store::PatternTable;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

/// The default control-process name
pub const CONTROL_NAME: &str = "trace_control";

/// A command for the control process
#[derive(Debug, Clone)]
pub enum Request {
    /// Enable flags on the selected processes, cluster-wide
    SetFlags {
        target: FlagTarget,
        flags: Vec<TraceFlag>,
    },
    /// Remove every flag from the selected processes
    ClearFlags { target: FlagTarget },
    /// Install a call filter
    Install {
        target: CallTarget,
        pattern: CanonicalPattern,
        local: bool,
    },
    /// Remove the filters a target covers
    Remove { target: CallTarget },
    /// Add a node to the traced set
    AddNode(NodeName),
    /// Remove a node from the traced set
    RemoveNode(NodeName),
    /// The current traced-node set
    GetNodes,
    /// The pattern table handle
    GetTable,
    /// Orderly shutdown
    Stop,
}

/// The control process's reply
#[derive(Debug, Clone)]
pub enum Reply {
    /// Per-node outcomes of a broadcast command
    Replies(Vec<NodeReply>),
    /// The traced-node set
    Nodes(Vec<NodeName>),
    /// The pattern table handle
    Table(PatternTable),
    /// The node was added to the traced set
    NodeAdded(NodeName),
    /// Acknowledged, nothing to report
    Done,
    /// The command was rejected outright
    Error(Term),
    /// The control process is stopping
    Stopped,
}

/// What unblocks a waiting caller
#[derive(Debug)]
pub enum Wake {
    /// The tagged reply arrived
    Reply(Reply),
    /// The liveness watch fired first
    Down(DownReason),
}

/// One request in flight: the command plus the caller's address
pub struct Envelope {
    pub req: Request,
    pub reply_to: mpsc::Sender<Wake>,
}

/// Address of a running control process
#[derive(Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<Envelope>,
    board: Arc<MonitorBoard>,
}

impl ControlHandle {
    /// Assemble a handle from its parts
    pub fn new(tx: mpsc::Sender<Envelope>, board: Arc<MonitorBoard>) -> Self {
        Self { tx, board }
    }

    /// The handle's liveness board
    pub fn board(&self) -> &Arc<MonitorBoard> {
        &self.board
    }
}

/// Request failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The control process terminated before replying
    Crashed,
    /// No control process is registered under the name
    NotRunning,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Crashed => write!(f, "control process terminated mid-request"),
            RequestError::NotRunning => write!(f, "no control process running"),
        }
    }
}

impl std::error::Error for RequestError {}

/// Perform one synchronous request
///
/// Establishes the liveness watch, sends the request carrying the
/// caller's reply address, then blocks until the reply or the down
/// notice arrives - whichever is first. The watch is cancelled on the
/// success path.
pub fn request(handle: &ControlHandle, req: Request) -> Result<Reply, RequestError> {
    let (tx, rx) = mpsc::channel();
    let watch_tx = tx.clone();
    let monitor_ref = handle.board.watch(Box::new(move |reason| {
        let _ = watch_tx.send(Wake::Down(reason));
    }));

    if handle.tx.send(Envelope { req, reply_to: tx }).is_err() {
        handle.board.demonitor(monitor_ref);
        return Err(RequestError::Crashed);
    }

    match rx.recv() {
        Ok(Wake::Reply(reply)) => {
            handle.board.demonitor(monitor_ref);
            Ok(reply)
        }
        Ok(Wake::Down(reason)) => {
            ControlDebug::log(&format!("request unblocked by down notice ({})", reason));
            Err(RequestError::Crashed)
        }
        Err(_) => Err(RequestError::Crashed),
    }
}

lazy_static! {
    static ref CONTROL_REGISTRY: Mutex<HashMap<String, ControlHandle>> =
        Mutex::new(HashMap::new());
}

/// Register a control handle under a name
pub fn register(name: &str, handle: ControlHandle) {
    CONTROL_REGISTRY
        .lock()
        .unwrap()
        .insert(name.to_string(), handle);
}

/// Look a control handle up by name
pub fn lookup(name: &str) -> Option<ControlHandle> {
    CONTROL_REGISTRY.lock().unwrap().get(name).cloned()
}

/// Drop a name's registration, returning the handle it held
pub fn unregister(name: &str) -> Option<ControlHandle> {
    CONTROL_REGISTRY.lock().unwrap().remove(name)
}

/// Rediscover the named handle and perform one request
pub fn request_named(name: &str, req: Request) -> Result<Reply, RequestError> {
    let handle = lookup(name).ok_or(RequestError::NotRunning)?;
    request(&handle, req)
}

/// A request reply a caller expected to carry a payload it did not
pub fn unexpected_reply(reply: &Reply) -> Term {
    Term::tuple(vec![
        Term::atom("unexpected_reply"),
        Term::atom(match reply {
            Reply::Replies(_) => "replies",
            Reply::Nodes(_) => "nodes",
            Reply::Table(_) => "table",
            Reply::NodeAdded(_) => "node_added",
            Reply::Done => "done",
            Reply::Error(_) => "error",
            Reply::Stopped => "stopped",
        }),
    ])
}
