//! Infrastructure Layer: Control
//!
//! The control process and everything callers need to talk to it
//! safely. The control process is a named server thread that owns the
//! traced-node set, the pattern table and the saved-id counter, and
//! serializes every command against the cluster. Callers reach it
//! through a synchronous request protocol that races the reply against
//! a liveness watch, so a crash mid-request unblocks the caller
//! immediately instead of hanging it.
//!
//! ## Modules
//!
//! - **[`liveness`]**: cancellable termination watches ([`MonitorBoard`])
//! - **[`server`]**: the control server thread and its command handling
//! - **[`protocol`]**: the crash-safe request/reply exchange and the
//!   named handle registry
//! - **[`flush`]**: the cluster-wide best-effort drain broadcast
//! - **[`debug`]**: gated debug output for control traffic

pub mod debug;
pub mod flush;
pub mod liveness;
pub mod protocol;
pub mod server;

pub use liveness::{DownReason, MonitorBoard, MonitorRef};
pub use protocol::{
    lookup, register, request, request_named, unregister, ControlHandle, Reply, Request,
    RequestError,
};
pub use server::{start, ControlConfig};
