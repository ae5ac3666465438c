//! Liveness watches
//!
//! A [`MonitorBoard`] is shared between a server thread and its callers.
//! Callers register a watcher before sending a request and cancel it
//! once the reply is in; the server side notifies the board on every
//! exit path. Watching an already-down board fires the watcher at once,
//! so the watch-then-send ordering never races the death of the server.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Identifies one registered watcher
pub type MonitorRef = u64;

/// Why the watched thread went down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownReason {
    /// Orderly stop
    Normal,
    /// Abnormal termination
    Crashed(String),
}

impl fmt::Display for DownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownReason::Normal => write!(f, "normal"),
            DownReason::Crashed(what) => write!(f, "crashed: {}", what),
        }
    }
}

type Watcher = Box<dyn FnOnce(DownReason) + Send>;

struct Inner {
    down: Option<DownReason>,
    next_ref: MonitorRef,
    watchers: HashMap<MonitorRef, Watcher>,
}

/// A shared termination notice board
#[derive(Default)]
pub struct MonitorBoard {
    inner: Mutex<Inner>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            down: None,
            next_ref: 1,
            watchers: HashMap::new(),
        }
    }
}

impl MonitorBoard {
    /// Create a live board
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a watcher; fires immediately if the board is already down
    pub fn watch(&self, watcher: Watcher) -> MonitorRef {
        let mut inner = self.inner.lock().unwrap();
        let monitor_ref = inner.next_ref;
        inner.next_ref += 1;
        match inner.down.clone() {
            Some(reason) => {
                drop(inner);
                watcher(reason);
            }
            None => {
                inner.watchers.insert(monitor_ref, watcher);
            }
        }
        monitor_ref
    }

    /// Cancel a watcher; harmless if it already fired
    pub fn demonitor(&self, monitor_ref: MonitorRef) {
        self.inner.lock().unwrap().watchers.remove(&monitor_ref);
    }

    /// Mark the board down and fire every watcher; the first reason wins
    pub fn notify_down(&self, reason: DownReason) {
        let watchers = {
            let mut inner = self.inner.lock().unwrap();
            if inner.down.is_some() {
                return;
            }
            inner.down = Some(reason.clone());
            std::mem::take(&mut inner.watchers)
        };
        for (_, watcher) in watchers {
            watcher(reason.clone());
        }
    }

    /// True once the watched thread is gone
    pub fn is_down(&self) -> bool {
        self.inner.lock().unwrap().down.is_some()
    }
}

/// Notifies the board on drop unless a notice was already posted
///
/// Held by the server thread so that a panic or an early return still
/// fires every watcher.
pub struct DownGuard {
    board: Arc<MonitorBoard>,
    reason: DownReason,
}

impl DownGuard {
    /// Guard `board` with `reason` as the fallback notice
    pub fn new(board: Arc<MonitorBoard>, reason: DownReason) -> Self {
        Self { board, reason }
    }
}

impl Drop for DownGuard {
    fn drop(&mut self) {
        self.board.notify_down(self.reason.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_watch_then_down_fires() {
        let board = MonitorBoard::new();
        let (tx, rx) = mpsc::channel();
        board.watch(Box::new(move |reason| {
            tx.send(reason).unwrap();
        }));
        board.notify_down(DownReason::Crashed("boom".to_string()));
        assert_eq!(rx.recv().unwrap(), DownReason::Crashed("boom".to_string()));
        assert!(board.is_down());
    }

    #[test]
    fn test_watch_after_down_fires_immediately() {
        let board = MonitorBoard::new();
        board.notify_down(DownReason::Normal);
        let (tx, rx) = mpsc::channel();
        board.watch(Box::new(move |reason| {
            tx.send(reason).unwrap();
        }));
        assert_eq!(rx.try_recv().unwrap(), DownReason::Normal);
    }

    #[test]
    fn test_demonitor_cancels() {
        let board = MonitorBoard::new();
        let (tx, rx) = mpsc::channel();
        let monitor_ref = board.watch(Box::new(move |reason| {
            tx.send(reason).unwrap();
        }));
        board.demonitor(monitor_ref);
        board.notify_down(DownReason::Normal);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_first_reason_wins() {
        let board = MonitorBoard::new();
        board.notify_down(DownReason::Normal);
        board.notify_down(DownReason::Crashed("late".to_string()));
        let (tx, rx) = mpsc::channel();
        board.watch(Box::new(move |reason| {
            tx.send(reason).unwrap();
        }));
        assert_eq!(rx.try_recv().unwrap(), DownReason::Normal);
    }

    #[test]
    fn test_guard_notifies_on_drop() {
        let board = Arc::new(MonitorBoard::new());
        {
            let _guard = DownGuard::new(
                Arc::clone(&board),
                DownReason::Crashed("killed".to_string()),
            );
        }
        assert!(board.is_down());
    }

    #[test]
    fn test_guard_defers_to_earlier_notice() {
        let board = Arc::new(MonitorBoard::new());
        {
            let _guard = DownGuard::new(
                Arc::clone(&board),
                DownReason::Crashed("killed".to_string()),
            );
            board.notify_down(DownReason::Normal);
        }
        let (tx, rx) = mpsc::channel();
        board.watch(Box::new(move |reason| {
            tx.send(reason).unwrap();
        }));
        assert_eq!(rx.try_recv().unwrap(), DownReason::Normal);
    }
}
