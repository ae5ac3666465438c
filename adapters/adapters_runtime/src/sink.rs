//! Trace output sinks
//!
//! Where a node's drained trace output goes. The in-memory sink backs
//! tests and live inspection; the file sink produces the frame stream
//! the file-inspection client replays.

use entities_terms::Term;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A trace output destination
#[derive(Debug, Clone)]
pub enum TraceSink {
    /// Append to a shared in-memory buffer
    Memory(Arc<Mutex<Vec<u8>>>),
    /// Append to a file
    File(PathBuf),
}

impl TraceSink {
    /// An in-memory sink plus the buffer it appends to
    pub fn memory() -> (TraceSink, Arc<Mutex<Vec<u8>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        (TraceSink::Memory(Arc::clone(&buffer)), buffer)
    }

    /// A file sink appending to `path`
    pub fn file(path: impl Into<PathBuf>) -> TraceSink {
        TraceSink::File(path.into())
    }

    /// Append bytes to the destination
    pub fn write_all(&self, bytes: &[u8]) -> Result<(), Term> {
        match self {
            TraceSink::Memory(buffer) => {
                buffer.lock().unwrap().extend_from_slice(bytes);
                Ok(())
            }
            TraceSink::File(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(io_reason)?;
                file.write_all(bytes).map_err(io_reason)
            }
        }
    }
}

fn io_reason(err: std::io::Error) -> Term {
    Term::tuple(vec![
        Term::atom("io_error"),
        Term::Binary(err.to_string().into_bytes()),
    ])
}
