//! Trace-file inspection
//!
//! Replays a recorded trace file through the event formatter onto a
//! caller-supplied device. The file is the frame stream a node sink
//! produced; replay runs to the end of the stream or surfaces the
//! client's abnormal termination as an error.

use entities_terms::Term;
use infrastructure_pattern_store::codec::next_frame;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

/// File-inspection failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectError {
    /// The file or the device failed
    Io(String),
    /// A frame that does not decode
    BadFrame(String),
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectError::Io(what) => write!(f, "io failure: {}", what),
            InspectError::BadFrame(what) => write!(f, "bad trace frame: {}", what),
        }
    }
}

impl std::error::Error for InspectError {}

/// Render one recorded event as a display line
///
/// Call events print as `(<pid>) call m:f(args)`, or `m:f/arity` when
/// only the arity was recorded. Other event shapes fall back to plain
/// term rendering.
pub fn format_event(event: &Term) -> String {
    if let Some(parts) = event.as_tuple() {
        if parts.len() == 4 && parts[0].is_atom("trace") {
            if let (Term::Pid(pid), Some(kind)) = (&parts[1], parts[2].as_atom()) {
                if kind == "call" {
                    if let Some(line) = format_call(pid, &parts[3]) {
                        return line;
                    }
                }
                return format!("({}) {} {}", pid, kind, parts[3]);
            }
        }
    }
    event.to_string()
}

fn format_call(pid: &entities_terms::Pid, mfa: &Term) -> Option<String> {
    let parts = mfa.as_tuple()?;
    if parts.len() != 3 {
        return None;
    }
    let module = parts[0].as_atom()?;
    let function = parts[1].as_atom()?;
    match &parts[2] {
        Term::Int(arity) => Some(format!("({}) call {}:{}/{}", pid, module, function, arity)),
        Term::List(args) => {
            let rendered: Vec<String> = args.iter().map(Term::to_string).collect();
            Some(format!(
                "({}) call {}:{}({})",
                pid,
                module,
                function,
                rendered.join(",")
            ))
        }
        Term::Nil => Some(format!("({}) call {}:{}()", pid, module, function)),
        _ => None,
    }
}

/// Replay a trace file onto a device
///
/// Returns the number of events replayed. Ends normally at the end of
/// the frame stream; a short or undecodable frame, an unreadable file
/// or a failing device surface as errors.
pub fn replay<W: Write>(device: &mut W, path: &Path) -> Result<usize, InspectError> {
    let bytes = fs::read(path).map_err(|e| InspectError::Io(e.to_string()))?;
    let mut index = 0;
    let mut count = 0;
    loop {
        match next_frame(&bytes, &mut index) {
            Ok(Some(event)) => {
                writeln!(device, "{}", format_event(&event))
                    .map_err(|e| InspectError::Io(e.to_string()))?;
                count += 1;
            }
            Ok(None) => return Ok(count),
            Err(e) => return Err(InspectError::BadFrame(e.to_string())),
        }
    }
}
