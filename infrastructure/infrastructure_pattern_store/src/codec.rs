//! Pattern and event codec
//!
//! A small tagged binary format for terms, used two ways: filter
//! programs stored in the pattern table (with a crc32 trailer so foreign
//! or corrupt entries are detected on read), and length-prefixed event
//! frames written by a node's trace sink.
//!
//! Entries can reach the table without going through this codec, so
//! decoding must fail cleanly, never panic.

use entities_terms::{Pid, Term};
use entities_trace::MatchClause;
use std::fmt;

const TAG_ATOM: u8 = 0x01;
const TAG_INT: u8 = 0x02;
const TAG_TUPLE: u8 = 0x03;
const TAG_LIST: u8 = 0x04;
const TAG_BINARY: u8 = 0x05;
const TAG_PID: u8 = 0x06;
const TAG_VAR: u8 = 0x07;
const TAG_NIL: u8 = 0x08;

const PROGRAM_MAGIC: u8 = 0x54;
const PROGRAM_VERSION: u8 = 1;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended inside a value
    Truncated,
    /// A tag byte that encodes nothing
    BadTag(u8),
    /// The integrity trailer does not match the payload
    BadChecksum,
    /// Structurally valid bytes with the wrong shape
    BadShape(String),
    /// A name field that is not UTF-8
    BadName,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Truncated => write!(f, "truncated buffer"),
            CodecError::BadTag(tag) => write!(f, "unknown tag byte 0x{:02x}", tag),
            CodecError::BadChecksum => write!(f, "checksum mismatch"),
            CodecError::BadShape(what) => write!(f, "bad shape: {}", what),
            CodecError::BadName => write!(f, "name is not utf-8"),
        }
    }
}

impl std::error::Error for CodecError {}

fn put_name(name: &str, out: &mut Vec<u8>) {
    let bytes = name.as_bytes();
    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(bytes);
}

/// Encode one term
pub fn encode_term(term: &Term, out: &mut Vec<u8>) {
    match term {
        Term::Atom(name) => {
            out.push(TAG_ATOM);
            put_name(name, out);
        }
        Term::Int(value) => {
            out.push(TAG_INT);
            out.extend_from_slice(&value.to_be_bytes());
        }
        Term::Tuple(elements) => {
            out.push(TAG_TUPLE);
            out.extend_from_slice(&(elements.len() as u16).to_be_bytes());
            for element in elements {
                encode_term(element, out);
            }
        }
        Term::List(elements) => {
            out.push(TAG_LIST);
            out.extend_from_slice(&(elements.len() as u16).to_be_bytes());
            for element in elements {
                encode_term(element, out);
            }
        }
        Term::Binary(bytes) => {
            out.push(TAG_BINARY);
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            out.extend_from_slice(bytes);
        }
        Term::Pid(pid) => {
            out.push(TAG_PID);
            put_name(&pid.node, out);
            out.extend_from_slice(&pid.num.to_be_bytes());
        }
        Term::Var(name) => {
            out.push(TAG_VAR);
            put_name(name, out);
        }
        Term::Nil => out.push(TAG_NIL),
    }
}

fn take<'a>(buf: &'a [u8], index: &mut usize, n: usize) -> Result<&'a [u8], CodecError> {
    if buf.len() < *index + n {
        return Err(CodecError::Truncated);
    }
    let slice = &buf[*index..*index + n];
    *index += n;
    Ok(slice)
}

fn take_u16(buf: &[u8], index: &mut usize) -> Result<u16, CodecError> {
    let bytes = take(buf, index, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn take_u32(buf: &[u8], index: &mut usize) -> Result<u32, CodecError> {
    let bytes = take(buf, index, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn take_name(buf: &[u8], index: &mut usize) -> Result<String, CodecError> {
    let len = take_u16(buf, index)? as usize;
    let bytes = take(buf, index, len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::BadName)
}

/// Decode one term, advancing `index`
pub fn decode_term(buf: &[u8], index: &mut usize) -> Result<Term, CodecError> {
    let tag = take(buf, index, 1)?[0];
    match tag {
        TAG_ATOM => Ok(Term::Atom(take_name(buf, index)?)),
        TAG_INT => {
            let bytes = take(buf, index, 8)?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            Ok(Term::Int(i64::from_be_bytes(raw)))
        }
        TAG_TUPLE | TAG_LIST => {
            let count = take_u16(buf, index)? as usize;
            let mut elements = Vec::with_capacity(count);
            for _ in 0..count {
                elements.push(decode_term(buf, index)?);
            }
            if tag == TAG_TUPLE {
                Ok(Term::Tuple(elements))
            } else {
                Ok(Term::List(elements))
            }
        }
        TAG_BINARY => {
            let len = take_u32(buf, index)? as usize;
            Ok(Term::Binary(take(buf, index, len)?.to_vec()))
        }
        TAG_PID => {
            let node = take_name(buf, index)?;
            let bytes = take(buf, index, 8)?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            Ok(Term::Pid(Pid {
                node,
                num: u64::from_be_bytes(raw),
            }))
        }
        TAG_VAR => Ok(Term::Var(take_name(buf, index)?)),
        TAG_NIL => Ok(Term::Nil),
        other => Err(CodecError::BadTag(other)),
    }
}

/// Encode a filter program with its integrity trailer
pub fn encode_program(clauses: &[MatchClause]) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(PROGRAM_MAGIC);
    out.push(PROGRAM_VERSION);
    out.extend_from_slice(&(clauses.len() as u16).to_be_bytes());
    for clause in clauses {
        encode_term(&clause.head, &mut out);
        out.extend_from_slice(&(clause.guards.len() as u16).to_be_bytes());
        for guard in &clause.guards {
            encode_term(guard, &mut out);
        }
        out.extend_from_slice(&(clause.body.len() as u16).to_be_bytes());
        for effect in &clause.body {
            encode_term(effect, &mut out);
        }
    }
    let checksum = crc32fast::hash(&out);
    out.extend_from_slice(&checksum.to_be_bytes());
    out
}

/// Decode a filter program, verifying the trailer
pub fn decode_program(buf: &[u8]) -> Result<Vec<MatchClause>, CodecError> {
    if buf.len() < 8 {
        return Err(CodecError::Truncated);
    }
    let (payload, trailer) = buf.split_at(buf.len() - 4);
    let stored = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if crc32fast::hash(payload) != stored {
        return Err(CodecError::BadChecksum);
    }
    let mut index = 0;
    let magic = take(payload, &mut index, 1)?[0];
    if magic != PROGRAM_MAGIC {
        return Err(CodecError::BadShape(format!("magic 0x{:02x}", magic)));
    }
    let version = take(payload, &mut index, 1)?[0];
    if version != PROGRAM_VERSION {
        return Err(CodecError::BadShape(format!("version {}", version)));
    }
    let clause_count = take_u16(payload, &mut index)? as usize;
    let mut clauses = Vec::with_capacity(clause_count);
    for _ in 0..clause_count {
        let head = decode_term(payload, &mut index)?;
        let guard_count = take_u16(payload, &mut index)? as usize;
        let mut guards = Vec::with_capacity(guard_count);
        for _ in 0..guard_count {
            guards.push(decode_term(payload, &mut index)?);
        }
        let body_count = take_u16(payload, &mut index)? as usize;
        let mut body = Vec::with_capacity(body_count);
        for _ in 0..body_count {
            body.push(decode_term(payload, &mut index)?);
        }
        clauses.push(MatchClause { head, guards, body });
    }
    if index != payload.len() {
        return Err(CodecError::BadShape("trailing bytes".to_string()));
    }
    Ok(clauses)
}

/// Encode one event term as a length-prefixed frame
pub fn encode_frame(event: &Term) -> Vec<u8> {
    let mut payload = Vec::new();
    encode_term(event, &mut payload);
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Read the next frame, advancing `index`; `None` at end of buffer
pub fn next_frame(buf: &[u8], index: &mut usize) -> Result<Option<Term>, CodecError> {
    if *index == buf.len() {
        return Ok(None);
    }
    let len = take_u32(buf, index)? as usize;
    let payload = take(buf, index, len)?;
    let mut inner = 0;
    let event = decode_term(payload, &mut inner)?;
    if inner != payload.len() {
        return Err(CodecError::BadShape("trailing frame bytes".to_string()));
    }
    Ok(Some(event))
}
