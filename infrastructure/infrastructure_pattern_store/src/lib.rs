//! Infrastructure Layer: Pattern Store
//!
//! Provides the shared pattern table that saved filter programs live in,
//! the binary codec that turns programs and event terms into bytes, and
//! the reader that lists the reserved saved-id space.
//!
//! ## Modules
//!
//! - **[`codec`]**: term/program encoding with a crc32 integrity trailer
//! - **[`table`]**: the shared key-value pattern table
//! - **[`reader`]**: decoding enumeration of saved patterns

pub mod codec;
pub mod reader;
pub mod table;

pub use codec::{decode_program, encode_program, CodecError};
pub use reader::saved_patterns;
pub use table::{PatternKey, PatternTable};
