//! Binary compiler-driver protocol shared by the host and the helper process.
//!
//! Every frame is a 4-byte little-endian action code followed by the fixed
//! payload for that action. The helper answers exactly one `Compile` with a
//! single result frame and otherwise never writes to its standard output.
//!
//! Primitive layout:
//! - `i32`: 4 bytes, little-endian (action codes, lengths, counts)
//! - `bool`: 1 byte, 0 = false, anything else = true
//! - string: `i32` byte length + UTF-8 bytes
//! - blob: `i32` byte length + raw bytes

mod action;
mod codec;
mod error;
mod outcome;

#[cfg(test)]
mod tests;

pub use action::{Action, ActionFrame};
pub use codec::{FrameReader, FrameWriter, MAX_FIELD_LEN};
pub use error::ProtocolError;
pub use outcome::CompileOutcome;
