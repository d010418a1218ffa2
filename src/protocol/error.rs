use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;

/// Framing failures. Every variant is fatal for the process pair: a binary
/// stream has no resynchronisation point once a frame is misread.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown action code {0}")]
    UnknownAction(i32),

    #[error("truncated {what}: expected {expected} bytes, got {got}")]
    Truncated {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("negative length {len} for {what}")]
    NegativeLength { what: &'static str, len: i32 },

    #[error("{what} length {len} exceeds limit of {max} bytes")]
    LengthTooLarge {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{what} is not valid UTF-8")]
    InvalidUtf8 {
        what: &'static str,
        #[source]
        source: FromUtf8Error,
    },

    #[error("stream closed before Finish")]
    StreamClosed,

    #[error("protocol I/O failed: {0}")]
    Io(#[from] io::Error),
}
