use super::codec::{FrameReader, FrameWriter};
use super::error::ProtocolError;
use std::io::{Read, Write};

/// Terminal answer to a `Compile` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Compiled binary image.
    Success { payload: Vec<u8> },
    /// Diagnostic lines in the order the compiler produced them.
    Failure { diagnostics: Vec<String> },
}

impl CompileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutcome::Success { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompileOutcome::Success { .. } => "success",
            CompileOutcome::Failure { .. } => "failure",
        }
    }

    /// Encode the result frame and flush it as one message.
    pub fn write_to<W: Write>(&self, writer: &mut FrameWriter<W>) -> Result<(), ProtocolError> {
        match self {
            CompileOutcome::Success { payload } => {
                writer.put_bool(true);
                writer.put_bytes("compiled image", payload)?;
            }
            CompileOutcome::Failure { diagnostics } => {
                writer.put_bool(false);
                writer.put_len("diagnostic count", diagnostics.len())?;
                for line in diagnostics {
                    writer.put_string("diagnostic", line)?;
                }
            }
        }
        writer.flush_frame()
    }

    pub fn read_from<R: Read>(reader: &mut FrameReader<R>) -> Result<Self, ProtocolError> {
        if reader.read_bool("success flag")? {
            let payload = reader.read_bytes("compiled image")?;
            return Ok(CompileOutcome::Success { payload });
        }
        let count = reader.read_len("diagnostic count")?;
        let mut diagnostics = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            diagnostics.push(reader.read_string("diagnostic")?);
        }
        Ok(CompileOutcome::Failure { diagnostics })
    }
}
