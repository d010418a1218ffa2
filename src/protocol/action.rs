use super::codec::{FrameReader, FrameWriter};
use super::error::ProtocolError;
use serde::Serialize;
use std::io::{Read, Write};

/// Closed set of commands the host can send to the helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Action {
    AddPreprocessorSymbol = 0,
    AddSourceFile = 1,
    AddReference = 2,
    EnableCompatibilityShim = 3,
    Compile = 4,
    Finish = 5,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::AddPreprocessorSymbol,
        Action::AddSourceFile,
        Action::AddReference,
        Action::EnableCompatibilityShim,
        Action::Compile,
        Action::Finish,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::AddPreprocessorSymbol => "add_preprocessor_symbol",
            Action::AddSourceFile => "add_source_file",
            Action::AddReference => "add_reference",
            Action::EnableCompatibilityShim => "enable_compatibility_shim",
            Action::Compile => "compile",
            Action::Finish => "finish",
        }
    }
}

/// A complete frame: action code plus its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum ActionFrame {
    AddPreprocessorSymbol(String),
    AddSourceFile(String),
    AddReference(String),
    EnableCompatibilityShim,
    Compile,
    Finish,
}

impl ActionFrame {
    pub fn action(&self) -> Action {
        match self {
            ActionFrame::AddPreprocessorSymbol(_) => Action::AddPreprocessorSymbol,
            ActionFrame::AddSourceFile(_) => Action::AddSourceFile,
            ActionFrame::AddReference(_) => Action::AddReference,
            ActionFrame::EnableCompatibilityShim => Action::EnableCompatibilityShim,
            ActionFrame::Compile => Action::Compile,
            ActionFrame::Finish => Action::Finish,
        }
    }

    fn text(&self) -> Option<&str> {
        match self {
            ActionFrame::AddPreprocessorSymbol(text)
            | ActionFrame::AddSourceFile(text)
            | ActionFrame::AddReference(text) => Some(text),
            _ => None,
        }
    }

    /// Encode and flush the frame as one message.
    pub fn write_to<W: Write>(&self, writer: &mut FrameWriter<W>) -> Result<(), ProtocolError> {
        writer.put_i32(self.action().code());
        if let Some(text) = self.text() {
            writer.put_string(self.action().as_str(), text)?;
        }
        writer.flush_frame()
    }

    /// Read the payload for an action whose code has already been consumed.
    /// This is the only decoder for action payloads; the helper's read loop
    /// goes through it.
    pub fn read_payload<R: Read>(
        action: Action,
        reader: &mut FrameReader<R>,
    ) -> Result<Self, ProtocolError> {
        let frame = match action {
            Action::AddPreprocessorSymbol => {
                ActionFrame::AddPreprocessorSymbol(reader.read_string("symbol name")?)
            }
            Action::AddSourceFile => ActionFrame::AddSourceFile(reader.read_string("source path")?),
            Action::AddReference => {
                ActionFrame::AddReference(reader.read_string("reference path")?)
            }
            Action::EnableCompatibilityShim => ActionFrame::EnableCompatibilityShim,
            Action::Compile => ActionFrame::Compile,
            Action::Finish => ActionFrame::Finish,
        };
        Ok(frame)
    }
}
