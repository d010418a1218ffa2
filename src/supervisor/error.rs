use super::escape::ArgumentLineError;
use crate::protocol::ProtocolError;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("helper executable not found at {}", path.display())]
    HelperMissing { path: PathBuf },

    #[error("interpreter command is empty")]
    EmptyInterpreter,

    #[error("invalid helper command line")]
    CommandLine(#[from] ArgumentLineError),

    #[error("failed to start helper `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("helper stdio pipes were not captured")]
    PipesUnavailable,

    #[error("helper exited before the session finished ({status})")]
    ExitedEarly { status: ExitStatus },

    #[error("helper produced no result within {timeout:?}")]
    ResultTimeout { timeout: Duration },

    #[error("helper channel is closed")]
    ChannelClosed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("helper process i/o failed")]
    Io(#[from] io::Error),
}
