use super::handlers;
use crate::compiler::CompilerBackend;
use crate::layout::COMPATIBILITY_SHIM_FILE;
use crate::protocol::{Action, ActionFrame, FrameReader, FrameWriter, ProtocolError};
use crate::session::{CompilerSession, SessionError};
use std::env;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug_span;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Whether the outer read loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Where the helper finds files it ships with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperEnvironment {
    pub shim_path: PathBuf,
}

impl HelperEnvironment {
    pub fn from_install_dir(dir: &Path) -> Self {
        Self {
            shim_path: dir.join(COMPATIBILITY_SHIM_FILE),
        }
    }

    /// Resolve against the directory holding the running executable, never
    /// the working directory the host launched us from.
    pub fn locate() -> io::Result<Self> {
        let exe = env::current_exe()?;
        let dir = exe.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "helper executable has no parent directory")
        })?;
        Ok(Self::from_install_dir(dir))
    }
}

/// What a handler may touch. Payloads arrive already decoded, so handlers
/// never see the input stream.
pub struct DispatchContext<'a, W> {
    pub session: &'a mut CompilerSession,
    pub backend: &'a dyn CompilerBackend,
    pub writer: &'a mut FrameWriter<W>,
    pub env: &'a HelperEnvironment,
}

/// Static action table. Adding an [`ActionFrame`] variant without a handler
/// fails to compile.
pub fn dispatch<W: Write>(
    frame: ActionFrame,
    ctx: &mut DispatchContext<'_, W>,
) -> Result<Flow, DispatchError> {
    let _span = debug_span!("dispatch", action = frame.action().as_str()).entered();
    match frame {
        ActionFrame::AddPreprocessorSymbol(symbol) => {
            handlers::add_preprocessor_symbol(ctx, symbol)
        }
        ActionFrame::AddSourceFile(path) => handlers::add_source_file(ctx, path),
        ActionFrame::AddReference(path) => handlers::add_reference(ctx, path),
        ActionFrame::EnableCompatibilityShim => handlers::enable_compatibility_shim(ctx),
        ActionFrame::Compile => handlers::compile(ctx),
        ActionFrame::Finish => handlers::finish(ctx),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub actions: usize,
    pub symbols: usize,
    pub sources: usize,
    pub references: usize,
    pub compiles: usize,
}

impl DriverStats {
    fn record(&mut self, action: Action) {
        self.actions += 1;
        match action {
            Action::AddPreprocessorSymbol => self.symbols += 1,
            Action::AddSourceFile => self.sources += 1,
            Action::AddReference | Action::EnableCompatibilityShim => self.references += 1,
            Action::Compile => self.compiles += 1,
            Action::Finish => {}
        }
    }
}

/// Serve actions until `Finish`. Any framing error or session misuse ends the
/// loop immediately; the caller is expected to exit and let the host tear
/// down the pipes.
pub fn run_driver_loop<R: Read, W: Write>(
    input: R,
    output: W,
    session: &mut CompilerSession,
    backend: &dyn CompilerBackend,
    env: &HelperEnvironment,
) -> Result<DriverStats, DispatchError> {
    let mut reader = FrameReader::new(input);
    let mut writer = FrameWriter::new(output);
    let mut stats = DriverStats::default();

    loop {
        let code = reader
            .read_action_code()?
            .ok_or(ProtocolError::StreamClosed)?;
        let action = Action::from_code(code).ok_or(ProtocolError::UnknownAction(code))?;
        let frame = ActionFrame::read_payload(action, &mut reader)?;
        stats.record(action);

        let mut ctx = DispatchContext {
            session: &mut *session,
            backend,
            writer: &mut writer,
            env,
        };
        if dispatch(frame, &mut ctx)? == Flow::Stop {
            return Ok(stats);
        }
    }
}
