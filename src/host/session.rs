use super::collaborators::{DiagnosticSink, LibraryLoader};
use super::discovery::{discover, DiscoveryRoots};
use super::plan::{HostIdentity, SessionPlan};
use crate::protocol::{ActionFrame, CompileOutcome};
use crate::supervisor::{
    HelperChannel, HelperProcess, LaunchSpec, SupervisorError, SupervisorOptions,
};
use std::error::Error as StdError;
use thiserror::Error;
use tracing::{info, info_span, warn};

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("failed to load the compiled library")]
    Load {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The image reached the loader.
    Loaded { bytes: usize },
    /// Diagnostics went to the sink; nothing was loaded.
    Failed { diagnostics: usize },
}

impl SessionOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SessionOutcome::Loaded { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    /// Frames written, `Compile` and `Finish` included.
    pub frames_sent: usize,
    pub outcome: SessionOutcome,
}

/// Everything needed to compile the discovered mods once.
#[derive(Debug, Clone)]
pub struct HostRequest {
    pub identity: HostIdentity,
    pub roots: DiscoveryRoots,
    pub launch: LaunchSpec,
    pub options: SupervisorOptions,
}

/// Send the plan, then `Compile`, read the one result, then `Finish`.
///
/// `Finish` goes out once the result is in hand, whatever it says. If the
/// exchange breaks before that, no further frame is written and the caller
/// tears the channel down.
pub fn run_session<C: HelperChannel + ?Sized>(
    channel: &mut C,
    plan: &SessionPlan,
    sink: &mut dyn DiagnosticSink,
    loader: &mut dyn LibraryLoader,
) -> Result<SessionReport, HostError> {
    let mut frames_sent = 0;
    for frame in plan.frames() {
        channel.send(frame)?;
        frames_sent += 1;
    }
    channel.send(&ActionFrame::Compile)?;
    frames_sent += 1;

    let outcome = channel.read_outcome()?;
    channel.send(&ActionFrame::Finish)?;
    frames_sent += 1;

    let outcome = match outcome {
        CompileOutcome::Success { payload } => {
            loader
                .load(&payload)
                .map_err(|err| HostError::Load { source: err.into() })?;
            SessionOutcome::Loaded {
                bytes: payload.len(),
            }
        }
        CompileOutcome::Failure { diagnostics } => {
            for line in &diagnostics {
                sink.diagnostic(line);
            }
            SessionOutcome::Failed {
                diagnostics: diagnostics.len(),
            }
        }
    };
    Ok(SessionReport {
        frames_sent,
        outcome,
    })
}

/// Discover inputs, launch the helper, run one session and reap the helper.
pub fn compile_mods(
    request: &HostRequest,
    sink: &mut dyn DiagnosticSink,
    loader: &mut dyn LibraryLoader,
) -> Result<SessionReport, HostError> {
    let span = info_span!(
        "session.run",
        platform = request.identity.platform.label(),
        version = %request.identity.version
    );
    let _enter = span.enter();

    let discovered = discover(&request.roots);
    let plan = SessionPlan::build(&request.identity, &discovered);
    info!(
        frames = plan.frames().len(),
        sources = plan.source_count(),
        shim = request.identity.needs_compatibility_shim(),
        "session planned"
    );

    let mut helper = HelperProcess::launch(&request.launch, request.options)?;
    let pid = helper.id();
    let result = run_session(&mut helper, &plan, sink, loader);
    let status = helper.shutdown();
    if !status.success() && result.is_ok() {
        warn!(pid, status = %status, "helper exited abnormally after a complete session");
    }

    match &result {
        Ok(report) => info!(
            pid,
            frames = report.frames_sent,
            loaded = report.outcome.is_loaded(),
            "session finished"
        ),
        Err(err) => warn!(pid, error = %err, "session aborted"),
    }
    result
}
