use super::error::SupervisorError;
use super::launch::LaunchSpec;
use super::HelperChannel;
use crate::protocol::{
    Action, ActionFrame, CompileOutcome, FrameReader, FrameWriter, ProtocolError,
};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::process::{Child, ChildStdin, ChildStdout, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// How long the child must stay alive before the first frame is written.
    /// This is the whole ready barrier: launch returns once it elapses.
    pub ready_settle: Duration,
    /// Bound on the result wait; `None` waits as long as the helper runs.
    pub result_timeout: Option<Duration>,
    /// Time allowed between each teardown step.
    pub exit_grace: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            ready_settle: Duration::from_millis(50),
            result_timeout: None,
            exit_grace: Duration::from_secs(2),
        }
    }
}

/// A running helper plus both pipe ends. Dropping it always closes the pipes
/// and reaps the child, escalating to SIGTERM and then a kill when the
/// helper does not leave on its own.
pub struct HelperProcess {
    child: Child,
    writer: Option<FrameWriter<ChildStdin>>,
    reader: Option<FrameReader<ChildStdout>>,
    options: SupervisorOptions,
    finish_sent: bool,
    exit_status: Option<ExitStatus>,
}

impl HelperProcess {
    pub fn launch(spec: &LaunchSpec, options: SupervisorOptions) -> Result<Self, SupervisorError> {
        if !spec.helper.is_file() {
            return Err(SupervisorError::HelperMissing {
                path: spec.helper.clone(),
            });
        }
        let command_line = spec.command_line()?;
        let mut cmd = command_line.to_command()?;
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let program = command_line.program.to_string_lossy().to_string();
        let mut child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
            program: program.clone(),
            source,
        })?;
        info!(
            pid = child.id(),
            program = %program,
            mode = command_line.mode.label(),
            "helper launched"
        );

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let mut process = Self {
            child,
            writer: stdin.map(FrameWriter::new),
            reader: stdout.map(FrameReader::new),
            options,
            finish_sent: false,
            exit_status: None,
        };
        if process.writer.is_none() || process.reader.is_none() {
            return Err(SupervisorError::PipesUnavailable);
        }
        process.wait_ready()?;
        Ok(process)
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Block until the helper has survived its start-up window. A helper that
    /// dies after the window surfaces later as `ExitedEarly` on a pipe error.
    fn wait_ready(&mut self) -> Result<(), SupervisorError> {
        let window = self.options.ready_settle;
        let start = Instant::now();
        loop {
            if let Some(status) = self.child.try_wait()? {
                self.exit_status = Some(status);
                return Err(SupervisorError::ExitedEarly { status });
            }
            if start.elapsed() >= window {
                debug!(elapsed_ms = start.elapsed().as_millis() as u64, "helper ready");
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL.min(window));
        }
    }

    /// Replace a pipe failure with the helper's exit when it has already gone.
    fn explain(&mut self, err: SupervisorError) -> SupervisorError {
        let pipe_failure = matches!(
            err,
            SupervisorError::Protocol(
                ProtocolError::Io(_) | ProtocolError::Truncated { .. } | ProtocolError::StreamClosed
            )
        );
        if !pipe_failure {
            return err;
        }
        let window = self.options.exit_grace.min(Duration::from_millis(200));
        match wait_for_exit(&mut self.child, window) {
            Some(status) => {
                self.exit_status = Some(status);
                SupervisorError::ExitedEarly { status }
            }
            None => err,
        }
    }

    fn read_blocking(&mut self) -> Result<CompileOutcome, SupervisorError> {
        let reader = self.reader.as_mut().ok_or(SupervisorError::ChannelClosed)?;
        Ok(CompileOutcome::read_from(reader)?)
    }

    /// Read on a worker thread so the wait can be abandoned. On timeout the
    /// reader stays with the worker, which unblocks once teardown closes the
    /// child's stdout.
    fn read_bounded(&mut self, timeout: Duration) -> Result<CompileOutcome, SupervisorError> {
        let mut reader = self.reader.take().ok_or(SupervisorError::ChannelClosed)?;
        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let result = CompileOutcome::read_from(&mut reader);
            let _ = tx.send((reader, result));
        });
        match rx.recv_timeout(timeout) {
            Ok((reader, result)) => {
                self.reader = Some(reader);
                Ok(result?)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "helper result timed out");
                Err(SupervisorError::ResultTimeout { timeout })
            }
            Err(RecvTimeoutError::Disconnected) => Err(SupervisorError::ChannelClosed),
        }
    }

    /// Close both pipes and reap the child. Idempotent.
    pub fn shutdown(&mut self) -> ExitStatus {
        if let Some(status) = self.exit_status {
            self.writer = None;
            self.reader = None;
            return status;
        }
        // Closing stdin is the helper's cue to stop if Finish never went out.
        self.writer = None;
        self.reader = None;

        let grace = self.options.exit_grace;
        let status = match wait_for_exit(&mut self.child, grace) {
            Some(status) => status,
            None => {
                warn!(pid = self.child.id(), "helper ignored shutdown; sending SIGTERM");
                terminate(self.child.id());
                match wait_for_exit(&mut self.child, grace) {
                    Some(status) => status,
                    None => {
                        warn!(pid = self.child.id(), "helper ignored SIGTERM; killing");
                        if let Err(err) = self.child.kill() {
                            debug!(error = %err, "kill failed");
                        }
                        match self.child.wait() {
                            Ok(status) => status,
                            Err(err) => {
                                warn!(error = %err, "failed to reap helper");
                                fallback_status()
                            }
                        }
                    }
                }
            }
        };
        info!(status = %status, finish_sent = self.finish_sent, "helper exited");
        self.exit_status = Some(status);
        status
    }
}

impl HelperChannel for HelperProcess {
    fn send(&mut self, frame: &ActionFrame) -> Result<(), SupervisorError> {
        if self.finish_sent {
            return Err(SupervisorError::ChannelClosed);
        }
        let writer = self.writer.as_mut().ok_or(SupervisorError::ChannelClosed)?;
        let result = frame.write_to(writer);
        if let Err(err) = result {
            return Err(self.explain(err.into()));
        }
        if frame.action() == Action::Finish {
            self.finish_sent = true;
        }
        Ok(())
    }

    fn read_outcome(&mut self) -> Result<CompileOutcome, SupervisorError> {
        let result = match self.options.result_timeout {
            Some(timeout) => self.read_bounded(timeout),
            None => self.read_blocking(),
        };
        result.map_err(|err| self.explain(err))
    }
}

impl Drop for HelperProcess {
    fn drop(&mut self) {
        if self.exit_status.is_none() {
            self.shutdown();
        }
    }
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(err) => {
                debug!(error = %err, "try_wait failed");
                return None;
            }
        }
        if start.elapsed() >= timeout {
            return None;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn terminate(pid: u32) {
    // SAFETY: pid belongs to a child we have not reaped yet.
    if unsafe { libc::kill(pid as i32, libc::SIGTERM) } != 0 {
        debug!(pid, error = %std::io::Error::last_os_error(), "SIGTERM to helper failed");
    }
}

#[cfg(not(unix))]
fn terminate(pid: u32) {
    debug!(pid, "no SIGTERM on this platform; waiting for kill");
}

#[cfg(unix)]
fn fallback_status() -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(libc::SIGKILL)
}

#[cfg(windows)]
fn fallback_status() -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(1)
}
