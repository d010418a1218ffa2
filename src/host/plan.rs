use super::discovery::Discovered;
use super::symbols::{derive_symbols, HostVersion};
use crate::layout::{HostPlatform, MICRO_RUNTIME_KEY};
use crate::protocol::ActionFrame;
use serde::Serialize;

/// What the host knows about itself when a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub platform: HostPlatform,
    pub version: HostVersion,
    pub debug_build: bool,
    /// Public-key token of the host's core runtime, lowercase hex.
    pub runtime_key: Option<String>,
}

impl HostIdentity {
    pub fn needs_compatibility_shim(&self) -> bool {
        self.runtime_key
            .as_deref()
            .is_some_and(|key| key.trim().eq_ignore_ascii_case(MICRO_RUNTIME_KEY))
    }
}

/// Configuration frames for one session, in send order. `Compile` and
/// `Finish` are not part of the plan; the session driver adds them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionPlan {
    frames: Vec<ActionFrame>,
}

impl SessionPlan {
    pub fn build(identity: &HostIdentity, discovered: &Discovered) -> Self {
        let mut frames: Vec<ActionFrame> =
            derive_symbols(identity.platform, identity.version, identity.debug_build)
                .into_iter()
                .map(ActionFrame::AddPreprocessorSymbol)
                .collect();
        frames.extend(
            discovered
                .sources
                .iter()
                .map(|path| ActionFrame::AddSourceFile(path.to_string_lossy().to_string())),
        );
        frames.extend(
            discovered
                .references
                .iter()
                .map(|path| ActionFrame::AddReference(path.to_string_lossy().to_string())),
        );
        if identity.needs_compatibility_shim() {
            frames.push(ActionFrame::EnableCompatibilityShim);
        }
        Self { frames }
    }

    pub fn frames(&self) -> &[ActionFrame] {
        &self.frames
    }

    pub fn source_count(&self) -> usize {
        self.frames
            .iter()
            .filter(|frame| matches!(frame, ActionFrame::AddSourceFile(_)))
            .count()
    }

    /// Every frame the host will write, one JSON object per line.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for frame in self
            .frames
            .iter()
            .chain([&ActionFrame::Compile, &ActionFrame::Finish])
        {
            out.push_str(&serde_json::to_string(frame)?);
            out.push('\n');
        }
        Ok(out)
    }
}
