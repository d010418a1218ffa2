use super::unit::{LanguageVersion, ParseConfig, ReferenceHandle, ReferenceOrigin, SourceUnit};
use crate::compiler::{CompileOutput, CompilerBackend};
use crate::protocol::CompileOutcome;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    /// A second `Compile` in one helper lifetime. This is a driver bug on the
    /// host side, never something to retry.
    #[error("session already compiled; a helper process serves exactly one Compile")]
    AlreadyCompiled,
}

/// Mutable state owned by one helper process.
#[derive(Debug)]
pub struct CompilerSession {
    symbols: BTreeSet<String>,
    parse_config: ParseConfig,
    units: Vec<SourceUnit>,
    references: Vec<ReferenceHandle>,
    compiled: bool,
}

impl Default for CompilerSession {
    fn default() -> Self {
        Self::new(LanguageVersion::default())
    }
}

impl CompilerSession {
    pub fn new(language_version: LanguageVersion) -> Self {
        Self {
            symbols: BTreeSet::new(),
            parse_config: ParseConfig::new(language_version),
            units: Vec::new(),
            references: Vec::new(),
            compiled: false,
        }
    }

    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    pub fn parse_config(&self) -> &ParseConfig {
        &self.parse_config
    }

    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    pub fn references(&self) -> &[ReferenceHandle] {
        &self.references
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Define a symbol for every file parsed from now on. The name is stored
    /// exactly as sent.
    pub fn add_symbol(&mut self, name: &str) {
        if self.symbols.insert(name.to_string()) {
            self.parse_config.symbols = self.symbols.clone();
        }
    }

    /// Read and parse one file with the configuration in force right now.
    /// Unreadable files become a unit carrying a diagnostic; they surface as a
    /// normal compile failure rather than a protocol error.
    pub fn add_source_file(&mut self, path: &Path, backend: &dyn CompilerBackend) -> &SourceUnit {
        let unit = match fs::read_to_string(path) {
            Ok(text) => backend.parse(path, &text, &self.parse_config),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "source file unreadable");
                SourceUnit::unreadable(path, &err.to_string())
            }
        };
        debug!(
            path = %path.display(),
            symbols = unit.symbols.len(),
            errors = unit.has_errors,
            "parsed source unit"
        );
        self.units.push(unit);
        &self.units[self.units.len() - 1]
    }

    pub fn add_reference(&mut self, path: PathBuf) {
        self.push_reference(path, ReferenceOrigin::Explicit);
    }

    pub fn add_compatibility_shim(&mut self, path: PathBuf) {
        self.push_reference(path, ReferenceOrigin::CompatibilityShim);
    }

    fn push_reference(&mut self, path: PathBuf, origin: ReferenceOrigin) {
        if self.references.iter().any(|r| r.path == path) {
            debug!(path = %path.display(), "duplicate reference ignored");
            return;
        }
        self.references.push(ReferenceHandle { path, origin });
    }

    /// Hand the accumulated state to the backend. Fails fast on a second call.
    pub fn compile(
        &mut self,
        backend: &dyn CompilerBackend,
    ) -> Result<CompileOutcome, SessionError> {
        if self.compiled {
            return Err(SessionError::AlreadyCompiled);
        }
        self.compiled = true;
        let outcome = match backend.emit(&self.units, &self.references) {
            CompileOutput::Image(payload) => CompileOutcome::Success { payload },
            CompileOutput::Diagnostics(diagnostics) => CompileOutcome::Failure { diagnostics },
        };
        Ok(outcome)
    }
}
