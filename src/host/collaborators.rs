use crate::compiler::read_image;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Receives compiler diagnostics, one line at a time, in compiler order.
pub trait DiagnosticSink {
    fn diagnostic(&mut self, line: &str);
}

/// Forwards diagnostics to the log.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn diagnostic(&mut self, line: &str) {
        if line.contains(": warning ") {
            warn!(target: "modforge::diagnostics", "{line}");
        } else {
            error!(target: "modforge::diagnostics", "{line}");
        }
    }
}

/// Keeps every line. Used by the CLI to print failures and by tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectingSink {
    pub lines: Vec<String>,
}

impl DiagnosticSink for CollectingSink {
    fn diagnostic(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Fan out to two sinks.
pub struct TeeSink<'a, A, B> {
    pub first: &'a mut A,
    pub second: &'a mut B,
}

impl<A: DiagnosticSink, B: DiagnosticSink> DiagnosticSink for TeeSink<'_, A, B> {
    fn diagnostic(&mut self, line: &str) {
        self.first.diagnostic(line);
        self.second.diagnostic(line);
    }
}

/// Turns a compiled image into a loaded library.
pub trait LibraryLoader {
    fn load(&mut self, image: &[u8]) -> Result<()>;
}

/// Writes the image to disk after checking it is a readable image.
#[derive(Debug, Clone)]
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LibraryLoader for FileLoader {
    fn load(&mut self, image: &[u8]) -> Result<()> {
        let summary = read_image(image).context("compiled image is malformed")?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, image)
            .with_context(|| format!("failed to write image to {}", self.path.display()))?;
        info!(
            path = %self.path.display(),
            units = summary.units.len(),
            types = summary.type_count(),
            references = summary.references.len(),
            shims = summary.shims.len(),
            bytes = image.len(),
            "library image written"
        );
        Ok(())
    }
}

/// Accepts images without storing them; used when no output path is set.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    pub image: Option<Vec<u8>>,
}

impl LibraryLoader for MemoryLoader {
    fn load(&mut self, image: &[u8]) -> Result<()> {
        let summary = read_image(image).context("compiled image is malformed")?;
        info!(units = summary.units.len(), types = summary.type_count(), "library image loaded");
        self.image = Some(image.to_vec());
        Ok(())
    }
}
