//! Compiler capability used by the helper session.
//!
//! Semantic analysis and code generation live behind [`CompilerBackend`]. The
//! session only needs two calls: parse a file under a given configuration, and
//! emit the accumulated units against a reference set. [`LiteCompiler`] is the
//! bundled backend: a preprocessor and structural syntax checker that emits a
//! self-describing image.

mod image;
mod lite;

#[cfg(test)]
mod tests;

use crate::session::{ParseConfig, ReferenceHandle, SourceUnit};
use std::path::Path;

pub use image::{read_image, ImageSummary, ImageUnit, IMAGE_FORMAT_VERSION, IMAGE_MAGIC};
pub use lite::LiteCompiler;

/// Result of an emit: either the binary image or every diagnostic, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutput {
    Image(Vec<u8>),
    Diagnostics(Vec<String>),
}

pub trait CompilerBackend {
    /// Parse one file. Never fails: problems are carried as unit diagnostics.
    fn parse(&self, path: &Path, text: &str, config: &ParseConfig) -> SourceUnit;

    fn emit(&self, units: &[SourceUnit], references: &[ReferenceHandle]) -> CompileOutput;
}
