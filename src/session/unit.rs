use clap::ValueEnum;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Source language level handed to the compiler backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LanguageVersion {
    #[value(name = "7.3")]
    CSharp7_3,
    #[default]
    Latest,
}

impl LanguageVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageVersion::CSharp7_3 => "7.3",
            LanguageVersion::Latest => "latest",
        }
    }
}

/// Snapshot of the parse options in force at one point of the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseConfig {
    pub language_version: LanguageVersion,
    pub symbols: BTreeSet<String>,
}

impl ParseConfig {
    pub fn new(language_version: LanguageVersion) -> Self {
        Self {
            language_version,
            symbols: BTreeSet::new(),
        }
    }
}

/// One parsed source file. Owns its parse result outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    /// Symbols that were in effect when the file was parsed, plus its own `#define`s.
    pub symbols: BTreeSet<String>,
    /// Source text with inactive conditional regions blanked out.
    pub active_text: String,
    /// Non-partial type names declared at any nesting level.
    pub declared_types: Vec<String>,
    pub partial_types: Vec<String>,
    /// Formatted diagnostics, including warnings.
    pub diagnostics: Vec<String>,
    pub has_errors: bool,
}

impl SourceUnit {
    /// Unit standing in for a file that could not be read.
    pub fn unreadable(path: &Path, reason: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            symbols: BTreeSet::new(),
            active_text: String::new(),
            declared_types: Vec::new(),
            partial_types: Vec::new(),
            diagnostics: vec![format!(
                "error CS2001: Source file '{}' could not be found ({reason})",
                path.display()
            )],
            has_errors: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOrigin {
    Explicit,
    CompatibilityShim,
}

/// A binary reference handed to the compiler at emit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceHandle {
    pub path: PathBuf,
    pub origin: ReferenceOrigin,
}
