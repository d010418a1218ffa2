mod diagnostic;
mod preprocess;
mod syntax;

use super::image::write_image;
use super::{CompileOutput, CompilerBackend};
use crate::session::{LanguageVersion, ParseConfig, ReferenceHandle, SourceUnit};
use diagnostic::Diagnostic;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

static TYPE_DECL: OnceLock<Option<Regex>> = OnceLock::new();

fn type_decl_regex() -> Option<&'static Regex> {
    TYPE_DECL
        .get_or_init(|| {
            Regex::new(
                r"\b(?:(partial)\s+)?(class|struct|interface|enum|record)\s+([A-Za-z_][A-Za-z0-9_]*)",
            )
            .ok()
        })
        .as_ref()
}

/// Bundled backend: preprocessor, structural syntax check, duplicate type
/// detection, and a deterministic image of the active sources.
///
/// This is not a C# compiler. The syntax check covers literals, comments and
/// bracket nesting only, so statement-level errors such as `int x = ;` inside
/// balanced braces produce an image with no diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteCompiler;

impl LiteCompiler {
    pub fn new() -> Self {
        Self
    }
}

fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |idx| before[idx + 1..].chars().count())
        + 1;
    (line, column)
}

impl CompilerBackend for LiteCompiler {
    fn parse(&self, path: &Path, text: &str, config: &ParseConfig) -> SourceUnit {
        let pre = preprocess::preprocess(text, &config.symbols);
        let scanned = syntax::scan(&pre.text);

        let mut diagnostics: Vec<Diagnostic> = pre.diagnostics;
        diagnostics.extend(scanned.diagnostics);

        let mut declared_types = Vec::new();
        let mut partial_types = Vec::new();
        if let Some(regex) = type_decl_regex() {
            for caps in regex.captures_iter(&scanned.code) {
                let (Some(kind), Some(name)) = (caps.get(2), caps.get(3)) else {
                    continue;
                };
                if kind.as_str() == "record"
                    && config.language_version == LanguageVersion::CSharp7_3
                {
                    let (line, column) = line_column(&scanned.code, kind.start());
                    diagnostics.push(Diagnostic::error(
                        "CS8400",
                        line,
                        column,
                        "Feature 'records' is not available in C# 7.3. Please use language version 9.0 or greater.",
                    ));
                }
                if caps.get(1).is_some() {
                    partial_types.push(name.as_str().to_string());
                } else {
                    declared_types.push(name.as_str().to_string());
                }
            }
        }

        diagnostics.sort_by_key(|d| (d.line, d.column));
        let has_errors = diagnostics.iter().any(Diagnostic::is_error);
        SourceUnit {
            path: path.to_path_buf(),
            symbols: pre.symbols,
            active_text: pre.text,
            declared_types,
            partial_types,
            diagnostics: diagnostics.iter().map(|d| d.render(path)).collect(),
            has_errors,
        }
    }

    fn emit(&self, units: &[SourceUnit], references: &[ReferenceHandle]) -> CompileOutput {
        let mut diagnostics = Vec::new();
        let mut failed = false;

        for reference in references {
            if !reference.path.is_file() {
                diagnostics.push(format!(
                    "error CS0006: Metadata file '{}' could not be found",
                    reference.path.display()
                ));
                failed = true;
            }
        }

        let mut owners: BTreeMap<&str, &Path> = BTreeMap::new();
        for unit in units {
            diagnostics.extend(unit.diagnostics.iter().cloned());
            failed |= unit.has_errors;
            for name in &unit.declared_types {
                match owners.get(name.as_str()) {
                    Some(first) => {
                        diagnostics.push(format!(
                            "{}: error CS0101: The namespace '<global namespace>' already contains a definition for '{}' (first declared in {})",
                            unit.path.display(),
                            name,
                            first.display()
                        ));
                        failed = true;
                    }
                    None => {
                        owners.insert(name.as_str(), unit.path.as_path());
                    }
                }
            }
        }

        if failed {
            return CompileOutput::Diagnostics(diagnostics);
        }
        match write_image(units, references) {
            Ok(image) => CompileOutput::Image(image),
            Err(err) => CompileOutput::Diagnostics(vec![format!(
                "error CS0016: Could not write to output image: {err}"
            )]),
        }
    }
}
