use super::*;
use crate::compiler::{CompileOutput, CompilerBackend, LiteCompiler};
use crate::protocol::CompileOutcome;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

fn write_source(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("write source");
    path
}

/// Records how many times emit ran so re-compilation would be visible.
struct CountingBackend {
    inner: LiteCompiler,
    emits: Cell<usize>,
}

impl CompilerBackend for CountingBackend {
    fn parse(&self, path: &Path, text: &str, config: &ParseConfig) -> SourceUnit {
        self.inner.parse(path, text, config)
    }

    fn emit(&self, units: &[SourceUnit], references: &[ReferenceHandle]) -> CompileOutput {
        self.emits.set(self.emits.get() + 1);
        self.inner.emit(units, references)
    }
}

#[test]
fn new_session_is_empty() {
    let session = CompilerSession::default();
    assert!(session.symbols().is_empty());
    assert!(session.units().is_empty());
    assert!(session.references().is_empty());
    assert!(!session.is_compiled());
    assert_eq!(session.parse_config().language_version, LanguageVersion::Latest);
}

#[test]
fn symbols_are_a_set() {
    let mut session = CompilerSession::default();
    session.add_symbol("DEBUG");
    session.add_symbol("DEBUG");
    assert_eq!(session.symbols().len(), 1);
    assert!(session.parse_config().symbols.contains("DEBUG"));
}

#[test]
fn symbols_are_stored_exactly_as_sent() {
    let mut session = CompilerSession::default();
    session.add_symbol(" FOO ");
    session.add_symbol("   ");
    let stored: Vec<&str> = session.symbols().iter().map(String::as_str).collect();
    assert_eq!(stored, vec!["   ", " FOO "]);
    assert!(!session.symbols().contains("FOO"));
}

#[test]
fn file_sees_only_symbols_added_before_it() {
    let dir = tempfile::tempdir().unwrap();
    let backend = LiteCompiler::new();
    let text = "#if LATE\nclass WithLate {}\n#else\nclass WithoutLate {}\n#endif";
    let early = write_source(dir.path(), "Early.cs", text);
    let late = write_source(dir.path(), "Late.cs", text.replace("With", "Second").as_str());

    let mut session = CompilerSession::default();
    session.add_symbol("FIRST");
    session.add_source_file(&early, &backend);
    session.add_symbol("LATE");
    session.add_source_file(&late, &backend);

    let units = session.units();
    assert_eq!(units.len(), 2);
    assert_eq!(
        units[0].symbols.iter().cloned().collect::<Vec<_>>(),
        vec!["FIRST".to_string()]
    );
    assert_eq!(units[0].declared_types, vec!["WithoutLate"]);
    assert_eq!(
        units[1].symbols.iter().cloned().collect::<Vec<_>>(),
        vec!["FIRST".to_string(), "LATE".to_string()]
    );
    assert_eq!(units[1].declared_types, vec!["SecondLate"]);
}

#[test]
fn units_keep_arrival_order() {
    let dir = tempfile::tempdir().unwrap();
    let backend = LiteCompiler::new();
    let mut session = CompilerSession::default();
    for name in ["c.cs", "a.cs", "b.cs"] {
        let path = write_source(dir.path(), name, "");
        session.add_source_file(&path, &backend);
    }
    let names: Vec<_> = session
        .units()
        .iter()
        .map(|u| u.path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["c.cs", "a.cs", "b.cs"]);
}

#[test]
fn unreadable_source_becomes_compile_failure() {
    let backend = LiteCompiler::new();
    let mut session = CompilerSession::default();
    let unit = session.add_source_file(Path::new("/no/such/dir/Missing.cs"), &backend);
    assert!(unit.has_errors);
    assert!(unit.diagnostics[0].contains("CS2001"));

    match session.compile(&backend).unwrap() {
        CompileOutcome::Failure { diagnostics } => assert!(diagnostics[0].contains("Missing.cs")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn references_deduplicate_and_remember_origin() {
    let mut session = CompilerSession::default();
    session.add_reference(PathBuf::from("/game/Managed/UnityEngine.dll"));
    session.add_reference(PathBuf::from("/game/Managed/UnityEngine.dll"));
    session.add_compatibility_shim(PathBuf::from("/tools/MicroRuntimeForwarder.dll"));
    let refs = session.references();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].origin, ReferenceOrigin::Explicit);
    assert_eq!(refs[1].origin, ReferenceOrigin::CompatibilityShim);
}

#[test]
fn compile_succeeds_with_valid_source() {
    let dir = tempfile::tempdir().unwrap();
    let backend = LiteCompiler::new();
    let source = write_source(dir.path(), "Hello.cs", "public class Hello { }");
    let mut session = CompilerSession::default();
    session.add_source_file(&source, &backend);
    match session.compile(&backend).unwrap() {
        CompileOutcome::Success { payload } => assert!(!payload.is_empty()),
        other => panic!("expected success, got {other:?}"),
    }
    assert!(session.is_compiled());
}

#[test]
fn second_compile_is_rejected_without_rerunning() {
    let backend = CountingBackend {
        inner: LiteCompiler::new(),
        emits: Cell::new(0),
    };
    let mut session = CompilerSession::default();
    assert!(session.compile(&backend).is_ok());
    assert!(matches!(
        session.compile(&backend),
        Err(SessionError::AlreadyCompiled)
    ));
    assert_eq!(backend.emits.get(), 1);
}
