use modforge::host::{
    compile_mods, run_session, CollectingSink, DiscoveryRoots, HostIdentity, HostRequest,
    HostVersion, MemoryLoader, SessionOutcome, SessionPlan,
};
use modforge::layout::{HostPlatform, COMPATIBILITY_SHIM_FILE, MICRO_RUNTIME_KEY};
use modforge::protocol::{Action, ActionFrame, CompileOutcome, FrameReader, FrameWriter};
use modforge::supervisor::{HelperChannel, HelperProcess, LaunchMode, LaunchSpec, SupervisorOptions};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

fn helper_bin() -> &'static str {
    env!("CARGO_BIN_EXE_modforge-compiler")
}

fn launch_spec(extra: &[&str]) -> LaunchSpec {
    let mut spec = LaunchSpec::new(helper_bin());
    spec.mode = LaunchMode::Direct;
    spec.helper_args = extra.iter().map(|s| s.to_string()).collect();
    spec
}

fn options() -> SupervisorOptions {
    SupervisorOptions {
        result_timeout: Some(Duration::from_secs(30)),
        exit_grace: Duration::from_secs(5),
        ..SupervisorOptions::default()
    }
}

fn identity() -> HostIdentity {
    HostIdentity {
        platform: HostPlatform::Linux,
        version: HostVersion::parse("2019.4.1f1").unwrap(),
        debug_build: false,
        runtime_key: None,
    }
}

fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

/// Run the helper with raw stdin bytes and collect (exit code, stdout).
fn run_raw(stdin_bytes: &[u8]) -> (Option<i32>, Vec<u8>) {
    let mut child = Command::new(helper_bin())
        .env_remove("MODFORGE_LOGS")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn helper");
    {
        let mut stdin = child.stdin.take().unwrap();
        let _ = stdin.write_all(stdin_bytes);
    }
    let output = child.wait_with_output().expect("wait helper");
    (output.status.code(), output.stdout)
}

fn encode(frames: &[ActionFrame]) -> Vec<u8> {
    let mut writer = FrameWriter::new(Vec::new());
    for frame in frames {
        frame.write_to(&mut writer).unwrap();
    }
    writer.finish().unwrap()
}

#[test]
fn one_line_source_compiles_to_non_empty_image() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "Mods/Hello.cs", "public class Hello { }");

    let mut helper = HelperProcess::launch(&launch_spec(&[]), options()).unwrap();
    helper
        .send(&ActionFrame::AddSourceFile(source.to_string_lossy().to_string()))
        .unwrap();
    helper.send(&ActionFrame::Compile).unwrap();
    let outcome = helper.read_outcome().unwrap();
    helper.send(&ActionFrame::Finish).unwrap();
    assert!(helper.shutdown().success());

    match outcome {
        CompileOutcome::Success { payload } => assert!(!payload.is_empty()),
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn syntax_errors_reach_the_sink_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = write(dir.path(), "Mods/A.cs", "class A {");
    let second = write(dir.path(), "Mods/B.cs", "class B { void F( }");
    let discovered = modforge::host::Discovered {
        sources: vec![first, second],
        references: vec![],
    };
    let plan = SessionPlan::build(&identity(), &discovered);

    let mut helper = HelperProcess::launch(&launch_spec(&[]), options()).unwrap();
    let mut sink = CollectingSink::default();
    let mut loader = MemoryLoader::default();
    let report = run_session(&mut helper, &plan, &mut sink, &mut loader).unwrap();
    assert!(helper.shutdown().success());

    assert_eq!(report.outcome, SessionOutcome::Failed { diagnostics: 2 });
    assert_eq!(sink.lines.len(), 2);
    assert!(sink.lines[0].contains("A.cs") && sink.lines[0].contains("CS1513"));
    assert!(sink.lines[1].contains("B.cs") && sink.lines[1].contains("CS1026"));
    assert!(loader.image.is_none());
}

#[test]
fn compile_mods_discovers_and_loads() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "Install/Core/Core.dll", "MZ");
    write(
        root,
        "Install/Plugins/Helpers.cs",
        "#if UNITY_2019_4_OR_NEWER\npublic static class Helpers { }\n#endif",
    );
    write(root, "Game/Mods/Feature.cs", "public class Feature { }");
    write(root, "Game/Managed/UnityEngine.dll", "MZ");

    let request = HostRequest {
        identity: identity(),
        roots: DiscoveryRoots {
            core: root.join("Install/Core"),
            plugins: root.join("Install/Plugins"),
            mods: root.join("Game/Mods"),
            managed: root.join("Game/Managed"),
        },
        launch: launch_spec(&[]),
        options: options(),
    };
    let mut sink = CollectingSink::default();
    let mut loader = MemoryLoader::default();
    let report = compile_mods(&request, &mut sink, &mut loader).unwrap();
    assert!(report.outcome.is_loaded(), "{:?}", sink.lines);

    let summary = modforge::compiler::read_image(loader.image.as_deref().unwrap()).unwrap();
    assert_eq!(summary.units.len(), 2);
    assert_eq!(summary.units[0].types, vec!["Helpers"]);
    assert_eq!(summary.references.len(), 2);
    assert!(summary.references[0].ends_with("Core.dll"));
    assert!(summary.shims.is_empty());
}

#[test]
fn compatibility_shim_is_found_next_to_the_helper_tools() {
    let tools = tempfile::tempdir().unwrap();
    fs::write(tools.path().join(COMPATIBILITY_SHIM_FILE), b"MZ").unwrap();
    let tools_arg = tools.path().to_string_lossy().to_string();

    let mut identity = identity();
    identity.runtime_key = Some(MICRO_RUNTIME_KEY.to_string());
    let plan = SessionPlan::build(&identity, &modforge::host::Discovered::default());
    assert_eq!(plan.frames().last(), Some(&ActionFrame::EnableCompatibilityShim));

    let mut helper =
        HelperProcess::launch(&launch_spec(&["--shim-dir", &tools_arg]), options()).unwrap();
    let mut loader = MemoryLoader::default();
    let mut sink = CollectingSink::default();
    let report = run_session(&mut helper, &plan, &mut sink, &mut loader).unwrap();
    helper.shutdown();
    assert!(report.outcome.is_loaded());
    let summary = modforge::compiler::read_image(loader.image.as_deref().unwrap()).unwrap();
    assert_eq!(summary.references.len(), 1);
    assert!(summary.references[0].ends_with(COMPATIBILITY_SHIM_FILE));
    assert_eq!(summary.shims, summary.references);
}

#[test]
fn unknown_action_code_is_fatal() {
    let mut bytes = 42i32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&encode(&[ActionFrame::Compile, ActionFrame::Finish]));
    let (code, stdout) = run_raw(&bytes);
    assert_eq!(code, Some(2));
    assert!(stdout.is_empty(), "helper answered after an unknown action");
}

#[test]
fn second_compile_fails_after_one_result() {
    let bytes = encode(&[ActionFrame::Compile, ActionFrame::Compile, ActionFrame::Finish]);
    let (code, stdout) = run_raw(&bytes);
    assert_eq!(code, Some(2));

    let mut reader = FrameReader::new(Cursor::new(stdout.as_slice()));
    assert!(CompileOutcome::read_from(&mut reader).unwrap().is_success());
    assert_eq!(reader.get_ref().position() as usize, stdout.len());
}

#[test]
fn clean_finish_exits_zero_and_writes_nothing() {
    let bytes = encode(&[ActionFrame::AddPreprocessorSymbol("DEBUG".into()), ActionFrame::Finish]);
    let (code, stdout) = run_raw(&bytes);
    assert_eq!(code, Some(0));
    assert!(stdout.is_empty());
}

#[test]
fn closed_stdin_before_finish_is_a_protocol_error() {
    let (code, stdout) = run_raw(&Action::AddReference.code().to_le_bytes());
    assert_eq!(code, Some(2));
    assert!(stdout.is_empty());
}
