use super::*;
use crate::session::{LanguageVersion, ParseConfig, ReferenceHandle, ReferenceOrigin};
use std::collections::BTreeSet;
use std::path::PathBuf;

fn config(symbols: &[&str]) -> ParseConfig {
    ParseConfig {
        language_version: LanguageVersion::Latest,
        symbols: symbols.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
    }
}

fn parse(text: &str, symbols: &[&str]) -> crate::session::SourceUnit {
    LiteCompiler::new().parse(&PathBuf::from("Mod.cs"), text, &config(symbols))
}

#[test]
fn one_line_class_parses_cleanly() {
    let unit = parse("public class Greeter { }", &[]);
    assert!(!unit.has_errors);
    assert!(unit.diagnostics.is_empty());
    assert_eq!(unit.declared_types, vec!["Greeter".to_string()]);
}

#[test]
fn statement_level_errors_are_not_checked() {
    let unit = parse("class A { void M() { int x = ; } }", &[]);
    assert!(!unit.has_errors);
    assert!(unit.diagnostics.is_empty());
}

#[test]
fn missing_brace_reports_position_at_end_of_file() {
    let unit = parse("public class Broken {\n    void Run() { }\n", &[]);
    assert!(unit.has_errors);
    assert_eq!(unit.diagnostics, vec!["Mod.cs(3,1): error CS1513: } expected"]);
}

#[test]
fn stray_closer_is_reported() {
    let unit = parse("class A { } }", &[]);
    assert_eq!(
        unit.diagnostics,
        vec!["Mod.cs(1,13): error CS1022: Type or namespace definition, or end-of-file expected"]
    );
}

#[test]
fn mismatched_closer_names_the_expected_bracket() {
    let unit = parse("class A { void F( } }", &[]);
    assert_eq!(unit.diagnostics, vec!["Mod.cs(1,19): error CS1026: ) expected"]);
}

#[test]
fn brackets_inside_literals_and_comments_are_ignored() {
    let text = r#"class A {
    // }
    /* { ( [ */
    string s = "}";
    string v = @"C:\path ""{"" ";
    char c = '{';
    char e = '\'';
}"#;
    let unit = parse(text, &[]);
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
}

#[test]
fn unterminated_literals_are_errors() {
    assert!(parse("class A { string s = \"abc; }", &[])
        .diagnostics
        .iter()
        .any(|d| d.contains("CS1010")));
    assert!(parse("class A { } /* open", &[])
        .diagnostics
        .iter()
        .any(|d| d.contains("CS1035")));
    assert!(parse("class A { char c = ''; }", &[])
        .diagnostics
        .iter()
        .any(|d| d.contains("CS1011")));
}

#[test]
fn conditional_regions_follow_symbols() {
    let text = "#if MODERN\nclass Modern { }\n#else\nclass Legacy { }\n#endif\n";
    assert_eq!(parse(text, &["MODERN"]).declared_types, vec!["Modern"]);
    assert_eq!(parse(text, &[]).declared_types, vec!["Legacy"]);
}

#[test]
fn inactive_region_errors_are_not_reported() {
    let text = "#if NEVER\nclass Broken {\n#endif\nclass Fine { }\n";
    let unit = parse(text, &[]);
    assert!(!unit.has_errors, "{:?}", unit.diagnostics);
}

#[test]
fn elif_chain_takes_first_true_branch_only() {
    let text = "#if A\nclass One {}\n#elif B\nclass Two {}\n#elif true\nclass Three {}\n#else\nclass Four {}\n#endif";
    assert_eq!(parse(text, &["A", "B"]).declared_types, vec!["One"]);
    assert_eq!(parse(text, &["B"]).declared_types, vec!["Two"]);
    assert_eq!(parse(text, &[]).declared_types, vec!["Three"]);
}

#[test]
fn nested_conditionals_respect_parent_state() {
    let text = "#if OUTER\n#if INNER\nclass Both {}\n#else\nclass OuterOnly {}\n#endif\n#endif\nclass Always {}";
    assert_eq!(parse(text, &[]).declared_types, vec!["Always"]);
    assert_eq!(
        parse(text, &["OUTER"]).declared_types,
        vec!["OuterOnly", "Always"]
    );
}

#[test]
fn expressions_support_operators_and_grouping() {
    let text = "#if (A && !B) || (C == true)\nclass Hit {}\n#endif";
    assert_eq!(parse(text, &["A"]).declared_types, vec!["Hit"]);
    assert_eq!(parse(text, &["C"]).declared_types, vec!["Hit"]);
    assert!(parse(text, &["A", "B"]).declared_types.is_empty());
}

#[test]
fn invalid_expression_is_reported() {
    let unit = parse("#if A &&\nclass X {}\n#endif", &["A"]);
    assert!(unit.diagnostics[0].contains("CS1517"));
    assert!(unit.declared_types.is_empty());
}

#[test]
fn define_and_undef_are_local_to_the_file() {
    let unit = parse("#define LOCAL\n#undef GLOBAL\n#if LOCAL && !GLOBAL\nclass Y {}\n#endif", &["GLOBAL"]);
    assert_eq!(unit.declared_types, vec!["Y"]);
    assert!(unit.symbols.contains("LOCAL"));
    assert!(!unit.symbols.contains("GLOBAL"));
}

#[test]
fn define_after_code_is_rejected() {
    let unit = parse("class Z {}\n#define LATE\n", &[]);
    assert!(unit.diagnostics[0].contains("CS1032"));
}

#[test]
fn unbalanced_directives_are_reported() {
    assert!(parse("#if A\nclass A {}\n", &[]).diagnostics[0].contains("CS1027"));
    assert!(parse("#endif\n", &[]).diagnostics[0].contains("CS1028"));
    assert!(parse("#if A\n#else\n#else\n#endif", &[]).diagnostics[0].contains("CS1028"));
    assert!(parse("#frobnicate\n", &[]).diagnostics[0].contains("CS1024"));
}

#[test]
fn error_directive_fails_but_warning_does_not() {
    let unit = parse("#warning check this\nclass W {}", &[]);
    assert!(!unit.has_errors);
    assert_eq!(unit.diagnostics, vec!["Mod.cs(1,1): warning CS1030: #warning: 'check this'"]);

    let unit = parse("#if !SUPPORTED\n#error unsupported host\n#endif", &[]);
    assert!(unit.has_errors);
    assert!(unit.diagnostics[0].ends_with("#error: 'unsupported host'"));
}

#[test]
fn records_require_newer_language_version() {
    let old = ParseConfig::new(LanguageVersion::CSharp7_3);
    let unit = LiteCompiler::new().parse(&PathBuf::from("R.cs"), "record Point(int X);", &old);
    assert!(unit.diagnostics[0].starts_with("R.cs(1,1): error CS8400"));
    let unit = parse("record Point(int X);", &[]);
    assert!(!unit.has_errors);
}

#[test]
fn emit_produces_readable_image() {
    let units = vec![
        parse("public class Alpha { }", &["DEBUG"]),
        parse("public partial class Beta { }\npartial class Beta { }", &[]),
    ];
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("Core.dll");
    std::fs::write(&reference, b"MZ").unwrap();
    let references = vec![ReferenceHandle {
        path: reference.clone(),
        origin: ReferenceOrigin::Explicit,
    }];

    let CompileOutput::Image(bytes) = LiteCompiler::new().emit(&units, &references) else {
        panic!("expected image");
    };
    assert!(bytes.starts_with(IMAGE_MAGIC));
    let summary = read_image(&bytes).unwrap();
    assert_eq!(summary.version, IMAGE_FORMAT_VERSION);
    assert_eq!(summary.units.len(), 2);
    assert_eq!(summary.units[0].symbols, vec!["DEBUG"]);
    assert_eq!(summary.units[1].partial_types, vec!["Beta", "Beta"]);
    assert_eq!(summary.type_count(), 1);
    assert_eq!(summary.references, vec![reference.to_string_lossy().to_string()]);
    assert!(summary.shims.is_empty());
}

#[test]
fn emit_reports_missing_references_before_unit_diagnostics() {
    let units = vec![parse("class Broken {", &[])];
    let references = vec![ReferenceHandle {
        path: PathBuf::from("/definitely/missing/Ref.dll"),
        origin: ReferenceOrigin::Explicit,
    }];
    let CompileOutput::Diagnostics(lines) = LiteCompiler::new().emit(&units, &references) else {
        panic!("expected diagnostics");
    };
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("CS0006"));
    assert!(lines[1].contains("CS1513"));
}

#[test]
fn duplicate_types_across_units_fail() {
    let units = vec![parse("class Dup {}", &[]), parse("class Dup {}", &[])];
    let CompileOutput::Diagnostics(lines) = LiteCompiler::new().emit(&units, &[]) else {
        panic!("expected diagnostics");
    };
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("CS0101"));
}

#[test]
fn empty_session_still_emits_an_image() {
    let CompileOutput::Image(bytes) = LiteCompiler::new().emit(&[], &[]) else {
        panic!("expected image");
    };
    assert!(!bytes.is_empty());
    assert!(read_image(&bytes).unwrap().units.is_empty());
}

#[test]
fn corrupt_image_is_rejected() {
    assert!(read_image(b"nope").is_err());
    let mut bytes = IMAGE_MAGIC.to_vec();
    bytes.extend_from_slice(&1i32.to_le_bytes());
    bytes.extend_from_slice(&3i32.to_le_bytes());
    assert!(read_image(&bytes).is_err());
}
