use super::*;
use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

fn encoded(build: impl FnOnce(&mut FrameWriter<Vec<u8>>)) -> Vec<u8> {
    let mut writer = FrameWriter::new(Vec::new());
    build(&mut writer);
    writer.finish().expect("flush to vec")
}

fn reader(bytes: Vec<u8>) -> FrameReader<Cursor<Vec<u8>>> {
    FrameReader::new(Cursor::new(bytes))
}

#[test]
fn i32_is_little_endian() {
    let bytes = encoded(|w| w.put_i32(0x0102_0304));
    assert_eq!(bytes, vec![0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn integers_round_trip_including_extremes() {
    for value in [0, 1, -1, i32::MIN, i32::MAX, 42] {
        let bytes = encoded(|w| w.put_i32(value));
        assert_eq!(reader(bytes).read_i32("value").unwrap(), value);
    }
}

#[test]
fn bool_writes_canonical_byte_and_reads_any_nonzero_as_true() {
    assert_eq!(encoded(|w| w.put_bool(true)), vec![1]);
    assert_eq!(encoded(|w| w.put_bool(false)), vec![0]);
    assert!(reader(vec![0x7f]).read_bool("flag").unwrap());
    assert!(!reader(vec![0]).read_bool("flag").unwrap());
}

#[test]
fn strings_round_trip_including_empty_and_multibyte() {
    for value in ["", "UNITY_2019_4", "/tmp/mods/Ünïcode Mod/Main.cs", "日本語"] {
        let bytes = encoded(|w| w.put_string("text", value).unwrap());
        assert_eq!(bytes.len(), 4 + value.len());
        assert_eq!(reader(bytes).read_string("text").unwrap(), value);
    }
}

#[test]
fn empty_blob_round_trips() {
    let bytes = encoded(|w| w.put_bytes("blob", &[]).unwrap());
    assert_eq!(bytes, vec![0, 0, 0, 0]);
    assert!(reader(bytes).read_bytes("blob").unwrap().is_empty());
}

/// Records every `write` call separately.
#[derive(Clone, Default)]
struct WriteLog(Rc<RefCell<Vec<Vec<u8>>>>);

impl Write for WriteLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn frame_reaches_the_stream_in_one_write() {
    let log = WriteLog::default();
    let mut writer = FrameWriter::new(log.clone());
    writer.put_i32(7);
    writer.put_string("text", "abc").unwrap();
    assert!(log.0.borrow().is_empty());

    writer.flush_frame().unwrap();
    let writes = log.0.borrow();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].len(), 11);
}

#[test]
fn short_string_payload_is_truncation() {
    let mut bytes = 10i32.to_le_bytes().to_vec();
    bytes.extend_from_slice(b"abc");
    match reader(bytes).read_string("symbol name") {
        Err(ProtocolError::Truncated {
            what,
            expected,
            got,
        }) => {
            assert_eq!(what, "symbol name");
            assert_eq!(expected, 10);
            assert_eq!(got, 3);
        }
        other => panic!("expected truncation, got {other:?}"),
    }
}

#[test]
fn negative_length_is_rejected() {
    let bytes = (-5i32).to_le_bytes().to_vec();
    assert!(matches!(
        reader(bytes).read_bytes("blob"),
        Err(ProtocolError::NegativeLength { len: -5, .. })
    ));
}

#[test]
fn oversized_length_is_rejected_without_reading() {
    let bytes = i32::MAX.to_le_bytes().to_vec();
    assert!(matches!(
        reader(bytes).read_bytes("blob"),
        Err(ProtocolError::LengthTooLarge { .. })
    ));
}

#[test]
fn invalid_utf8_is_rejected() {
    let mut bytes = 2i32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe]);
    assert!(matches!(
        reader(bytes).read_string("source path"),
        Err(ProtocolError::InvalidUtf8 { .. })
    ));
}

#[test]
fn action_code_distinguishes_clean_end_from_partial_code() {
    assert!(reader(Vec::new()).read_action_code().unwrap().is_none());
    assert!(matches!(
        reader(vec![1, 0]).read_action_code(),
        Err(ProtocolError::Truncated { got: 2, .. })
    ));
    assert_eq!(
        reader(4i32.to_le_bytes().to_vec())
            .read_action_code()
            .unwrap(),
        Some(4)
    );
}

#[test]
fn action_codes_are_unique_and_reversible() {
    for action in Action::ALL {
        assert_eq!(Action::from_code(action.code()), Some(action));
    }
    assert_eq!(Action::from_code(6), None);
    assert_eq!(Action::from_code(-1), None);
}

#[test]
fn text_frame_layout_is_code_then_string() {
    let bytes = encoded(|w| {
        ActionFrame::AddReference("a.dll".to_string())
            .write_to(w)
            .unwrap()
    });
    let mut expected = Action::AddReference.code().to_le_bytes().to_vec();
    expected.extend_from_slice(&5i32.to_le_bytes());
    expected.extend_from_slice(b"a.dll");
    assert_eq!(bytes, expected);
}

#[test]
fn empty_frames_are_only_the_code() {
    for frame in [
        ActionFrame::EnableCompatibilityShim,
        ActionFrame::Compile,
        ActionFrame::Finish,
    ] {
        let bytes = encoded(|w| frame.write_to(w).unwrap());
        assert_eq!(bytes, frame.action().code().to_le_bytes().to_vec());
    }
}

#[test]
fn frames_decode_back_from_the_wire() {
    let frames = vec![
        ActionFrame::AddPreprocessorSymbol("DEBUG".to_string()),
        ActionFrame::AddSourceFile("/mods/a.cs".to_string()),
        ActionFrame::EnableCompatibilityShim,
        ActionFrame::Compile,
    ];
    let bytes = encoded(|w| {
        for frame in &frames {
            frame.write_to(w).unwrap();
        }
    });
    let mut r = reader(bytes);
    let mut decoded = Vec::new();
    while let Some(code) = r.read_action_code().unwrap() {
        let action = Action::from_code(code).unwrap();
        decoded.push(ActionFrame::read_payload(action, &mut r).unwrap());
    }
    assert_eq!(decoded, frames);
}

#[test]
fn success_outcome_layout() {
    let outcome = CompileOutcome::Success {
        payload: vec![9, 8, 7],
    };
    let bytes = encoded(|w| outcome.write_to(w).unwrap());
    assert_eq!(bytes, vec![1, 3, 0, 0, 0, 9, 8, 7]);
    assert_eq!(CompileOutcome::read_from(&mut reader(bytes)).unwrap(), outcome);
}

#[test]
fn failure_outcome_keeps_diagnostic_order() {
    let outcome = CompileOutcome::Failure {
        diagnostics: vec!["first".to_string(), String::new(), "third".to_string()],
    };
    let bytes = encoded(|w| outcome.write_to(w).unwrap());
    assert_eq!(bytes[0], 0);
    assert_eq!(&bytes[1..5], &3i32.to_le_bytes());
    assert_eq!(CompileOutcome::read_from(&mut reader(bytes)).unwrap(), outcome);
}

#[test]
fn truncated_outcome_is_an_error() {
    let outcome = CompileOutcome::Success {
        payload: vec![1, 2, 3, 4],
    };
    let mut bytes = encoded(|w| outcome.write_to(w).unwrap());
    bytes.truncate(bytes.len() - 1);
    assert!(matches!(
        CompileOutcome::read_from(&mut reader(bytes)),
        Err(ProtocolError::Truncated { .. })
    ));
}

#[test]
fn plan_frames_serialize_with_action_tag() {
    let json = serde_json::to_string(&ActionFrame::AddSourceFile("/m/a.cs".to_string())).unwrap();
    assert_eq!(json, r#"{"action":"add_source_file","value":"/m/a.cs"}"#);
    let json = serde_json::to_string(&ActionFrame::Compile).unwrap();
    assert_eq!(json, r#"{"action":"compile"}"#);
}
