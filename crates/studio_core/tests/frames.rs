use pretty_assertions::assert_eq;
use studio_core::{interpret_line, Frame, ProgressInfo};

#[test]
fn non_frame_lines_are_skipped() {
    assert_eq!(interpret_line(""), None);
    assert_eq!(interpret_line("   "), None);
    assert_eq!(interpret_line(": keep-alive"), None);
    assert_eq!(interpret_line("event: message"), None);
    assert_eq!(interpret_line("data:"), None);
}

#[test]
fn sentinel_ends_the_stream() {
    assert_eq!(interpret_line("data: [DONE]"), Some(Frame::StreamEnd));
    assert_eq!(interpret_line("data:[DONE]\r"), Some(Frame::StreamEnd));
    assert_eq!(
        interpret_line(r#"data: {"type":"done"}"#),
        Some(Frame::StreamEnd)
    );
}

#[test]
fn unparseable_json_falls_back_to_message_text() {
    assert_eq!(
        interpret_line("data: {\"type\": \"message\", "),
        Some(Frame::Message("{\"type\": \"message\",".to_string()))
    );
    assert_eq!(
        interpret_line("data: plain words"),
        Some(Frame::Message("plain words".to_string()))
    );
    assert_eq!(
        interpret_line(r#"data: "quoted""#),
        Some(Frame::Message("quoted".to_string()))
    );
}

#[test]
fn session_id_is_read_from_content() {
    assert_eq!(
        interpret_line(r#"data: {"type":"session_id","content":" s1 "}"#),
        Some(Frame::SessionId("s1".to_string()))
    );
    assert_eq!(
        interpret_line(r#"data: {"type":"session_id","content":""}"#),
        Some(Frame::Unknown("session_id".to_string()))
    );
}

#[test]
fn file_delta_accepts_direct_and_nested_fields() {
    assert_eq!(
        interpret_line(r#"data: {"type":"artifact_file","path":"/App.tsx","code":"x"}"#),
        Some(Frame::FileDelta {
            path: "/App.tsx".to_string(),
            code: "x".to_string(),
        })
    );
    assert_eq!(
        interpret_line(
            r#"data: {"type":"artifact_delta","content":"{\"path\":\"src/a.ts\",\"code\":\"let a;\"}"}"#
        ),
        Some(Frame::FileDelta {
            path: "src/a.ts".to_string(),
            code: "let a;".to_string(),
        })
    );
    assert_eq!(
        interpret_line(r#"data: {"type":"artifact_delta","content":{"path":"/b.ts","code":"b"}}"#),
        Some(Frame::FileDelta {
            path: "/b.ts".to_string(),
            code: "b".to_string(),
        })
    );
    assert_eq!(
        interpret_line(r#"data: {"type":"artifact_file"}"#),
        Some(Frame::FileDelta {
            path: String::new(),
            code: String::new(),
        })
    );
}

#[test]
fn artifact_end_reads_optional_identifier() {
    assert_eq!(
        interpret_line(r#"data: {"type":"artifact_end","artifact_id":"a1"}"#),
        Some(Frame::ArtifactEnd {
            artifact_id: Some("a1".to_string())
        })
    );
    assert_eq!(
        interpret_line(r#"data: {"type":"artifact_end","id":42}"#),
        Some(Frame::ArtifactEnd {
            artifact_id: Some("42".to_string())
        })
    );
    assert_eq!(
        interpret_line(r#"data: {"type":"artifact_end"}"#),
        Some(Frame::ArtifactEnd { artifact_id: None })
    );
}

#[test]
fn progress_may_be_json_string_encoded() {
    let expected = ProgressInfo {
        current: 2,
        total: 5,
        component: Some("Header".to_string()),
        stage: Some("generating".to_string()),
    };
    assert_eq!(
        interpret_line(
            r#"data: {"type":"progress","current":2,"total":"5","component":"Header","stage":"generating"}"#
        ),
        Some(Frame::Progress(expected.clone()))
    );
    assert_eq!(
        interpret_line(
            r#"data: {"type":"progress","content":"{\"current\":2,\"total\":5,\"component\":\"Header\",\"stage\":\"generating\"}"}"#
        ),
        Some(Frame::Progress(expected))
    );
}

#[test]
fn message_text_uses_first_present_field() {
    assert_eq!(
        interpret_line(r#"data: {"type":"message","delta":"d"}"#),
        Some(Frame::Message("d".to_string()))
    );
    assert_eq!(
        interpret_line(r#"data: {"type":"message","text":"t","delta":"d"}"#),
        Some(Frame::Message("t".to_string()))
    );
    assert_eq!(
        interpret_line(r#"data: {"content":"untyped"}"#),
        Some(Frame::Message("untyped".to_string()))
    );
}

#[test]
fn unknown_types_are_reported_for_ignoring() {
    assert_eq!(
        interpret_line(r#"data: {"type":"usage","tokens":10}"#),
        Some(Frame::Unknown("usage".to_string()))
    );
}
