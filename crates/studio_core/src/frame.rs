use serde_json::{Map, Value};

/// Payload that terminates a chat stream.
pub const DONE_SENTINEL: &str = "[DONE]";

const FRAME_MARKER: &str = "data:";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressInfo {
    pub current: u32,
    pub total: u32,
    pub component: Option<String>,
    pub stage: Option<String>,
}

/// One classified event from the chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    SessionId(String),
    ArtifactStart { artifact_id: Option<String> },
    FileDelta { path: String, code: String },
    ArtifactEnd { artifact_id: Option<String> },
    Progress(ProgressInfo),
    Thinking(String),
    Message(String),
    Error(String),
    StreamEnd,
    /// A frame whose `type` is not recognized. Carried for logging only.
    Unknown(String),
}

/// Classify one decoded stream line.
///
/// Returns `None` for lines that are not frames (blank lines, comments,
/// `event:` fields). Never fails: a body that is not JSON becomes a
/// [`Frame::Message`] carrying the raw text.
pub fn interpret_line(line: &str) -> Option<Frame> {
    let payload = line.trim().strip_prefix(FRAME_MARKER)?.trim();
    if payload.is_empty() {
        return None;
    }
    Some(interpret_payload(payload))
}

/// Classify the body of a `data:` frame.
pub fn interpret_payload(payload: &str) -> Frame {
    if payload == DONE_SENTINEL {
        return Frame::StreamEnd;
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(body)) => interpret_object(&body),
        Ok(Value::String(text)) => Frame::Message(text),
        Ok(_) | Err(_) => Frame::Message(payload.to_string()),
    }
}

fn interpret_object(body: &Map<String, Value>) -> Frame {
    let Some(kind) = body.get("type").and_then(Value::as_str) else {
        return match first_text(body, &["content", "text", "delta"]) {
            Some(text) => Frame::Message(text),
            None => Frame::Unknown(String::new()),
        };
    };

    match kind {
        "session_id" => match first_text(body, &["content", "session_id", "id"]) {
            Some(id) if !id.trim().is_empty() => Frame::SessionId(id.trim().to_string()),
            _ => Frame::Unknown(kind.to_string()),
        },
        "artifact_start" => Frame::ArtifactStart {
            artifact_id: identifier(body),
        },
        "artifact_file" | "artifact_delta" => file_delta(body),
        "artifact_end" => Frame::ArtifactEnd {
            artifact_id: identifier(body),
        },
        "progress" => Frame::Progress(progress(body)),
        "thinking" => Frame::Thinking(first_text(body, &["content", "delta"]).unwrap_or_default()),
        "message" => Frame::Message(first_text(body, &["content", "text", "delta"]).unwrap_or_default()),
        "error" => Frame::Error(
            first_text(body, &["content", "message", "error"])
                .unwrap_or_else(|| "stream reported an error".to_string()),
        ),
        "done" => Frame::StreamEnd,
        other => Frame::Unknown(other.to_string()),
    }
}

fn file_delta(body: &Map<String, Value>) -> Frame {
    let path = text_field(body, "path");
    let code = text_field(body, "code");
    if let (Some(path), Some(code)) = (&path, &code) {
        return Frame::FileDelta {
            path: path.clone(),
            code: code.clone(),
        };
    }

    let (path, code) = match nested_object(body.get("content")) {
        Some(inner) => (
            text_field(&inner, "path").or(path),
            first_text(&inner, &["code", "content"]).or(code),
        ),
        None => (path, code),
    };
    Frame::FileDelta {
        path: path.unwrap_or_default(),
        code: code.unwrap_or_default(),
    }
}

fn progress(body: &Map<String, Value>) -> ProgressInfo {
    let nested = nested_object(body.get("content"));
    let source = nested.as_ref().unwrap_or(body);
    ProgressInfo {
        current: count(source.get("current")),
        total: count(source.get("total")),
        component: text_field(source, "component"),
        stage: text_field(source, "stage"),
    }
}

/// An object given inline or as a JSON-encoded string.
fn nested_object(value: Option<&Value>) -> Option<Map<String, Value>> {
    match value? {
        Value::Object(inner) => Some(inner.clone()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn identifier(body: &Map<String, Value>) -> Option<String> {
    ["artifact_id", "id"].iter().find_map(|key| match body.get(*key)? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

fn count(value: Option<&Value>) -> u32 {
    let raw = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    raw.map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

fn text_field(body: &Map<String, Value>, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}

fn first_text(body: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text_field(body, key))
}

#[cfg(test)]
mod tests {
    use super::{count, nested_object};
    use serde_json::json;

    #[test]
    fn count_accepts_numeric_strings_and_floats() {
        assert_eq!(count(Some(&json!(3))), 3);
        assert_eq!(count(Some(&json!("7"))), 7);
        assert_eq!(count(Some(&json!(2.0))), 2);
        assert_eq!(count(Some(&json!(-1))), 0);
        assert_eq!(count(Some(&json!("x"))), 0);
        assert_eq!(count(None), 0);
    }

    #[test]
    fn nested_object_decodes_json_strings() {
        let encoded = json!("{\"path\":\"/a\"}");
        let inner = nested_object(Some(&encoded)).expect("object");
        assert_eq!(inner.get("path"), Some(&json!("/a")));
        assert!(nested_object(Some(&json!("not json"))).is_none());
        assert!(nested_object(Some(&json!([1, 2]))).is_none());
    }
}
