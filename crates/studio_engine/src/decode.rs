use studio_core::{interpret_line, Frame};

/// Splits a chunked byte stream into newline-terminated lines.
///
/// Bytes after the last newline are buffered until the next chunk, so the
/// output does not depend on where chunk boundaries fall. Lines are decoded
/// as UTF-8 only once complete, and a trailing `\r` is dropped.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let Some(last_newline) = self.buffer.iter().rposition(|byte| *byte == b'\n') else {
            return Vec::new();
        };
        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);
        complete[..last_newline]
            .split(|byte| *byte == b'\n')
            .map(decode_line)
            .collect()
    }

    /// Flush the buffered partial line at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }
}

/// Whether a line ends the chat stream (`data: [DONE]` or a `done` frame).
pub fn is_done_line(line: &str) -> bool {
    matches!(interpret_line(line), Some(Frame::StreamEnd))
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::{is_done_line, LineDecoder};

    #[test]
    fn partial_line_waits_for_newline() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert_eq!(decoder.push(b":1}\n\ndata: x"), vec!["data: {\"a\":1}", ""]);
        assert_eq!(decoder.finish().as_deref(), Some("data: x"));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn crlf_line_endings_are_stripped() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.push(b"a\r\nb\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn multibyte_characters_survive_split_chunks() {
        let text = "data: héllo\n".as_bytes();
        let mut decoder = LineDecoder::new();
        let mut lines = decoder.push(&text[..8]);
        lines.extend(decoder.push(&text[8..]));
        assert_eq!(lines, vec!["data: héllo"]);
    }

    #[test]
    fn sentinel_detection() {
        assert!(is_done_line("data: [DONE]"));
        assert!(is_done_line("data:[DONE]\r"));
        assert!(is_done_line("data: {\"type\":\"done\"}"));
        assert!(!is_done_line("data: {\"type\":\"message\",\"content\":\"[DONE]\"}"));
        assert!(!is_done_line("[DONE]"));
    }
}
