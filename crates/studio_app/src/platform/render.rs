//! Incremental terminal rendering of the view model.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

use studio_core::{AppViewModel, MessageId, MessageStatus, MessageView, ProgressInfo, Role};

#[derive(Debug, Default)]
struct Printed {
    thinking: usize,
    body: usize,
    ended: bool,
}

/// Writes only what changed since the previous frame.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    printed: HashMap<MessageId, Printed>,
    last_progress: Option<ProgressInfo>,
}

impl TerminalRenderer {
    pub fn render<W: Write>(&mut self, view: &AppViewModel, out: &mut W) -> io::Result<()> {
        for message in &view.messages {
            self.render_message(message, out)?;
        }
        if view.progress != self.last_progress {
            if let Some(progress) = &view.progress {
                writeln!(out)?;
                writeln!(out, "{}", progress_line(progress))?;
            }
            self.last_progress = view.progress.clone();
        }
        out.flush()
    }

    pub fn finish<W: Write>(&self, view: &AppViewModel, dir: &Path, out: &mut W) -> io::Result<()> {
        writeln!(out)?;
        if let Some(session_id) = &view.session_id {
            writeln!(out, "session:  {session_id}")?;
        }
        if let Some(artifact_id) = &view.base_artifact_id {
            writeln!(out, "artifact: {artifact_id}")?;
        }
        match &view.preview {
            Some(bundle) => writeln!(out, "preview:  {} files in {}", bundle.len(), dir.display())?,
            None => writeln!(out, "preview:  nothing to show")?,
        }
        out.flush()
    }

    fn render_message<W: Write>(&mut self, message: &MessageView, out: &mut W) -> io::Result<()> {
        let printed = self.printed.entry(message.id).or_default();
        if printed.ended {
            return Ok(());
        }

        if message.role == Role::User {
            writeln!(out, "> {}", message.body)?;
            printed.ended = true;
            return Ok(());
        }

        if let Some(region) = &message.thinking {
            if let Some(fresh) = region.text.get(printed.thinking..).filter(|s| !s.is_empty()) {
                if printed.thinking == 0 {
                    write!(out, "(thinking) ")?;
                }
                write!(out, "{fresh}")?;
                printed.thinking = region.text.len();
            }
        }

        if let Some(fresh) = message.body.get(printed.body..).filter(|s| !s.is_empty()) {
            if printed.body == 0 {
                if printed.thinking > 0 {
                    writeln!(out)?;
                }
                if message.status == Some(MessageStatus::Error) {
                    write!(out, "error: ")?;
                }
            }
            write!(out, "{fresh}")?;
            printed.body = message.body.len();
        }

        if message.status != Some(MessageStatus::Streaming) {
            writeln!(out)?;
            printed.ended = true;
        }
        Ok(())
    }
}

fn progress_line(progress: &ProgressInfo) -> String {
    let mut line = format!("[{}/{}]", progress.current, progress.total);
    for part in [&progress.stage, &progress.component].into_iter().flatten() {
        line.push(' ');
        line.push_str(part);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use studio_core::ThinkingRegion;

    fn assistant(body: &str, thinking: Option<&str>, status: MessageStatus) -> MessageView {
        MessageView {
            id: 2,
            role: Role::Assistant,
            body: body.to_string(),
            thinking: thinking.map(|text| ThinkingRegion {
                text: text.to_string(),
                active: false,
            }),
            status: Some(status),
            timestamp: Utc::now(),
        }
    }

    fn frame(renderer: &mut TerminalRenderer, messages: Vec<MessageView>) -> String {
        let view = AppViewModel {
            messages,
            ..AppViewModel::default()
        };
        let mut out = Vec::new();
        renderer.render(&view, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn streaming_reply_prints_only_new_text() {
        let mut renderer = TerminalRenderer::default();
        assert_eq!(
            frame(&mut renderer, vec![assistant("", Some("plan"), MessageStatus::Streaming)]),
            "(thinking) plan"
        );
        assert_eq!(
            frame(&mut renderer, vec![assistant("Hel", Some("plan"), MessageStatus::Streaming)]),
            "\nHel"
        );
        assert_eq!(
            frame(&mut renderer, vec![assistant("Hello", Some("plan"), MessageStatus::Complete)]),
            "lo\n"
        );
        assert_eq!(
            frame(&mut renderer, vec![assistant("Hello", Some("plan"), MessageStatus::Complete)]),
            ""
        );
    }

    #[test]
    fn error_entries_are_labelled() {
        let mut renderer = TerminalRenderer::default();
        assert_eq!(
            frame(&mut renderer, vec![assistant("boom", None, MessageStatus::Error)]),
            "error: boom\n"
        );
    }

    #[test]
    fn progress_line_lists_stage_and_component() {
        let progress = ProgressInfo {
            current: 1,
            total: 3,
            component: Some("Header".into()),
            stage: Some("building".into()),
        };
        assert_eq!(progress_line(&progress), "[1/3] building Header");
    }
}
