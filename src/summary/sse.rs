//! Incremental decoder for chat-completion server-sent events.
//!
//! Input arrives in arbitrary byte chunks. Complete lines are parsed as
//! they appear; a partial line waits for the next chunk.

use serde::Deserialize;
use tracing::warn;

/// Terminates the token stream.
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Token(String),
    Done,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once the sentinel has been seen. Later input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk of bytes and collect the events it completes.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.decode_line(&line, &mut events);
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        events
    }

    /// Flush a trailing line that never got its newline.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        if !self.done {
            self.decode_line(&rest, &mut events);
        }
        events
    }

    fn decode_line(&mut self, line: &[u8], events: &mut Vec<SseEvent>) {
        let line = String::from_utf8_lossy(line);
        let Some(data) = line.trim_end_matches(['\r', '\n']).strip_prefix("data:") else {
            return;
        };
        let data = data.trim();

        if data == DONE_SENTINEL {
            self.done = true;
            events.push(SseEvent::Done);
            return;
        }
        if data.is_empty() {
            return;
        }

        match serde_json::from_str::<CompletionChunk>(data) {
            Ok(chunk) => {
                let content = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta)
                    .and_then(|delta| delta.content);
                if let Some(content) = content.filter(|c| !c.is_empty()) {
                    events.push(SseEvent::Token(content));
                }
            }
            Err(e) => warn!(error = %e, "skipping malformed stream payload"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({ "choices": [{ "delta": { "content": content } }] })
        )
    }

    #[test]
    fn decodes_tokens_in_order() {
        let mut decoder = SseDecoder::new();
        let input = format!("{}{}data: [DONE]\n\n", data("Hello"), data(" world"));
        let events = decoder.push(input.as_bytes());
        assert_eq!(
            events,
            vec![
                SseEvent::Token("Hello".into()),
                SseEvent::Token(" world".into()),
                SseEvent::Done
            ]
        );
        assert!(decoder.is_done());
    }

    #[test]
    fn handles_arbitrary_chunk_boundaries() {
        let input = format!("{}{}", data("caf\u{e9}"), data("!"));
        let bytes = input.as_bytes();
        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        for piece in bytes.chunks(3) {
            events.extend(decoder.push(piece));
        }
        assert_eq!(
            events,
            vec![SseEvent::Token("caf\u{e9}".into()), SseEvent::Token("!".into())]
        );
    }

    #[test]
    fn skips_malformed_and_empty_payloads() {
        let mut decoder = SseDecoder::new();
        let input = format!(
            ": keep-alive\ndata: {{not json\n\ndata: {{\"choices\":[]}}\n\n{}{}",
            data(""),
            data("ok")
        );
        assert_eq!(
            decoder.push(input.as_bytes()),
            vec![SseEvent::Token("ok".into())]
        );
    }

    #[test]
    fn ignores_input_after_done() {
        let mut decoder = SseDecoder::new();
        let input = format!("data: [DONE]\n{}", data("late"));
        assert_eq!(decoder.push(input.as_bytes()), vec![SseEvent::Done]);
        assert!(decoder.push(data("later").as_bytes()).is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn finish_flushes_trailing_line() {
        let mut decoder = SseDecoder::new();
        let line = data("tail");
        let unterminated = line.trim_end();
        assert!(decoder.push(unterminated.as_bytes()).is_empty());
        assert_eq!(decoder.finish(), vec![SseEvent::Token("tail".into())]);
    }

    #[test]
    fn accepts_crlf_and_no_space_after_colon() {
        let mut decoder = SseDecoder::new();
        let input = "data:{\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n\r\n";
        assert_eq!(
            decoder.push(input.as_bytes()),
            vec![SseEvent::Token("x".into())]
        );
    }
}
