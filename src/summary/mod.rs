//! Streaming summary tokens from a chat-completion backend.
//!
//! The backend itself is a collaborator: anything implementing
//! [`TokenSource`] that yields the raw event-stream bytes for a
//! [`SummaryRequest`]. This module builds the request, decodes the stream
//! and hands tokens to the caller as they arrive.

pub mod sse;

use std::fmt::Display;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ReaderError, Result};

pub use sse::{SseDecoder, SseEvent, DONE_SENTINEL};

/// Longest input sent for summarisation, in characters.
pub const MAX_SUMMARY_INPUT_CHARS: usize = 10_000;

pub const DEFAULT_MODEL: &str = "x-ai/grok-4-fast:free";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl SummaryRequest {
    /// Ask for a listenable narrative summary of `text`, truncated to
    /// [`MAX_SUMMARY_INPUT_CHARS`].
    pub fn new(text: &str) -> Self {
        let total = text.chars().count();
        let input: String = text.chars().take(MAX_SUMMARY_INPUT_CHARS).collect();
        if total > MAX_SUMMARY_INPUT_CHARS {
            warn!(chars = total, limit = MAX_SUMMARY_INPUT_CHARS, "summary input truncated");
        }

        let prompt = format!(
            "Analyze this PDF text and create a comprehensive Explanation. Text: {input}, \
             Format your response as a natural, flowing narrative that someone would enjoy \
             listening to as an audio summary."
        );

        Self {
            model: DEFAULT_MODEL.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![ContentPart {
                    kind: "text".to_string(),
                    text: prompt,
                }],
            }],
            stream: true,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The prompt text of the first message.
    pub fn prompt(&self) -> &str {
        self.messages
            .first()
            .and_then(|m| m.content.first())
            .map_or("", |part| part.text.as_str())
    }
}

pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Something that can open an event stream for a request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn open(&self, request: &SummaryRequest) -> Result<ByteStream>;
}

/// Summarise `text` through `source`, forwarding tokens to `on_token`.
pub async fn summarize<F>(
    source: &dyn TokenSource,
    text: &str,
    cancel: watch::Receiver<bool>,
    on_token: F,
) -> Result<String>
where
    F: FnMut(&str),
{
    if text.trim().is_empty() {
        return Err(ReaderError::ExtractionInsufficientText(
            "no text available to summarize".to_string(),
        ));
    }
    let request = SummaryRequest::new(text);
    let stream = source.open(&request).await?;
    consume_stream(stream, cancel, on_token).await
}

/// Drive an event stream to completion.
///
/// Non-empty tokens go to `on_token` in arrival order and the concatenation
/// is returned. Setting `cancel` to `true` abandons the stream with
/// [`ReaderError::StreamCancelled`]; a transport error becomes
/// [`ReaderError::Stream`].
pub async fn consume_stream<S, E, F>(
    stream: S,
    mut cancel: watch::Receiver<bool>,
    mut on_token: F,
) -> Result<String>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
    F: FnMut(&str),
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = SseDecoder::new();
    let mut text = String::new();
    let mut cancel_live = true;

    if *cancel.borrow_and_update() {
        return Err(ReaderError::StreamCancelled);
    }

    loop {
        tokio::select! {
            biased;

            changed = cancel.changed(), if cancel_live => {
                match changed {
                    Ok(()) if *cancel.borrow_and_update() => {
                        info!(chars = text.len(), "summary stream cancelled");
                        return Err(ReaderError::StreamCancelled);
                    }
                    Ok(()) => {}
                    // sender gone: nobody can cancel any more
                    Err(_) => cancel_live = false,
                }
            }
            item = stream.next() => {
                let (events, ended) = match item {
                    Some(Ok(bytes)) => (decoder.push(&bytes), false),
                    Some(Err(e)) => return Err(ReaderError::Stream(e.to_string())),
                    None => (decoder.finish(), true),
                };

                for event in events {
                    if let SseEvent::Token(token) = event {
                        on_token(&token);
                        text.push_str(&token);
                    }
                }

                if ended || decoder.is_done() {
                    break;
                }
            }
        }
    }

    debug!(chars = text.len(), "summary stream complete");
    Ok(text)
}
