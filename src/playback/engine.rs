//! Chunk-addressable playback state machine.
//!
//! ```text
//!            play                 pause
//!   Idle ───────────► Speaking ───────────► Paused
//!    ▲  ◄───────────     │    ◄───────────    │
//!    │   stop / last     │        play        │
//!    │   chunk ended     │ chunk ended        │
//!    │                   ▼                    │
//!    │          advance pending ──(delay)──► submit next
//!    └──────────────────── stop ──────────────┘
//! ```
//!
//! The engine is synchronous. Speech completion arrives through
//! [`handle_event`](PlaybackEngine::handle_event); the delayed hand-off to
//! the next chunk is exposed as [`pending_advance`](PlaybackEngine::pending_advance)
//! and triggered by [`fire_advance`](PlaybackEngine::fire_advance), so the
//! owner decides how to keep time.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::speech::{SpeechBackend, SpeechEvent, SpeechEventKind, SpeechParams, Utterance};
use crate::error::{ReaderError, Result};
use crate::text::ChunkSequence;

/// Gap between the end of one chunk and the start of the next.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(300);

/// Sentence previews are cut to this many characters.
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking,
    Paused,
}

/// Read-only view of the engine for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub cursor: usize,
    pub total: usize,
    /// Position through the document as a percentage, counting the current chunk.
    pub progress: f64,
    /// Current chunk, truncated for display.
    pub sentence: Option<String>,
    pub last_error: Option<String>,
}

pub struct PlaybackEngine<B> {
    backend: B,
    chunks: ChunkSequence,
    cursor: usize,
    state: PlaybackState,
    params: SpeechParams,
    advance_delay: Duration,
    next_token: u64,
    /// Token of the utterance the backend is working on.
    active: Option<u64>,
    /// Token of the scheduled hand-off to the next chunk.
    pending: Option<u64>,
    last_error: Option<String>,
}

impl<B: SpeechBackend> PlaybackEngine<B> {
    /// Wrap `backend`, failing when it cannot speak in this environment.
    pub fn new(backend: B) -> Result<Self> {
        if !backend.is_available() {
            return Err(ReaderError::PlaybackUnsupported(
                "no speech engine found".to_string(),
            ));
        }

        Ok(Self {
            backend,
            chunks: ChunkSequence::default(),
            cursor: 0,
            state: PlaybackState::Idle,
            params: SpeechParams::default(),
            advance_delay: DEFAULT_ADVANCE_DELAY,
            next_token: 0,
            active: None,
            pending: None,
            last_error: None,
        })
    }

    #[must_use]
    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: SpeechParams) -> Self {
        self.params = params;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn chunks(&self) -> &ChunkSequence {
        &self.chunks
    }

    pub fn chunk_at(&self, index: usize) -> Option<&str> {
        self.chunks.get(index)
    }

    pub fn params(&self) -> &SpeechParams {
        &self.params
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Replace the document. Stops playback and rewinds to the first chunk.
    pub fn load(&mut self, chunks: ChunkSequence) {
        self.stop();
        info!(chunks = chunks.len(), "loaded document");
        self.chunks = chunks;
        self.cursor = 0;
        self.last_error = None;
    }

    /// Resume when paused, otherwise start speaking at the cursor.
    pub fn play(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Speaking => Ok(()),
            PlaybackState::Paused if self.active.is_some() => {
                self.backend.resume_active()?;
                self.state = PlaybackState::Speaking;
                debug!(cursor = self.cursor, "resumed");
                Ok(())
            }
            PlaybackState::Paused | PlaybackState::Idle => {
                if self.chunks.is_empty() {
                    return Err(ReaderError::NothingToPlay);
                }
                self.submit_current()
            }
        }
    }

    /// Freeze speech in place. Only meaningful while speaking.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != PlaybackState::Speaking {
            return Ok(());
        }
        if self.active.is_some() {
            self.backend.pause_active()?;
        }
        // Between chunks there is nothing to freeze; drop the hand-off and
        // let the next play() submit the chunk at the cursor.
        self.pending = None;
        self.state = PlaybackState::Paused;
        debug!(cursor = self.cursor, "paused");
        Ok(())
    }

    /// Halt playback. The cursor is kept.
    pub fn stop(&mut self) {
        self.halt();
        self.state = PlaybackState::Idle;
    }

    pub fn skip_forward(&mut self) -> Result<()> {
        if self.cursor + 1 >= self.chunks.len() {
            return Ok(());
        }
        self.jump(self.cursor + 1)
    }

    pub fn skip_backward(&mut self) -> Result<()> {
        if self.cursor == 0 {
            return Ok(());
        }
        self.jump(self.cursor - 1)
    }

    /// Move the cursor to `index`, clamped to the last chunk.
    ///
    /// While speaking the new chunk starts immediately. While paused the
    /// frozen utterance is abandoned and the engine goes idle at the new
    /// position.
    pub fn seek(&mut self, index: usize) -> Result<()> {
        if self.chunks.is_empty() {
            return Ok(());
        }
        let target = index.min(self.chunks.len() - 1);

        match self.state {
            PlaybackState::Speaking => {
                self.halt();
                self.cursor = target;
                self.submit_current()
            }
            PlaybackState::Paused => {
                self.stop();
                self.cursor = target;
                Ok(())
            }
            PlaybackState::Idle => {
                self.cursor = target;
                Ok(())
            }
        }
    }

    /// Applies from the next submission.
    pub fn set_params(&mut self, params: SpeechParams) {
        self.params = params;
    }

    /// Feed a backend event. Events for anything but the current submission are ignored.
    ///
    /// When the last chunk ends the engine goes [`PlaybackState::Idle`] and the
    /// cursor rewinds to 0, so the next `play` starts from the top. An error
    /// event also goes idle but keeps the cursor on the failed chunk.
    pub fn handle_event(&mut self, event: SpeechEvent) -> Result<()> {
        if self.active != Some(event.token) {
            debug!(token = event.token, active = ?self.active, "ignoring stale speech event");
            return Ok(());
        }

        match event.kind {
            SpeechEventKind::Started => {
                debug!(token = event.token, cursor = self.cursor, "utterance started");
                Ok(())
            }
            SpeechEventKind::Ended => {
                self.active = None;
                self.cursor += 1;
                if self.cursor >= self.chunks.len() {
                    info!(chunks = self.chunks.len(), "reached end of document");
                    self.cursor = 0;
                    self.state = PlaybackState::Idle;
                } else if self.state == PlaybackState::Speaking {
                    self.pending = Some(self.issue_token());
                }
                Ok(())
            }
            SpeechEventKind::Error(message) => {
                warn!(
                    token = event.token,
                    cursor = self.cursor,
                    error = %message,
                    "speech engine error"
                );
                self.active = None;
                self.pending = None;
                self.state = PlaybackState::Idle;
                self.last_error = Some(message.clone());
                Err(ReaderError::PlaybackCollaboratorError(message))
            }
        }
    }

    /// The scheduled hand-off, if any: its token and how long to wait before firing it.
    pub fn pending_advance(&self) -> Option<(u64, Duration)> {
        self.pending.map(|token| (token, self.advance_delay))
    }

    /// Submit the next chunk if `token` is still the scheduled hand-off.
    pub fn fire_advance(&mut self, token: u64) -> Result<()> {
        if self.pending != Some(token) || self.state != PlaybackState::Speaking {
            debug!(token, "ignoring stale advance");
            return Ok(());
        }
        self.submit_current()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let total = self.chunks.len();
        let progress = if total == 0 {
            0.0
        } else {
            (self.cursor + 1) as f64 / total as f64 * 100.0
        };

        PlaybackSnapshot {
            state: self.state,
            cursor: self.cursor,
            total,
            progress,
            sentence: self.chunks.get(self.cursor).map(preview),
            last_error: self.last_error.clone(),
        }
    }

    fn jump(&mut self, index: usize) -> Result<()> {
        let resume = self.state != PlaybackState::Idle;
        self.halt();
        self.cursor = index;
        if resume {
            self.submit_current()
        } else {
            Ok(())
        }
    }

    /// Cancel the active utterance and any scheduled hand-off without touching the state.
    fn halt(&mut self) {
        if self.active.take().is_some() {
            self.backend.cancel();
        }
        self.pending = None;
    }

    fn issue_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn submit_current(&mut self) -> Result<()> {
        let Some(text) = self.chunks.get(self.cursor).map(str::to_string) else {
            self.stop();
            return Err(ReaderError::NothingToPlay);
        };

        let token = self.issue_token();
        let utterance = Utterance {
            token,
            index: self.cursor,
            text,
            params: self.params.clone(),
        };

        self.pending = None;
        if let Err(e) = self.backend.submit(utterance) {
            warn!(cursor = self.cursor, error = %e, "speech submission failed");
            self.active = None;
            self.state = PlaybackState::Idle;
            self.last_error = Some(e.to_string());
            return Err(e);
        }

        debug!(token, cursor = self.cursor, "submitted chunk");
        self.active = Some(token);
        self.state = PlaybackState::Speaking;
        self.last_error = None;
        Ok(())
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
