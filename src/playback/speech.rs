//! Speech collaborator seam.
//!
//! A [`SpeechBackend`] accepts one [`Utterance`] at a time and reports its
//! lifecycle asynchronously as [`SpeechEvent`]s tagged with the submission
//! token. The engine only trusts events carrying the token of its current
//! submission; anything else is stale.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::Result;

/// Voice parameters applied to a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechParams {
    /// Speaking rate multiplier (1.0 = engine default).
    pub rate: f32,
    /// Pitch multiplier (1.0 = engine default).
    pub pitch: f32,
    /// Volume, 0.0 to 1.0.
    pub volume: f32,
    /// Engine-specific voice name.
    pub voice: Option<String>,
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice: None,
        }
    }
}

/// One chunk handed to the speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub token: u64,
    /// Chunk index this utterance speaks.
    pub index: usize,
    pub text: String,
    pub params: SpeechParams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEventKind {
    Started,
    Ended,
    Error(String),
}

/// Lifecycle notification for the submission identified by `token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechEvent {
    pub token: u64,
    pub kind: SpeechEventKind,
}

impl SpeechEvent {
    pub fn started(token: u64) -> Self {
        Self {
            token,
            kind: SpeechEventKind::Started,
        }
    }

    pub fn ended(token: u64) -> Self {
        Self {
            token,
            kind: SpeechEventKind::Ended,
        }
    }

    pub fn error(token: u64, message: impl Into<String>) -> Self {
        Self {
            token,
            kind: SpeechEventKind::Error(message.into()),
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<SpeechEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SpeechEvent>;

/// Channel carrying backend events to the playback driver.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Trait for speech engines.
///
/// `submit` returns as soon as the utterance is queued; completion is
/// reported later through the backend's event channel. A cancelled
/// utterance reports nothing further.
pub trait SpeechBackend: Send {
    /// Whether the engine can speak at all in this environment.
    fn is_available(&self) -> bool;

    /// Start speaking `utterance`, replacing anything in flight.
    fn submit(&mut self, utterance: Utterance) -> Result<()>;

    /// Abandon the active utterance, if any.
    fn cancel(&mut self);

    /// Freeze the active utterance in place.
    fn pause_active(&mut self) -> Result<()>;

    /// Continue a frozen utterance from where it stopped.
    fn resume_active(&mut self) -> Result<()>;
}
