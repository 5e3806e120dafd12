//! Sentence-by-sentence playback through a speech engine.
//!
//! [`PlaybackEngine`] is the synchronous state machine; [`PlaybackDriver`]
//! runs it inside a tokio task for interactive use. Speech engines plug in
//! through [`SpeechBackend`].
//!
//! # Example
//!
//! ```rust,no_run
//! use readaloud::playback::{event_channel, CommandSpeechBackend, PlaybackDriver, PlaybackEngine};
//! use readaloud::text::chunk;
//!
//! # async fn demo() -> readaloud::error::Result<()> {
//! let (events_tx, events_rx) = event_channel();
//! let engine = PlaybackEngine::new(CommandSpeechBackend::detect(events_tx))?;
//! let driver = PlaybackDriver::spawn(engine, events_rx);
//!
//! driver.load(chunk("Hello there. Welcome to the document.")).await?;
//! driver.play().await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod driver;
pub mod engine;
pub mod speech;

pub use backends::{CommandSpeechBackend, SpeechProgram};
pub use driver::PlaybackDriver;
pub use engine::{PlaybackEngine, PlaybackSnapshot, PlaybackState, DEFAULT_ADVANCE_DELAY};
pub use speech::{
    event_channel, EventReceiver, EventSender, SpeechBackend, SpeechEvent, SpeechEventKind,
    SpeechParams, Utterance,
};
