//! Async owner for a [`PlaybackEngine`].
//!
//! The engine lives inside a single tokio task. UI actions arrive over a
//! command channel, backend events over the speech event channel, and the
//! delayed auto-advance is a timer in the same `select!` loop, so every
//! transition is applied in one place and in arrival order.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::engine::{PlaybackEngine, PlaybackSnapshot};
use super::speech::{EventReceiver, SpeechBackend, SpeechParams};
use crate::error::{ReaderError, Result};
use crate::text::ChunkSequence;

const COMMAND_BUFFER: usize = 32;

#[derive(Debug)]
enum Action {
    Play,
    Pause,
    Stop,
    SkipForward,
    SkipBackward,
    Seek(usize),
    SetParams(SpeechParams),
    Load(ChunkSequence),
    Shutdown,
}

struct Command {
    action: Action,
    reply: oneshot::Sender<Result<()>>,
}

/// Handle to a running playback task.
pub struct PlaybackDriver {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
    task: JoinHandle<()>,
}

impl PlaybackDriver {
    /// Move `engine` into a new task fed by `events`.
    pub fn spawn<B>(engine: PlaybackEngine<B>, events: EventReceiver) -> Self
    where
        B: SpeechBackend + 'static,
    {
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshots) = watch::channel(engine.snapshot());
        let task = tokio::spawn(run(engine, command_rx, events, snapshot_tx));

        Self {
            commands,
            snapshots,
            task,
        }
    }

    pub async fn play(&self) -> Result<()> {
        self.send(Action::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Action::Pause).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(Action::Stop).await
    }

    pub async fn skip_forward(&self) -> Result<()> {
        self.send(Action::SkipForward).await
    }

    pub async fn skip_backward(&self) -> Result<()> {
        self.send(Action::SkipBackward).await
    }

    pub async fn seek(&self, index: usize) -> Result<()> {
        self.send(Action::Seek(index)).await
    }

    pub async fn set_params(&self, params: SpeechParams) -> Result<()> {
        self.send(Action::SetParams(params)).await
    }

    pub async fn load(&self, chunks: ChunkSequence) -> Result<()> {
        self.send(Action::Load(chunks)).await
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every transition.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }

    /// Stop playback and wait for the task to exit.
    pub async fn shutdown(self) -> Result<()> {
        let result = self.send(Action::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "playback task ended abnormally");
        }
        match result {
            Err(ReaderError::DriverClosed) => Ok(()),
            other => other,
        }
    }

    async fn send(&self, action: Action) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command { action, reply })
            .await
            .map_err(|_| ReaderError::DriverClosed)?;
        response.await.map_err(|_| ReaderError::DriverClosed)?
    }
}

async fn run<B: SpeechBackend>(
    mut engine: PlaybackEngine<B>,
    mut commands: mpsc::Receiver<Command>,
    mut events: EventReceiver,
    snapshots: watch::Sender<PlaybackSnapshot>,
) {
    let mut timer: Option<(u64, Instant)> = None;

    loop {
        timer = match (engine.pending_advance(), timer) {
            (Some((token, _)), Some((armed, deadline))) if armed == token => {
                Some((armed, deadline))
            }
            (Some((token, delay)), _) => Some((token, Instant::now() + delay)),
            (None, _) => None,
        };
        let advance = async move {
            match timer {
                Some((_, deadline)) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            command = commands.recv() => {
                let Some(Command { action, reply }) = command else {
                    engine.stop();
                    break;
                };
                if matches!(action, Action::Shutdown) {
                    engine.stop();
                    let _ = reply.send(Ok(()));
                    break;
                }
                let _ = reply.send(apply(&mut engine, action));
            }
            Some(event) = events.recv() => {
                if let Err(e) = engine.handle_event(event) {
                    warn!(error = %e, "playback stopped");
                }
            }
            () = advance => {
                if let Some((token, _)) = timer.take() {
                    if let Err(e) = engine.fire_advance(token) {
                        warn!(error = %e, "auto-advance failed");
                    }
                }
            }
        }

        let _ = snapshots.send(engine.snapshot());
    }

    let _ = snapshots.send(engine.snapshot());
    debug!("playback task finished");
}

fn apply<B: SpeechBackend>(engine: &mut PlaybackEngine<B>, action: Action) -> Result<()> {
    match action {
        Action::Play => engine.play(),
        Action::Pause => engine.pause(),
        Action::Stop => {
            engine.stop();
            Ok(())
        }
        Action::SkipForward => engine.skip_forward(),
        Action::SkipBackward => engine.skip_backward(),
        Action::Seek(index) => engine.seek(index),
        Action::SetParams(params) => {
            engine.set_params(params);
            Ok(())
        }
        Action::Load(chunks) => {
            engine.load(chunks);
            Ok(())
        }
        Action::Shutdown => Ok(()),
    }
}
