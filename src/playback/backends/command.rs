//! Speech via a command-line synthesizer subprocess
//!
//! Supported programs, searched in order:
//! - `espeak-ng`
//! - `espeak`
//! - `say` (macOS)
//!
//! Each utterance is one child process. Pausing stops the process with
//! `SIGSTOP` and resuming continues it with `SIGCONT` (Unix only).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{ReaderError, Result};
use crate::playback::speech::{EventSender, SpeechBackend, SpeechEvent, SpeechParams, Utterance};

/// Synthesizer programs understood by [`CommandSpeechBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechProgram {
    EspeakNg,
    Espeak,
    /// macOS `say`.
    Say,
}

impl SpeechProgram {
    /// Search order when no program is configured.
    pub const SEARCH_ORDER: [SpeechProgram; 3] = [Self::EspeakNg, Self::Espeak, Self::Say];

    pub fn binary_name(self) -> &'static str {
        match self {
            Self::EspeakNg => "espeak-ng",
            Self::Espeak => "espeak",
            Self::Say => "say",
        }
    }

    /// Infer the program family from a binary path.
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        Self::SEARCH_ORDER.into_iter().find(|p| p.binary_name() == stem)
    }

    /// Arguments for speaking `text` with `params`.
    fn args(self, text: &str, params: &SpeechParams) -> Vec<String> {
        let mut args = Vec::new();
        match self {
            Self::EspeakNg | Self::Espeak => {
                // espeak: words per minute, pitch 0-99, amplitude 0-200
                args.push("-s".to_string());
                args.push(words_per_minute(params.rate).to_string());
                args.push("-p".to_string());
                args.push(((50.0 * params.pitch).round().clamp(0.0, 99.0) as u32).to_string());
                args.push("-a".to_string());
                args.push(((100.0 * params.volume).round().clamp(0.0, 200.0) as u32).to_string());
                if let Some(voice) = &params.voice {
                    args.push("-v".to_string());
                    args.push(voice.clone());
                }
            }
            Self::Say => {
                args.push("-r".to_string());
                args.push(words_per_minute(params.rate).to_string());
                if let Some(voice) = &params.voice {
                    args.push("-v".to_string());
                    args.push(voice.clone());
                }
            }
        }
        args.push(text.to_string());
        args
    }
}

fn words_per_minute(rate: f32) -> u32 {
    (175.0 * rate).round().clamp(80.0, 500.0) as u32
}

struct ActiveChild {
    token: u64,
    pid: Option<u32>,
    /// Dropping or firing this kills the child without reporting an event.
    cancel: oneshot::Sender<()>,
}

impl ActiveChild {
    /// The child's pid while its watcher task is still running.
    fn live_pid(&self) -> Option<u32> {
        if self.cancel.is_closed() {
            None
        } else {
            self.pid
        }
    }
}

/// Speech backend driving a synthesizer subprocess.
pub struct CommandSpeechBackend {
    program: Option<(SpeechProgram, PathBuf)>,
    events: EventSender,
    active: Option<ActiveChild>,
}

impl CommandSpeechBackend {
    /// Search `PATH` for a supported synthesizer.
    pub fn detect(events: EventSender) -> Self {
        let program = SpeechProgram::SEARCH_ORDER
            .into_iter()
            .find_map(|p| which::which(p.binary_name()).ok().map(|path| (p, path)));

        match &program {
            Some((_, path)) => info!(program = %path.display(), "using speech synthesizer"),
            None => warn!("no speech synthesizer found (tried espeak-ng, espeak, say)"),
        }

        Self {
            program,
            events,
            active: None,
        }
    }

    /// Use a specific synthesizer binary.
    pub fn with_program(path: impl AsRef<Path>, events: EventSender) -> Result<Self> {
        let path = path.as_ref();
        let kind = SpeechProgram::from_path(path).ok_or_else(|| {
            ReaderError::PlaybackUnsupported(format!(
                "{} is not a supported synthesizer (expected espeak-ng, espeak or say)",
                path.display()
            ))
        })?;
        let resolved = which::which(path).unwrap_or_else(|_| path.to_path_buf());

        Ok(Self {
            program: Some((kind, resolved)),
            events,
            active: None,
        })
    }

    pub fn program(&self) -> Option<SpeechProgram> {
        self.program.as_ref().map(|(kind, _)| *kind)
    }

    #[cfg(unix)]
    fn signal_active(&self, signal: libc::c_int) -> Result<()> {
        let Some(pid) = self.active.as_ref().and_then(ActiveChild::live_pid) else {
            return Ok(());
        };
        let pid = libc::pid_t::try_from(pid).map_err(|_| {
            ReaderError::PlaybackCollaboratorError(format!("invalid process id {pid}"))
        })?;
        // SAFETY: kill(2) has no memory-safety preconditions; pid belongs to a
        // child this backend spawned and has not yet reaped.
        let rc = unsafe { libc::kill(pid, signal) };
        if rc != 0 {
            return Err(ReaderError::PlaybackCollaboratorError(format!(
                "failed to signal speech process: {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(())
    }
}

impl SpeechBackend for CommandSpeechBackend {
    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn submit(&mut self, utterance: Utterance) -> Result<()> {
        self.cancel();

        let (kind, path) = self
            .program
            .as_ref()
            .ok_or_else(|| ReaderError::PlaybackUnsupported("no speech synthesizer".to_string()))?;
        let args = kind.args(&utterance.text, &utterance.params);
        debug!(
            token = utterance.token,
            index = utterance.index,
            "spawning {}",
            kind.binary_name()
        );

        let mut child = Command::new(path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ReaderError::PlaybackCollaboratorError(format!(
                    "failed to start {}: {e}",
                    path.display()
                ))
            })?;

        let token = utterance.token;
        let pid = child.id();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let events = self.events.clone();
        let _ = events.send(SpeechEvent::started(token));

        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    let event = match status {
                        Ok(status) if status.success() => SpeechEvent::ended(token),
                        Ok(status) => {
                            SpeechEvent::error(token, format!("synthesizer exited with {status}"))
                        }
                        Err(e) => SpeechEvent::error(token, e.to_string()),
                    };
                    let _ = events.send(event);
                }
                _ = cancel_rx => {
                    let _ = child.kill().await;
                    debug!(token, "speech process cancelled");
                }
            }
        });

        self.active = Some(ActiveChild {
            token,
            pid,
            cancel: cancel_tx,
        });
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(token = active.token, "cancelling utterance");
            // A stopped process must be continued before it can die cleanly.
            #[cfg(unix)]
            if let Some(pid) = active.live_pid().and_then(|p| libc::pid_t::try_from(p).ok()) {
                // SAFETY: see signal_active.
                unsafe {
                    libc::kill(pid, libc::SIGCONT);
                }
            }
            let _ = active.cancel.send(());
        }
    }

    #[cfg(unix)]
    fn pause_active(&mut self) -> Result<()> {
        self.signal_active(libc::SIGSTOP)
    }

    #[cfg(unix)]
    fn resume_active(&mut self) -> Result<()> {
        self.signal_active(libc::SIGCONT)
    }

    #[cfg(not(unix))]
    fn pause_active(&mut self) -> Result<()> {
        Err(ReaderError::PlaybackCollaboratorError(
            "pausing speech is not supported on this platform".to_string(),
        ))
    }

    #[cfg(not(unix))]
    fn resume_active(&mut self) -> Result<()> {
        Err(ReaderError::PlaybackCollaboratorError(
            "resuming speech is not supported on this platform".to_string(),
        ))
    }
}

impl Drop for CommandSpeechBackend {
    fn drop(&mut self) {
        self.cancel();
    }
}
