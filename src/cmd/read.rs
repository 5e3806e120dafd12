use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use readaloud::config::ReaderConfig;
use readaloud::content::ExtractionMethod;
use readaloud::playback::{
    event_channel, CommandSpeechBackend, PlaybackDriver, PlaybackEngine, PlaybackSnapshot,
    PlaybackState, SpeechParams,
};

use super::load_and_extract;

/// One line of interactive input.
#[derive(Debug, PartialEq)]
enum Control {
    Pause,
    Resume,
    Next,
    Back,
    Stop,
    Seek(usize),
    Quit,
    Help,
}

fn parse_control(line: &str) -> Option<Control> {
    let mut parts = line.split_whitespace();
    let control = match parts.next()? {
        "p" | "pause" => Control::Pause,
        "r" | "resume" | "play" => Control::Resume,
        "n" | "next" => Control::Next,
        "b" | "back" => Control::Back,
        "s" | "stop" => Control::Stop,
        "g" | "goto" => {
            let number = parts.next()?.parse::<usize>().ok()?;
            Control::Seek(number.saturating_sub(1))
        }
        "q" | "quit" => Control::Quit,
        _ => Control::Help,
    };
    Some(control)
}

const HELP: &str =
    "controls: p pause | r resume | n next | b back | s stop | g <N> go to chunk | q quit";

pub async fn cmd_read(
    path: &Path,
    method: ExtractionMethod,
    start: usize,
    params: SpeechParams,
    config: &ReaderConfig,
) -> Result<()> {
    let (doc, result) = load_and_extract(path, method)?;
    let result = result.into_result()?;
    eprintln!(
        "📖 {}: {} chunks ({})",
        doc.meta().name,
        result.chunks.len(),
        result.quality.label()
    );

    let (events_tx, events_rx) = event_channel();
    let backend = match &config.speech.program {
        Some(program) => CommandSpeechBackend::with_program(program, events_tx)?,
        None => CommandSpeechBackend::detect(events_tx),
    };
    let engine = PlaybackEngine::new(backend)?
        .with_params(params)
        .with_advance_delay(config.playback.advance_delay());

    let driver = PlaybackDriver::spawn(engine, events_rx);
    driver.load(result.chunks).await?;
    driver.seek(start.saturating_sub(1)).await?;
    driver.play().await?;
    eprintln!("{HELP}");

    let outcome = control_loop(&driver).await;
    driver.shutdown().await?;
    outcome
}

async fn control_loop(driver: &PlaybackDriver) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut snapshots = driver.subscribe();
    let mut last = snapshots.borrow_and_update().clone();
    announce(&last);

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("failed to read controls from stdin")? else {
                    stdin_open = false;
                    continue;
                };
                let Some(control) = parse_control(&line) else { continue };
                let outcome = match control {
                    Control::Pause => driver.pause().await,
                    Control::Resume => driver.play().await,
                    Control::Next => driver.skip_forward().await,
                    Control::Back => driver.skip_backward().await,
                    Control::Stop => driver.stop().await,
                    Control::Seek(index) => driver.seek(index).await,
                    Control::Quit => return Ok(()),
                    Control::Help => {
                        eprintln!("{HELP}");
                        Ok(())
                    }
                };
                if let Err(e) = outcome {
                    eprintln!("⚠️  {e}");
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let snap = snapshots.borrow_and_update().clone();
                if snap.state != last.state || snap.cursor != last.cursor {
                    announce(&snap);
                }
                if snap.state == PlaybackState::Idle && last.state != PlaybackState::Idle {
                    if let Some(err) = &snap.last_error {
                        anyhow::bail!("playback stopped: {err}");
                    }
                    if !stdin_open {
                        return Ok(());
                    }
                }
                last = snap;
            }
        }
    }
}

fn announce(snap: &PlaybackSnapshot) {
    match snap.state {
        PlaybackState::Speaking => eprintln!(
            "🔊 [{}/{} {:.0}%] {}",
            snap.cursor + 1,
            snap.total,
            snap.progress,
            snap.sentence.as_deref().unwrap_or_default()
        ),
        PlaybackState::Paused => eprintln!("⏸  paused at chunk {}", snap.cursor + 1),
        PlaybackState::Idle => eprintln!("⏹  stopped at chunk {}", snap.cursor + 1),
    }
}
