//! `readaloud` CLI - extract text from PDFs and read it aloud

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use readaloud::config::ReaderConfig;
use readaloud::content::ExtractionMethod;

#[derive(Parser)]
#[command(name = "readaloud")]
#[command(about = "Extract readable text from PDFs and listen to it sentence by sentence")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/readaloud/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a PDF
    Extract {
        /// PDF file to read
        file: PathBuf,

        /// Extraction method: auto, structured, pattern, loose, raw
        #[arg(short, long)]
        method: Option<ExtractionMethod>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Write the text to this file instead of stdout
        #[arg(short, long, conflicts_with = "export")]
        output: Option<PathBuf>,

        /// Write the text to <name>_text.txt in the current directory
        #[arg(long)]
        export: bool,
    },

    /// List the sentence chunks that would be read aloud
    Chunks {
        /// PDF file to read
        file: PathBuf,

        /// Extraction method: auto, structured, pattern, loose, raw
        #[arg(short, long)]
        method: Option<ExtractionMethod>,
    },

    /// Read a PDF aloud (controls on stdin: p, r, n, b, s, g <N>, q)
    Read {
        /// PDF file to read
        file: PathBuf,

        /// Extraction method: auto, structured, pattern, loose, raw
        #[arg(short, long)]
        method: Option<ExtractionMethod>,

        /// Chunk to start from (1-based)
        #[arg(long, default_value = "1")]
        start: usize,

        /// Speaking rate multiplier
        #[arg(long)]
        rate: Option<f32>,

        /// Pitch multiplier
        #[arg(long)]
        pitch: Option<f32>,

        /// Volume, 0.0 to 1.0
        #[arg(long)]
        volume: Option<f32>,

        /// Synthesizer voice name
        #[arg(long)]
        voice: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ReaderConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            file,
            method,
            json,
            output,
            export,
        } => {
            let method = method.unwrap_or(config.extraction.method);
            let output = if export {
                Some(PathBuf::from(readaloud::export::plain_text_file_name(
                    file.file_name().and_then(|n| n.to_str()),
                )))
            } else {
                output
            };
            cmd::extract::cmd_extract(&file, method, json, output.as_deref())?;
        }
        Commands::Chunks { file, method } => {
            let method = method.unwrap_or(config.extraction.method);
            cmd::extract::cmd_chunks(&file, method)?;
        }
        Commands::Read {
            file,
            method,
            start,
            rate,
            pitch,
            volume,
            voice,
        } => {
            let mut params = config.speech.params.clone();
            if let Some(rate) = rate {
                params.rate = rate;
            }
            if let Some(pitch) = pitch {
                params.pitch = pitch;
            }
            if let Some(volume) = volume {
                params.volume = volume;
            }
            if voice.is_some() {
                params.voice = voice;
            }
            let method = method.unwrap_or(config.extraction.method);
            cmd::read::cmd_read(&file, method, start, params, &config).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
