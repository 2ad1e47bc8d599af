#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Ferry Crossing session.

mod audio;
mod config;
#[cfg(feature = "cpal")]
mod cpal_device;
mod driver;
mod gemini;
mod script;
mod session;

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ferry_crossing_core::Command;
use ferry_crossing_system_narration::{Narrator, SpeechBackend};
use ferry_crossing_world::World;

use crate::{audio::AudioMode, config::AppConfig, gemini::GeminiBackend, session::Session};

#[derive(Debug, Parser)]
#[command(name = "ferry-crossing", version, about = "Play the ferry crossing from a terminal")]
struct Cli {
    /// Configuration file; defaults apply when it does not exist.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Audio output.
    #[arg(long, value_enum, default_value_t = AudioMode::Offline)]
    audio: AudioMode,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Read commands from stdin while the countdown runs in real time.
    Play,
    /// Run commands from a file; time advances only on `wait` lines.
    Script {
        /// Script to execute.
        path: PathBuf,
    },
}

/// Entry point for the Ferry Crossing command-line interface.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_path);
    let config = AppConfig::load(&config_path)?;

    let graph = audio::build_graph(cli.audio, &config.audio)?;
    let backend = GeminiBackend::from_env(&config.narration)?
        .map(|backend| Arc::new(backend) as Arc<dyn SpeechBackend>);
    let narrator = Narrator::new(backend, graph.output_port());
    let mut session = Session::new(
        World::with_config(config.world_config()),
        graph,
        narrator,
        cli.audio.needs_pumping(),
    );
    driver::report(&session.submit(Command::Initialize));

    match cli.mode {
        Mode::Play => driver::run_interactive(&mut session).await,
        Mode::Script { path } => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read script {}", path.display()))?;
            driver::run_script(&mut session, &contents).await
        }
    }
}
