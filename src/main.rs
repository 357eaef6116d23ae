mod app;
mod assets;
mod audio;
mod fetch;
mod game;
mod signal;
mod silhouette;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use app::AppConfig;
use assets::GameAssets;
use audio::AudioPlayer;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the sounds, music, background animation and font
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Species index URL
    #[arg(long, default_value = fetch::DEFAULT_INDEX_URL)]
    index_url: String,

    /// Serial port of the signal peripheral (skips auto-detection)
    #[arg(long)]
    serial_port: Option<String>,

    /// Rounds per session
    #[arg(long, default_value_t = game::DEFAULT_ROUNDS)]
    rounds: u32,

    /// Guessing time limit per round, in seconds
    #[arg(long, default_value_t = game::DEFAULT_TIME_LIMIT_SECS)]
    time_limit: u64,

    /// Disable audio output
    #[arg(long)]
    mute: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Sombra starting");
    tracing::info!("Rounds per session: {}", args.rounds);
    tracing::info!("Time limit: {}s", args.time_limit);

    // Load local assets
    let assets = GameAssets::load(&args.assets).context("Failed to load assets")?;
    let (width, height) = assets.background_size();
    tracing::info!("Window size: {}x{}", width, height);

    // Initialize audio
    let GameAssets {
        sounds,
        background_frames,
        font,
    } = assets;
    let audio = AudioPlayer::new(sounds, args.mute).context("Failed to initialize audio")?;

    // Find the signal peripheral, best-effort
    let link = match &args.serial_port {
        Some(path) => signal::open(path),
        None => signal::detect(),
    };
    if !link.is_connected() {
        tracing::info!("Running without a signal peripheral");
    }

    // Initialize the species source
    let source = fetch::create_default_source(&args.index_url)
        .context("Failed to initialize species source")?;

    // Run the window shell
    let config = AppConfig {
        rounds: args.rounds,
        guess_time: Duration::from_secs(args.time_limit),
    };
    let summary = app::run(config, background_frames, font, audio, link, source)?;

    match summary {
        Some(summary) => tracing::info!("Final score: {summary}"),
        None => tracing::info!("Closed before a session finished"),
    }

    Ok(())
}
