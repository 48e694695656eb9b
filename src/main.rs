//! vocalize - Render and play text-to-speech engine output.
//!
//! Reads a speech engine response (JSON with a base64 PCM payload), encodes
//! it as WAV, and plays it over an optional looping background track.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- response.json                        # Play voice only
//! cargo run -- response.json -b lofi -v 0.2         # Play over a background
//! cargo run -- response.json --out take.wav --no-play
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use vocalize::{
    AudioEngine, EnginePayload, MediaStore, Pcm16Decoder, RenderSettings, RenderedTrack,
    Renderer, Studio, StudioConfig,
};

/// Command-line options for the application.
struct CliOptions {
    /// Engine response to render.
    payload: PathBuf,
    /// Optional JSON configuration file.
    config: Option<PathBuf>,
    /// Background catalog id.
    background: Option<String>,
    /// Background mixing level.
    volume: Option<f32>,
    /// Where to save the rendered WAV.
    out: Option<PathBuf>,
    /// Render (and save) without playing.
    no_play: bool,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--config <path>` or `-c <path>`: Load a studio configuration file
    /// - `--background <id>` or `-b <id>`: Play over a background track
    /// - `--volume <level>` or `-v <level>`: Background mixing level
    /// - `--out <path>` or `-o <path>`: Save the rendered WAV
    /// - `--no-play`: Skip playback
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut payload: Option<PathBuf> = None;
        let mut config = None;
        let mut background = None;
        let mut volume = None;
        let mut out = None;
        let mut no_play = false;
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => config = Some(PathBuf::from(value(&args, &mut i)?)),
                "--background" | "-b" => background = Some(value(&args, &mut i)?.to_string()),
                "--volume" | "-v" => {
                    let raw = value(&args, &mut i)?;
                    let level: f32 = raw
                        .parse()
                        .with_context(|| format!("Invalid volume: {}", raw))?;
                    volume = Some(level);
                }
                "--out" | "-o" => out = Some(PathBuf::from(value(&args, &mut i)?)),
                "--no-play" => no_play = true,
                "--help" | "-h" => {
                    print_help(args.first().map(String::as_str).unwrap_or("vocalize"));
                    std::process::exit(0);
                }
                other if other.starts_with('-') => {
                    eprintln!("Unknown option: {}", other);
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
                other => payload = Some(PathBuf::from(other)),
            }
            i += 1;
        }

        let payload = payload.context("Missing engine response file (use --help)")?;
        Ok(Self {
            payload,
            config,
            background,
            volume,
            out,
            no_play,
        })
    }
}

/// Returns the argument following the option at `i`, advancing `i`.
fn value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let option = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{} requires a value", option))
}

fn print_help(program: &str) {
    eprintln!("vocalize - Render and play text-to-speech engine output");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <RESPONSE.json>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config PATH      Load a studio configuration file (JSON)");
    eprintln!("  -b, --background ID    Background track id (e.g. lofi, zen, none)");
    eprintln!("  -v, --volume LEVEL     Background mixing level, 0.0 to 1.0");
    eprintln!("  -o, --out PATH         Save the rendered WAV");
    eprintln!("      --no-play          Render without playing");
    eprintln!("  -h, --help             Print this help message");
    eprintln!();
    eprintln!("Set RUST_LOG=debug for detailed logs.");
}

/// Renders without touching the audio output device.
fn render_headless(
    config: &StudioConfig,
    payload: &EnginePayload,
    settings: RenderSettings,
    store: &mut MediaStore,
) -> Result<RenderedTrack> {
    Renderer::new(Pcm16Decoder)
        .with_stream_format(config.sample_rate, config.channel_count)
        .render(payload, settings, store)
        .context("Render failed")
}

/// Reports a finished render and saves it if requested.
fn finish_render(track: &RenderedTrack, out: Option<&Path>) -> Result<()> {
    eprintln!(
        "Rendered {:.2}s of audio ({} bytes)",
        track.duration_seconds,
        track.container.len()
    );
    if let Some(out) = out {
        track
            .container
            .save_to_file(out)
            .with_context(|| format!("Failed to save {}", out.display()))?;
        eprintln!("Saved {}", out.display());
    }
    Ok(())
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => StudioConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => StudioConfig::default(),
    };

    let json = std::fs::read_to_string(&cli.payload)
        .with_context(|| format!("Failed to read {}", cli.payload.display()))?;
    let payload: EnginePayload =
        serde_json::from_str(&json).context("Failed to parse engine response")?;

    let mut settings = RenderSettings::default();
    if let Some(id) = &cli.background {
        settings = settings.with_background(
            id.as_str(),
            cli.volume.unwrap_or(config.default_mixing_level),
        );
    }

    if cli.no_play {
        let mut store = MediaStore::new();
        let track = render_headless(&config, &payload, settings, &mut store)?;
        return finish_render(&track, cli.out.as_deref());
    }

    let engine = AudioEngine::new()?;
    let mut studio = Studio::new(
        &config,
        engine.channel("voice"),
        engine.channel("background"),
        Pcm16Decoder,
    );

    let id = studio.render(&payload, settings).context("Render failed")?;
    let track = studio
        .history()
        .get(id)
        .context("Rendered track missing from history")?;
    finish_render(track, cli.out.as_deref())?;

    let report = studio.replay(id).context("Playback failed")?;
    tracing::debug!(session = report.token.generation(), "Waiting for voice to finish");

    let interval = Duration::from_millis(config.poll_interval_ms);
    while studio.is_playing() {
        if studio.poll() {
            break;
        }
        thread::sleep(interval);
    }
    studio.stop();

    Ok(())
}
