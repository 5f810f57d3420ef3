use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use reelloop_core::decode::domain::incremental_decoder::IncrementalDecoder;
use reelloop_core::decode::infrastructure::ffmpeg_mpeg2_decoder::FfmpegMpeg2Decoder;
use reelloop_core::playback::domain::playback_logger::StdoutPlaybackLogger;
use reelloop_core::playback::domain::playback_session::PlaybackSession;
use reelloop_core::playback::domain::presentation_loop::PresentationLoop;
use reelloop_core::shared::config::PlayerConfig;
use reelloop_core::shared::error::Result as PlaybackResult;
use reelloop_core::stream::domain::chunk_source::ChunkSource;
use reelloop_core::stream::infrastructure::reader_chunk_source::FileChunkSource;
use reelloop_core::surface::domain::renderer::Renderer;
use reelloop_core::surface::domain::tick_clock::TickClock;
use reelloop_core::surface::infrastructure::headless_gpu_renderer::HeadlessGpuRenderer;
use reelloop_core::surface::infrastructure::null_renderer::NullRenderer;
use reelloop_core::surface::infrastructure::snapshot_writer::SnapshotWriter;

/// Loops a raw MPEG-2 video elementary stream at its native frame rate.
#[derive(Parser)]
#[command(name = "reelloop")]
struct Cli {
    /// Elementary stream to play (default: config file, then data/eq.mpg).
    input: Option<PathBuf>,

    /// JSON config file (default: the platform config dir, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Presentation ticks per second.
    #[arg(long)]
    tick_rate: Option<u32>,

    /// Bytes read from the stream per decoder request.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Stop after this many ticks (default: run until interrupted).
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Renderer: gpu (offscreen wgpu) or null.
    #[arg(long, default_value = "gpu")]
    renderer: String,

    /// Offscreen target width.
    #[arg(long)]
    width: Option<u32>,

    /// Offscreen target height.
    #[arg(long)]
    height: Option<u32>,

    /// Save every Nth published picture as PNG into this directory.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Picture interval for --snapshot-dir.
    #[arg(long, default_value = "25")]
    snapshot_every: u64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = build_config(&cli)?;

    let mut session = PlaybackSession::open(&config, open_stream, create_decoder)?;
    if let Some(dir) = &cli.snapshot_dir {
        session = session.with_snapshots(Box::new(SnapshotWriter::new(dir, cli.snapshot_every)));
    }

    let mut renderer = build_renderer(&cli, &config)?;
    let mut presentation = PresentationLoop::new(Box::new(StdoutPlaybackLogger::default()));
    let summary = presentation.run(session, renderer.as_mut())?;

    log::info!(
        "Done: {} ticks, {} pictures, {} loops",
        summary.ticks,
        summary.pictures_published,
        summary.loops
    );
    Ok(())
}

fn open_stream(path: &Path) -> PlaybackResult<Box<dyn ChunkSource>> {
    Ok(Box::new(FileChunkSource::open(path)?))
}

fn create_decoder() -> PlaybackResult<Box<dyn IncrementalDecoder>> {
    Ok(Box::new(FfmpegMpeg2Decoder::new()?))
}

/// File settings first, then command-line overrides.
fn build_config(cli: &Cli) -> Result<PlayerConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::load_or_default()?,
    };

    if let Some(input) = &cli.input {
        config.input = input.clone();
    }
    if let Some(tick_rate) = cli.tick_rate {
        config.tick_rate = tick_rate;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(width) = cli.width {
        config.window_width = width;
    }
    if let Some(height) = cli.height {
        config.window_height = height;
    }

    config.validate()?;
    Ok(config)
}

fn build_renderer(
    cli: &Cli,
    config: &PlayerConfig,
) -> Result<Box<dyn Renderer>, Box<dyn std::error::Error>> {
    let clock = TickClock::new(config.tick_rate).with_max_ticks(cli.max_ticks);
    if cli.renderer == "null" {
        return Ok(Box::new(NullRenderer::with_clock(clock)));
    }

    let renderer = HeadlessGpuRenderer::new(config.window_width, config.window_height, clock)
        .ok_or("No GPU adapter available (use --renderer null to run without one)")?;
    Ok(Box::new(renderer))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.renderer != "gpu" && cli.renderer != "null" {
        return Err(format!("Renderer must be 'gpu' or 'null', got '{}'", cli.renderer).into());
    }
    if cli.snapshot_every == 0 {
        return Err("Snapshot interval must be at least 1".into());
    }
    if let Some(config) = &cli.config {
        if !config.exists() {
            return Err(format!("Config file not found: {}", config.display()).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("reelloop").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"tick_rate": 30, "chunk_size": 1024}"#).unwrap();

        let cli = parse(&[
            "clip.m2v",
            "--config",
            path.to_str().unwrap(),
            "--tick-rate",
            "50",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.input, PathBuf::from("clip.m2v"));
        assert_eq!(config.tick_rate, 50);
        assert_eq!(config.chunk_size, 1024);
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();
        let cli = parse(&["--config", path.to_str().unwrap(), "--chunk-size", "0"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_unknown_renderer_is_rejected() {
        assert!(validate(&parse(&["--renderer", "vulkan"])).is_err());
        assert!(validate(&parse(&["--renderer", "null"])).is_ok());
    }

    #[test]
    fn test_missing_config_file_is_rejected() {
        assert!(validate(&parse(&["--config", "/nonexistent/reelloop.json"])).is_err());
    }

    #[test]
    fn test_missing_input_fails_at_open() {
        let config = PlayerConfig {
            input: PathBuf::from("/nonexistent/clip.m2v"),
            ..PlayerConfig::default()
        };
        assert!(PlaybackSession::open(&config, open_stream, create_decoder).is_err());
    }
}
