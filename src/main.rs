use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber;

use photomorph::{
    audio::AudioSource,
    config::Config,
    pipeline::{PipelineEngine, PipelineJob},
};

#[derive(Parser)]
#[command(
    name = "photomorph",
    version,
    about = "Morph two photos into a crossfade video",
    long_about = "Photomorph blends two images into a smooth crossfade video, optionally set to a soundtrack from a local audio file or a remote video URL. When the audio cannot be fetched or attached, the video is delivered silent with a warning."
)]
struct Cli {
    /// Starting image (JPEG or PNG)
    #[arg(short, long)]
    first: PathBuf,

    /// Ending image (JPEG or PNG)
    #[arg(short, long)]
    second: PathBuf,

    /// Output video file path
    #[arg(short, long, default_value = "morphing.mp4")]
    output: PathBuf,

    /// Number of frames to render, endpoints included
    #[arg(long)]
    frames: Option<u32>,

    /// Output frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Output width in pixels (defaults to the first image's width)
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Output height in pixels (defaults to the first image's height)
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Soundtrack file (WAV, MP3, FLAC, OGG, M4A, AAC)
    #[arg(short, long, conflicts_with = "audio_url")]
    audio: Option<PathBuf>,

    /// Remote video URL to pull the soundtrack from (requires yt-dlp)
    #[arg(long)]
    audio_url: Option<String>,

    /// Also write the two normalized endpoint images next to the output
    #[arg(long)]
    save_previews: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Photomorph v{}", env!("CARGO_PKG_VERSION"));
    info!("First image: {:?}", cli.first);
    info!("Second image: {:?}", cli.second);
    info!("Output: {:?}", cli.output);

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    let first = std::fs::read(&cli.first)?;
    let second = std::fs::read(&cli.second)?;

    let mut job = PipelineJob::new(first, second, &cli.output);
    if let Some(frames) = cli.frames {
        job.frame_count = frames;
    }
    if let Some(fps) = cli.fps {
        job.fps = fps;
    }
    if let (Some(width), Some(height)) = (cli.width, cli.height) {
        job.target_size = Some((width, height));
    }
    job.audio = audio_source(&cli)?;

    // Create and run the pipeline engine
    let engine = PipelineEngine::new(config)?;
    if !job.audio.is_none() && !engine.audio_available() {
        warn!("Audio tools are missing; the job may fall back to a silent video");
    }

    if cli.save_previews {
        save_previews(&engine, &job, &cli.output)?;
    }

    let outcome = engine.run(job).await?;

    if let Some(warning) = &outcome.warning {
        warn!("{warning}");
    }
    info!(
        "Morph {}. Output saved to: {:?}",
        outcome.status, outcome.video.path
    );
    Ok(())
}

fn save_previews(engine: &PipelineEngine, job: &PipelineJob, output: &Path) -> Result<()> {
    let (first, second) = engine.preview(&job.first_image, &job.second_image, job.target_size)?;

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let first_path = dir.join("first_preview.png");
    let second_path = dir.join("second_preview.png");
    first.save(&first_path)?;
    second.save(&second_path)?;

    info!("Saved endpoint previews to {:?} and {:?}", first_path, second_path);
    Ok(())
}

fn audio_source(cli: &Cli) -> Result<AudioSource> {
    if let Some(path) = &cli.audio {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "soundtrack".to_string());
        return Ok(AudioSource::Upload { bytes, file_name });
    }
    if let Some(url) = &cli.audio_url {
        return Ok(AudioSource::RemoteUrl(url.clone()));
    }
    Ok(AudioSource::None)
}
