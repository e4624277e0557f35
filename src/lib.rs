//! # Photomorph
//!
//! Blend two photos into a smooth crossfade video, optionally set to a
//! soundtrack.
//!
//! The pipeline normalizes two input images to a shared size, interpolates
//! a configurable number of in-between frames, encodes them as an H.264
//! video and, when asked, attaches an audio track from an uploaded file or
//! a remote video URL. Audio problems never sink a job: the pipeline falls
//! back to delivering the silent video with a warning.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use photomorph::{Config, PipelineEngine, PipelineJob};
//!
//! # #[tokio::main]
//! # async fn main() -> photomorph::Result<()> {
//! let first = std::fs::read("first.jpg")?;
//! let second = std::fs::read("second.png")?;
//!
//! let engine = PipelineEngine::new(Config::default())?;
//! let outcome = engine.run(PipelineJob::new(first, second, "morph.mp4")).await?;
//!
//! println!("{}: {}", outcome.status, outcome.video.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Adding a Soundtrack
//!
//! ```rust,no_run
//! use photomorph::{AudioSource, Config, PipelineEngine, PipelineJob};
//!
//! # #[tokio::main]
//! # async fn main() -> photomorph::Result<()> {
//! let mut job = PipelineJob::new(
//!     std::fs::read("first.jpg")?,
//!     std::fs::read("second.jpg")?,
//!     "morph.mp4",
//! );
//! job.audio = AudioSource::RemoteUrl("https://youtu.be/aqz-KE-bpKQ".into());
//!
//! let engine = PipelineEngine::new(Config::default())?;
//! let outcome = engine.run(job).await?;
//! if let Some(warning) = &outcome.warning {
//!     eprintln!("{warning}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`morph`] - Image normalization and frame interpolation
//! - [`video`] - Video encoding and audio muxing
//! - [`audio`] - Soundtrack acquisition and probing
//! - [`pipeline`] - The orchestration engine, jobs and progress reporting
//! - [`config`] - Configuration management

pub mod audio;
pub mod config;
pub mod error;
pub mod morph;
pub mod pipeline;
pub mod video;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for convenience
pub use crate::{
    audio::AudioSource,
    config::Config,
    error::{MorphError, Result},
    pipeline::{JobOutcome, JobStatus, PipelineEngine, PipelineJob},
    video::{AudioTrack, VideoAsset},
};
