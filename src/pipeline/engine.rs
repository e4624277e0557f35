//! Pipeline orchestration
//!
//! `PipelineEngine` drives one job through the full morph pipeline:
//! validation, image normalization, frame interpolation, video encoding,
//! then the optional audio stages. Every intermediate artifact lives in a
//! per-job [`Workspace`] and only the finished video is moved to the
//! caller's output path, so observers never see a half-written file.

use std::path::Path;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::audio::{AudioAcquirer, AudioCapability, AudioClip};
use crate::config::Config;
use crate::error::{Result, ValidationError};
use crate::morph::{Interpolator, Normalizer};
use crate::pipeline::job::{JobOutcome, JobStatus, PipelineJob};
use crate::pipeline::progress::{ProgressReporter, Stage};
use crate::pipeline::workspace::Workspace;
use crate::video::{Muxer, VideoAsset, VideoEncoder};

/// Share of the encoding stage spent writing frames to disk; the encoder
/// process itself accounts for the remainder.
const FRAME_WRITE_SHARE: f64 = 0.9;

/// Drives morph jobs from validation through publication.
pub struct PipelineEngine {
    config: Config,
    capability: AudioCapability,
    normalizer: Normalizer,
    interpolator: Interpolator,
    encoder: VideoEncoder,
    muxer: Muxer,
    acquirer: AudioAcquirer,
}

impl PipelineEngine {
    /// Builds an engine from a validated configuration, probing the host
    /// for external tools once.
    pub fn new(config: Config) -> Result<Self> {
        let capability = AudioCapability::detect(&config.tools);
        Self::with_capability(config, capability)
    }

    /// Builds an engine with a pre-resolved capability report instead of
    /// probing the host.
    pub fn with_capability(config: Config, capability: AudioCapability) -> Result<Self> {
        config.validate()?;

        if !capability.conversion {
            warn!(
                "{} was not found; video encoding will fail until it is installed",
                config.tools.ffmpeg
            );
        } else if !capability.remote_fetch {
            info!(
                "{} was not found; remote audio URLs will be rejected",
                config.tools.ytdlp
            );
        }

        let interpolator = Interpolator::new(&config.limits);
        let encoder = VideoEncoder::new(config.video.params.clone(), config.tools.ffmpeg.clone());
        let muxer = Muxer::new(config.tools.ffmpeg.clone());
        let acquirer = AudioAcquirer::new(&config, capability);

        Ok(Self {
            config,
            capability,
            normalizer: Normalizer::new(),
            interpolator,
            encoder,
            muxer,
            acquirer,
        })
    }

    /// Whether this host can attach soundtracks at all.
    pub fn audio_available(&self) -> bool {
        self.config.audio.enabled && self.capability.audio_available()
    }

    /// The tool capability report resolved at construction.
    pub fn capability(&self) -> AudioCapability {
        self.capability
    }

    /// Normalizes both inputs without running the pipeline, for callers
    /// that want to show the morph endpoints before committing to a job.
    pub fn preview(
        &self,
        first_image: &[u8],
        second_image: &[u8],
        target_size: Option<(u32, u32)>,
    ) -> Result<(RgbImage, RgbImage)> {
        self.normalizer.normalize(first_image, second_image, target_size)
    }

    /// Runs one job to completion without progress reporting.
    pub async fn run(&self, job: PipelineJob) -> Result<JobOutcome> {
        self.run_with_progress(job, &ProgressReporter::silent()).await
    }

    /// Runs one job to completion, reporting per-stage progress.
    ///
    /// Audio-path failures downgrade the job to a silent video with a
    /// warning; every other error aborts the run with nothing published.
    pub async fn run_with_progress(
        &self,
        job: PipelineJob,
        progress: &ProgressReporter,
    ) -> Result<JobOutcome> {
        info!("🎬 Starting morph pipeline");
        info!("   Frames: {} at {} fps", job.frame_count, job.fps);
        info!("   Audio: {}", job.audio.kind());
        info!("   Output: {}", job.output_path.display());

        info!("🔍 Step 1: Validating job parameters...");
        progress.stage_started(Stage::Validating);
        self.validate(&job)?;
        progress.stage_finished(Stage::Validating);

        let workspace = Workspace::new()?;
        debug!("workspace at {}", workspace.path().display());

        info!("🖼️  Step 2: Normalizing source images...");
        progress.stage_started(Stage::Normalizing);
        let (first, second) =
            self.normalizer
                .normalize(&job.first_image, &job.second_image, job.target_size)?;
        progress.stage_finished(Stage::Normalizing);
        info!("   ✅ Normalized to {}x{}", first.width(), first.height());

        info!("🎞️  Step 3: Interpolating {} crossfade frames...", job.frame_count);
        progress.stage_started(Stage::Interpolating);
        let sequence = self.interpolator.interpolate(
            &first,
            &second,
            job.frame_count,
            |frames_done, total| {
                progress.report(Stage::Interpolating, frames_done as f64 / total as f64);
            },
        )?;
        progress.stage_finished(Stage::Interpolating);
        info!("   ✅ {} frames ready", sequence.len());

        info!("📼 Step 4: Encoding silent video...");
        progress.stage_started(Stage::Encoding);
        let silent = self
            .encoder
            .encode(&sequence, job.fps, workspace.path(), |frames_done, total| {
                progress.report(
                    Stage::Encoding,
                    FRAME_WRITE_SHARE * frames_done as f64 / total as f64,
                );
            })
            .await?;
        progress.stage_finished(Stage::Encoding);
        info!(
            "   ✅ Silent video ready: {:.2}s, {}x{}",
            silent.duration_seconds(),
            silent.width,
            silent.height
        );

        let (finished, status, warning) =
            match self.attach_audio(&job, &silent, &workspace, progress).await {
                Ok(Some(composed)) => (composed, JobStatus::DoneComposed, None),
                Ok(None) => (silent, JobStatus::DoneSilent, None),
                Err(e) if e.is_audio_recoverable() => {
                    warn!("audio path failed, delivering silent video: {e}");
                    let warning = e.user_message();
                    (silent, JobStatus::DoneSilent, Some(warning))
                }
                Err(e) => return Err(e),
            };

        let video = self.publish(&workspace, finished, &job.output_path)?;
        info!("🎉 Pipeline complete: {} -> {}", status, video.path.display());

        Ok(JobOutcome {
            video,
            status,
            warning,
        })
    }

    /// Acquires and attaches the requested soundtrack. `Ok(None)` means the
    /// job never asked for audio; errors are for the caller to classify.
    async fn attach_audio(
        &self,
        job: &PipelineJob,
        silent: &VideoAsset,
        workspace: &Workspace,
        progress: &ProgressReporter,
    ) -> Result<Option<VideoAsset>> {
        if job.audio.is_none() {
            debug!("no audio requested, delivering the silent video");
            return Ok(None);
        }

        info!("🎵 Step 5: Acquiring soundtrack ({})...", job.audio.kind());
        progress.stage_started(Stage::AcquiringAudio);
        let clip = match self.acquirer.acquire(&job.audio, workspace.path()).await? {
            Some(clip) => clip,
            None => return Ok(None),
        };
        progress.stage_finished(Stage::AcquiringAudio);
        log_clip(&clip);

        info!("🔗 Step 6: Muxing soundtrack into video...");
        progress.stage_started(Stage::Muxing);
        let composed = self.muxer.mux(silent, &clip, workspace.path()).await?;
        progress.stage_finished(Stage::Muxing);
        info!("   ✅ Composed video ready");

        Ok(Some(composed))
    }

    /// Rejects jobs that violate the configured limits before any work
    /// happens.
    fn validate(&self, job: &PipelineJob) -> Result<()> {
        if job.first_image.is_empty() {
            return Err(ValidationError::MissingImage { which: "first" }.into());
        }
        if job.second_image.is_empty() {
            return Err(ValidationError::MissingImage { which: "second" }.into());
        }

        let limits = &self.config.limits;
        if job.frame_count < limits.min_frame_count || job.frame_count > limits.max_frame_count {
            return Err(ValidationError::FrameCountOutOfRange {
                value: job.frame_count,
                min: limits.min_frame_count,
                max: limits.max_frame_count,
            }
            .into());
        }
        if job.fps < limits.min_fps || job.fps > limits.max_fps {
            return Err(ValidationError::FpsOutOfRange {
                value: job.fps,
                min: limits.min_fps,
                max: limits.max_fps,
            }
            .into());
        }
        if let Some((width, height)) = job.target_size {
            for value in [width, height] {
                if value < limits.min_dimension || value > limits.max_dimension {
                    return Err(ValidationError::SizeOutOfRange {
                        value,
                        min: limits.min_dimension,
                        max: limits.max_dimension,
                    }
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Moves the finished artifact out of the workspace in one step.
    fn publish(
        &self,
        workspace: &Workspace,
        asset: VideoAsset,
        destination: &Path,
    ) -> Result<VideoAsset> {
        workspace.publish(&asset.path, destination)?;
        Ok(VideoAsset {
            path: destination.to_path_buf(),
            ..asset
        })
    }
}

fn log_clip(clip: &AudioClip) {
    match clip.duration {
        Some(seconds) => info!(
            "   ✅ Soundtrack staged: {} ({:.2}s)",
            clip.format, seconds
        ),
        None => info!("   ✅ Soundtrack staged: {}", clip.format),
    }
}
