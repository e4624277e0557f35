use std::path::PathBuf;

use crate::audio::AudioSource;
use crate::video::VideoAsset;

/// Frames rendered when the caller does not choose a count
pub const DEFAULT_FRAME_COUNT: u32 = 250;

/// Frame rate used when the caller does not choose one
pub const DEFAULT_FPS: u32 = 30;

/// Everything the caller specifies for one morph job
///
/// A job is transient: it exists for a single pipeline run and no job
/// registry survives it.
#[derive(Debug, Clone)]
pub struct PipelineJob {
    /// Raw bytes of the starting image (JPEG or PNG)
    pub first_image: Vec<u8>,

    /// Raw bytes of the ending image (JPEG or PNG)
    pub second_image: Vec<u8>,

    /// Number of frames to render, endpoints included
    pub frame_count: u32,

    /// Output frame rate
    pub fps: u32,

    /// Optional explicit output size; the first image's decoded size
    /// otherwise
    pub target_size: Option<(u32, u32)>,

    /// Optional soundtrack source
    pub audio: AudioSource,

    /// Destination for the finished video
    pub output_path: PathBuf,
}

impl PipelineJob {
    /// A job with default frame count and rate, inferred size and no audio.
    pub fn new(
        first_image: Vec<u8>,
        second_image: Vec<u8>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            first_image,
            second_image,
            frame_count: DEFAULT_FRAME_COUNT,
            fps: DEFAULT_FPS,
            target_size: None,
            audio: AudioSource::None,
            output_path: output_path.into(),
        }
    }

    /// Planned video duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        self.frame_count as f64 / self.fps as f64
    }
}

/// How a finished job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Video only: either no audio was requested or the audio path failed
    DoneSilent,

    /// Video with the requested soundtrack attached
    DoneComposed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::DoneSilent => write!(f, "done (silent)"),
            JobStatus::DoneComposed => write!(f, "done (composed)"),
        }
    }
}

/// Terminal result of a successful pipeline run
#[derive(Debug)]
pub struct JobOutcome {
    /// The published video at the job's output path
    pub video: VideoAsset,

    /// Which terminal branch the job took
    pub status: JobStatus,

    /// Set when the audio path failed and the job downgraded to silent
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_defaults() {
        let job = PipelineJob::new(vec![1], vec![2], "out.mp4");
        assert_eq!(job.frame_count, DEFAULT_FRAME_COUNT);
        assert_eq!(job.fps, DEFAULT_FPS);
        assert!(job.target_size.is_none());
        assert!(job.audio.is_none());
    }

    #[test]
    fn test_planned_duration() {
        let mut job = PipelineJob::new(vec![1], vec![2], "out.mp4");
        job.frame_count = 30;
        job.fps = 30;
        assert!((job.duration_seconds() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(JobStatus::DoneSilent.to_string(), "done (silent)");
        assert_eq!(JobStatus::DoneComposed.to_string(), "done (composed)");
    }
}
