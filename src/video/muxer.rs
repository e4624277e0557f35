use std::path::Path;
use std::process::Command;

use tokio::task;
use tracing::{debug, info};

use crate::audio::AudioClip;
use crate::error::{MuxError, Result};
use crate::video::types::{AudioTrack, VideoAsset};

/// Combines a silent video with a staged audio clip into one container
///
/// The video stream is copied untouched; the audio is re-encoded to AAC
/// and the output stops at the video's duration. A clip longer than the
/// video is trimmed, a shorter one simply ends early.
pub struct Muxer {
    ffmpeg: String,
}

impl Muxer {
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Mux `clip` into `video`, writing `<work_dir>/composed.mp4`.
    pub async fn mux(
        &self,
        video: &VideoAsset,
        clip: &AudioClip,
        work_dir: &Path,
    ) -> Result<VideoAsset> {
        let output = work_dir.join("composed.mp4");
        let args = mux_args(&video.path, &clip.path, video.duration_seconds(), &output);

        info!(
            video = %video.path.display(),
            audio = %clip.path.display(),
            duration = video.duration_seconds(),
            "attaching soundtrack"
        );
        debug!(tool = %self.ffmpeg, ?args, "running muxer");

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(&args);

        let result = task::spawn_blocking(move || cmd.output())
            .await
            .map_err(|e| MuxError::MuxFailed {
                reason: format!("failed to spawn muxer: {e}"),
            })?
            .map_err(|e| MuxError::MuxFailed {
                reason: format!("could not run muxer: {e}"),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(MuxError::MuxFailed {
                reason: stderr.trim().to_string(),
            }
            .into());
        }

        if !output.exists() {
            return Err(MuxError::MuxFailed {
                reason: "muxer produced no output file".to_string(),
            }
            .into());
        }

        Ok(VideoAsset {
            path: output,
            audio: AudioTrack::Composed,
            ..video.clone()
        })
    }
}

/// The `-t` cap trims the audio to the video's length while `-c:v copy`
/// leaves the visual stream byte-identical.
fn mux_args(video: &Path, audio: &Path, duration_seconds: f64, output: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        video.display().to_string(),
        "-i".to_string(),
        audio.display().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-t".to_string(),
        format!("{duration_seconds:.3}"),
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-y".to_string(),
        output.display().to_string(),
    ]
}
