use std::path::{Path, PathBuf};
use std::process::Command;

use tokio::task;
use tracing::{debug, info};

use crate::audio::fetcher::RemoteAudioFetcher;
use crate::audio::probe::AudioProbe;
use crate::audio::types::{AudioClip, AudioSource};
use crate::config::{Config, ToolsConfig};
use crate::error::{AudioError, Result};
use crate::video::VideoEncoder;

/// Tool availability, resolved once when the engine is constructed
///
/// Availability never varies mid-job: a job either starts with a working
/// audio subsystem or the acquirer fails closed with an unsupported-format
/// error that the pipeline downgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioCapability {
    /// ffmpeg is present, so conversion and muxing can run
    pub conversion: bool,

    /// yt-dlp is present, so remote URLs can be resolved
    pub remote_fetch: bool,
}

impl AudioCapability {
    /// Probe the configured tools with their version flags.
    pub fn detect(tools: &ToolsConfig) -> Self {
        Self {
            conversion: VideoEncoder::check_available(&tools.ffmpeg),
            remote_fetch: RemoteAudioFetcher::check_available(&tools.ytdlp),
        }
    }

    pub fn disabled() -> Self {
        Self {
            conversion: false,
            remote_fetch: false,
        }
    }

    pub fn audio_available(&self) -> bool {
        self.conversion
    }
}

/// Obtains the requested soundtrack and stages it for the muxer
pub struct AudioAcquirer {
    enabled: bool,
    capability: AudioCapability,
    fetcher: RemoteAudioFetcher,
    ffmpeg: String,
}

impl AudioAcquirer {
    pub fn new(config: &Config, capability: AudioCapability) -> Self {
        Self {
            enabled: config.audio.enabled,
            capability,
            fetcher: RemoteAudioFetcher::new(config.tools.ytdlp.clone()),
            ffmpeg: config.tools.ffmpeg.clone(),
        }
    }

    /// Obtain the requested soundtrack, staging it inside `dest_dir`.
    ///
    /// Returns `Ok(None)` when no audio was requested. Every error leaving
    /// this method belongs to the recoverable audio path.
    pub async fn acquire(
        &self,
        source: &AudioSource,
        dest_dir: &Path,
    ) -> Result<Option<AudioClip>> {
        match source {
            AudioSource::None => Ok(None),
            _ if !self.enabled => Err(AudioError::UnsupportedFormat {
                detail: "the audio subsystem is disabled by configuration".to_string(),
            }
            .into()),
            _ if !self.capability.audio_available() => Err(AudioError::UnsupportedFormat {
                detail: "the audio subsystem is unavailable on this host (ffmpeg not found)"
                    .to_string(),
            }
            .into()),
            AudioSource::Upload { bytes, file_name } => {
                self.stage_upload(bytes, file_name, dest_dir).map(Some)
            }
            AudioSource::RemoteUrl(url) => self.fetch_remote(url, dest_dir).await.map(Some),
        }
    }

    fn stage_upload(&self, bytes: &[u8], file_name: &str, dest_dir: &Path) -> Result<AudioClip> {
        let probed = AudioProbe::probe(bytes, file_name)?;

        let path = dest_dir.join(format!("uploaded_audio.{}", probed.extension));
        std::fs::write(&path, bytes).map_err(AudioError::Io)?;

        info!(
            path = %path.display(),
            duration = probed.duration.unwrap_or(0.0),
            "staged uploaded audio"
        );

        Ok(AudioClip {
            path,
            duration: probed.duration,
            format: probed.extension,
        })
    }

    async fn fetch_remote(&self, url: &str, dest_dir: &Path) -> Result<AudioClip> {
        if !self.capability.remote_fetch {
            return Err(AudioError::UnsupportedFormat {
                detail: "remote audio requires yt-dlp, which was not found".to_string(),
            }
            .into());
        }

        let downloaded = self.fetcher.fetch(url, dest_dir).await?;
        let converted = self.convert_to_working_format(&downloaded.path, dest_dir).await?;

        Ok(AudioClip {
            path: converted,
            duration: downloaded.duration,
            format: "m4a".to_string(),
        })
    }

    /// Re-wrap the downloaded stream as audio-only AAC in an m4a container.
    async fn convert_to_working_format(&self, input: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let output = dest_dir.join("soundtrack.m4a");
        let args = convert_args(input, &output);

        debug!(tool = %self.ffmpeg, ?args, "converting downloaded audio");

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(&args);

        let result = task::spawn_blocking(move || cmd.output())
            .await
            .map_err(|e| AudioError::ConversionFailed {
                reason: format!("failed to spawn converter: {e}"),
            })?
            .map_err(|e| AudioError::ConversionFailed {
                reason: format!("could not run converter: {e}"),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AudioError::ConversionFailed {
                reason: stderr.trim().to_string(),
            }
            .into());
        }

        if !output.exists() {
            return Err(AudioError::ConversionFailed {
                reason: "converted clip is missing on disk".to_string(),
            }
            .into());
        }

        Ok(output)
    }
}

fn convert_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.display().to_string(),
        "-vn".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-y".to_string(),
        output.display().to_string(),
    ]
}
