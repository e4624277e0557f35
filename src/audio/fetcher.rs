use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;
use tokio::task;
use tracing::{debug, info};

use crate::error::{AudioError, Result};

/// Metadata subset the stream resolver reports for one remote video
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMetadata {
    #[serde(default)]
    pub title: Option<String>,

    /// Source video length in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub formats: Vec<RemoteFormat>,
}

/// One downloadable stream of a remote video
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFormat {
    pub format_id: String,

    /// Average audio bitrate in kbit/s
    #[serde(default)]
    pub abr: Option<f64>,

    #[serde(default)]
    pub vcodec: Option<String>,

    #[serde(default)]
    pub acodec: Option<String>,

    #[serde(default)]
    pub ext: Option<String>,
}

impl RemoteFormat {
    /// An audio-only stream declares no video codec but does carry audio.
    fn is_audio_only(&self) -> bool {
        let video_absent = matches!(self.vcodec.as_deref(), None | Some("none"));
        let audio_present = match self.acodec.as_deref() {
            Some("none") => false,
            Some(_) => true,
            None => self.abr.is_some(),
        };
        video_absent && audio_present
    }
}

/// Select the audio-only stream with the highest bitrate.
pub fn best_audio_format(metadata: &RemoteMetadata) -> Option<&RemoteFormat> {
    metadata
        .formats
        .iter()
        .filter(|format| format.is_audio_only())
        .max_by(|a, b| a.abr.unwrap_or(0.0).total_cmp(&b.abr.unwrap_or(0.0)))
}

/// A remote stream downloaded into the job workspace
#[derive(Debug, Clone)]
pub struct DownloadedAudio {
    pub path: PathBuf,

    /// Length in seconds as reported by the resolver
    pub duration: Option<f64>,
}

/// Downloads the best audio-only stream of a remote video via yt-dlp
///
/// Resolution and download are two separate invocations: `-J` first for
/// the stream table, then `-f <id>` for the pick. Every failure maps to
/// `RemoteFetchFailed`, which the pipeline downgrades rather than fails on.
pub struct RemoteAudioFetcher {
    ytdlp: String,
}

impl RemoteAudioFetcher {
    pub fn new(ytdlp: impl Into<String>) -> Self {
        Self {
            ytdlp: ytdlp.into(),
        }
    }

    /// Probe for the tool with `--version`, the same check used at startup.
    pub fn check_available(binary: &str) -> bool {
        Command::new(binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Resolve `url`, pick its best audio-only stream and download it
    /// into `dest_dir`.
    pub async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<DownloadedAudio> {
        let metadata = self.resolve(url).await?;

        let format = best_audio_format(&metadata)
            .ok_or_else(|| AudioError::RemoteFetchFailed {
                reason: "the source offers no audio-only stream".to_string(),
            })?
            .clone();

        info!(
            format_id = %format.format_id,
            abr = format.abr.unwrap_or(0.0),
            title = metadata.title.as_deref().unwrap_or("<untitled>"),
            "selected remote audio stream"
        );

        let extension = format.ext.clone().unwrap_or_else(|| "m4a".to_string());
        let output = dest_dir.join(format!("remote_audio.{extension}"));

        self.run(download_args(&format.format_id, &output, url))
            .await?;

        if !output.exists() {
            return Err(AudioError::RemoteFetchFailed {
                reason: "downloaded stream is missing on disk".to_string(),
            }
            .into());
        }

        Ok(DownloadedAudio {
            path: output,
            duration: metadata.duration,
        })
    }

    async fn resolve(&self, url: &str) -> Result<RemoteMetadata> {
        let output = self.run(probe_args(url)).await?;

        let metadata = serde_json::from_slice(&output.stdout).map_err(|e| {
            AudioError::RemoteFetchFailed {
                reason: format!("stream metadata was not valid JSON: {e}"),
            }
        })?;

        Ok(metadata)
    }

    async fn run(&self, args: Vec<String>) -> Result<std::process::Output> {
        debug!(tool = %self.ytdlp, ?args, "running stream resolver");

        let mut cmd = Command::new(&self.ytdlp);
        cmd.args(&args);

        let output = task::spawn_blocking(move || cmd.output())
            .await
            .map_err(|e| AudioError::RemoteFetchFailed {
                reason: format!("failed to spawn resolver: {e}"),
            })?
            .map_err(|e| AudioError::RemoteFetchFailed {
                reason: format!("could not run resolver: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AudioError::RemoteFetchFailed {
                reason: format!("resolver failed: {}", stderr.trim()),
            }
            .into());
        }

        Ok(output)
    }
}

fn probe_args(url: &str) -> Vec<String> {
    vec![
        "-J".to_string(),
        "--no-playlist".to_string(),
        url.to_string(),
    ]
}

fn download_args(format_id: &str, output: &Path, url: &str) -> Vec<String> {
    vec![
        "-f".to_string(),
        format_id.to_string(),
        "--no-playlist".to_string(),
        "-o".to_string(),
        output.display().to_string(),
        url.to_string(),
    ]
}
