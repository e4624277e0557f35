use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;
use tokio::task;
use tracing::{debug, info};

use crate::error::{EncodingError, Result};
use crate::video::types::{AudioTrack, FrameSequence, VideoAsset, VideoParams};

/// Encodes a frame sequence into a silent H.264/MP4 file
///
/// Frames are dumped as PNGs and fed to an external ffmpeg through its
/// concat demuxer. Everything intermediate lands in the caller's work
/// directory; the encoder never touches paths outside it.
pub struct VideoEncoder {
    params: VideoParams,
    ffmpeg: String,
}

impl VideoEncoder {
    pub fn new(params: VideoParams, ffmpeg: impl Into<String>) -> Self {
        Self {
            params,
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Probe for a working encoder binary.
    pub fn check_available(binary: &str) -> bool {
        Command::new(binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Encode `sequence` at `fps` into `<work_dir>/silent.mp4`.
    ///
    /// `on_frame` is invoked once per frame written to disk with
    /// `(done, total)`; writes run on worker threads, so calls may arrive
    /// out of order.
    pub async fn encode<F>(
        &self,
        sequence: &FrameSequence,
        fps: u32,
        work_dir: &Path,
        on_frame: F,
    ) -> Result<VideoAsset>
    where
        F: Fn(u32, u32) + Sync,
    {
        if fps == 0 {
            return Err(EncodingError::EncoderFailed {
                reason: "frame rate must be positive".to_string(),
            }
            .into());
        }

        let Some((width, height)) = sequence.dimensions() else {
            return Err(EncodingError::EncoderFailed {
                reason: "no frames to encode".to_string(),
            }
            .into());
        };

        self.check_dimensions(sequence, width, height)?;

        if !Self::check_available(&self.ffmpeg) {
            return Err(EncodingError::EncoderUnavailable {
                reason: format!("{} was not found on this host", self.ffmpeg),
            }
            .into());
        }

        let frames_dir = work_dir.join("frames");
        std::fs::create_dir_all(&frames_dir).map_err(EncodingError::Io)?;

        let frame_paths = self.write_frames(sequence, &frames_dir, &on_frame)?;

        let list_path = work_dir.join("frame_list.txt");
        self.write_frame_list(&frame_paths, fps, &list_path)?;

        let output = work_dir.join("silent.mp4");
        let args = self.encode_args(&list_path, fps, &output);

        info!(
            frames = sequence.len(),
            fps,
            codec = %self.params.codec,
            "encoding silent video"
        );
        self.run_encoder(args).await?;

        if !output.exists() {
            return Err(EncodingError::EncoderFailed {
                reason: "encoder produced no output file".to_string(),
            }
            .into());
        }

        Ok(VideoAsset {
            path: output,
            // The pad filter rounds odd dimensions up for yuv420p.
            width: width + width % 2,
            height: height + height % 2,
            fps,
            frame_count: sequence.len() as u32,
            audio: AudioTrack::Silent,
        })
    }

    /// Every frame must match the first frame's dimensions; a mismatch is
    /// a broken upstream invariant, not user input.
    fn check_dimensions(&self, sequence: &FrameSequence, width: u32, height: u32) -> Result<()> {
        for (index, frame) in sequence.iter().enumerate() {
            if frame.width() != width || frame.height() != height {
                return Err(EncodingError::DimensionMismatch {
                    index,
                    width: frame.width(),
                    height: frame.height(),
                    expected_width: width,
                    expected_height: height,
                }
                .into());
            }
        }
        Ok(())
    }

    fn write_frames<F>(
        &self,
        sequence: &FrameSequence,
        frames_dir: &Path,
        on_frame: &F,
    ) -> Result<Vec<PathBuf>>
    where
        F: Fn(u32, u32) + Sync,
    {
        let total = sequence.len() as u32;
        let written = AtomicU32::new(0);

        debug!(path = %frames_dir.display(), "writing frames");

        sequence
            .frames()
            .par_iter()
            .enumerate()
            .try_for_each(|(i, frame)| -> Result<()> {
                let path = frames_dir.join(format!("frame_{i:06}.png"));
                frame
                    .save_png(&path)
                    .map_err(|e| EncodingError::EncoderFailed {
                        reason: format!("failed to write frame {i}: {e}"),
                    })?;

                let done = written.fetch_add(1, Ordering::Relaxed) + 1;
                on_frame(done, total);
                Ok(())
            })?;

        Ok((0..sequence.len())
            .map(|i| frames_dir.join(format!("frame_{i:06}.png")))
            .collect())
    }

    /// Concat-demuxer input list: one entry per frame with its display
    /// duration, then the last frame repeated so the final duration sticks.
    fn write_frame_list(&self, frame_paths: &[PathBuf], fps: u32, list_path: &Path) -> Result<()> {
        let mut file = File::create(list_path).map_err(EncodingError::Io)?;
        let frame_duration = 1.0 / fps as f64;

        for path in frame_paths {
            writeln!(file, "file '{}'", path.display()).map_err(EncodingError::Io)?;
            writeln!(file, "duration {frame_duration:.6}").map_err(EncodingError::Io)?;
        }

        if let Some(last) = frame_paths.last() {
            writeln!(file, "file '{}'", last.display()).map_err(EncodingError::Io)?;
        }

        Ok(())
    }

    fn encode_args(&self, list_path: &Path, fps: u32, output: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_path.display().to_string(),
            "-c:v".to_string(),
            self.params.codec.clone(),
            "-r".to_string(),
            fps.to_string(),
            "-pix_fmt".to_string(),
            self.params.pixel_format.clone(),
            "-crf".to_string(),
            self.params.crf().to_string(),
            "-vf".to_string(),
            "pad=ceil(iw/2)*2:ceil(ih/2)*2".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-y".to_string(),
            output.display().to_string(),
        ]
    }

    async fn run_encoder(&self, args: Vec<String>) -> Result<()> {
        debug!(tool = %self.ffmpeg, ?args, "running encoder");

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(&args);

        let output = task::spawn_blocking(move || cmd.output())
            .await
            .map_err(|e| EncodingError::EncoderFailed {
                reason: format!("failed to spawn encoder: {e}"),
            })?
            .map_err(|e| EncodingError::EncoderFailed {
                reason: format!("could not run encoder: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EncodingError::EncoderFailed {
                reason: stderr.trim().to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MorphError;
    use crate::video::types::Frame;
    use tempfile::tempdir;

    fn sequence_of(count: usize, width: u32, height: u32) -> FrameSequence {
        let frames = (0..count)
            .map(|i| Frame::new_filled(width, height, [i as u8 * 10, 100, 200]))
            .collect();
        FrameSequence::new(frames)
    }

    fn encoder_with(binary: &str) -> VideoEncoder {
        VideoEncoder::new(VideoParams::default(), binary)
    }

    #[test]
    fn test_encode_args_carry_codec_and_quality() {
        let encoder = encoder_with("ffmpeg");
        let args = encoder.encode_args(Path::new("/tmp/list.txt"), 30, Path::new("/tmp/out.mp4"));

        let joined = args.join(" ");
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-pix_fmt yuv420p"));
        assert!(joined.contains("-r 30"));
        assert!(joined.contains("-crf"));
        assert!(joined.contains("pad=ceil(iw/2)*2:ceil(ih/2)*2"));
        assert!(joined.contains("-movflags +faststart"));
        assert!(joined.ends_with("-y /tmp/out.mp4"));
    }

    #[test]
    fn test_frame_list_lists_every_frame_with_duration() {
        let encoder = encoder_with("ffmpeg");
        let dir = tempdir().unwrap();

        let paths: Vec<PathBuf> = (0..3)
            .map(|i| dir.path().join(format!("frame_{i:06}.png")))
            .collect();
        let list_path = dir.path().join("frame_list.txt");
        encoder.write_frame_list(&paths, 30, &list_path).unwrap();

        let content = std::fs::read_to_string(&list_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("file '"));
        assert!(lines[0].ends_with("frame_000000.png'"));
        assert_eq!(lines[1], "duration 0.033333");
        assert!(lines[6].ends_with("frame_000002.png'"), "last frame repeats");
    }

    #[tokio::test]
    async fn test_zero_fps_is_rejected() {
        let encoder = encoder_with("ffmpeg");
        let dir = tempdir().unwrap();

        let error = encoder
            .encode(&sequence_of(3, 4, 4), 0, dir.path(), |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            MorphError::Encoding(EncodingError::EncoderFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_names_the_frame() {
        let encoder = encoder_with("ffmpeg");
        let dir = tempdir().unwrap();

        let mut frames: Vec<Frame> = (0..3).map(|_| Frame::new_filled(4, 4, [0, 0, 0])).collect();
        frames.push(Frame::new_filled(4, 5, [0, 0, 0]));
        let sequence = FrameSequence::new(frames);

        let error = encoder
            .encode(&sequence, 30, dir.path(), |_, _| {})
            .await
            .unwrap_err();

        match error {
            MorphError::Encoding(EncodingError::DimensionMismatch {
                index,
                height,
                expected_height,
                ..
            }) => {
                assert_eq!(index, 3);
                assert_eq!(height, 5);
                assert_eq!(expected_height, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_encoder_binary_is_unavailable() {
        let encoder = encoder_with("definitely-not-a-real-encoder");
        let dir = tempdir().unwrap();

        let error = encoder
            .encode(&sequence_of(3, 4, 4), 30, dir.path(), |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            MorphError::Encoding(EncodingError::EncoderUnavailable { .. })
        ));
    }

    #[test]
    fn test_check_available_for_missing_binary() {
        assert!(!VideoEncoder::check_available("definitely-not-a-real-encoder"));
    }

    #[cfg(unix)]
    mod with_fake_tool {
        use super::*;
        use crate::test_support::write_fake_tool;
        use std::sync::Mutex;

        const FAKE_FFMPEG: &str = r#"#!/bin/sh
case "$*" in
  *-version*) echo "ffmpeg version 6.0"; exit 0;;
esac
for last; do :; done
echo fakevideo > "$last"
"#;

        const BROKEN_FFMPEG: &str = r#"#!/bin/sh
case "$*" in
  *-version*) echo "ffmpeg version 6.0"; exit 0;;
esac
echo "encoder exploded" >&2
exit 1
"#;

        #[tokio::test]
        async fn test_encode_produces_a_silent_asset() {
            let tools = tempdir().unwrap();
            let ffmpeg = write_fake_tool(tools.path(), "ffmpeg", FAKE_FFMPEG);
            let encoder = encoder_with(&ffmpeg.display().to_string());

            let work = tempdir().unwrap();
            let seen = Mutex::new(Vec::new());
            let asset = encoder
                .encode(&sequence_of(5, 4, 4), 30, work.path(), |done, total| {
                    assert_eq!(total, 5);
                    seen.lock().unwrap().push(done);
                })
                .await
                .unwrap();

            assert!(asset.path.exists());
            assert_eq!(asset.audio, AudioTrack::Silent);
            assert_eq!((asset.width, asset.height), (4, 4));
            assert_eq!(asset.frame_count, 5);
            assert!((asset.duration_seconds() - 5.0 / 30.0).abs() < 1e-9);

            let mut seen = seen.into_inner().unwrap();
            seen.sort_unstable();
            assert_eq!(seen, (1..=5).collect::<Vec<u32>>());

            // All five frames landed on disk for the encoder to read.
            let frames = std::fs::read_dir(work.path().join("frames")).unwrap().count();
            assert_eq!(frames, 5);
        }

        #[tokio::test]
        async fn test_odd_dimensions_are_reported_padded() {
            let tools = tempdir().unwrap();
            let ffmpeg = write_fake_tool(tools.path(), "ffmpeg", FAKE_FFMPEG);
            let encoder = encoder_with(&ffmpeg.display().to_string());

            let work = tempdir().unwrap();
            let asset = encoder
                .encode(&sequence_of(2, 5, 3), 10, work.path(), |_, _| {})
                .await
                .unwrap();

            assert_eq!((asset.width, asset.height), (6, 4));
        }

        #[tokio::test]
        async fn test_encoder_failure_carries_stderr() {
            let tools = tempdir().unwrap();
            let ffmpeg = write_fake_tool(tools.path(), "ffmpeg", BROKEN_FFMPEG);
            let encoder = encoder_with(&ffmpeg.display().to_string());

            let work = tempdir().unwrap();
            let error = encoder
                .encode(&sequence_of(3, 4, 4), 30, work.path(), |_, _| {})
                .await
                .unwrap_err();

            match error {
                MorphError::Encoding(EncodingError::EncoderFailed { reason }) => {
                    assert!(reason.contains("encoder exploded"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
