use std::io::Cursor;
use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::{AudioError, Result};

/// What a successful parse learned about uploaded audio bytes
#[derive(Debug, Clone)]
pub struct ProbedAudio {
    /// Clip length in seconds, when the container carries timing data
    pub duration: Option<f64>,

    /// Normalized lowercase extension the bytes were validated as
    pub extension: String,
}

/// Parses uploaded audio bytes without decoding them to samples
///
/// WAV goes through hound, everything else through a symphonia format
/// probe. Bytes that no parser accepts are an unsupported format, which
/// the pipeline treats as recoverable.
pub struct AudioProbe;

impl AudioProbe {
    /// Validate uploaded bytes and measure their duration.
    ///
    /// The extension of `file_name` selects the parser, mirroring how the
    /// upload arrived from the caller.
    pub fn probe(bytes: &[u8], file_name: &str) -> Result<ProbedAudio> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "wav" => Self::probe_wav(bytes),
            "mp3" | "flac" | "ogg" | "m4a" | "aac" => Self::probe_with_symphonia(bytes, &extension),
            other => Err(AudioError::UnsupportedFormat {
                detail: format!("unrecognized extension '{other}'"),
            }
            .into()),
        }
    }

    /// WAV parsing via hound, the most reliable reader for the format
    fn probe_wav(bytes: &[u8]) -> Result<ProbedAudio> {
        let reader =
            hound::WavReader::new(Cursor::new(bytes)).map_err(|e| AudioError::UnsupportedFormat {
                detail: format!("wav: {e}"),
            })?;

        let spec = reader.spec();
        let duration = reader.duration() as f64 / spec.sample_rate as f64;

        debug!(
            duration,
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            "probed wav upload"
        );

        Ok(ProbedAudio {
            duration: Some(duration),
            extension: "wav".to_string(),
        })
    }

    fn probe_with_symphonia(bytes: &[u8], extension: &str) -> Result<ProbedAudio> {
        let source = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(extension);

        let fmt_opts: FormatOptions = Default::default();
        let meta_opts: MetadataOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|e| AudioError::UnsupportedFormat {
                detail: format!("{extension}: {e}"),
            })?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::UnsupportedFormat {
                detail: "no decodable audio track".to_string(),
            })?;

        let track_id = track.id;
        let time_base = track.codec_params.time_base;

        // The easy path: the container declares its frame count up front.
        if let (Some(tb), Some(n_frames)) = (time_base, track.codec_params.n_frames) {
            let time = tb.calc_time(n_frames);
            return Ok(ProbedAudio {
                duration: Some(time.seconds as f64 + time.frac),
                extension: extension.to_string(),
            });
        }

        // Otherwise walk the packets and sum their durations. No decoding
        // happens here; the stream is only demuxed.
        let Some(tb) = time_base else {
            return Ok(ProbedAudio {
                duration: None,
                extension: extension.to_string(),
            });
        };

        let mut total_ts = 0u64;
        loop {
            match format.next_packet() {
                Ok(packet) => {
                    if packet.track_id() == track_id {
                        total_ts += packet.dur();
                    }
                }
                Err(SymphoniaError::IoError(_)) => break,
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(AudioError::UnsupportedFormat {
                        detail: format!("{extension}: {e}"),
                    }
                    .into());
                }
            }
        }

        let time = tb.calc_time(total_ts);
        Ok(ProbedAudio {
            duration: Some(time.seconds as f64 + time.frac),
            extension: extension.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MorphError;

    fn wav_bytes(seconds: f64, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut buffer = Vec::new();
        {
            let cursor = Cursor::new(&mut buffer);
            let mut writer = hound::WavWriter::new(cursor, spec).unwrap();
            let total = (seconds * sample_rate as f64) as usize;
            for i in 0..total {
                let sample = ((i as f32 * 0.05).sin() * 8000.0) as i16;
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        buffer
    }

    #[test]
    fn test_wav_upload_reports_duration() {
        let bytes = wav_bytes(1.0, 44100);
        let probed = AudioProbe::probe(&bytes, "track.wav").unwrap();

        assert_eq!(probed.extension, "wav");
        let duration = probed.duration.unwrap();
        assert!((duration - 1.0).abs() < 0.01, "duration was {duration}");
    }

    #[test]
    fn test_extension_case_is_ignored() {
        let bytes = wav_bytes(0.25, 8000);
        let probed = AudioProbe::probe(&bytes, "TRACK.WAV").unwrap();
        assert_eq!(probed.extension, "wav");
    }

    #[test]
    fn test_garbage_wav_bytes_rejected() {
        let error = AudioProbe::probe(&[0u8; 64], "broken.wav").unwrap_err();
        assert!(matches!(
            error,
            MorphError::Audio(AudioError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_garbage_mp3_bytes_rejected() {
        let error = AudioProbe::probe(&[0u8; 64], "broken.mp3").unwrap_err();
        assert!(matches!(
            error,
            MorphError::Audio(AudioError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let error = AudioProbe::probe(&[0u8; 64], "mystery.xyz").unwrap_err();
        match error {
            MorphError::Audio(AudioError::UnsupportedFormat { detail }) => {
                assert!(detail.contains("xyz"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
