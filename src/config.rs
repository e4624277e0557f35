use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::video::VideoParams;

/// Main configuration for the photomorph pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Video encoding settings
    pub video: VideoConfig,

    /// Audio subsystem settings
    pub audio: AudioConfig,

    /// Parameter bounds enforced during job validation
    pub limits: LimitsConfig,

    /// External tool invocation settings
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video: VideoConfig::default(),
            audio: AudioConfig::default(),
            limits: LimitsConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string(),
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.video.validate()?;
        self.limits.validate()?;
        self.tools.validate()?;
        Ok(())
    }
}

/// Video encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Encoder parameters (codec, pixel format, quality)
    pub params: VideoParams,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            params: VideoParams::default(),
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.params.codec.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "video.params.codec".to_string(),
                value: "<empty>".to_string(),
            }
            .into());
        }

        if self.params.quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "video.params.quality".to_string(),
                value: self.params.quality.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Audio subsystem configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Master switch for the audio subsystem. When false, any requested
    /// audio source fails closed and the job falls back to a silent video.
    pub enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Bounds applied to job parameters before the pipeline starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Minimum number of morph frames
    pub min_frame_count: u32,

    /// Maximum number of morph frames
    pub max_frame_count: u32,

    /// Minimum frames per second
    pub min_fps: u32,

    /// Maximum frames per second
    pub max_fps: u32,

    /// Minimum explicit output dimension (width or height)
    pub min_dimension: u32,

    /// Maximum explicit output dimension (width or height)
    pub max_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_frame_count: 2,
            max_frame_count: 600,
            min_fps: 5,
            max_fps: 60,
            min_dimension: 64,
            max_dimension: 4000,
        }
    }
}

impl LimitsConfig {
    fn validate(&self) -> Result<()> {
        if self.min_frame_count < 2 || self.min_frame_count > self.max_frame_count {
            return Err(ConfigError::InvalidValue {
                key: "limits.frame_count_range".to_string(),
                value: format!("{}-{}", self.min_frame_count, self.max_frame_count),
            }
            .into());
        }

        if self.min_fps == 0 || self.min_fps > self.max_fps {
            return Err(ConfigError::InvalidValue {
                key: "limits.fps_range".to_string(),
                value: format!("{}-{}", self.min_fps, self.max_fps),
            }
            .into());
        }

        if self.min_dimension == 0 || self.min_dimension > self.max_dimension {
            return Err(ConfigError::InvalidValue {
                key: "limits.dimension_range".to_string(),
                value: format!("{}-{}", self.min_dimension, self.max_dimension),
            }
            .into());
        }

        Ok(())
    }
}

/// External tool configuration
///
/// Tool names are resolved through PATH; tests point them at stub
/// executables to exercise the pipeline without real encoders installed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// ffmpeg binary used for encoding, conversion and muxing
    pub ffmpeg: String,

    /// yt-dlp binary used to resolve and download remote audio streams
    pub ytdlp: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ytdlp: "yt-dlp".to_string(),
        }
    }
}

impl ToolsConfig {
    fn validate(&self) -> Result<()> {
        if self.ffmpeg.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "tools.ffmpeg".to_string(),
                value: "<empty>".to_string(),
            }
            .into());
        }

        if self.ytdlp.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "tools.ytdlp".to_string(),
                value: "<empty>".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let original_config = Config::default();

        // Save and load
        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(
            original_config.limits.max_frame_count,
            loaded_config.limits.max_frame_count
        );
        assert_eq!(
            original_config.video.params.codec,
            loaded_config.video.params.codec
        );
        assert_eq!(original_config.tools.ffmpeg, loaded_config.tools.ffmpeg);
    }

    #[test]
    fn test_invalid_frame_count_range() {
        let mut config = Config::default();
        config.limits.min_frame_count = 500;
        config.limits.max_frame_count = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_fps_range() {
        let mut config = Config::default();
        config.limits.min_fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_tool_name_rejected() {
        let mut config = Config::default();
        config.tools.ffmpeg = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::from_file("definitely/not/a/real/config.toml");
        assert!(result.is_err());
    }
}
