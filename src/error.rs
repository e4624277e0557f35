use thiserror::Error;

/// Main error type for the photomorph library
#[derive(Error, Debug)]
pub enum MorphError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    #[error("Video encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Mux error: {0}")]
    Mux(#[from] MuxError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameter errors caught before any stage runs. Always fatal.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Both images are required; {which} image is missing")]
    MissingImage { which: &'static str },

    #[error("Frame count {value} is outside the allowed range {min}..={max}")]
    FrameCountOutOfRange { value: u32, min: u32, max: u32 },

    #[error("FPS {value} is outside the allowed range {min}..={max}")]
    FpsOutOfRange { value: u32, min: u32, max: u32 },

    #[error("Output dimension {value} is outside the allowed range {min}..={max}")]
    SizeOutOfRange { value: u32, min: u32, max: u32 },

    #[error("Input frames have mismatched dimensions: {a_width}x{a_height} vs {b_width}x{b_height}")]
    FrameSizeMismatch {
        a_width: u32,
        a_height: u32,
        b_width: u32,
        b_height: u32,
    },
}

/// Image decode/normalization errors. Fatal: no video can exist without both inputs.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to decode {which} image: {reason}")]
    DecodeFailed { which: &'static str, reason: String },

    #[error("Invalid target size {width}x{height}: dimensions must be positive")]
    InvalidSize { width: u32, height: u32 },
}

/// Silent-video encoding errors. Fatal: without the silent asset the job has nothing to deliver.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Video encoder unavailable: {reason}")]
    EncoderUnavailable { reason: String },

    #[error("Frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        index: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("Video encoding failed: {reason}")]
    EncoderFailed { reason: String },

    #[error("Frame write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio acquisition errors. Recoverable: the orchestrator downgrades these to a silent result.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Remote audio fetch failed: {reason}")]
    RemoteFetchFailed { reason: String },

    #[error("Unsupported audio format: {detail}")]
    UnsupportedFormat { detail: String },

    #[error("Audio conversion failed: {reason}")]
    ConversionFailed { reason: String },

    #[error("Audio IO failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio-video combination errors. Recoverable: the silent asset is already on disk.
#[derive(Error, Debug)]
pub enum MuxError {
    #[error("Muxing failed: {reason}")]
    MuxFailed { reason: String },

    #[error("Mux IO failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using MorphError
pub type Result<T> = std::result::Result<T, MorphError>;

impl MorphError {
    /// Check if this error belongs to the audio path and may be downgraded
    /// to a silent result instead of failing the whole job.
    pub fn is_audio_recoverable(&self) -> bool {
        matches!(self, Self::Audio(_) | Self::Mux(_))
    }

    /// Get a user-friendly message, used verbatim as the downgrade warning.
    pub fn user_message(&self) -> String {
        match self {
            Self::Audio(AudioError::RemoteFetchFailed { reason }) => {
                format!("Could not fetch the remote audio track ({reason}); delivering the video without sound.")
            }
            Self::Audio(AudioError::UnsupportedFormat { detail }) => {
                format!("The audio source could not be used ({detail}); delivering the video without sound.")
            }
            Self::Audio(AudioError::ConversionFailed { reason }) => {
                format!("Audio conversion failed ({reason}); delivering the video without sound.")
            }
            Self::Mux(MuxError::MuxFailed { reason }) => {
                format!("Could not attach the audio track ({reason}); delivering the video without sound.")
            }
            Self::Encoding(EncodingError::EncoderUnavailable { reason }) => {
                format!("Video encoding is not available on this host: {reason}")
            }
            _ => self.to_string(),
        }
    }
}
