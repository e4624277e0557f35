use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Represents a single video frame
///
/// This is a simple wrapper around an RGB image buffer that provides
/// convenient methods for pixel access used by the interpolator.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    /// Get the width of the frame
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Get the height of the frame
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let pixel = self.buffer.get_pixel(x, y);
        [pixel[0], pixel[1], pixel[2]]
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Consume the frame, returning the underlying image buffer
    pub fn into_image(self) -> RgbImage {
        self.buffer
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

/// Video encoding parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoParams {
    /// Video codec to use for output
    pub codec: String,

    /// Pixel format for the encoded stream
    pub pixel_format: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            quality: 85,
        }
    }
}

impl VideoParams {
    /// Map the 0-100 quality setting onto the encoder's CRF scale,
    /// where 0 is lossless and 51 is worst.
    pub fn crf(&self) -> u8 {
        let quality = self.quality.min(100) as u32;
        ((100 - quality) * 51 / 100) as u8
    }
}

/// An ordered run of equally-sized frames, first to last
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Create a sequence from frames already in playback order
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Get all frames in playback order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get the total number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Dimensions of the first frame, which every other frame must match
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| (f.width(), f.height()))
    }

    /// Get frames as an iterator
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }
}

/// Whether a finished video carries a soundtrack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioTrack {
    /// No audio stream in the container
    Silent,
    /// An AAC soundtrack was muxed in
    Composed,
}

impl AudioTrack {
    pub fn is_silent(&self) -> bool {
        matches!(self, AudioTrack::Silent)
    }
}

impl std::fmt::Display for AudioTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioTrack::Silent => write!(f, "silent"),
            AudioTrack::Composed => write!(f, "composed"),
        }
    }
}

/// A finished video file with its metadata
#[derive(Debug, Clone)]
pub struct VideoAsset {
    /// Path to the video file
    pub path: PathBuf,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Frame rate
    pub fps: u32,

    /// Number of frames in the stream
    pub frame_count: u32,

    /// Soundtrack state of the container
    pub audio: AudioTrack,
}

impl VideoAsset {
    /// Playback duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        self.frame_count as f64 / self.fps as f64
    }
}
