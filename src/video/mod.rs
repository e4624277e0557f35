//! # Video Module
//!
//! Serializes frame sequences into H.264/MP4 files and attaches
//! soundtracks, both through an external ffmpeg binary.

pub mod encoder;
pub mod muxer;
pub mod types;

pub use encoder::VideoEncoder;
pub use muxer::Muxer;
pub use types::{AudioTrack, Frame, FrameSequence, VideoAsset, VideoParams};
