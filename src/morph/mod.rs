//! # Morph Module
//!
//! Turns two still images into the ordered crossfade frames that become the
//! output video: normalization to a shared size, then per-pixel blending.

pub mod interpolator;
pub mod normalizer;

pub use interpolator::Interpolator;
pub use normalizer::Normalizer;
