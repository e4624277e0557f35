use std::sync::atomic::{AtomicU32, Ordering};

use image::RgbImage;
use rayon::prelude::*;
use tracing::debug;

use crate::config::LimitsConfig;
use crate::error::{Result, ValidationError};
use crate::video::{Frame, FrameSequence};

/// Linear per-pixel blend of two equally-sized images
///
/// Alpha 0 returns the first image's values and alpha 1 the second's.
/// Channel values are rounded to the nearest integer and clamped to the
/// 8-bit range.
pub fn blend(a: &RgbImage, b: &RgbImage, alpha: f32) -> RgbImage {
    let mut out = a.clone();
    for (dst, src) in out.pixels_mut().zip(b.pixels()) {
        for channel in 0..3 {
            let blended = (1.0 - alpha) * dst.0[channel] as f32 + alpha * src.0[channel] as f32;
            dst.0[channel] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Produces the ordered crossfade frames between two normalized images
///
/// Frame `i` of `n` uses blend weight `i / (n - 1)`, so the first frame is
/// the first image unchanged and the last frame is the second image
/// unchanged. Frames are generated in parallel; the sequence order is
/// unaffected.
pub struct Interpolator {
    min_frames: u32,
    max_frames: u32,
}

impl Interpolator {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            min_frames: limits.min_frame_count,
            max_frames: limits.max_frame_count,
        }
    }

    /// Generate `frame_count` blended frames from `a` to `b`.
    ///
    /// `on_frame` is invoked once per completed frame with `(done, total)`.
    /// Frames complete on worker threads, so calls may arrive out of order;
    /// each `done` value is reported exactly once.
    pub fn interpolate<F>(
        &self,
        a: &RgbImage,
        b: &RgbImage,
        frame_count: u32,
        on_frame: F,
    ) -> Result<FrameSequence>
    where
        F: Fn(u32, u32) + Sync,
    {
        if frame_count < self.min_frames || frame_count > self.max_frames {
            return Err(ValidationError::FrameCountOutOfRange {
                value: frame_count,
                min: self.min_frames,
                max: self.max_frames,
            }
            .into());
        }

        if a.dimensions() != b.dimensions() {
            return Err(ValidationError::FrameSizeMismatch {
                a_width: a.width(),
                a_height: a.height(),
                b_width: b.width(),
                b_height: b.height(),
            }
            .into());
        }

        debug!(
            frame_count,
            width = a.width(),
            height = a.height(),
            "interpolating crossfade frames"
        );

        let last = frame_count - 1;
        let completed = AtomicU32::new(0);

        let frames: Vec<Frame> = (0..frame_count)
            .into_par_iter()
            .map(|i| {
                // Boundary frames are the inputs themselves, bit for bit.
                let frame = if i == 0 {
                    Frame::new(a.clone())
                } else if i == last {
                    Frame::new(b.clone())
                } else {
                    let alpha = i as f32 / last as f32;
                    Frame::new(blend(a, b, alpha))
                };

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                on_frame(done, frame_count);
                frame
            })
            .collect();

        Ok(FrameSequence::new(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MorphError;
    use image::ImageBuffer;
    use std::sync::Mutex;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        ImageBuffer::from_fn(width, height, |_, _| image::Rgb(color))
    }

    fn interpolator() -> Interpolator {
        Interpolator::new(&LimitsConfig::default())
    }

    #[test]
    fn test_sequence_has_exact_frame_count() {
        let a = solid(10, 10, [0, 0, 0]);
        let b = solid(10, 10, [255, 255, 255]);

        let sequence = interpolator().interpolate(&a, &b, 30, |_, _| {}).unwrap();
        assert_eq!(sequence.len(), 30);
    }

    #[test]
    fn test_boundary_frames_match_inputs_exactly() {
        let a = solid(6, 4, [10, 200, 30]);
        let b = solid(6, 4, [240, 5, 90]);

        let sequence = interpolator().interpolate(&a, &b, 30, |_, _| {}).unwrap();

        let first = sequence.frames().first().unwrap();
        let last = sequence.frames().last().unwrap();
        assert_eq!(first.as_image().as_raw(), a.as_raw());
        assert_eq!(last.as_image().as_raw(), b.as_raw());
    }

    #[test]
    fn test_two_frames_are_the_endpoints() {
        let a = solid(3, 3, [1, 2, 3]);
        let b = solid(3, 3, [200, 100, 50]);

        let sequence = interpolator().interpolate(&a, &b, 2, |_, _| {}).unwrap();

        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.frames()[0].as_image().as_raw(), a.as_raw());
        assert_eq!(sequence.frames()[1].as_image().as_raw(), b.as_raw());
    }

    #[test]
    fn test_midpoint_is_the_average() {
        let a = solid(4, 4, [0, 0, 0]);
        let b = solid(4, 4, [200, 100, 50]);

        let sequence = interpolator().interpolate(&a, &b, 3, |_, _| {}).unwrap();

        let middle = &sequence.frames()[1];
        assert_eq!(middle.get_pixel(2, 2), [100, 50, 25]);
    }

    #[test]
    fn test_blend_weight_increases_with_index() {
        let a = solid(2, 2, [0, 0, 0]);
        let b = solid(2, 2, [255, 255, 255]);

        let sequence = interpolator().interpolate(&a, &b, 11, |_, _| {}).unwrap();

        let values: Vec<u8> = sequence.iter().map(|f| f.get_pixel(0, 0)[0]).collect();
        for pair in values.windows(2) {
            assert!(pair[0] < pair[1], "expected strictly increasing: {values:?}");
        }
        assert_eq!(values[0], 0);
        assert_eq!(values[10], 255);
    }

    #[test]
    fn test_frame_count_below_minimum_rejected() {
        let a = solid(2, 2, [0, 0, 0]);
        let b = solid(2, 2, [255, 255, 255]);

        let error = interpolator().interpolate(&a, &b, 1, |_, _| {}).unwrap_err();
        assert!(matches!(
            error,
            MorphError::Validation(ValidationError::FrameCountOutOfRange { value: 1, .. })
        ));
    }

    #[test]
    fn test_frame_count_above_maximum_rejected() {
        let a = solid(2, 2, [0, 0, 0]);
        let b = solid(2, 2, [255, 255, 255]);

        let error = interpolator().interpolate(&a, &b, 601, |_, _| {}).unwrap_err();
        assert!(matches!(
            error,
            MorphError::Validation(ValidationError::FrameCountOutOfRange { value: 601, .. })
        ));
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let a = solid(4, 4, [0, 0, 0]);
        let b = solid(4, 5, [255, 255, 255]);

        let error = interpolator().interpolate(&a, &b, 10, |_, _| {}).unwrap_err();
        assert!(matches!(
            error,
            MorphError::Validation(ValidationError::FrameSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_every_frame_reports_progress_once() {
        let a = solid(4, 4, [0, 0, 0]);
        let b = solid(4, 4, [255, 255, 255]);

        let seen = Mutex::new(Vec::new());
        interpolator()
            .interpolate(&a, &b, 25, |done, total| {
                assert_eq!(total, 25);
                seen.lock().unwrap().push(done);
            })
            .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (1..=25).collect::<Vec<u32>>());
    }

    #[test]
    fn test_interpolation_is_deterministic() {
        let a = solid(8, 8, [13, 37, 42]);
        let b = solid(8, 8, [211, 98, 7]);

        let one = interpolator().interpolate(&a, &b, 15, |_, _| {}).unwrap();
        let two = interpolator().interpolate(&a, &b, 15, |_, _| {}).unwrap();

        for (x, y) in one.iter().zip(two.iter()) {
            assert_eq!(x.as_image().as_raw(), y.as_image().as_raw());
        }
    }
}
