use image::{imageops, imageops::FilterType, RgbImage};
use tracing::debug;

use crate::error::{ImageError, Result};

/// Decodes the two source images and brings them to one shared size
///
/// Both inputs are converted to 8-bit RGB with no alpha channel so the
/// interpolator can blend raw buffers directly. Resizing uses Lanczos3 to
/// keep aliasing artifacts out of the blended frames.
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Decode both byte streams and resize them to the target size.
    ///
    /// When no explicit target size is given, the decoded size of the first
    /// image is used for both.
    pub fn normalize(
        &self,
        first: &[u8],
        second: &[u8],
        target_size: Option<(u32, u32)>,
    ) -> Result<(RgbImage, RgbImage)> {
        if let Some((width, height)) = target_size {
            if width == 0 || height == 0 {
                return Err(ImageError::InvalidSize { width, height }.into());
            }
        }

        let first = Self::decode_rgb(first, "first")?;
        let second = Self::decode_rgb(second, "second")?;

        let (width, height) = target_size.unwrap_or((first.width(), first.height()));
        debug!(width, height, "normalizing source images");

        Ok((
            Self::fit(first, width, height),
            Self::fit(second, width, height),
        ))
    }

    fn decode_rgb(bytes: &[u8], which: &'static str) -> Result<RgbImage> {
        let decoded = image::load_from_memory(bytes).map_err(|e| ImageError::DecodeFailed {
            which,
            reason: e.to_string(),
        })?;

        let rgb = match decoded {
            image::DynamicImage::ImageRgb8(img) => img,
            other => other.to_rgb8(),
        };

        Ok(rgb)
    }

    fn fit(image: RgbImage, width: u32, height: u32) -> RgbImage {
        if image.width() == width && image.height() == height {
            return image;
        }
        imageops::resize(&image, width, height, FilterType::Lanczos3)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
