//! Image normalization before the model call.

use image::codecs::jpeg::JpegEncoder;
use image::{GenericImageView, ImageFormat};
use tracing::debug;

use crate::error::{Result, RxError};
use crate::models::config::PreprocessConfig;

/// Image bytes ready to be sent to a vision model.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

/// Decodes, downsizes and re-encodes prescription images.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    enabled: bool,
    max_size: u32,
    jpeg_quality: u8,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }
}

impl ImagePreprocessor {
    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_size: config.max_image_size.max(1),
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }

    /// Pass images through untouched (format is still checked).
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set maximum image dimension.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.max_size = size.max(1);
        self
    }

    /// Prepare raw upload bytes for the model.
    ///
    /// When enabled the image is converted to RGB, shrunk so its longer side
    /// fits `max_size`, and re-encoded as JPEG. Otherwise the bytes are sent
    /// as-is provided the format is one the model accepts.
    pub fn prepare(&self, bytes: &[u8]) -> Result<PreparedImage> {
        if bytes.is_empty() {
            return Err(RxError::UnsupportedImage("image is empty".to_string()));
        }

        if !self.enabled {
            return self.passthrough(bytes);
        }

        let image = image::load_from_memory(bytes)?;
        let (orig_width, orig_height) = image.dimensions();
        debug!("Original image size: {}x{}", orig_width, orig_height);

        let (width, height) = self.calculate_resize_dimensions(orig_width, orig_height);
        let image = if (width, height) != (orig_width, orig_height) {
            debug!("Resizing image to {}x{}", width, height);
            image.resize_exact(width, height, image::imageops::FilterType::Lanczos3)
        } else {
            image
        };

        let rgb = image.to_rgb8();
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.jpeg_quality).encode_image(&rgb)?;

        Ok(PreparedImage {
            bytes: encoded,
            mime_type: "image/jpeg".to_string(),
            width,
            height,
        })
    }

    fn passthrough(&self, bytes: &[u8]) -> Result<PreparedImage> {
        let format = image::guess_format(bytes)
            .map_err(|_| RxError::UnsupportedImage("unrecognized image data".to_string()))?;

        let mime_type = match format {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            other => {
                return Err(RxError::UnsupportedImage(format!(
                    "{:?} images cannot be sent without preprocessing",
                    other
                )));
            }
        };

        let (width, height) = image::load_from_memory_with_format(bytes, format)?.dimensions();

        Ok(PreparedImage {
            bytes: bytes.to_vec(),
            mime_type: mime_type.to_string(),
            width,
            height,
        })
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max_dim = width.max(height);

        if max_dim <= self.max_size {
            return (width, height);
        }

        let scale = self.max_size as f64 / max_dim as f64;
        let new_width = (width as f64 * scale).round() as u32;
        let new_height = (height as f64 * scale).round() as u32;

        (new_width.clamp(1, self.max_size), new_height.clamp(1, self.max_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([240, 240, 240]));
        encode(DynamicImage::ImageRgb8(image), ImageFormat::Png)
    }

    #[test]
    fn test_resize_dimensions() {
        let preprocessor = ImagePreprocessor::default();

        assert_eq!(preprocessor.calculate_resize_dimensions(500, 300), (500, 300));
        assert_eq!(preprocessor.calculate_resize_dimensions(4096, 1024), (2048, 512));
        assert_eq!(preprocessor.calculate_resize_dimensions(1000, 3000), (683, 2048));
    }

    #[test]
    fn test_oversized_image_is_downscaled() {
        let preprocessor = ImagePreprocessor::default().with_max_size(64);
        let prepared = preprocessor.prepare(&png(256, 128)).unwrap();

        assert_eq!((prepared.width, prepared.height), (64, 32));
        assert_eq!(prepared.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 32));
    }

    #[test]
    fn test_alpha_is_dropped() {
        let image = RgbaImage::from_pixel(10, 10, Rgba([10, 20, 30, 128]));
        let bytes = encode(DynamicImage::ImageRgba8(image), ImageFormat::Png);

        let prepared = ImagePreprocessor::default().prepare(&bytes).unwrap();
        let decoded = image::load_from_memory(&prepared.bytes).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_passthrough_keeps_bytes() {
        let bytes = png(20, 10);
        let prepared = ImagePreprocessor::default()
            .with_enabled(false)
            .prepare(&bytes)
            .unwrap();

        assert_eq!(prepared.bytes, bytes);
        assert_eq!(prepared.mime_type, "image/png");
        assert_eq!((prepared.width, prepared.height), (20, 10));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let preprocessor = ImagePreprocessor::default();
        assert!(matches!(preprocessor.prepare(b""), Err(RxError::UnsupportedImage(_))));
        assert!(matches!(preprocessor.prepare(b"not an image"), Err(RxError::Image(_))));
        assert!(matches!(
            preprocessor.clone().with_enabled(false).prepare(b"not an image"),
            Err(RxError::UnsupportedImage(_))
        ));
    }
}
