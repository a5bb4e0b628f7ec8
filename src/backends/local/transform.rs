// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Lanczos upscaling with alpha handling.
//!
//! [`transform`] is plain synchronous CPU work. [`TransformProvider`] wraps it
//! as a [`Provider`] that runs on the transform pool, which is how the
//! pipeline's second stage and the `transform` backend use it.

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::backends::local::CpuPool;
use crate::config::consts::{MAX_SCALE, MIN_SCALE};
use crate::errors::{ProviderError, TransformError};
use crate::traits::{Provider, ProviderOutput};

/// Result of one transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    /// PNG-encoded image
    pub bytes: Vec<u8>,
    pub original_dims: (u32, u32),
    pub new_dims: (u32, u32),
    /// Scale actually applied, after clamping
    pub scale: u32,
    /// Whether the output keeps an alpha channel
    pub has_alpha: bool,
}

/// Resize `bytes` by `scale` with a Lanczos3 filter and encode as PNG.
///
/// `scale` is clamped to the supported range. With `preserve_alpha` an RGBA
/// input stays RGBA; without it, transparent areas are flattened onto white
/// before resizing.
pub fn transform(bytes: &[u8], scale: u32, preserve_alpha: bool) -> Result<TransformOutput, TransformError> {
    let input = image::load_from_memory(bytes).map_err(|e| TransformError::InvalidImage(e.to_string()))?;

    let scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    let original_dims = (input.width(), input.height());
    let new_dims = (original_dims.0 * scale, original_dims.1 * scale);
    let input_has_alpha = input.color().has_alpha();

    let output = if input_has_alpha && preserve_alpha {
        DynamicImage::ImageRgba8(resize(input.to_rgba8(), new_dims))
    } else if input_has_alpha {
        DynamicImage::ImageRgb8(resize(flatten_onto_white(&input.to_rgba8()), new_dims))
    } else {
        DynamicImage::ImageRgb8(resize(input.to_rgb8(), new_dims))
    };

    let mut encoded = Cursor::new(Vec::new());
    output
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(|e| TransformError::Encode(e.to_string()))?;

    Ok(TransformOutput {
        bytes: encoded.into_inner(),
        original_dims,
        new_dims,
        scale,
        has_alpha: input_has_alpha && preserve_alpha,
    })
}

impl From<TransformOutput> for ProviderOutput {
    fn from(output: TransformOutput) -> Self {
        let size = |(width, height): (u32, u32)| json!({ "width": width, "height": height });
        ProviderOutput::from(output.bytes)
            .with_metadata("original_size", size(output.original_dims))
            .with_metadata("upscaled_size", size(output.new_dims))
            .with_metadata("scale_factor", json!(output.scale))
            .with_metadata("has_alpha", json!(output.has_alpha))
    }
}

fn resize<P>(buffer: image::ImageBuffer<P, Vec<u8>>, (width, height): (u32, u32)) -> image::ImageBuffer<P, Vec<u8>>
where
    P: image::Pixel<Subpixel = u8> + 'static,
{
    if buffer.dimensions() == (width, height) {
        return buffer;
    }
    imageops::resize(&buffer, width, height, FilterType::Lanczos3)
}

/// Composite onto opaque white using alpha as the mask.
fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Transform exposed as a provider. The payload is the input image.
pub struct TransformProvider {
    scale: u32,
    preserve_alpha: bool,
    pool: CpuPool,
}

impl TransformProvider {
    pub fn new(scale: u32, preserve_alpha: bool, pool: CpuPool) -> Self {
        Self {
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
            preserve_alpha,
            pool,
        }
    }
}

#[async_trait]
impl Provider for TransformProvider {
    async fn process(&self, payload: Arc<[u8]>, cancel: CancellationToken) -> Result<Vec<u8>, ProviderError> {
        Ok(self.process_detailed(payload, cancel).await?.bytes)
    }

    async fn process_detailed(
        &self,
        payload: Arc<[u8]>,
        cancel: CancellationToken,
    ) -> Result<ProviderOutput, ProviderError> {
        let (scale, preserve_alpha) = (self.scale, self.preserve_alpha);
        let output = self
            .pool
            .run(&cancel, move || transform(&payload, scale, preserve_alpha))
            .await??;
        Ok(output.into())
    }

    fn name(&self) -> &'static str {
        "lanczos_transform"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{GenericImageView, Rgba};

    /// In-memory PNG of the given size and fill.
    pub(crate) fn png(width: u32, height: u32, fill: Rgba<u8>) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, fill);
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn rgb_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_scale_four_multiplies_dimensions() {
        let output = transform(&png(3, 5, Rgba([200, 0, 0, 255])), 4, true).unwrap();
        assert_eq!(output.original_dims, (3, 5));
        assert_eq!(output.new_dims, (12, 20));

        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (12, 20));
    }

    #[test]
    fn test_scale_is_clamped_not_rejected() {
        let input = png(2, 2, Rgba([0, 0, 0, 255]));
        assert_eq!(transform(&input, 0, true).unwrap().new_dims, (2, 2));
        let clamped = transform(&input, 50, true).unwrap();
        assert_eq!(clamped.new_dims, (16, 16));
        assert_eq!(clamped.scale, MAX_SCALE);
    }

    #[test]
    fn test_unit_scale_keeps_rgba_dims_and_alpha() {
        let output = transform(&png(7, 3, Rgba([10, 20, 30, 90])), 1, true).unwrap();
        assert_eq!(output.original_dims, (7, 3));
        assert_eq!(output.new_dims, (7, 3));
        assert_eq!(output.scale, 1);
        assert!(output.has_alpha);

        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (7, 3));
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn test_alpha_is_preserved_when_requested() {
        let output = transform(&png(4, 4, Rgba([0, 128, 0, 64])), 2, true).unwrap();
        assert!(output.has_alpha);
        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn test_transparent_pixels_become_white_without_alpha() {
        let output = transform(&png(4, 4, Rgba([0, 0, 0, 0])), 1, false).unwrap();
        assert!(!output.has_alpha);

        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert!(!decoded.color().has_alpha());
        let rgb = decoded.to_rgb8();
        assert!(rgb.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_flattened_then_resized_stays_white() {
        let output = transform(&png(4, 4, Rgba([0, 0, 0, 0])), 2, false).unwrap();
        let rgb = image::load_from_memory(&output.bytes).unwrap().to_rgb8();
        assert!(rgb.pixels().all(|p| p.0.iter().all(|&c| c >= 254)));
    }

    #[test]
    fn test_half_transparent_black_blends_to_grey() {
        let rgb = flatten_onto_white(&RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128])));
        assert_eq!(rgb.get_pixel(0, 0).0, [127, 127, 127]);
    }

    #[test]
    fn test_opaque_input_has_no_alpha() {
        let output = transform(&rgb_png(2, 3), 2, true).unwrap();
        assert!(!output.has_alpha);
        assert_eq!(output.new_dims, (4, 6));
    }

    #[test]
    fn test_invalid_image_is_rejected() {
        let err = transform(b"definitely not an image", 2, true).unwrap_err();
        assert!(matches!(err, TransformError::InvalidImage(_)));
    }

    #[tokio::test]
    async fn test_provider_runs_on_pool() {
        let provider = TransformProvider::new(2, true, CpuPool::new("transform", 1));
        let payload: Arc<[u8]> = png(2, 2, Rgba([1, 2, 3, 255])).into();
        let bytes = provider.process(payload, CancellationToken::new()).await.unwrap();
        assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), (4, 4));
    }

    #[tokio::test]
    async fn test_provider_reports_transform_details() {
        let provider = TransformProvider::new(3, true, CpuPool::new("transform", 1));
        let payload: Arc<[u8]> = png(2, 1, Rgba([1, 2, 3, 100])).into();
        let output = provider
            .process_detailed(payload, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.metadata["original_size"], json!({ "width": 2, "height": 1 }));
        assert_eq!(output.metadata["upscaled_size"], json!({ "width": 6, "height": 3 }));
        assert_eq!(output.metadata["scale_factor"], 3);
        assert_eq!(output.metadata["has_alpha"], true);
    }

    #[tokio::test]
    async fn test_provider_reports_invalid_image_as_failure() {
        let provider = TransformProvider::new(2, true, CpuPool::new("transform", 1));
        let err = provider
            .process(Arc::from(&b"nope"[..]), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Failed(_)));
    }
}
