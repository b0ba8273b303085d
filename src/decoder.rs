//! rqrr による QR デコーダ
//!
//! ライブの `FrameDetector` とギャラリーの `ImageDecoder` を兼ねる。
//! デコードは CPU バウンドなので blocking プールで実行する。

use std::path::Path;

use async_trait::async_trait;
use barcode_scan_common::{BoundingBox, Detection};
use image::imageops::FilterType;
use tracing::debug;

use crate::collaborators::{FrameDetector, GrayFrame, ImageDecoder};
use crate::error::{DecodeError, DetectorError};
use crate::session::ImageRef;

/// Smallest accepted `max_image_size`; below this QR modules blur away.
pub const MIN_IMAGE_SIZE: u32 = 64;

#[derive(Debug, Clone, Copy)]
pub struct QrDecoder {
    /// Gallery images larger than this (longest side, px) are downscaled first.
    max_image_size: u32,
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new(2048)
    }
}

impl QrDecoder {
    pub fn new(max_image_size: u32) -> Self {
        Self {
            max_image_size: max_image_size.max(MIN_IMAGE_SIZE),
        }
    }

    /// Decode all QR grids in a luminance buffer. Grids that fail to decode are skipped.
    pub fn decode_luma<F>(width: usize, height: usize, luma: F) -> Vec<Detection>
    where
        F: FnMut(usize, usize) -> u8,
    {
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, luma);
        let grids = prepared.detect_grids();
        debug!("found {} candidate QR grid(s)", grids.len());

        grids
            .into_iter()
            .filter_map(|grid| {
                let bbox = BoundingBox::enclosing(grid.bounds.iter().map(|p| (p.x, p.y)));
                match grid.decode() {
                    Ok((_, content)) => Some(Detection::from_payload(content, bbox)),
                    Err(e) => {
                        debug!("grid decode failed: {:?}", e);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn decode_frame(frame: &GrayFrame) -> Result<Vec<Detection>, DetectorError> {
        if !frame.is_well_formed() {
            return Err(DetectorError::Frame(format!(
                "{}x{} frame (stride {}) needs {} bytes, got {}",
                frame.width,
                frame.height,
                frame.stride,
                frame.stride as usize * frame.height as usize,
                frame.data.len()
            )));
        }
        Ok(Self::decode_luma(
            frame.width as usize,
            frame.height as usize,
            |x, y| frame.luma(x as u32, y as u32),
        ))
    }

    /// Load, downscale if needed, decode. Bounding boxes are in original image coordinates.
    pub fn decode_file(&self, path: &Path) -> Result<Vec<Detection>, DecodeError> {
        let img = image::open(path).map_err(|e| DecodeError::ImageLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let (orig_w, orig_h) = (img.width(), img.height());
        let longest = orig_w.max(orig_h);
        let img = if longest > self.max_image_size {
            debug!(
                "downscaling {}x{} to fit {}px",
                orig_w, orig_h, self.max_image_size
            );
            img.resize(self.max_image_size, self.max_image_size, FilterType::Triangle)
        } else {
            img
        };

        let luma = img.to_luma8();
        let scale = orig_w as f64 / luma.width().max(1) as f64;
        let detections = Self::decode_luma(luma.width() as usize, luma.height() as usize, |x, y| {
            luma.get_pixel(x as u32, y as u32)[0]
        });

        if (scale - 1.0).abs() < f64::EPSILON {
            return Ok(detections);
        }
        Ok(detections
            .into_iter()
            .map(|mut d| {
                d.bounding_box = d.bounding_box.map(|b| scale_box(b, scale));
                d
            })
            .collect())
    }
}

/// Read an image file as a tightly packed luminance frame.
pub fn load_frame(path: &Path) -> Result<GrayFrame, DecodeError> {
    let luma = image::open(path)
        .map_err(|e| DecodeError::ImageLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?
        .to_luma8();
    let (width, height) = luma.dimensions();
    Ok(GrayFrame::new(width, height, luma.into_raw()))
}

fn scale_box(b: BoundingBox, scale: f64) -> BoundingBox {
    let s = |v: i32| (v as f64 * scale).round() as i32;
    BoundingBox::new(s(b.left), s(b.top), s(b.right), s(b.bottom))
}

#[async_trait]
impl FrameDetector for QrDecoder {
    async fn detect(&self, frame: &GrayFrame) -> Result<Vec<Detection>, DetectorError> {
        let frame = frame.clone();
        tokio::task::spawn_blocking(move || Self::decode_frame(&frame))
            .await
            .map_err(|e| DetectorError::Frame(format!("detector task failed: {e}")))?
    }
}

#[async_trait]
impl ImageDecoder for QrDecoder {
    async fn decode(&self, image: &ImageRef) -> Result<Vec<Detection>, DecodeError> {
        let decoder = *self;
        let path = image.path().to_path_buf();
        tokio::task::spawn_blocking(move || decoder.decode_file(&path))
            .await
            .map_err(|e| DecodeError::Decoder(format!("decoder task failed: {e}")))?
    }
}
