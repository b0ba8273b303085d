//! セッションが利用する外部機能
//!
//! カメラ接続と推論はこのトレイトの向こう側。セッションは結果と失敗だけを受け取る。

use async_trait::async_trait;
use barcode_scan_common::Detection;

use crate::error::{DecodeError, DetectorError, TorchError};
use crate::session::ImageRef;

/// 8-bit luminance frame, row-major, `stride` bytes per row.
#[derive(Debug, Clone)]
pub struct GrayFrame {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub data: Vec<u8>,
}

impl GrayFrame {
    /// Tightly packed frame (`stride == width`).
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width,
            data,
        }
    }

    pub fn with_stride(width: u32, height: u32, stride: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride,
            data,
        }
    }

    /// Buffer holds at least `stride * height` bytes and `stride >= width`.
    pub fn is_well_formed(&self) -> bool {
        self.stride >= self.width && self.data.len() >= (self.stride as usize) * (self.height as usize)
    }

    /// Luminance at (x, y); caller keeps coordinates in range.
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize) * (self.stride as usize) + x as usize]
    }
}

/// Continuous detector run against live preview frames.
#[async_trait]
pub trait FrameDetector: Send + Sync {
    async fn detect(&self, frame: &GrayFrame) -> Result<Vec<Detection>, DetectorError>;
}

/// One-shot decoder for a picked gallery image.
#[async_trait]
pub trait ImageDecoder: Send + Sync {
    async fn decode(&self, image: &ImageRef) -> Result<Vec<Detection>, DecodeError>;
}

/// Flashlight control; resolves only once the hardware confirmed the new state.
#[async_trait]
pub trait TorchController: Send + Sync {
    async fn enable_torch(&self, on: bool) -> Result<(), TorchError>;
}
