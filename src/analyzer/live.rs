//! ライブプレビュー解析
//!
//! 有界チャネルからフレームを受け取り、`scan_interval` フレームごとに検出器を
//! 走らせて結果をセッションに反映する。

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::collaborators::{FrameDetector, GrayFrame};
use crate::error::DetectorError;
use crate::session::WeakSession;

pub struct LiveAnalyzer {
    detector: Arc<dyn FrameDetector>,
    scan_interval: u64,
}

impl LiveAnalyzer {
    /// `scan_interval` of 0 or 1 analyzes every frame.
    pub fn new(detector: Arc<dyn FrameDetector>, scan_interval: u64) -> Self {
        Self {
            detector,
            scan_interval: scan_interval.max(1),
        }
    }

    pub fn scan_interval(&self) -> u64 {
        self.scan_interval
    }

    /// Runs until the frame sender is dropped or the session goes away.
    pub async fn run(self, session: WeakSession, mut frames: mpsc::Receiver<GrayFrame>) {
        info!("live analyzer started (every {} frame(s))", self.scan_interval);
        let mut frame_count: u64 = 0;

        while let Some(frame) = frames.recv().await {
            frame_count += 1;
            if frame_count % self.scan_interval != 0 {
                continue;
            }

            let result = self.detector.detect(&frame).await;

            let Some(handle) = session.upgrade() else {
                break;
            };
            if handle.is_closed() {
                break;
            }

            match result {
                Ok(detections) => handle.on_live_frame_result(Some(&detections)),
                Err(DetectorError::Unavailable(reason)) => {
                    handle.report_analyzer_error(Some(reason));
                }
                Err(e @ DetectorError::Frame(_)) => {
                    debug!("frame {} skipped: {}", frame_count, e);
                }
            }
        }

        info!("live analyzer stopped after {} frame(s)", frame_count);
    }
}

impl std::fmt::Debug for LiveAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveAnalyzer")
            .field("scan_interval", &self.scan_interval)
            .finish_non_exhaustive()
    }
}
