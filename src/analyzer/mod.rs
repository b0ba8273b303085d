mod live;
mod types;

pub use live::LiveAnalyzer;
pub use types::ScanRecord;

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::collaborators::ImageDecoder;
use crate::scanner::ImageInfo;
use crate::session::{ImageRef, SessionHandle, SessionState};

/// Run one gallery image through a fresh session: select, confirm, wait for the result.
pub async fn scan_image(
    decoder: Arc<dyn ImageDecoder>,
    image: ImageRef,
    decode_timeout: Duration,
) -> SessionState {
    let session = SessionHandle::new(decoder, None, decode_timeout);
    session.on_gallery_image_selected(Some(image));
    session.confirm_gallery_image();
    let state = session.settled().await;
    session.close();
    state
}

/// Decode every image, `batch_size` sessions at a time. Output keeps input order.
pub async fn scan_images(
    images: &[ImageInfo],
    decoder: Arc<dyn ImageDecoder>,
    batch_size: usize,
    decode_timeout: Duration,
    show_progress: bool,
) -> Vec<ScanRecord> {
    let progress = if show_progress {
        let pb = ProgressBar::new(images.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut results = Vec::with_capacity(images.len());

    for (batch_idx, batch) in images.chunks(batch_size.max(1)).enumerate() {
        debug!("batch {}: {} image(s)", batch_idx + 1, batch.len());

        let mut set = JoinSet::new();
        for (idx, info) in batch.iter().enumerate() {
            let decoder = Arc::clone(&decoder);
            let image = ImageRef::new(&info.path);
            set.spawn(async move { (idx, scan_image(decoder, image, decode_timeout).await) });
        }

        let mut states: Vec<Option<SessionState>> = vec![None; batch.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, state)) => states[idx] = Some(state),
                Err(e) => warn!("scan task failed: {}", e),
            }
            progress.inc(1);
        }

        for (info, state) in batch.iter().zip(states) {
            results.push(to_record(info, state));
        }
    }

    progress.finish_and_clear();
    results
}

fn to_record(info: &ImageInfo, state: Option<SessionState>) -> ScanRecord {
    let mut record = ScanRecord {
        file_name: info.file_name.clone(),
        file_path: info.path.display().to_string(),
        ..Default::default()
    };

    match state {
        Some(state) => {
            record.symbol_label = state
                .current_detection
                .as_ref()
                .map(|d| d.symbol_type.display_name().to_string())
                .unwrap_or_default();
            record.detection = state.current_detection;
            record.message = state.error_message;
        }
        None => record.message = Some("scan task aborted".to_string()),
    }
    record
}
