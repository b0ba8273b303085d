//! Detection session state machine
//!
//! Folds live-frame results, gallery decode outcomes and user intents into a
//! single `SessionState`. Synchronous and single-owner: `SessionHandle` is the
//! serialization point that drives it from async contexts.
//!
//! Gallery decodes are tracked by generation. Every confirm hands out a
//! `DecodeTicket`; anything that leaves gallery mode bumps the generation so a
//! completion arriving afterwards is discarded instead of applied.

use barcode_scan_common::{same_detection, Detection};
use tracing::{debug, info, warn};

use super::messages;
use super::state::{ImageRef, SessionState};
use crate::error::{DecodeError, TorchError};

/// Proof that a gallery decode was started for `image`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeTicket {
    generation: u64,
    image: ImageRef,
}

impl DecodeTicket {
    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct DetectionSession {
    state: SessionState,
    generation: u64,
    pending: Option<u64>,
}

impl DetectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether a gallery decode is outstanding.
    pub fn has_pending_decode(&self) -> bool {
        self.pending.is_some()
    }

    pub fn on_live_frame_result(&mut self, detections: Option<&[Detection]>) {
        if self.state.is_gallery_mode() {
            return;
        }

        let selected = detections
            .unwrap_or_default()
            .iter()
            .find(|d| d.has_payload());

        if same_detection(self.state.current_detection.as_ref(), selected) {
            return;
        }

        match selected {
            Some(d) => debug!("live frame detected: {:?}", d.raw_value),
            None => debug!("live frame: barcode disappeared"),
        }
        self.state.current_detection = selected.cloned();
        if self.state.current_detection.is_none() {
            self.state.result_dialog_visible = false;
        }
    }

    pub fn on_gallery_image_selected(&mut self, image: Option<ImageRef>) {
        let Some(image) = image else {
            warn!("gallery pick returned no image");
            self.state.error_message = Some(messages::GALLERY_PICK_FAILED.to_string());
            return;
        };

        info!("gallery image selected: {}", image);
        self.invalidate_pending();
        self.state.selected_image = Some(image);
        self.state.current_detection = None;
        self.state.result_dialog_visible = false;
        self.state.loading = false;
        self.state.error_message = None;
    }

    /// Start decoding the selected image. Returns `None` when nothing was started.
    pub fn confirm_gallery_image(&mut self) -> Option<DecodeTicket> {
        if self.state.loading {
            debug!("gallery decode already in flight, ignoring confirm");
            return None;
        }
        let Some(image) = self.state.selected_image.clone() else {
            self.state.error_message = Some(messages::NO_IMAGE_SELECTED.to_string());
            return None;
        };

        self.generation += 1;
        self.pending = Some(self.generation);
        self.state.loading = true;
        self.state.error_message = None;
        info!("gallery decode started: {} (generation {})", image, self.generation);

        Some(DecodeTicket {
            generation: self.generation,
            image,
        })
    }

    /// Apply a decode outcome. Returns `false` if the ticket was stale and the outcome discarded.
    pub fn complete_gallery_decode(
        &mut self,
        ticket: &DecodeTicket,
        outcome: Result<Vec<Detection>, DecodeError>,
    ) -> bool {
        if self.pending != Some(ticket.generation) {
            debug!(
                "discarding stale decode completion (generation {})",
                ticket.generation
            );
            return false;
        }
        self.pending = None;
        self.state.loading = false;

        match outcome {
            Ok(detections) => {
                let found = detections.into_iter().find(|d| d.has_payload());
                info!(
                    "gallery decode finished: {}",
                    found
                        .as_ref()
                        .and_then(|d| d.raw_value.as_deref())
                        .unwrap_or("<none>")
                );
                self.state.result_dialog_visible = found.is_some();
                self.state.error_message = match found {
                    Some(_) => None,
                    None => Some(messages::NO_BARCODE_FOUND.to_string()),
                };
                self.state.current_detection = found;
            }
            Err(e) => {
                warn!("gallery decode failed: {}", e);
                self.state.error_message = Some(messages::image_processing_failed(&e));
                self.state.selected_image = None;
                self.state.current_detection = None;
                self.state.result_dialog_visible = false;
            }
        }
        true
    }

    pub fn cancel_gallery_image_selection(&mut self) {
        self.invalidate_pending();
        self.state.selected_image = None;
        self.state.current_detection = None;
        self.state.result_dialog_visible = false;
        self.state.loading = false;
        self.state.error_message = None;
    }

    pub fn dismiss_result_dialog(&mut self) {
        self.state.result_dialog_visible = false;
        if self.state.selected_image.is_some() {
            self.invalidate_pending();
            self.state.selected_image = None;
            self.state.current_detection = None;
            self.state.loading = false;
        }
    }

    /// Torch state to request for a toggle.
    pub fn flash_toggle_target(&self) -> bool {
        !self.state.flash_enabled
    }

    pub fn on_flash_result(&mut self, target: bool, result: Result<(), TorchError>) {
        match result {
            Ok(()) => {
                info!("flash toggled: {}", target);
                self.state.flash_enabled = target;
                self.state.error_message = None;
            }
            Err(e) => {
                warn!("failed to toggle flash: {}", e);
                self.state.error_message = Some(messages::FLASH_FAILED.to_string());
            }
        }
    }

    pub fn set_transient_message(&mut self, text: impl Into<String>) {
        self.state.error_message = Some(text.into());
    }

    pub fn clear_transient_message(&mut self) {
        self.state.error_message = None;
    }

    /// Replace the sticky analyzer error; `None` clears it.
    pub fn report_analyzer_error(&mut self, error: Option<String>) {
        if let Some(e) = &error {
            warn!("analyzer error: {}", e);
        }
        self.state.analyzer_error = error;
    }

    /// Drop any outstanding decode, e.g. when the screen is torn down.
    pub fn detach(&mut self) {
        self.invalidate_pending();
        self.state.loading = false;
    }

    fn invalidate_pending(&mut self) {
        if self.pending.take().is_some() {
            self.generation += 1;
        }
    }
}
