//! Transient messages surfaced through `SessionState::error_message`.

pub const GALLERY_PICK_FAILED: &str = "Failed to get image from gallery";
pub const NO_IMAGE_SELECTED: &str = "No image selected";
pub const NO_BARCODE_FOUND: &str = "No barcode found in image";
pub const CAMERA_NOT_READY: &str = "Camera not ready";
pub const FLASH_FAILED: &str = "Failed to control flash";
pub const COPIED_TO_CLIPBOARD: &str = "Copied to clipboard";
pub const OPEN_LINK_FAILED: &str = "Could not open link";

pub fn image_processing_failed(reason: impl std::fmt::Display) -> String {
    format!("Error processing image: {reason}")
}
