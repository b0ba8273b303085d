use barcode_scan_common::{BoundingBox, Detection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque reference to a picked gallery image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Read-only snapshot rendered by the UI layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_detection: Option<Detection>,
    pub flash_enabled: bool,
    pub result_dialog_visible: bool,
    pub loading: bool,
    pub selected_image: Option<ImageRef>,
    /// One-shot; the UI clears it after showing it.
    pub error_message: Option<String>,
    /// Sticky until replaced.
    pub analyzer_error: Option<String>,
}

impl SessionState {
    pub fn detected_value(&self) -> Option<&str> {
        self.current_detection
            .as_ref()
            .and_then(|d| d.raw_value.as_deref())
    }

    pub fn detected_bounding_box(&self) -> Option<BoundingBox> {
        self.current_detection.as_ref().and_then(|d| d.bounding_box)
    }

    /// Live updates are suspended while a gallery image is selected or decoding.
    pub fn is_gallery_mode(&self) -> bool {
        self.selected_image.is_some() || self.loading
    }
}
