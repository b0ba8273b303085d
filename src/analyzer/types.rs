use barcode_scan_common::Detection;
use serde::{Deserialize, Serialize};

/// Outcome of scanning one gallery image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub file_name: String,

    #[serde(default)]
    pub file_path: String,

    #[serde(default)]
    pub detection: Option<Detection>,

    /// "URL", "Text", ... for readers that do not want the enum
    #[serde(default)]
    pub symbol_label: String,

    /// Transient message the session ended with (not found, decode failure)
    #[serde(default)]
    pub message: Option<String>,
}

impl ScanRecord {
    pub fn is_found(&self) -> bool {
        self.detection.is_some()
    }
}
