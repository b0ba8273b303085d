use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Failure of a one-shot image decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("cannot open image {path}: {reason}")]
    ImageLoad { path: String, reason: String },

    #[error("decoder failed: {0}")]
    Decoder(String),

    #[error("decode timed out after {0}s")]
    Timeout(u64),
}

/// Failure of the continuous frame detector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    /// The capability itself is unusable; the session enters a degraded mode.
    #[error("barcode detector unavailable: {0}")]
    Unavailable(String),

    /// A single frame could not be analyzed.
    #[error("frame rejected: {0}")]
    Frame(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TorchError {
    #[error("torch is not supported on this device")]
    Unsupported,

    #[error("torch request failed: {0}")]
    Hardware(String),
}
