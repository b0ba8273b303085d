use crate::decoder::MIN_IMAGE_SIZE;
use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DECODE_TIMEOUT_ENV: &str = "BARCODE_SCAN_DECODE_TIMEOUT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound for one gallery decode; a slower decode becomes an error message.
    pub decode_timeout_seconds: u64,
    /// Longest side (px) a gallery image is decoded at.
    pub max_image_size: u32,
    /// Analyze every Nth live frame.
    pub scan_interval: u64,
    /// Frames buffered between the camera and the analyzer.
    pub frame_queue_capacity: usize,
    /// Images decoded concurrently by `scan`.
    pub default_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decode_timeout_seconds: 10,
            max_image_size: 2048,
            scan_interval: 1,
            frame_queue_capacity: 8,
            default_batch_size: 4,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ScanError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("barcode-scan").join("config.json"))
    }

    pub fn decode_timeout(&self) -> Duration {
        Duration::from_secs(self.decode_timeout_seconds)
    }

    pub fn set_decode_timeout(&mut self, seconds: u64) -> Result<()> {
        self.decode_timeout_seconds = seconds;
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.decode_timeout_seconds == 0 {
            return Err(ScanError::Config("decode_timeout_seconds は 1 以上を指定してください".into()));
        }
        if self.frame_queue_capacity == 0 {
            return Err(ScanError::Config("frame_queue_capacity は 1 以上を指定してください".into()));
        }
        if self.scan_interval == 0 {
            return Err(ScanError::Config("scan_interval は 1 以上を指定してください".into()));
        }
        if self.default_batch_size == 0 {
            return Err(ScanError::Config("default_batch_size は 1 以上を指定してください".into()));
        }
        if self.max_image_size < MIN_IMAGE_SIZE {
            return Err(ScanError::Config(format!(
                "max_image_size は {MIN_IMAGE_SIZE} 以上を指定してください"
            )));
        }
        Ok(())
    }

    // Environment wins over the file; unparsable values are ignored.
    fn apply_env(&mut self) {
        if let Some(secs) = std::env::var(DECODE_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&v| v > 0)
        {
            self.decode_timeout_seconds = secs;
        }
    }
}
