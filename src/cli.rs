use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::session::messages;
use crate::{Detection, SymbolType};

/// `live` のフレームレート上限
pub const MAX_FPS: u32 = 1000;

#[derive(Parser, Debug)]
#[command(name = "barcode-scan")]
#[command(about = "Scan barcodes/QR codes from gallery images or a simulated live preview", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode one gallery image
    Decode {
        /// Image file
        #[arg(required = true)]
        image: PathBuf,

        /// Print the final session state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode every image in a folder and write the results as JSON
    Scan {
        /// Folder containing images
        #[arg(required = true)]
        folder: PathBuf,

        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Images decoded concurrently (default: from config)
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Include subfolders
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// Feed image files through the live analyzer as preview frames
    Live {
        /// Frames, in playback order
        #[arg(required = true)]
        frames: Vec<PathBuf>,

        /// Frames per second (1-1000)
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=MAX_FPS as i64))]
        fps: u32,

        /// Turn the torch on before streaming
        #[arg(long)]
        flash: bool,
    },

    /// Show or edit settings
    Config {
        /// Set the gallery decode timeout (seconds)
        #[arg(long)]
        set_decode_timeout: Option<u64>,

        /// Show settings
        #[arg(long)]
        show: bool,
    },
}

/// Interval between preview frames; never zero.
pub fn frame_period(fps: u32) -> Duration {
    let fps = fps.clamp(1, MAX_FPS);
    Duration::from_nanos(1_000_000_000 / u64::from(fps))
}

/// `Link:` 行の表示内容。URL 以外は `None`、開けない URL は失敗メッセージ。
pub fn link_line(detection: &Detection) -> Option<String> {
    if detection.symbol_type != SymbolType::Url {
        return None;
    }
    Some(match detection.link() {
        Some(url) => url.to_string(),
        None => messages::OPEN_LINK_FAILED.to_string(),
    })
}
