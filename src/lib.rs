//! barcode-scan
//!
//! Detection session for a barcode/QR scanner: folds live camera-frame results
//! and one-shot gallery decodes into a single UI-facing state.

pub mod analyzer;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod decoder;
pub mod error;
pub mod scanner;
pub mod session;
pub mod torch;

pub use barcode_scan_common::{BoundingBox, Detection, SymbolType};
