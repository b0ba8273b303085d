//! Barcode Scan 共通ライブラリ
//!
//! セッション本体・CLI・UI フロントエンドで共有する型

pub mod types;
pub mod symbol;

pub use types::{BoundingBox, Detection, same_detection};
pub use symbol::SymbolType;
