//! バーコード検出セッション
//!
//! - state: UI が描画するスナップショット
//! - machine: 同期的な状態遷移
//! - handle: 外部機能のコールバックから machine を駆動する非同期の単一書き込み窓口

mod handle;
mod machine;
pub mod messages;
mod state;

pub use handle::{SessionHandle, WeakSession};
pub use machine::{DecodeTicket, DetectionSession};
pub use state::{ImageRef, SessionState};
