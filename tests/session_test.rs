//! セッションハンドルテスト
//!
//! 偽の外部機能で `SessionHandle` を駆動し、状態遷移を端から端まで検証

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use barcode_scan::collaborators::{ImageDecoder, TorchController};
use barcode_scan::error::{DecodeError, TorchError};
use barcode_scan::session::{messages, ImageRef, SessionHandle, SessionState};
use barcode_scan::{BoundingBox, Detection, SymbolType};
use tokio::sync::Notify;

/// Decoder returning a preset outcome, optionally held until released.
struct FakeDecoder {
    outcome: Result<Vec<Detection>, DecodeError>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl FakeDecoder {
    fn new(outcome: Result<Vec<Detection>, DecodeError>) -> Self {
        Self {
            outcome,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn gated(outcome: Result<Vec<Detection>, DecodeError>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(outcome)
        }
    }
}

#[async_trait]
impl ImageDecoder for FakeDecoder {
    async fn decode(&self, _image: &ImageRef) -> Result<Vec<Detection>, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.outcome.clone()
    }
}

struct FakeTorch {
    fail: bool,
    requests: Mutex<Vec<bool>>,
}

impl FakeTorch {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TorchController for FakeTorch {
    async fn enable_torch(&self, on: bool) -> Result<(), TorchError> {
        self.requests.lock().unwrap().push(on);
        if self.fail {
            Err(TorchError::Hardware("busy".into()))
        } else {
            Ok(())
        }
    }
}

fn d1() -> Detection {
    Detection::from_payload("https://x", Some(BoundingBox::new(0, 0, 50, 50)))
}

fn session_with(decoder: FakeDecoder) -> SessionHandle {
    SessionHandle::new(Arc::new(decoder), None, Duration::from_secs(5))
}

/// Example walkthrough: live detection, disappearance, gallery decode, dismiss.
#[tokio::test]
async fn test_live_then_gallery_scenario() {
    let session = session_with(FakeDecoder::new(Ok(vec![Detection::from_payload("D1", None)])));

    session.on_live_frame_result(Some(&[d1()]));
    let state = session.snapshot();
    assert_eq!(state.current_detection, Some(d1()));
    assert_eq!(state.current_detection.as_ref().unwrap().symbol_type, SymbolType::Url);
    assert!(!state.result_dialog_visible);

    session.on_live_frame_result(Some(&[]));
    assert!(session.snapshot().current_detection.is_none());

    session.on_gallery_image_selected(Some(ImageRef::new("i1.png")));
    let state = session.snapshot();
    assert_eq!(state.selected_image, Some(ImageRef::new("i1.png")));
    assert!(state.current_detection.is_none());

    assert!(session.confirm_gallery_image());
    let state = session.settled().await;
    assert!(!state.loading);
    assert_eq!(state.detected_value(), Some("D1"));
    assert!(state.result_dialog_visible);

    session.dismiss_result_dialog();
    let state = session.snapshot();
    assert!(state.selected_image.is_none());
    assert!(state.current_detection.is_none());
    assert!(!state.result_dialog_visible);
}

/// loading goes false -> true -> false exactly once per decode
#[tokio::test]
async fn test_loading_transitions_once() {
    let gate = Arc::new(Notify::new());
    let session = session_with(FakeDecoder::gated(Ok(vec![]), Arc::clone(&gate)));
    let mut rx = session.subscribe();

    session.on_gallery_image_selected(Some(ImageRef::new("i1.png")));
    rx.borrow_and_update();

    assert!(session.confirm_gallery_image());
    assert!(rx.borrow_and_update().loading);

    // second confirm while loading is ignored
    assert!(!session.confirm_gallery_image());

    gate.notify_one();
    rx.changed().await.unwrap();
    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert!(state.current_detection.is_none());
    assert!(!state.result_dialog_visible);
    assert_eq!(state.error_message.as_deref(), Some(messages::NO_BARCODE_FOUND));
}

#[tokio::test]
async fn test_decode_failure_returns_to_live_mode() {
    let session = session_with(FakeDecoder::new(Err(DecodeError::Decoder("corrupt".into()))));

    session.on_gallery_image_selected(Some(ImageRef::new("bad.png")));
    session.confirm_gallery_image();
    let state = session.settled().await;

    assert!(!state.loading);
    assert!(state.selected_image.is_none());
    let message = state.error_message.unwrap();
    assert!(message.starts_with("Error processing image"));
    assert!(message.contains("corrupt"));

    // live updates resume
    session.on_live_frame_result(Some(&[d1()]));
    assert!(session.snapshot().current_detection.is_some());
}

#[tokio::test]
async fn test_decode_timeout_becomes_error() {
    let gate = Arc::new(Notify::new());
    let decoder = FakeDecoder::gated(Ok(vec![d1()]), gate);
    let session = SessionHandle::new(Arc::new(decoder), None, Duration::from_millis(50));

    session.on_gallery_image_selected(Some(ImageRef::new("slow.png")));
    session.confirm_gallery_image();
    let state = session.settled().await;

    assert!(!state.loading);
    assert!(state.selected_image.is_none());
    assert!(state.error_message.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_confirm_without_selection() {
    let decoder = Arc::new(FakeDecoder::new(Ok(vec![d1()])));
    let session = SessionHandle::new(decoder.clone(), None, Duration::from_secs(1));

    assert!(!session.confirm_gallery_image());
    let state = session.snapshot();
    assert_eq!(state.error_message.as_deref(), Some(messages::NO_IMAGE_SELECTED));
    assert!(!state.loading);
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_live_frames_ignored_while_loading() {
    let gate = Arc::new(Notify::new());
    let session = session_with(FakeDecoder::gated(Ok(vec![]), Arc::clone(&gate)));

    session.on_gallery_image_selected(Some(ImageRef::new("i1.png")));
    session.confirm_gallery_image();
    let before = session.snapshot();

    session.on_live_frame_result(Some(&[d1()]));
    session.on_live_frame_result(None);
    assert_eq!(session.snapshot(), before);

    gate.notify_one();
    session.settled().await;
}

#[tokio::test]
async fn test_gallery_pick_absent_only_sets_error() {
    let session = session_with(FakeDecoder::new(Ok(vec![])));
    session.on_live_frame_result(Some(&[d1()]));

    session.on_gallery_image_selected(None);
    let state = session.snapshot();
    assert_eq!(state.error_message.as_deref(), Some(messages::GALLERY_PICK_FAILED));
    assert_eq!(state.current_detection, Some(d1()));
    assert!(state.selected_image.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_cancel_discards_late_completion() {
    let gate = Arc::new(Notify::new());
    let session = session_with(FakeDecoder::gated(Ok(vec![d1()]), Arc::clone(&gate)));

    session.report_analyzer_error(Some("detector offline".into()));
    session.on_gallery_image_selected(Some(ImageRef::new("i1.png")));
    session.confirm_gallery_image();
    session.cancel_gallery_image_selection();

    let expected = SessionState {
        analyzer_error: Some("detector offline".into()),
        ..SessionState::default()
    };
    assert_eq!(session.snapshot(), expected);

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.snapshot(), expected);
}

#[tokio::test]
async fn test_close_discards_late_completion() {
    let gate = Arc::new(Notify::new());
    let session = session_with(FakeDecoder::gated(Ok(vec![d1()]), Arc::clone(&gate)));

    session.on_gallery_image_selected(Some(ImageRef::new("i1.png")));
    session.confirm_gallery_image();
    session.close();

    assert!(session.is_closed());
    assert!(!session.snapshot().loading);

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(session.snapshot().current_detection.is_none());

    // operations after close are ignored
    session.set_transient_message("ignored");
    assert!(session.snapshot().error_message.is_none());
}

#[tokio::test]
async fn test_dismiss_live_result_keeps_detection() {
    let session = session_with(FakeDecoder::new(Ok(vec![])));
    session.on_live_frame_result(Some(&[d1()]));
    session.dismiss_result_dialog();

    let state = session.snapshot();
    assert_eq!(state.current_detection, Some(d1()));
    assert!(!state.result_dialog_visible);
}

#[tokio::test]
async fn test_identical_frames_publish_once() {
    let session = session_with(FakeDecoder::new(Ok(vec![])));
    let mut rx = session.subscribe();

    session.on_live_frame_result(Some(&[d1()]));
    assert!(rx.has_changed().unwrap());
    let first = rx.borrow_and_update().clone();

    session.on_live_frame_result(Some(&[d1()]));
    assert!(!rx.has_changed().unwrap());
    assert_eq!(session.snapshot(), first);
}

#[tokio::test]
async fn test_toggle_flash_confirmed() {
    let torch = Arc::new(FakeTorch::new(false));
    let session = SessionHandle::new(
        Arc::new(FakeDecoder::new(Ok(vec![]))),
        Some(torch.clone()),
        Duration::from_secs(1),
    );

    session.toggle_flash().await;
    assert!(session.snapshot().flash_enabled);
    session.toggle_flash().await;
    assert!(!session.snapshot().flash_enabled);

    assert_eq!(*torch.requests.lock().unwrap(), vec![true, false]);
}

#[tokio::test]
async fn test_toggle_flash_failure_keeps_state() {
    let torch = Arc::new(FakeTorch::new(true));
    let session = SessionHandle::new(
        Arc::new(FakeDecoder::new(Ok(vec![]))),
        Some(torch),
        Duration::from_secs(1),
    );

    session.toggle_flash().await;
    let state = session.snapshot();
    assert!(!state.flash_enabled);
    assert_eq!(state.error_message.as_deref(), Some(messages::FLASH_FAILED));
}

#[tokio::test]
async fn test_toggle_flash_without_torch() {
    let session = session_with(FakeDecoder::new(Ok(vec![])));
    session.toggle_flash().await;

    let state = session.snapshot();
    assert!(!state.flash_enabled);
    assert_eq!(state.error_message.as_deref(), Some(messages::CAMERA_NOT_READY));
}

#[tokio::test]
async fn test_transient_message_cleared_by_caller() {
    let session = session_with(FakeDecoder::new(Ok(vec![])));
    session.set_transient_message(messages::COPIED_TO_CLIPBOARD);
    assert_eq!(session.snapshot().error_message.as_deref(), Some("Copied to clipboard"));

    session.clear_transient_message();
    assert!(session.snapshot().error_message.is_none());
}
