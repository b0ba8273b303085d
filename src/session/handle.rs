//! Async front for one screen activation.
//!
//! All mutations go through one `Mutex<Core>`; the lock is never held across
//! an await. Each change publishes a snapshot on a `watch` channel, so readers
//! never observe a half-applied transition. Spawned work (gallery decodes, the
//! live analyzer loop) only holds a `Weak` reference and is aborted on `close`
//! or when the last handle is dropped.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use barcode_scan_common::Detection;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info};

use super::machine::DetectionSession;
use super::messages;
use super::state::{ImageRef, SessionState};
use crate::analyzer::LiveAnalyzer;
use crate::collaborators::{GrayFrame, ImageDecoder, TorchController};
use crate::error::DecodeError;

struct Core {
    session: DetectionSession,
    closed: bool,
    tasks: Vec<AbortHandle>,
}

struct Inner {
    core: Mutex<Core>,
    state_tx: watch::Sender<SessionState>,
    decoder: Arc<dyn ImageDecoder>,
    torch: Option<Arc<dyn TorchController>>,
    decode_timeout: Duration,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let core = self.core.get_mut().unwrap_or_else(|e| e.into_inner());
        for task in core.tasks.drain(..) {
            task.abort();
        }
    }
}

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

/// Non-owning reference held by background tasks.
#[derive(Clone)]
pub struct WeakSession {
    inner: Weak<Inner>,
}

impl WeakSession {
    pub fn upgrade(&self) -> Option<SessionHandle> {
        self.inner.upgrade().map(|inner| SessionHandle { inner })
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("state", &*self.inner.state_tx.borrow())
            .field("decode_timeout", &self.inner.decode_timeout)
            .field("has_torch", &self.inner.torch.is_some())
            .finish()
    }
}

impl SessionHandle {
    pub fn new(
        decoder: Arc<dyn ImageDecoder>,
        torch: Option<Arc<dyn TorchController>>,
        decode_timeout: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                core: Mutex::new(Core {
                    session: DetectionSession::new(),
                    closed: false,
                    tasks: Vec::new(),
                }),
                state_tx,
                decoder,
                torch,
                decode_timeout,
            }),
        }
    }

    pub fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SessionState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Wait until no gallery decode is in flight and return that state.
    pub async fn settled(&self) -> SessionState {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|s| !s.loading).await.map(|s| (*s).clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    pub fn on_live_frame_result(&self, detections: Option<&[Detection]>) {
        self.update(|s| s.on_live_frame_result(detections));
    }

    pub fn on_gallery_image_selected(&self, image: Option<ImageRef>) {
        self.update(|s| s.on_gallery_image_selected(image));
    }

    /// Start decoding the selected image in the background.
    /// Returns whether a decode was started. Must be called inside a tokio runtime.
    pub fn confirm_gallery_image(&self) -> bool {
        let Some(ticket) = self.update(|s| s.confirm_gallery_image()).flatten() else {
            return false;
        };

        let weak = self.downgrade();
        let decoder = Arc::clone(&self.inner.decoder);
        let timeout = self.inner.decode_timeout;

        let task = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, decoder.decode(ticket.image())).await {
                Ok(outcome) => outcome,
                Err(_) => Err(DecodeError::Timeout(timeout.as_secs())),
            };
            match weak.upgrade() {
                Some(handle) => {
                    handle.update(|s| s.complete_gallery_decode(&ticket, outcome));
                }
                None => debug!("session gone, dropping decode result for {}", ticket.image()),
            }
        });
        self.track(&task);
        true
    }

    pub fn cancel_gallery_image_selection(&self) {
        self.update(|s| s.cancel_gallery_image_selection());
    }

    pub fn dismiss_result_dialog(&self) {
        self.update(|s| s.dismiss_result_dialog());
    }

    /// Request the opposite torch state; the flag flips only once the torch confirms.
    pub async fn toggle_flash(&self) {
        let Some(torch) = self.inner.torch.clone() else {
            self.update(|s| s.set_transient_message(messages::CAMERA_NOT_READY));
            return;
        };
        let Some(target) = self.update(|s| s.flash_toggle_target()) else {
            return;
        };

        let result = torch.enable_torch(target).await;
        self.update(|s| s.on_flash_result(target, result));
    }

    pub fn set_transient_message(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|s| s.set_transient_message(text));
    }

    pub fn clear_transient_message(&self) {
        self.update(|s| s.clear_transient_message());
    }

    pub fn report_analyzer_error(&self, error: Option<String>) {
        self.update(|s| s.report_analyzer_error(error));
    }

    /// Feed frames from `frames` through `analyzer` until the sender side closes.
    /// The returned handle resolves once the analyzer has drained the channel.
    pub fn attach_analyzer(
        &self,
        analyzer: LiveAnalyzer,
        frames: mpsc::Receiver<GrayFrame>,
    ) -> JoinHandle<()> {
        let task = tokio::spawn(analyzer.run(self.downgrade(), frames));
        self.track(&task);
        task
    }

    /// Tear down: abort background work and ignore anything that completes later.
    pub fn close(&self) {
        let tasks = {
            let mut core = self.lock();
            if core.closed {
                return;
            }
            core.closed = true;
            core.session.detach();
            self.publish(&core.session);
            std::mem::take(&mut core.tasks)
        };
        info!("session closed, aborting {} task(s)", tasks.len());
        for task in tasks {
            task.abort();
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut DetectionSession) -> R) -> Option<R> {
        let mut core = self.lock();
        if core.closed {
            return None;
        }
        let result = f(&mut core.session);
        self.publish(&core.session);
        Some(result)
    }

    fn publish(&self, session: &DetectionSession) {
        let next = session.state();
        self.inner.state_tx.send_if_modified(|current| {
            if *current == *next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
    }

    fn track(&self, task: &JoinHandle<()>) {
        let mut core = self.lock();
        if core.closed {
            task.abort();
            return;
        }
        core.tasks.retain(|t| !t.is_finished());
        core.tasks.push(task.abort_handle());
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.inner.core.lock().unwrap_or_else(|e| e.into_inner())
    }
}
