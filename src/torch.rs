use async_trait::async_trait;

use crate::collaborators::TorchController;
use crate::error::TorchError;

/// Controller for hosts without a flashlight (desktop, file-only scanning).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTorch;

#[async_trait]
impl TorchController for NoTorch {
    async fn enable_torch(&self, _on: bool) -> Result<(), TorchError> {
        Err(TorchError::Unsupported)
    }
}
