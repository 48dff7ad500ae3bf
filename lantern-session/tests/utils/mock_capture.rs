use async_trait::async_trait;
use lantern_session::media::{LocalMedia, MediaCapture, MediaError};

/// Capture layer that always grants a synthetic camera.
pub struct GrantedCapture;

#[async_trait]
impl MediaCapture for GrantedCapture {
    async fn acquire(&self) -> Result<LocalMedia, MediaError> {
        Ok(LocalMedia::video("mock-camera"))
    }
}

/// Capture layer standing in for a user who refused the permission prompt.
pub struct DeniedCapture;

#[async_trait]
impl MediaCapture for DeniedCapture {
    async fn acquire(&self) -> Result<LocalMedia, MediaError> {
        Err(MediaError::PermissionDenied)
    }
}
