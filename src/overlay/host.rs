//! Platform window primitives used by the overlay controller.

use async_trait::async_trait;
use thiserror::Error;

use crate::state::WindowOp;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("{0:?} is not supported on this platform")]
    Unsupported(WindowOp),
    #[error("Window is no longer available")]
    Disconnected,
    #[error("Platform command failed: {0}")]
    Command(String),
}

/// Executes one window operation and resolves once it has taken effect
#[async_trait]
pub trait OverlayHost: Send + Sync {
    async fn perform(&self, op: WindowOp) -> Result<(), PlatformError>;
}
