use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

use super::{capture::CaptureSpec, document::StyledDocument};

/// Browser parameters for one isolated render session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSpec {
    pub chrome_path: Option<PathBuf>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_scale_factor: f64,
    /// Time without new network resources before the page counts as settled.
    pub settle_quiet: Duration,
    /// Upper bound on the whole load-and-settle step.
    pub load_timeout: Duration,
}

impl Default for SessionSpec {
    fn default() -> Self {
        Self {
            chrome_path: None,
            viewport_width: 1200,
            viewport_height: 800,
            device_scale_factor: 2.0,
            settle_quiet: Duration::from_millis(500),
            load_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to launch browser: {message}")]
    Launch { message: String },
    #[error("failed to load document: {message}")]
    Load { message: String },
    #[error("document did not settle within {timeout:?}")]
    SettleTimeout { timeout: Duration },
    #[error("capture rejected by browser: {message}")]
    Capture { message: String },
    #[error("browser task failed: {message}")]
    Task { message: String },
}

impl CaptureError {
    /// Pipeline stage used as the failure metric label.
    pub fn stage(&self) -> &'static str {
        match self {
            CaptureError::Launch { .. } => "launch",
            CaptureError::Load { .. } | CaptureError::SettleTimeout { .. } => "load",
            CaptureError::Capture { .. } => "capture",
            CaptureError::Task { .. } => "task",
        }
    }

    pub fn launch(message: impl Into<String>) -> Self {
        Self::Launch {
            message: message.into(),
        }
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture {
            message: message.into(),
        }
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }
}

/// Starts isolated browser sessions.
#[async_trait]
pub trait RenderDriver: Send + Sync {
    async fn launch(&self, spec: &SessionSpec) -> Result<Box<dyn RenderSession>, CaptureError>;
}

/// One browser process with one page, owned by a single export.
///
/// Dropping the session tears the browser down; implementations must release
/// everything they hold in `Drop` so that every exit path cleans up once.
#[async_trait]
pub trait RenderSession: Send {
    /// Load the document and wait until it has settled.
    async fn load(&mut self, document: &StyledDocument) -> Result<(), CaptureError>;

    /// Capture the loaded page.
    async fn capture(&mut self, spec: &CaptureSpec) -> Result<Vec<u8>, CaptureError>;
}
