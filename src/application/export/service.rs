use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use metrics::{counter, gauge, histogram};
use thiserror::Error;
use time::{Date, OffsetDateTime};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::{
    application::render::{RenderError, RenderRequest, RenderService, TrustedHtml},
    domain::{
        error::DomainError,
        export::{CaptureResult, ExportFormat, export_filename},
        theme::Theme,
    },
};

use super::{
    capture::{CaptureSpec, DEFAULT_JPEG_QUALITY, PdfLayout},
    document::{StyledDocument, build_document},
    driver::{CaptureError, RenderDriver, RenderSession, SessionSpec},
};

const METRIC_SESSIONS_OPENED_TOTAL: &str = "markprint_export_sessions_opened_total";
const METRIC_SESSIONS_RELEASED_TOTAL: &str = "markprint_export_sessions_released_total";
const METRIC_SESSIONS_ACTIVE: &str = "markprint_export_sessions_active";
const METRIC_FAILURES_TOTAL: &str = "markprint_export_failures_total";
const METRIC_DURATION_MS: &str = "markprint_export_duration_ms";

/// Tunables for the export pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub session: SessionSpec,
    pub jpeg_quality: u32,
    pub pdf_layout: PdfLayout,
    pub request_timeout: Duration,
    pub max_concurrent_sessions: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            session: SessionSpec::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            pdf_layout: PdfLayout::default(),
            request_timeout: Duration::from_secs(60),
            max_concurrent_sessions: 2,
        }
    }
}

impl From<&crate::config::ExportSettings> for ExportOptions {
    fn from(settings: &crate::config::ExportSettings) -> Self {
        Self {
            session: SessionSpec {
                chrome_path: settings.chrome_path.clone(),
                viewport_width: settings.viewport_width.get(),
                viewport_height: settings.viewport_height.get(),
                device_scale_factor: settings.device_scale_factor,
                settle_quiet: settings.settle_quiet,
                load_timeout: settings.load_timeout,
            },
            jpeg_quality: settings.jpeg_quality,
            pdf_layout: settings.pdf_layout,
            request_timeout: settings.request_timeout,
            max_concurrent_sessions: settings.max_concurrent_sessions.get() as usize,
        }
    }
}

/// Document body supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportContent {
    /// Pre-rendered HTML received from a client; sanitised before use.
    Html(String),
    /// Markdown source rendered server-side.
    Markdown(String),
}

impl ExportContent {
    /// Pick the first non-blank body, preferring HTML.
    pub fn from_fields(html: Option<String>, markdown: Option<String>) -> Option<Self> {
        let non_blank = |value: Option<String>| value.filter(|text| !text.trim().is_empty());

        non_blank(html)
            .map(ExportContent::Html)
            .or_else(|| non_blank(markdown).map(ExportContent::Markdown))
    }

    fn is_blank(&self) -> bool {
        match self {
            ExportContent::Html(text) | ExportContent::Markdown(text) => text.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub content: ExportContent,
    pub theme: Theme,
    pub format: ExportFormat,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no content provided")]
    EmptyContent,
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("export did not finish within {timeout:?}")]
    TimedOut { timeout: Duration },
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ExportError {
    pub fn stage(&self) -> &'static str {
        match self {
            ExportError::EmptyContent => "validation",
            ExportError::Render(_) => "document",
            ExportError::Capture(err) => err.stage(),
            ExportError::TimedOut { .. } => "timeout",
            ExportError::Domain(_) => "package",
        }
    }
}

/// Runs one export per call: document, session, capture, package.
#[derive(Clone)]
pub struct ExportService {
    driver: Arc<dyn RenderDriver>,
    renderer: Arc<dyn RenderService>,
    options: ExportOptions,
    permits: Arc<Semaphore>,
}

impl ExportService {
    pub fn new(
        driver: Arc<dyn RenderDriver>,
        renderer: Arc<dyn RenderService>,
        options: ExportOptions,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(options.max_concurrent_sessions.max(1)));
        Self {
            driver,
            renderer,
            options,
            permits,
        }
    }

    pub async fn export(&self, request: ExportRequest) -> Result<CaptureResult, ExportError> {
        let started_at = Instant::now();
        let format = request.format;

        let result = self.export_inner(request).await;
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(capture) => {
                histogram!(METRIC_DURATION_MS, "format" => format.as_str()).record(elapsed_ms);
                info!(
                    target = "markprint::export",
                    format = format.as_str(),
                    bytes = capture.bytes.len(),
                    elapsed_ms,
                    "export completed"
                );
            }
            Err(ExportError::EmptyContent) => {
                debug!(target = "markprint::export", "export rejected: no content");
            }
            Err(err) => {
                counter!(METRIC_FAILURES_TOTAL, "stage" => err.stage()).increment(1);
                warn!(
                    target = "markprint::export",
                    format = format.as_str(),
                    stage = err.stage(),
                    error = %err,
                    elapsed_ms,
                    "export failed"
                );
            }
        }

        result
    }

    async fn export_inner(&self, request: ExportRequest) -> Result<CaptureResult, ExportError> {
        let fragment = self.trust(&request.content)?;
        let document = build_document(&fragment, request.theme)?;
        let spec = CaptureSpec::for_format(
            request.format,
            self.options.pdf_layout,
            self.options.jpeg_quality,
        );

        let timeout = self.options.request_timeout;
        let bytes = tokio::time::timeout(timeout, self.capture(&document, &spec))
            .await
            .map_err(|_| ExportError::TimedOut { timeout })??;

        let filename = export_filename(
            request.format.default_file_stem(),
            request.format,
            today(),
        )?;

        Ok(CaptureResult {
            bytes: Bytes::from(bytes),
            format: request.format,
            filename,
        })
    }

    /// Turn caller content into a trusted fragment, rejecting blank input.
    fn trust(&self, content: &ExportContent) -> Result<TrustedHtml, ExportError> {
        if content.is_blank() {
            return Err(ExportError::EmptyContent);
        }

        let fragment = match content {
            ExportContent::Html(html) => self.renderer.sanitize_fragment(html),
            ExportContent::Markdown(markdown) => {
                self.renderer.render(&RenderRequest::new(markdown.as_str()))?.html
            }
        };

        if fragment.is_blank() {
            return Err(ExportError::EmptyContent);
        }
        Ok(fragment)
    }

    async fn capture(
        &self,
        document: &StyledDocument,
        spec: &CaptureSpec,
    ) -> Result<Vec<u8>, CaptureError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|err| CaptureError::task(format!("session permits closed: {err}")))?;

        let session = self.driver.launch(&self.options.session).await?;
        let mut session = SessionGuard::new(session);
        debug!(
            target = "markprint::export",
            theme = document.theme().as_str(),
            document_bytes = document.as_str().len(),
            "render session opened"
        );

        session.load(document).await?;
        let bytes = session.capture(spec).await?;
        if bytes.is_empty() {
            return Err(CaptureError::capture("browser returned an empty buffer"));
        }

        Ok(bytes)
    }
}

/// Owns a session for the duration of one export and records its release.
struct SessionGuard {
    inner: Box<dyn RenderSession>,
}

impl SessionGuard {
    fn new(inner: Box<dyn RenderSession>) -> Self {
        counter!(METRIC_SESSIONS_OPENED_TOTAL).increment(1);
        gauge!(METRIC_SESSIONS_ACTIVE).increment(1.0);
        Self { inner }
    }

    async fn load(&mut self, document: &StyledDocument) -> Result<(), CaptureError> {
        self.inner.load(document).await
    }

    async fn capture(&mut self, spec: &CaptureSpec) -> Result<Vec<u8>, CaptureError> {
        self.inner.capture(spec).await
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        counter!(METRIC_SESSIONS_RELEASED_TOTAL).increment(1);
        gauge!(METRIC_SESSIONS_ACTIVE).decrement(1.0);
    }
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
