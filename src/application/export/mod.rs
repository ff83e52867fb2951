//! Export pipeline: themed document, browser session, capture, packaging.

mod capture;
mod document;
mod driver;
mod service;

pub use capture::{CaptureSpec, DEFAULT_JPEG_QUALITY, PdfLayout};
pub use document::{StyledDocument, build_document};
pub use driver::{CaptureError, RenderDriver, RenderSession, SessionSpec};
pub use service::{ExportContent, ExportError, ExportOptions, ExportRequest, ExportService};
