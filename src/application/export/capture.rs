use std::{fmt, str::FromStr};

use crate::domain::{error::DomainError, export::ExportFormat};

/// Quality used for JPEG screenshots when none is configured.
pub const DEFAULT_JPEG_QUALITY: u32 = 95;

/// Page geometry for PDF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfLayout {
    /// One page sized to the full rendered content.
    #[default]
    FullContent,
    A4,
    Letter,
}

impl PdfLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            PdfLayout::FullContent => "full-content",
            PdfLayout::A4 => "a4",
            PdfLayout::Letter => "letter",
        }
    }

    /// Fixed paper size in inches, `None` when the page follows the content.
    pub fn paper_inches(self) -> Option<(f64, f64)> {
        match self {
            PdfLayout::FullContent => None,
            PdfLayout::A4 => Some((8.27, 11.69)),
            PdfLayout::Letter => Some((8.5, 11.0)),
        }
    }
}

impl fmt::Display for PdfLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PdfLayout {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full-content" | "full_content" | "content" => Ok(PdfLayout::FullContent),
            "a4" => Ok(PdfLayout::A4),
            "letter" => Ok(PdfLayout::Letter),
            other => Err(DomainError::validation(format!(
                "unknown pdf layout `{other}`"
            ))),
        }
    }
}

/// What a render session should produce once the document has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSpec {
    Pdf { layout: PdfLayout },
    Screenshot { format: ExportFormat, quality: Option<u32> },
}

impl CaptureSpec {
    pub fn for_format(format: ExportFormat, layout: PdfLayout, jpeg_quality: u32) -> Self {
        match format {
            ExportFormat::Pdf => CaptureSpec::Pdf { layout },
            ExportFormat::Png => CaptureSpec::Screenshot {
                format,
                quality: None,
            },
            ExportFormat::Jpeg => CaptureSpec::Screenshot {
                format,
                quality: Some(jpeg_quality.clamp(1, 100)),
            },
        }
    }

    pub fn format(&self) -> ExportFormat {
        match self {
            CaptureSpec::Pdf { .. } => ExportFormat::Pdf,
            CaptureSpec::Screenshot { format, .. } => *format,
        }
    }
}
