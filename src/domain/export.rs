//! Export formats and the artifacts produced for them.

use std::{fmt, str::FromStr};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::{Date, format_description::FormatItem, macros::format_description};

use super::error::DomainError;

const FILENAME_DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub const PDF_FILE_STEM: &str = "markdown-document";
pub const SCREENSHOT_FILE_STEM: &str = "markdown-screenshot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    pub fn is_raster(self) -> bool {
        matches!(self, ExportFormat::Png | ExportFormat::Jpeg)
    }

    pub fn default_file_stem(self) -> &'static str {
        match self {
            ExportFormat::Pdf => PDF_FILE_STEM,
            ExportFormat::Png | ExportFormat::Jpeg => SCREENSHOT_FILE_STEM,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            other => Err(DomainError::validation(format!(
                "unsupported export format `{other}`"
            ))),
        }
    }
}

/// Build `<stem>-<YYYY-MM-DD>.<ext>`.
pub fn export_filename(stem: &str, format: ExportFormat, date: Date) -> Result<String, DomainError> {
    let stamp = date
        .format(FILENAME_DATE_FORMAT)
        .map_err(|err| DomainError::invariant(format!("failed to format export date: {err}")))?;
    Ok(format!("{stem}-{stamp}.{}", format.extension()))
}

/// Bytes captured from the browser together with their download metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub bytes: Bytes,
    pub format: ExportFormat,
    pub filename: String,
}

impl CaptureResult {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}
