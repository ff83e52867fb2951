use std::error::Error as StdError;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    application::{error::ErrorReport, export::ExportError},
    domain::export::ExportFormat,
};

pub mod messages {
    use crate::domain::export::ExportFormat;

    pub const NO_CONTENT: &str = "No content provided";
    pub const UNSUPPORTED_FORMAT: &str = "Unsupported format";
    pub const INVALID_BODY: &str = "Invalid request body";
    pub const PDF_FAILED: &str = "Failed to generate PDF";
    pub const SCREENSHOT_FAILED: &str = "Failed to generate screenshot";
    pub const RENDER_FAILED: &str = "Failed to render markdown";

    /// Public message for any failed export of `format`.
    pub fn generation_failed(format: ExportFormat) -> &'static str {
        match format {
            ExportFormat::Pdf => PDF_FAILED,
            ExportFormat::Png | ExportFormat::Jpeg => SCREENSHOT_FAILED,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
}

/// JSON error response; the public message never carries failure details.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            message,
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        Self {
            status,
            message,
            report: ErrorReport::from_error(source, status, error),
        }
    }

    pub fn no_content() -> Self {
        Self::new(
            "infra::http::api::validate",
            StatusCode::BAD_REQUEST,
            messages::NO_CONTENT,
            "htmlContent and markdown were both missing or blank",
        )
    }

    pub fn unsupported_format(requested: &str) -> Self {
        Self::new(
            "infra::http::api::validate",
            StatusCode::BAD_REQUEST,
            messages::UNSUPPORTED_FORMAT,
            format!("format `{requested}` is not png or jpeg"),
        )
    }

    pub fn invalid_body(rejection: &JsonRejection) -> Self {
        Self::from_error(
            "infra::http::api::json",
            StatusCode::BAD_REQUEST,
            messages::INVALID_BODY,
            rejection,
        )
    }

    /// Map a failed export to the uniform response for its artifact kind.
    ///
    /// Every failure after validation, timeouts included, answers the same
    /// generic 500; the stage and detail only reach the logs.
    pub fn export_failed(format: ExportFormat, error: &ExportError) -> Self {
        match error {
            ExportError::EmptyContent => Self::no_content(),
            _ => Self::generation_failed("infra::http::api::export", format, error),
        }
    }

    pub fn generation_failed(
        source: &'static str,
        format: ExportFormat,
        error: &dyn StdError,
    ) -> Self {
        Self::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            messages::generation_failed(format),
            error,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.message,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
