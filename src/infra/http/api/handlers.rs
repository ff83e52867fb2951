use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    application::{
        export::{ExportContent, ExportRequest},
        render::RenderRequest,
    },
    domain::{
        export::{CaptureResult, ExportFormat},
        theme::Theme,
    },
};

use super::error::{ApiError, messages};
use super::models::{
    GeneratePdfRequest, GenerateScreenshotRequest, RenderMarkdownRequest, RenderMarkdownResponse,
};
use super::state::ApiState;

pub async fn generate_pdf(
    State(state): State<ApiState>,
    payload: Result<Json<GeneratePdfRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::invalid_body(&rejection))?;

    let content = ExportContent::from_fields(payload.html_content, payload.markdown)
        .ok_or_else(ApiError::no_content)?;

    run_export(
        &state,
        ExportRequest {
            content,
            theme: Theme::from_lenient(payload.theme.as_deref()),
            format: ExportFormat::Pdf,
        },
    )
    .await
}

pub async fn generate_screenshot(
    State(state): State<ApiState>,
    payload: Result<Json<GenerateScreenshotRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::invalid_body(&rejection))?;

    let content = ExportContent::from_fields(payload.html_content, payload.markdown)
        .ok_or_else(ApiError::no_content)?;
    let format = screenshot_format(payload.format.as_deref())?;

    run_export(
        &state,
        ExportRequest {
            content,
            theme: Theme::from_lenient(payload.theme.as_deref()),
            format,
        },
    )
    .await
}

pub async fn render_markdown(
    State(state): State<ApiState>,
    payload: Result<Json<RenderMarkdownRequest>, JsonRejection>,
) -> Result<Json<RenderMarkdownResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::invalid_body(&rejection))?;

    let output = state
        .renderer
        .render(&RenderRequest::new(payload.markdown))
        .map_err(|err| {
            ApiError::from_error(
                "infra::http::api::render_markdown",
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::RENDER_FAILED,
                &err,
            )
        })?;

    Ok(Json(RenderMarkdownResponse {
        html: output.html,
        word_count: output.word_count,
    }))
}

pub async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Screenshots default to PNG; PDF is not a screenshot format.
fn screenshot_format(requested: Option<&str>) -> Result<ExportFormat, ApiError> {
    let Some(requested) = requested.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(ExportFormat::Png);
    };
    match requested.parse::<ExportFormat>() {
        Ok(format) if format.is_raster() => Ok(format),
        _ => Err(ApiError::unsupported_format(requested)),
    }
}

async fn run_export(state: &ApiState, request: ExportRequest) -> Result<Response, ApiError> {
    let format = request.format;
    let capture = state
        .export
        .export(request)
        .await
        .map_err(|err| ApiError::export_failed(format, &err))?;

    capture_response(capture)
}

fn capture_response(capture: CaptureResult) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&capture.content_disposition()).map_err(|err| {
        ApiError::generation_failed("infra::http::api::capture_response", capture.format, &err)
    })?;

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(capture.mime_type()),
        ),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((StatusCode::OK, headers, capture.bytes).into_response())
}
