mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use markprint::application::export::{CaptureSpec, ExportOptions, PdfLayout};
use markprint::domain::export::ExportFormat;
use serde_json::json;

use support::{Failure, MockDriver, PNG_MAGIC, error_message, json_post, router, router_with, send};

#[tokio::test]
async fn screenshot_of_html_returns_png() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver.clone());

    let (status, headers, body) = send(
        &app,
        json_post(
            "/api/generate-screenshot",
            json!({ "htmlContent": "<h1>Hi</h1>", "theme": "light" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert!(body.starts_with(PNG_MAGIC));
    assert_eq!(driver.counters.launched(), 1);
    assert_eq!(driver.counters.released(), 1);

    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"markdown-screenshot-"));
    assert!(disposition.ends_with(".png\""));
}

#[tokio::test]
async fn content_type_follows_the_requested_format() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver.clone());

    let cases = [
        ("/api/generate-pdf", json!({ "htmlContent": "<p>x</p>" }), "application/pdf", ".pdf\""),
        (
            "/api/generate-screenshot",
            json!({ "htmlContent": "<p>x</p>", "format": "png" }),
            "image/png",
            ".png\"",
        ),
        (
            "/api/generate-screenshot",
            json!({ "htmlContent": "<p>x</p>", "format": "jpeg" }),
            "image/jpeg",
            ".jpeg\"",
        ),
    ];

    for (uri, payload, mime, suffix) in cases {
        let (status, headers, body) = send(&app, json_post(uri, payload)).await;
        assert_eq!(status, StatusCode::OK, "{uri} {mime}");
        assert_eq!(headers[header::CONTENT_TYPE], mime);
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .ends_with(suffix));
        assert!(!body.is_empty());
    }
}

#[tokio::test]
async fn pdf_filename_uses_document_stem() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver);

    let (_, headers, body) = send(
        &app,
        json_post("/api/generate-pdf", json!({ "markdown": "# Report" })),
    )
    .await;

    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"markdown-document-"));
    assert!(body.starts_with(b"%PDF"));
}

#[tokio::test]
async fn empty_content_is_rejected_without_launching() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver.clone());

    let payloads = [
        json!({ "htmlContent": "", "theme": "dark" }),
        json!({ "htmlContent": "   \n\t", "theme": "light" }),
        json!({ "theme": "dark" }),
        json!({ "htmlContent": "", "markdown": "  " }),
    ];

    for uri in ["/api/generate-pdf", "/api/generate-screenshot"] {
        for payload in payloads.iter().cloned() {
            let (status, _, body) = send(&app, json_post(uri, payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error_message(&body), "No content provided");
        }
    }

    assert_eq!(driver.counters.launched(), 0);
}

#[tokio::test]
async fn unsupported_screenshot_formats_are_rejected() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver.clone());

    for format in ["gif", "pdf"] {
        let (status, _, body) = send(
            &app,
            json_post(
                "/api/generate-screenshot",
                json!({ "htmlContent": "<p>x</p>", "format": format }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), "Unsupported format");
    }
    assert_eq!(driver.counters.launched(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-pdf")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Invalid request body");
    assert_eq!(driver.counters.launched(), 0);
}

#[tokio::test]
async fn failures_return_generic_messages() {
    let cases = [
        (Failure::Launch, "/api/generate-pdf", "Failed to generate PDF"),
        (Failure::Load, "/api/generate-screenshot", "Failed to generate screenshot"),
        (Failure::Capture, "/api/generate-pdf", "Failed to generate PDF"),
    ];

    for (failure, uri, message) in cases {
        let driver = Arc::new(MockDriver::new(failure));
        let app = router(driver.clone());

        let (status, _, body) = send(&app, json_post(uri, json!({ "htmlContent": "<p>x</p>" }))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_message(&body), message);
        let text = String::from_utf8(body).unwrap();
        assert!(!text.contains("/opt/secret"));
        assert!(!text.contains("ERR_FILE_NOT_FOUND"));
        assert!(!text.contains("Printing failed"));
        assert_eq!(driver.counters.launched(), driver.counters.released());
    }
}

#[tokio::test]
async fn sessions_are_released_after_mixed_requests() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver.clone());

    let sequence = [
        Failure::None,
        Failure::Load,
        Failure::Capture,
        Failure::None,
        Failure::Launch,
        Failure::Capture,
        Failure::None,
    ];
    for failure in sequence {
        driver.set_failure(failure);
        let _ = send(
            &app,
            json_post("/api/generate-screenshot", json!({ "htmlContent": "<p>x</p>" })),
        )
        .await;
    }

    assert_eq!(driver.counters.launched(), 6);
    assert_eq!(driver.counters.released(), 6);
}

#[tokio::test]
async fn jpeg_captures_carry_quality_and_png_does_not() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver.clone());

    send(
        &app,
        json_post(
            "/api/generate-screenshot",
            json!({ "htmlContent": "<p>x</p>", "format": "jpeg" }),
        ),
    )
    .await;
    assert_eq!(
        driver.counters.last_capture(),
        Some(CaptureSpec::Screenshot {
            format: ExportFormat::Jpeg,
            quality: Some(95)
        })
    );

    send(
        &app,
        json_post("/api/generate-screenshot", json!({ "htmlContent": "<p>x</p>" })),
    )
    .await;
    assert_eq!(
        driver.counters.last_capture(),
        Some(CaptureSpec::Screenshot {
            format: ExportFormat::Png,
            quality: None
        })
    );

    send(&app, json_post("/api/generate-pdf", json!({ "htmlContent": "<p>x</p>" }))).await;
    assert_eq!(
        driver.counters.last_capture(),
        Some(CaptureSpec::Pdf {
            layout: PdfLayout::FullContent
        })
    );
}

#[tokio::test]
async fn theme_reaches_the_loaded_document() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver.clone());

    send(
        &app,
        json_post("/api/generate-pdf", json!({ "htmlContent": "<p>x</p>", "theme": "dark" })),
    )
    .await;
    let dark = driver.counters.last_document().unwrap();
    assert!(dark.contains("<html class=\"dark\""));
    assert!(dark.contains("background-color: #0d1117 !important;"));

    send(
        &app,
        json_post("/api/generate-pdf", json!({ "htmlContent": "<p>x</p>", "theme": "sepia" })),
    )
    .await;
    let fallback = driver.counters.last_document().unwrap();
    assert!(fallback.contains("<html class=\"light\""));
}

#[tokio::test]
async fn received_html_is_sanitised_before_loading() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver.clone());

    send(
        &app,
        json_post(
            "/api/generate-pdf",
            json!({ "htmlContent": "<h1>Title</h1><script>steal()</script><img src=x onerror=alert(1)>" }),
        ),
    )
    .await;

    let document = driver.counters.last_document().unwrap();
    assert!(document.contains("<h1>Title</h1>"));
    assert!(!document.contains("steal()"));
    assert!(!document.contains("onerror"));
}

#[tokio::test]
async fn slow_exports_fail_generically_and_release() {
    let driver = Arc::new(MockDriver::new(Failure::Hang));
    let options = ExportOptions {
        request_timeout: Duration::from_millis(100),
        ..ExportOptions::default()
    };
    let app = router_with(driver.clone(), options);

    let cases = [
        ("/api/generate-screenshot", "Failed to generate screenshot"),
        ("/api/generate-pdf", "Failed to generate PDF"),
    ];
    for (uri, message) in cases {
        let (status, _, body) = send(&app, json_post(uri, json!({ "htmlContent": "<h1>Hi</h1>" }))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_message(&body), message);
    }
    assert_eq!(driver.counters.launched(), 2);
    assert_eq!(driver.counters.released(), 2);
}

#[tokio::test]
async fn concurrent_sessions_are_bounded() {
    let mut driver = MockDriver::new(Failure::None);
    driver.hold = Duration::from_millis(50);
    let driver = Arc::new(driver);
    let options = ExportOptions {
        max_concurrent_sessions: 1,
        ..ExportOptions::default()
    };
    let app = router_with(driver.clone(), options);

    let requests = (0..4).map(|_| {
        let app = app.clone();
        tokio::spawn(async move {
            send(
                &app,
                json_post("/api/generate-screenshot", json!({ "htmlContent": "<p>x</p>" })),
            )
            .await
            .0
        })
    });
    for handle in requests.collect::<Vec<_>>() {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(driver.counters.launched(), 4);
    assert_eq!(driver.counters.released(), 4);
    assert_eq!(driver.counters.peak_active(), 1);
}

#[tokio::test]
async fn live_preview_renders_markdown() {
    let driver = Arc::new(MockDriver::new(Failure::None));
    let app = router(driver.clone());

    let (status, _, body) = send(
        &app,
        json_post("/api/render", json!({ "markdown": "# Hello\n\nsmall world" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["wordCount"], 4);
    assert!(value["html"].as_str().unwrap().contains("<h1>Hello</h1>"));
    assert_eq!(driver.counters.launched(), 0);
}

#[tokio::test]
async fn health_is_no_content() {
    let app = router(Arc::new(MockDriver::new(Failure::None)));
    let request = Request::builder().uri("/_health").body(Body::empty()).unwrap();

    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}
