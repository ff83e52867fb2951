#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request};
use http_body_util::BodyExt;
use markprint::{
    application::{
        export::{
            CaptureError, CaptureSpec, ExportOptions, ExportService, RenderDriver, RenderSession,
            SessionSpec, StyledDocument,
        },
        render::{ComrakRenderService, RenderService},
    },
    infra::http::{ApiState, build_router},
};
use tower::ServiceExt;

pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    Launch,
    Load,
    Capture,
    Hang,
}

/// Counts every launch and release so tests can prove sessions never leak.
#[derive(Default)]
pub struct Counters {
    pub launched: AtomicUsize,
    pub released: AtomicUsize,
    pub active: AtomicUsize,
    pub peak_active: AtomicUsize,
    pub captures: Mutex<Vec<CaptureSpec>>,
    pub documents: Mutex<Vec<String>>,
}

impl Counters {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    pub fn last_capture(&self) -> Option<CaptureSpec> {
        self.captures.lock().unwrap().last().copied()
    }

    pub fn last_document(&self) -> Option<String> {
        self.documents.lock().unwrap().last().cloned()
    }
}

pub struct MockDriver {
    pub counters: Arc<Counters>,
    pub failure: Mutex<Failure>,
    pub hold: Duration,
}

impl MockDriver {
    pub fn new(failure: Failure) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            failure: Mutex::new(failure),
            hold: Duration::ZERO,
        }
    }

    pub fn set_failure(&self, failure: Failure) {
        *self.failure.lock().unwrap() = failure;
    }
}

#[async_trait]
impl RenderDriver for MockDriver {
    async fn launch(&self, _spec: &SessionSpec) -> Result<Box<dyn RenderSession>, CaptureError> {
        let failure = *self.failure.lock().unwrap();
        if failure == Failure::Launch {
            return Err(CaptureError::launch("chrome binary missing at /opt/secret/chrome"));
        }

        self.counters.launched.fetch_add(1, Ordering::SeqCst);
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak_active.fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(MockSession {
            counters: self.counters.clone(),
            failure,
            hold: self.hold,
        }))
    }
}

pub struct MockSession {
    counters: Arc<Counters>,
    failure: Failure,
    hold: Duration,
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RenderSession for MockSession {
    async fn load(&mut self, document: &StyledDocument) -> Result<(), CaptureError> {
        self.counters
            .documents
            .lock()
            .unwrap()
            .push(document.as_str().to_string());
        match self.failure {
            Failure::Load => Err(CaptureError::load("net::ERR_FILE_NOT_FOUND")),
            Failure::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
            _ => {
                if !self.hold.is_zero() {
                    tokio::time::sleep(self.hold).await;
                }
                Ok(())
            }
        }
    }

    async fn capture(&mut self, spec: &CaptureSpec) -> Result<Vec<u8>, CaptureError> {
        self.counters.captures.lock().unwrap().push(*spec);
        if self.failure == Failure::Capture {
            return Err(CaptureError::capture("Printing failed"));
        }
        let body = match spec {
            CaptureSpec::Pdf { .. } => b"%PDF-1.7 mock".to_vec(),
            CaptureSpec::Screenshot { .. } => {
                let mut bytes = PNG_MAGIC.to_vec();
                bytes.extend_from_slice(b"mock-image");
                bytes
            }
        };
        Ok(body)
    }
}

pub fn router_with(driver: Arc<MockDriver>, options: ExportOptions) -> Router {
    let renderer: Arc<dyn RenderService> = Arc::new(ComrakRenderService::default());
    let export = ExportService::new(driver, renderer.clone(), options);
    build_router(ApiState::new(export, renderer), 1024 * 1024)
}

pub fn router(driver: Arc<MockDriver>) -> Router {
    router_with(driver, ExportOptions::default())
}

pub fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> (axum::http::StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

pub fn error_message(body: &[u8]) -> String {
    let value: serde_json::Value = serde_json::from_slice(body).unwrap();
    value["error"].as_str().unwrap_or_default().to_string()
}
