//! Headless Chrome render driver.
//!
//! `headless_chrome` is synchronous, so every browser call runs on tokio's
//! blocking pool. A session owns one browser process and one tab; dropping the
//! session kills the process.

use std::{
    ffi::OsStr,
    io::Write,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use headless_chrome::{
    Browser, LaunchOptions,
    browser::tab::Tab,
    protocol::cdp::{Emulation, Page},
    types::PrintToPdfOptions,
};
use serde::{Deserialize, de::DeserializeOwned};
use tempfile::NamedTempFile;
use tokio::task;
use tracing::{debug, warn};
use url::Url;

use crate::application::export::{
    CaptureError, CaptureSpec, PdfLayout, RenderDriver, RenderSession, SessionSpec,
    StyledDocument,
};
use crate::domain::export::ExportFormat;

const CSS_PIXELS_PER_INCH: f64 = 96.0;
const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(100);
const PAPER_MARGIN_INCHES: f64 = 0.4;

const PAGE_STATE_SCRIPT: &str = r#"JSON.stringify({
    ready: document.readyState === 'complete',
    images: Array.from(document.images).every((img) => img.complete),
    resources: performance.getEntriesByType('resource').length
})"#;

const CONTENT_SIZE_SCRIPT: &str = r#"JSON.stringify({
    width: Math.max(document.documentElement.scrollWidth, document.body ? document.body.scrollWidth : 0),
    height: Math.max(document.documentElement.scrollHeight, document.body ? document.body.scrollHeight : 0)
})"#;

#[derive(Debug, Deserialize)]
struct PageState {
    ready: bool,
    images: bool,
    resources: u64,
}

#[derive(Debug, Deserialize)]
struct ContentSize {
    width: f64,
    height: f64,
}

/// Launches a fresh headless Chrome per session.
#[derive(Debug, Default, Clone)]
pub struct ChromeDriver;

impl ChromeDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RenderDriver for ChromeDriver {
    async fn launch(&self, spec: &SessionSpec) -> Result<Box<dyn RenderSession>, CaptureError> {
        let launch_spec = spec.clone();
        let (browser, tab) = task::spawn_blocking(move || launch_browser(&launch_spec))
            .await
            .map_err(|err| CaptureError::task(format!("launch task panicked: {err}")))??;

        debug!(
            target = "markprint::export",
            width = spec.viewport_width,
            height = spec.viewport_height,
            "browser launched"
        );

        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            tab: Some(tab),
            spec: spec.clone(),
            document_file: None,
        }))
    }
}

fn launch_browser(spec: &SessionSpec) -> Result<(Browser, Arc<Tab>), CaptureError> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .path(spec.chrome_path.clone())
        .window_size(Some((spec.viewport_width, spec.viewport_height)))
        .idle_browser_timeout(spec.load_timeout + Duration::from_secs(30))
        .args(vec![
            OsStr::new("--disable-setuid-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--hide-scrollbars"),
        ])
        .build()
        .map_err(|err| CaptureError::launch(format!("invalid launch options: {err}")))?;

    let browser = Browser::new(options).map_err(|err| CaptureError::launch(format!("{err:#}")))?;
    let tab = browser
        .new_tab()
        .map_err(|err| CaptureError::launch(format!("failed to open tab: {err:#}")))?;

    // The window size alone leaves devicePixelRatio at 1.
    tab.call_method(device_metrics(spec))
        .map_err(|err| CaptureError::launch(format!("failed to set device metrics: {err:#}")))?;

    Ok((browser, tab))
}

fn device_metrics(spec: &SessionSpec) -> Emulation::SetDeviceMetricsOverride {
    Emulation::SetDeviceMetricsOverride {
        width: spec.viewport_width,
        height: spec.viewport_height,
        device_scale_factor: spec.device_scale_factor,
        mobile: false,
        scale: None,
        screen_width: None,
        screen_height: None,
        position_x: None,
        position_y: None,
        dont_set_visible_size: None,
        screen_orientation: None,
        viewport: None,
        display_feature: None,
        device_posture: None,
    }
}

/// One Chrome process and its single tab.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    spec: SessionSpec,
    /// The loaded document; removed from disk when the session ends.
    document_file: Option<NamedTempFile>,
}

impl ChromeSession {
    fn tab(&self) -> Result<Arc<Tab>, CaptureError> {
        self.tab
            .clone()
            .ok_or_else(|| CaptureError::task("session already released"))
    }
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn load(&mut self, document: &StyledDocument) -> Result<(), CaptureError> {
        let tab = self.tab()?;
        let html = document.as_str().to_owned();
        let quiet = self.spec.settle_quiet;
        let timeout = self.spec.load_timeout;

        let file = task::spawn_blocking(move || load_document(&tab, &html, quiet, timeout))
            .await
            .map_err(|err| CaptureError::task(format!("load task panicked: {err}")))??;

        self.document_file = Some(file);
        Ok(())
    }

    async fn capture(&mut self, spec: &CaptureSpec) -> Result<Vec<u8>, CaptureError> {
        let tab = self.tab()?;
        let spec = *spec;

        task::spawn_blocking(move || capture_page(&tab, spec))
            .await
            .map_err(|err| CaptureError::task(format!("capture task panicked: {err}")))?
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        let tab = self.tab.take();
        let browser = self.browser.take();
        let document_file = self.document_file.take();

        let teardown = move || {
            drop(tab);
            drop(browser);
            drop(document_file);
        };

        // Killing Chrome waits on the child process; keep that off async workers.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(teardown);
            }
            Err(_) => teardown(),
        }
    }
}

fn load_document(
    tab: &Tab,
    html: &str,
    quiet: Duration,
    timeout: Duration,
) -> Result<NamedTempFile, CaptureError> {
    let started_at = Instant::now();

    let mut file = tempfile::Builder::new()
        .prefix("markprint-")
        .suffix(".html")
        .tempfile()
        .map_err(|err| CaptureError::load(format!("failed to create document file: {err}")))?;
    file.write_all(html.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|err| CaptureError::load(format!("failed to write document file: {err}")))?;

    let url = Url::from_file_path(file.path())
        .map_err(|()| CaptureError::load("document path is not absolute"))?;

    tab.navigate_to(url.as_str())
        .map_err(|err| CaptureError::load(format!("navigation failed: {err:#}")))?;
    tab.wait_until_navigated()
        .map_err(|err| CaptureError::load(format!("navigation did not complete: {err:#}")))?;

    wait_for_settle(tab, quiet, timeout.saturating_sub(started_at.elapsed()))?;
    debug!(
        target = "markprint::export",
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "document settled"
    );
    Ok(file)
}

/// Poll until the page is ready, every image is decoded, and no new resource
/// entries appeared for `quiet`.
fn wait_for_settle(tab: &Tab, quiet: Duration, timeout: Duration) -> Result<(), CaptureError> {
    let deadline = Instant::now() + timeout;
    let mut last_resources = None;
    let mut quiet_since = Instant::now();

    loop {
        let state: PageState = evaluate_json(tab, PAGE_STATE_SCRIPT, CaptureError::load)?;
        let now = Instant::now();

        if last_resources != Some(state.resources) {
            last_resources = Some(state.resources);
            quiet_since = now;
        }

        if state.ready && state.images && now.duration_since(quiet_since) >= quiet {
            return Ok(());
        }
        if now >= deadline {
            return Err(CaptureError::SettleTimeout { timeout });
        }

        thread::sleep(SETTLE_POLL_INTERVAL.min(deadline.saturating_duration_since(now)));
    }
}

fn capture_page(tab: &Tab, spec: CaptureSpec) -> Result<Vec<u8>, CaptureError> {
    let size: ContentSize = evaluate_json(tab, CONTENT_SIZE_SCRIPT, CaptureError::capture)?;

    match spec {
        CaptureSpec::Pdf { layout } => tab
            .print_to_pdf(Some(pdf_options(layout, &size)))
            .map_err(|err| CaptureError::capture(format!("print to pdf failed: {err:#}"))),
        CaptureSpec::Screenshot { format, quality } => {
            let data = tab
                .call_method(screenshot_command(format, quality, &size))
                .map_err(|err| CaptureError::capture(format!("screenshot failed: {err:#}")))?
                .data;
            BASE64
                .decode(data)
                .map_err(|err| CaptureError::capture(format!("screenshot payload: {err}")))
        }
    }
}

/// Full-page capture: the clip covers the whole document and Chrome paints
/// beyond the viewport. Pixel density comes from the device metrics override.
fn screenshot_command(
    format: ExportFormat,
    quality: Option<u32>,
    size: &ContentSize,
) -> Page::CaptureScreenshot {
    let format = match format {
        ExportFormat::Jpeg => Page::CaptureScreenshotFormatOption::Jpeg,
        _ => Page::CaptureScreenshotFormatOption::Png,
    };
    Page::CaptureScreenshot {
        format: Some(format),
        quality,
        clip: Some(Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: size.width.max(1.0),
            height: size.height.max(1.0),
            scale: 1.0,
        }),
        from_surface: Some(true),
        capture_beyond_viewport: Some(true),
        optimize_for_speed: None,
    }
}

fn pdf_options(layout: PdfLayout, size: &ContentSize) -> PrintToPdfOptions {
    let (paper_width, paper_height, margin) = match layout.paper_inches() {
        Some((width, height)) => (width, height, PAPER_MARGIN_INCHES),
        None => (
            size.width.max(1.0) / CSS_PIXELS_PER_INCH,
            size.height.max(1.0) / CSS_PIXELS_PER_INCH,
            0.0,
        ),
    };

    PrintToPdfOptions {
        print_background: Some(true),
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(margin),
        margin_bottom: Some(margin),
        margin_left: Some(margin),
        margin_right: Some(margin),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

/// Evaluate a script returning a JSON string; `fail` picks the stage the
/// error is reported under.
fn evaluate_json<T: DeserializeOwned>(
    tab: &Tab,
    script: &str,
    fail: fn(String) -> CaptureError,
) -> Result<T, CaptureError> {
    let result = tab
        .evaluate(script, false)
        .map_err(|err| fail(format!("page evaluation failed: {err:#}")))?;
    let raw = result
        .value
        .as_ref()
        .and_then(|value| value.as_str())
        .ok_or_else(|| fail("page evaluation returned no value".to_string()))?;

    parse_page_json(raw, fail)
}

fn parse_page_json<T: DeserializeOwned>(
    raw: &str,
    fail: fn(String) -> CaptureError,
) -> Result<T, CaptureError> {
    serde_json::from_str(raw).map_err(|err| {
        warn!(target = "markprint::export", raw, "unexpected page payload");
        fail(format!("malformed page payload: {err}"))
    })
}
