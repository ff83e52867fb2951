//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::export::PdfLayout;

pub use cli::{
    BrowserOverrides, CliArgs, Command, DraftAction, DraftArgs, ExportArgs, LoggingOverrides,
    RenderArgs, ServeArgs, ServeOverrides, ThemeAction, ThemeArgs, WorkspaceOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "markprint";
const ENV_PREFIX: &str = "MARKPRINT";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BODY_LIMIT_BYTES: u64 = 8 * 1024 * 1024;
const DEFAULT_VIEWPORT_WIDTH: u32 = 1200;
const DEFAULT_VIEWPORT_HEIGHT: u32 = 800;
const DEFAULT_DEVICE_SCALE_FACTOR: f64 = 2.0;
const MAX_DEVICE_SCALE_FACTOR: f64 = 4.0;
const DEFAULT_JPEG_QUALITY: u32 = 95;
const DEFAULT_SETTLE_QUIET_MS: u64 = 500;
const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_CONCURRENT_SESSIONS: u32 = 2;
const DEFAULT_WORKSPACE_DIR: &str = ".markprint";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub export: ExportSettings,
    pub workspace: WorkspaceSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub body_limit_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub line_breaks: bool,
    pub highlight_code: bool,
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub chrome_path: Option<PathBuf>,
    pub viewport_width: NonZeroU32,
    pub viewport_height: NonZeroU32,
    pub device_scale_factor: f64,
    pub jpeg_quality: u32,
    pub settle_quiet: Duration,
    pub load_timeout: Duration,
    pub request_timeout: Duration,
    pub max_concurrent_sessions: NonZeroU32,
    pub pdf_layout: PdfLayout,
}

#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_command_overrides(cli.command.as_ref());

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    export: RawExportSettings,
    workspace: RawWorkspaceSettings,
}

impl RawSettings {
    fn apply_command_overrides(&mut self, command: Option<&Command>) {
        match command {
            Some(Command::Serve(args)) => self.apply_serve_overrides(&args.overrides),
            Some(Command::Export(args)) => {
                self.apply_logging_overrides(&args.logging);
                self.apply_browser_overrides(&args.browser);
                self.apply_workspace_overrides(&args.workspace);
            }
            Some(Command::Draft(args)) => self.apply_workspace_overrides(&args.workspace),
            Some(Command::Theme(args)) => self.apply_workspace_overrides(&args.workspace),
            Some(Command::Render(_)) => {}
            None => self.apply_serve_overrides(&ServeOverrides::default()),
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(limit) = overrides.body_limit_bytes {
            self.server.body_limit_bytes = Some(limit);
        }
        if let Some(max) = overrides.max_concurrent_sessions {
            self.export.max_concurrent_sessions = Some(max);
        }

        self.apply_logging_overrides(&overrides.logging);
        self.apply_browser_overrides(&overrides.browser);
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_workspace_overrides(&mut self, overrides: &WorkspaceOverrides) {
        if let Some(directory) = overrides.workspace_directory.as_ref() {
            self.workspace.directory = Some(directory.clone());
        }
    }

    fn apply_browser_overrides(&mut self, overrides: &BrowserOverrides) {
        if let Some(path) = overrides.chrome_path.as_ref() {
            self.export.chrome_path = Some(path.clone());
        }
        if let Some(layout) = overrides.pdf_layout.as_ref() {
            self.export.pdf_layout = Some(layout.clone());
        }
        if let Some(seconds) = overrides.load_timeout_seconds {
            self.export.load_timeout_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            render,
            export,
            workspace,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            render: build_render_settings(render),
            export: build_export_settings(export)?,
            workspace: build_workspace_settings(workspace)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let limit = server.body_limit_bytes.unwrap_or(DEFAULT_BODY_LIMIT_BYTES);
    let body_limit_bytes = NonZeroU64::new(limit)
        .ok_or_else(|| LoadError::invalid("server.body_limit_bytes", "must be greater than zero"))?;

    Ok(ServerSettings {
        addr,
        body_limit_bytes,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> RenderSettings {
    RenderSettings {
        line_breaks: render.line_breaks.unwrap_or(true),
        highlight_code: render.highlight_code.unwrap_or(true),
    }
}

fn build_export_settings(export: RawExportSettings) -> Result<ExportSettings, LoadError> {
    let chrome_path = export
        .chrome_path
        .filter(|path| !path.as_os_str().is_empty());

    let viewport_width = non_zero_u32(
        export.viewport_width.unwrap_or(DEFAULT_VIEWPORT_WIDTH).into(),
        "export.viewport_width",
    )?;
    let viewport_height = non_zero_u32(
        export.viewport_height.unwrap_or(DEFAULT_VIEWPORT_HEIGHT).into(),
        "export.viewport_height",
    )?;

    let device_scale_factor = export
        .device_scale_factor
        .unwrap_or(DEFAULT_DEVICE_SCALE_FACTOR);
    if !(device_scale_factor > 0.0 && device_scale_factor <= MAX_DEVICE_SCALE_FACTOR) {
        return Err(LoadError::invalid(
            "export.device_scale_factor",
            format!("must be within (0, {MAX_DEVICE_SCALE_FACTOR}]"),
        ));
    }

    let jpeg_quality = export.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY);
    if !(1..=100).contains(&jpeg_quality) {
        return Err(LoadError::invalid(
            "export.jpeg_quality",
            "must be between 1 and 100",
        ));
    }

    let settle_quiet =
        Duration::from_millis(export.settle_quiet_ms.unwrap_or(DEFAULT_SETTLE_QUIET_MS));

    let load_secs = export
        .load_timeout_seconds
        .unwrap_or(DEFAULT_LOAD_TIMEOUT_SECS);
    if load_secs == 0 {
        return Err(LoadError::invalid(
            "export.load_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let request_secs = export
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if request_secs == 0 {
        return Err(LoadError::invalid(
            "export.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let max_concurrent_sessions = non_zero_u32(
        export
            .max_concurrent_sessions
            .unwrap_or(DEFAULT_MAX_CONCURRENT_SESSIONS)
            .into(),
        "export.max_concurrent_sessions",
    )?;

    let pdf_layout = match export.pdf_layout {
        Some(layout) => PdfLayout::from_str(&layout)
            .map_err(|err| LoadError::invalid("export.pdf_layout", err.to_string()))?,
        None => PdfLayout::default(),
    };

    Ok(ExportSettings {
        chrome_path,
        viewport_width,
        viewport_height,
        device_scale_factor,
        jpeg_quality,
        settle_quiet,
        load_timeout: Duration::from_secs(load_secs),
        request_timeout: Duration::from_secs(request_secs),
        max_concurrent_sessions,
        pdf_layout,
    })
}

fn build_workspace_settings(
    workspace: RawWorkspaceSettings,
) -> Result<WorkspaceSettings, LoadError> {
    let directory = workspace
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "workspace.directory",
            "path must not be empty",
        ));
    }
    Ok(WorkspaceSettings { directory })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    body_limit_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    line_breaks: Option<bool>,
    highlight_code: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawExportSettings {
    chrome_path: Option<PathBuf>,
    viewport_width: Option<u32>,
    viewport_height: Option<u32>,
    device_scale_factor: Option<f64>,
    jpeg_quality: Option<u32>,
    settle_quiet_ms: Option<u64>,
    load_timeout_seconds: Option<u64>,
    request_timeout_seconds: Option<u64>,
    max_concurrent_sessions: Option<u32>,
    pdf_layout: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWorkspaceSettings {
    directory: Option<PathBuf>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
