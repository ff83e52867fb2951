use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the markprint binary.
#[derive(Debug, Parser)]
#[command(
    name = "markprint",
    version,
    about = "Render Markdown and export it to PDF, PNG or JPEG"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MARKPRINT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP export service.
    Serve(Box<ServeArgs>),
    /// Export a Markdown file (or the saved draft) to disk.
    Export(ExportArgs),
    /// Print the rendered HTML fragment for a Markdown file.
    Render(RenderArgs),
    /// Show or clear the saved draft.
    Draft(DraftArgs),
    /// Show or toggle the saved theme preference.
    Theme(ThemeArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct BrowserOverrides {
    /// Override the Chrome/Chromium executable.
    #[arg(long = "chrome-path", value_name = "PATH", value_hint = ValueHint::ExecutablePath)]
    pub chrome_path: Option<PathBuf>,

    /// Override the PDF page layout (full-content|a4|letter).
    #[arg(long = "pdf-layout", value_name = "LAYOUT")]
    pub pdf_layout: Option<String>,

    /// Override the settle timeout for loading a document.
    #[arg(long = "load-timeout-seconds", value_name = "SECONDS")]
    pub load_timeout_seconds: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub browser: BrowserOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the request body limit in bytes.
    #[arg(long = "body-limit-bytes", value_name = "BYTES")]
    pub body_limit_bytes: Option<u64>,

    /// Override the number of browser sessions allowed at once.
    #[arg(long = "max-concurrent-sessions", value_name = "COUNT")]
    pub max_concurrent_sessions: Option<u32>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub browser: BrowserOverrides,

    /// Markdown file to export; the saved draft is used when omitted.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Output format (pdf|png|jpeg).
    #[arg(long, short = 'f', default_value = "pdf")]
    pub format: String,

    /// Theme (light|dark); the saved preference is used when omitted.
    #[arg(long, short = 't')]
    pub theme: Option<String>,

    /// Output path; defaults to the dated filename in the current directory.
    #[arg(long, short = 'o', value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub workspace: WorkspaceOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct WorkspaceOverrides {
    /// Override the workspace directory.
    #[arg(long = "workspace-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub workspace_directory: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DraftArgs {
    #[command(flatten)]
    pub workspace: WorkspaceOverrides,

    #[command(subcommand)]
    pub action: DraftAction,
}

#[derive(Debug, Subcommand, Clone, Copy, PartialEq, Eq)]
pub enum DraftAction {
    /// Print the saved draft, or the sample document when none is saved.
    Show,
    /// Remove the saved draft.
    Clear,
}

#[derive(Debug, Args, Clone)]
pub struct ThemeArgs {
    #[command(flatten)]
    pub workspace: WorkspaceOverrides,

    #[command(subcommand)]
    pub action: ThemeAction,
}

#[derive(Debug, Subcommand, Clone, Copy, PartialEq, Eq)]
pub enum ThemeAction {
    /// Print the saved theme, or the system preference when none is saved.
    Show,
    /// Switch between light and dark and save the result.
    Toggle,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Markdown file to render; standard input is read when omitted.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Print the word count to standard error as well.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub word_count: bool,
}
