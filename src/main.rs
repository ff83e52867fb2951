use std::{
    io::{self, Read},
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use markprint::{
    application::{
        error::AppError,
        export::{ExportContent, ExportOptions, ExportRequest, ExportService},
        render::{ComrakRenderService, RenderRequest, RenderService, RendererConfig},
        workspace::{Workspace, system_theme},
    },
    config::{self, DraftAction, ExportArgs, RenderArgs, Settings, ThemeAction},
    domain::{export::ExportFormat, theme::Theme},
    infra::{browser::ChromeDriver, error::InfraError, http, store::JsonFileStore, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(i32::from(error.exit_code()));
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Export(args) => run_export(settings, args).await,
        config::Command::Render(args) => run_render(settings, args).await,
        config::Command::Draft(args) => run_draft(&settings, args.action),
        config::Command::Theme(args) => run_theme(&settings, args.action),
    }
}

fn open_workspace(settings: &Settings) -> Result<Workspace<JsonFileStore>, AppError> {
    let store = JsonFileStore::open(&settings.workspace.directory)?;
    Ok(Workspace::new(store, system_theme()))
}

fn build_renderer(settings: &Settings) -> Arc<dyn RenderService> {
    Arc::new(ComrakRenderService::new(RendererConfig::from(&settings.render)))
}

fn build_export_service(settings: &Settings, renderer: Arc<dyn RenderService>) -> ExportService {
    ExportService::new(
        Arc::new(ChromeDriver::new()),
        renderer,
        ExportOptions::from(&settings.export),
    )
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let renderer = build_renderer(&settings);
    let export = build_export_service(&settings, renderer.clone());
    let state = http::ApiState::new(export, renderer);

    let body_limit = usize::try_from(settings.server.body_limit_bytes.get())
        .map_err(|_| AppError::validation("server.body_limit_bytes does not fit in memory"))?;
    let router = http::build_router(state, body_limit);

    http::serve(router, settings.server.addr)
        .await
        .map_err(AppError::from)
}

async fn run_export(settings: Settings, args: ExportArgs) -> Result<(), AppError> {
    let format: ExportFormat = args.format.parse()?;
    let workspace = open_workspace(&settings)?;

    let markdown = match args.input.as_deref() {
        Some(path) => {
            let markdown = tokio::fs::read_to_string(path)
                .await
                .map_err(InfraError::from)?;
            workspace.save_draft(&markdown)?;
            markdown
        }
        None => workspace.draft()?,
    };

    let theme = match args.theme.as_deref() {
        Some(value) => {
            let theme: Theme = value.parse()?;
            workspace.save_theme(theme)?;
            theme
        }
        None => workspace.theme()?,
    };

    let renderer = build_renderer(&settings);
    let export = build_export_service(&settings, renderer);
    let content = ExportContent::from_fields(None, Some(markdown))
        .ok_or_else(|| AppError::validation("nothing to export: the document is empty"))?;

    let capture = export
        .export(ExportRequest {
            content,
            theme,
            format,
        })
        .await?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&capture.filename));
    write_output(&output, &capture.bytes).await?;

    info!(
        target = "markprint::export",
        path = %output.display(),
        bytes = capture.bytes.len(),
        theme = theme.as_str(),
        "export written"
    );
    Ok(())
}

async fn run_render(settings: Settings, args: RenderArgs) -> Result<(), AppError> {
    let markdown = match args.input.as_deref() {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(InfraError::from)?,
        None => read_stdin()?,
    };

    let renderer = ComrakRenderService::new(RendererConfig::from(&settings.render));
    let output = renderer.render(&RenderRequest::new(markdown))?;

    println!("{}", output.html);
    if args.word_count {
        eprintln!("{} words", output.word_count);
    }
    Ok(())
}

fn run_draft(settings: &Settings, action: DraftAction) -> Result<(), AppError> {
    let workspace = open_workspace(settings)?;
    match action {
        DraftAction::Show => println!("{}", workspace.draft()?),
        DraftAction::Clear => {
            workspace.clear_draft()?;
            info!(
                target = "markprint::workspace",
                path = %workspace.store().path().display(),
                "draft cleared"
            );
        }
    }
    Ok(())
}

fn run_theme(settings: &Settings, action: ThemeAction) -> Result<(), AppError> {
    let workspace = open_workspace(settings)?;
    let theme = match action {
        ThemeAction::Show => workspace.theme()?,
        ThemeAction::Toggle => {
            let theme = workspace.toggle_theme()?;
            info!(
                target = "markprint::workspace",
                path = %workspace.store().path().display(),
                theme = theme.as_str(),
                "theme saved"
            );
            theme
        }
    };
    println!("{theme}");
    Ok(())
}

fn read_stdin() -> Result<String, AppError> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(InfraError::from)?;
    Ok(buffer)
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(InfraError::from)?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(InfraError::from)?;
    Ok(())
}
