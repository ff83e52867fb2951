use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        logging: LoggingOverrides {
            log_level: Some("debug".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_the_export_contract() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.server.body_limit_bytes.get(), DEFAULT_BODY_LIMIT_BYTES);
    assert_eq!(settings.export.viewport_width.get(), 1200);
    assert_eq!(settings.export.viewport_height.get(), 800);
    assert_eq!(settings.export.device_scale_factor, 2.0);
    assert_eq!(settings.export.jpeg_quality, 95);
    assert_eq!(settings.export.settle_quiet, Duration::from_millis(500));
    assert_eq!(settings.export.load_timeout, Duration::from_secs(30));
    assert_eq!(settings.export.request_timeout, Duration::from_secs(60));
    assert_eq!(settings.export.max_concurrent_sessions.get(), 2);
    assert_eq!(settings.export.pdf_layout, PdfLayout::FullContent);
    assert_eq!(settings.export.chrome_path, None);
    assert!(settings.render.line_breaks);
    assert!(settings.render.highlight_code);
    assert_eq!(settings.workspace.directory, PathBuf::from(".markprint"));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        logging: LoggingOverrides {
            log_json: Some(true),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.format, LogFormat::Json);
}

#[test]
fn jpeg_quality_must_be_a_percentage() {
    let mut raw = RawSettings::default();
    raw.export.jpeg_quality = Some(0);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "export.jpeg_quality",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.export.jpeg_quality = Some(101);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn zero_sessions_are_rejected() {
    let mut raw = RawSettings::default();
    raw.export.max_concurrent_sessions = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "export.max_concurrent_sessions",
            ..
        })
    ));
}

#[test]
fn scale_factor_is_bounded() {
    let mut raw = RawSettings::default();
    raw.export.device_scale_factor = Some(0.0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.export.device_scale_factor = Some(8.0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn pdf_layout_is_parsed() {
    let mut raw = RawSettings::default();
    raw.export.pdf_layout = Some("letter".into());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.export.pdf_layout, PdfLayout::Letter);

    let mut raw = RawSettings::default();
    raw.export.pdf_layout = Some("scroll".into());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "export.pdf_layout",
            ..
        })
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["markprint"]);
    assert!(args.command.is_none());
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "markprint",
        "serve",
        "--server-port",
        "8080",
        "--chrome-path",
        "/usr/bin/chromium",
        "--max-concurrent-sessions",
        "4",
        "--log-json",
        "true",
    ]);

    let Some(Command::Serve(serve)) = args.command.clone() else {
        panic!("expected serve command");
    };
    assert_eq!(serve.overrides.server_port, Some(8080));
    assert_eq!(serve.overrides.logging.log_json, Some(true));

    let mut raw = RawSettings::default();
    raw.apply_command_overrides(args.command.as_ref());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.server.addr.port(), 8080);
    assert_eq!(settings.export.max_concurrent_sessions.get(), 4);
    assert_eq!(
        settings.export.chrome_path,
        Some(PathBuf::from("/usr/bin/chromium"))
    );
}

#[test]
fn parse_export_arguments() {
    let args = CliArgs::parse_from([
        "markprint",
        "export",
        "notes.md",
        "--format",
        "png",
        "--theme",
        "dark",
        "-o",
        "out.png",
        "--pdf-layout",
        "a4",
    ]);

    let Some(Command::Export(export)) = args.command.clone() else {
        panic!("expected export command");
    };
    assert_eq!(export.input, Some(PathBuf::from("notes.md")));
    assert_eq!(export.format, "png");
    assert_eq!(export.theme.as_deref(), Some("dark"));
    assert_eq!(export.output, Some(PathBuf::from("out.png")));

    let mut raw = RawSettings::default();
    raw.apply_command_overrides(args.command.as_ref());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.export.pdf_layout, PdfLayout::A4);
}

#[test]
fn export_defaults_to_pdf_and_draft() {
    let args = CliArgs::parse_from(["markprint", "export"]);
    let Some(Command::Export(export)) = args.command else {
        panic!("expected export command");
    };
    assert_eq!(export.input, None);
    assert_eq!(export.format, "pdf");
    assert_eq!(export.theme, None);
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from(["markprint", "render", "README.md", "--word-count"]);
    let Some(Command::Render(render)) = args.command else {
        panic!("expected render command");
    };
    assert_eq!(render.input, Some(PathBuf::from("README.md")));
    assert!(render.word_count);
}

#[test]
fn parse_draft_and_theme_commands() {
    let args = CliArgs::parse_from([
        "markprint",
        "draft",
        "--workspace-directory",
        "/tmp/notes",
        "clear",
    ]);
    let Some(Command::Draft(draft)) = args.command.clone() else {
        panic!("expected draft command");
    };
    assert_eq!(draft.action, DraftAction::Clear);

    let mut raw = RawSettings::default();
    raw.apply_command_overrides(args.command.as_ref());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.workspace.directory, PathBuf::from("/tmp/notes"));

    let args = CliArgs::parse_from(["markprint", "theme", "toggle"]);
    let Some(Command::Theme(theme)) = args.command else {
        panic!("expected theme command");
    };
    assert_eq!(theme.action, ThemeAction::Toggle);
    assert_eq!(theme.workspace.workspace_directory, None);
}
