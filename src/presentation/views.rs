use askama::{Error as AskamaError, Template};
use thiserror::Error;

use crate::domain::theme::{CssVar, DARK_PALETTE, LIGHT_PALETTE, Theme};

const SYNTAX_LIGHT_CSS: &str = include_str!(concat!(env!("OUT_DIR"), "/syntax-light.css"));
const SYNTAX_DARK_CSS: &str = include_str!(concat!(env!("OUT_DIR"), "/syntax-dark.css"));

const DOCUMENT_TITLE: &str = "Markdown Export";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }

    pub fn origin(&self) -> &'static str {
        self.source
    }
}

/// Standalone document wrapped around a rendered fragment for export.
#[derive(Template)]
#[template(path = "export_document.html")]
pub struct ExportDocumentTemplate<'a> {
    pub title: &'a str,
    pub theme_class: &'static str,
    pub background: &'static str,
    pub dark: bool,
    pub light_vars: [CssVar; 13],
    pub dark_vars: [CssVar; 13],
    pub syntax_css: &'static str,
    pub content: &'a str,
}

impl<'a> ExportDocumentTemplate<'a> {
    pub fn new(theme: Theme, content: &'a str) -> Self {
        Self {
            title: DOCUMENT_TITLE,
            theme_class: theme.root_class(),
            background: theme.background(),
            dark: theme == Theme::Dark,
            light_vars: LIGHT_PALETTE.variables(),
            dark_vars: DARK_PALETTE.variables(),
            syntax_css: syntax_css_for(theme),
            content,
        }
    }
}

pub fn syntax_css_for(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => SYNTAX_LIGHT_CSS,
        Theme::Dark => SYNTAX_DARK_CSS,
    }
}

pub fn render_template<T: Template>(template: T) -> Result<String, TemplateRenderError> {
    template.render().map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
    })
}
