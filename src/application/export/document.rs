use crate::{
    application::render::{RenderError, TrustedHtml},
    domain::theme::Theme,
    presentation::views::{ExportDocumentTemplate, render_template},
};

/// Complete standalone HTML document handed to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledDocument {
    html: String,
    theme: Theme,
}

impl StyledDocument {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }
}

/// Wrap a trusted fragment in the themed export template.
///
/// The fragment is embedded verbatim; trust was established when it was rendered.
pub fn build_document(fragment: &TrustedHtml, theme: Theme) -> Result<StyledDocument, RenderError> {
    let template = ExportDocumentTemplate::new(theme, fragment.as_str());
    let html = render_template(template).map_err(|err| RenderError::Template {
        message: format!("{}: {}", err.origin(), err.error),
    })?;

    Ok(StyledDocument { html, theme })
}
