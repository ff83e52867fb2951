use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTML that has passed through the markdown renderer or its sanitiser.
///
/// The constructor is private to the render module: network input never becomes
/// `TrustedHtml` without being rendered from markdown or cleaned by ammonia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    pub(in crate::application::render) fn new(html: String) -> Self {
        Self(html)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// True when the fragment carries no visible markup at all.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TrustedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Markdown source handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub markdown: String,
}

impl RenderRequest {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
        }
    }
}

/// Deterministic rendering result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    pub html: TrustedHtml,
    /// Number of fenced or indented code blocks routed through the highlighter.
    pub code_blocks: u32,
    /// Whitespace-delimited words in the markdown source.
    pub word_count: usize,
}

impl RenderOutput {
    pub fn contains_code(&self) -> bool {
        self.code_blocks > 0
    }
}

/// Structured errors surfaced by the rendering pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("markdown parsing failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("document template failed: {message}")]
    Template { message: String },
}

/// Renders markdown into trusted HTML fragments.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError>;

    /// Clean an externally supplied HTML fragment so it may be embedded.
    fn sanitize_fragment(&self, html: &str) -> TrustedHtml;
}

/// Count whitespace-separated words, ignoring empty runs.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_ignores_repeated_whitespace() {
        assert_eq!(word_count("  hello \n\n world\tagain "), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n"), 0);
    }

    #[test]
    fn blank_fragments_are_detected() {
        assert!(TrustedHtml::new("  \n".into()).is_blank());
        assert!(!TrustedHtml::new("<p>x</p>".into()).is_blank());
    }
}
