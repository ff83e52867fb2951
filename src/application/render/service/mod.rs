mod config;
mod highlight;
mod rewrite;

use comrak::{Arena, format_html, nodes::AstNode, parse_document};
use syntect::{dumps::from_uncompressed_data, html::ClassStyle, parsing::SyntaxSet};
use tracing::warn;

use crate::application::render::types::{
    RenderError, RenderOutput, RenderRequest, RenderService, TrustedHtml, word_count,
};

use config::{build_options, build_sanitizer};
use rewrite::rewrite_ast;

/// Immutable renderer configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Treat single newlines as `<br>`.
    pub line_breaks: bool,
    /// Route code blocks through syntect.
    pub highlight_code: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            line_breaks: true,
            highlight_code: true,
        }
    }
}

impl From<&crate::config::RenderSettings> for RendererConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            line_breaks: settings.line_breaks,
            highlight_code: settings.highlight_code,
        }
    }
}

/// Comrak-based GFM renderer with Syntect highlighting and Ammonia sanitisation.
pub struct ComrakRenderService {
    config: RendererConfig,
    options: comrak::Options<'static>,
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
    sanitizer: ammonia::Builder<'static>,
}

impl ComrakRenderService {
    pub fn new(config: RendererConfig) -> Self {
        let options = build_options(&config);
        let syntax_set = load_syntax_set();
        let class_style = ClassStyle::SpacedPrefixed { prefix: "syntax-" };
        let sanitizer = build_sanitizer();

        Self {
            config,
            options,
            syntax_set,
            class_style,
            sanitizer,
        }
    }

    fn rewrite_stage<'a>(&self, root: &'a AstNode<'a>) -> Result<u32, RenderError> {
        if !self.config.highlight_code {
            return Ok(count_code_blocks(root));
        }
        let outcome = rewrite_ast(root, &self.syntax_set, &self.class_style)?;
        Ok(outcome.code_blocks)
    }
}

impl Default for ComrakRenderService {
    fn default() -> Self {
        Self::new(RendererConfig::default())
    }
}

impl RenderService for ComrakRenderService {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, &request.markdown, &self.options);

        let code_blocks = self.rewrite_stage(root)?;
        let rendered_html = render_html_stage(root, &self.options)?;
        let html = self.sanitize_fragment(&rendered_html);

        Ok(RenderOutput {
            html,
            code_blocks,
            word_count: word_count(&request.markdown),
        })
    }

    fn sanitize_fragment(&self, html: &str) -> TrustedHtml {
        TrustedHtml::new(self.sanitizer.clean(html).to_string())
    }
}

fn load_syntax_set() -> SyntaxSet {
    let syntax_bytes = include_bytes!(env!("SYNTAX_PACK_FILE"));
    match from_uncompressed_data(syntax_bytes) {
        Ok(set) => set,
        Err(err) => {
            warn!(
                target = "markprint::render",
                error = %err,
                "bundled syntax pack unreadable, using syntect defaults"
            );
            SyntaxSet::load_defaults_newlines()
        }
    }
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, RenderError> {
    let mut html = String::new();
    format_html(root, options, &mut html).map_err(|err| RenderError::Markdown {
        message: err.to_string(),
    })?;
    Ok(html)
}

fn count_code_blocks<'a>(root: &'a AstNode<'a>) -> u32 {
    root.descendants()
        .filter(|node| matches!(node.data.borrow().value, comrak::nodes::NodeValue::CodeBlock(_)))
        .count() as u32
}
