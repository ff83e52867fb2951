use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::RenderError;

/// How the syntax for a block was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyntaxMatch {
    Declared,
    Detected,
    PlainText,
}

pub(crate) struct Highlighted {
    pub(crate) html: String,
    pub(crate) matched: SyntaxMatch,
}

pub(crate) fn highlight_code(
    language: Option<&str>,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<Highlighted, RenderError> {
    let (syntax, matched) = resolve_syntax(syntax_set, language, code);

    let mut code_with_newline = code.to_string();
    if !code_with_newline.ends_with('\n') {
        code_with_newline.push('\n');
    }

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, *class_style);

    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|err| RenderError::Highlighting {
                language: syntax.name.clone(),
                message: err.to_string(),
            })?;
    }

    let highlighted = generator.finalize();
    let html = match (matched, language) {
        (SyntaxMatch::Declared, Some(lang)) => {
            let lang = ammonia::clean_text(&lang.to_ascii_lowercase());
            format!(
                "<pre class=\"syntax-highlight\" data-language=\"{lang}\"><code class=\"language-{lang} syntax-code\">{highlighted}</code></pre>"
            )
        }
        _ => format!(
            "<pre class=\"syntax-highlight\"><code class=\"syntax-code\">{highlighted}</code></pre>"
        ),
    };

    Ok(Highlighted { html, matched })
}

/// Declared language first, then first-line detection, then plain text.
fn resolve_syntax<'a>(
    syntax_set: &'a SyntaxSet,
    language: Option<&str>,
    code: &str,
) -> (&'a SyntaxReference, SyntaxMatch) {
    if let Some(syntax) = language.and_then(|token| find_syntax(syntax_set, token)) {
        return (syntax, SyntaxMatch::Declared);
    }

    let first_line = code.lines().find(|line| !line.trim().is_empty());
    if let Some(syntax) = first_line.and_then(|line| syntax_set.find_syntax_by_first_line(line)) {
        return (syntax, SyntaxMatch::Detected);
    }

    (syntax_set.find_syntax_plain_text(), SyntaxMatch::PlainText)
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}
