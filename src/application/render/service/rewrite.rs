use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use syntect::html::ClassStyle;
use syntect::parsing::SyntaxSet;
use tracing::debug;

use crate::application::render::types::RenderError;

use super::highlight::{self, SyntaxMatch};

#[derive(Debug, Default)]
pub(crate) struct RewriteOutcome {
    pub(crate) code_blocks: u32,
}

/// Replace every code block with pre-highlighted HTML.
pub(crate) fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<RewriteOutcome, RenderError> {
    let mut walker = RewriteWalker {
        syntax_set,
        class_style,
        outcome: RewriteOutcome::default(),
    };
    walker.visit_nodes(root)?;
    Ok(walker.outcome)
}

struct RewriteWalker<'a> {
    syntax_set: &'a SyntaxSet,
    class_style: &'a ClassStyle,
    outcome: RewriteOutcome,
}

impl RewriteWalker<'_> {
    fn visit_nodes(&mut self, node: &AstNode<'_>) -> Result<(), RenderError> {
        if let Some((info, literal)) = extract_code_block(node) {
            let language = info.split_whitespace().next();
            let highlighted =
                highlight::highlight_code(language, &literal, self.syntax_set, self.class_style)?;

            if highlighted.matched == SyntaxMatch::Detected {
                debug!(
                    target = "markprint::render",
                    declared = language.unwrap_or(""),
                    "code block language detected from content"
                );
            }
            self.outcome.code_blocks += 1;

            let mut data = node.data.borrow_mut();
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: highlighted.html,
            });
            return Ok(());
        }

        let mut child = node.first_child();
        while let Some(next) = child {
            self.visit_nodes(next)?;
            child = next.next_sibling();
        }

        Ok(())
    }
}

fn extract_code_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    if let NodeValue::CodeBlock(block) = &data.value {
        let info = block.info.trim().to_string();
        let literal = block.literal.clone();
        Some((info, literal))
    } else {
        None
    }
}
