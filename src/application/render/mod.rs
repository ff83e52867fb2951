//! Markdown rendering.
//!
//! The pipeline is pure: markdown in, sanitised HTML out. Code blocks are
//! highlighted by syntect before comrak serialises the tree, and everything is
//! cleaned by ammonia before it is wrapped in [`TrustedHtml`].

mod service;
mod types;

pub use service::{ComrakRenderService, RendererConfig};
pub use types::{
    RenderError, RenderOutput, RenderRequest, RenderService, TrustedHtml, word_count,
};
