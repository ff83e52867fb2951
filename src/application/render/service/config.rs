use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;
use comrak::options::{ListStyleType, Options};

use super::RendererConfig;

pub(crate) fn build_options(config: &RendererConfig) -> Options<'static> {
    let mut options = Options::default();
    configure_extensions(&mut options, config);
    options
}

pub(crate) fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "abbr",
        "blockquote",
        "br",
        "code",
        "del",
        "details",
        "div",
        "em",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "img",
        "input",
        "ins",
        "kbd",
        "li",
        "ol",
        "p",
        "pre",
        "s",
        "section",
        "span",
        "strong",
        "sub",
        "summary",
        "sup",
        "table",
        "tbody",
        "td",
        "th",
        "thead",
        "tr",
        "u",
        "ul",
    ]);
    builder.tags(tags);

    let generic: HashSet<&'static str> = HashSet::from([
        "class",
        "id",
        "title",
        "lang",
        "dir",
        "aria-hidden",
        "aria-label",
        "role",
        "data-footnote-ref",
        "data-footnotes",
        "data-footnote-backref",
    ]);
    builder.generic_attributes(generic);

    builder.add_tag_attributes("a", &["target"]);
    builder.add_tag_attributes("img", &["width", "height", "alt", "loading"]);
    builder.add_tag_attributes("code", &["data-language"]);
    builder.add_tag_attributes("pre", &["data-language"]);
    builder.add_tag_attributes("th", &["align", "colspan", "rowspan", "scope"]);
    builder.add_tag_attributes("td", &["align", "colspan", "rowspan"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.add_tag_attributes("ol", &["start"]);

    builder.add_url_schemes(["http", "https", "mailto", "tel", "data"].iter().copied());

    builder
}

fn configure_extensions(options: &mut Options<'static>, config: &RendererConfig) {
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.superscript = false;

    let render = &mut options.render;
    render.hardbreaks = config.line_breaks;
    render.github_pre_lang = true;
    render.tasklist_classes = true;
    render.list_style = ListStyleType::Dash;
    render.r#unsafe = true;
    render.gfm_quirks = true;
}
