use markprint::application::export::build_document;
use markprint::application::render::{
    ComrakRenderService, RenderRequest, RenderService, RendererConfig, word_count,
};
use markprint::application::workspace::SAMPLE_MARKDOWN;
use markprint::domain::theme::Theme;

fn render(markdown: &str) -> String {
    ComrakRenderService::new(RendererConfig::default())
        .render(&RenderRequest::new(markdown))
        .expect("render succeeds")
        .html
        .into_string()
}

#[test]
fn task_lists_render_as_checkboxes() {
    let html = render("- [x] done\n- [ ] todo");
    assert!(html.contains("type=\"checkbox\""));
    assert!(html.contains("checked"));
    assert!(html.contains("task-list-item"));
}

#[test]
fn autolinks_are_created() {
    let html = render("see https://example.com for details");
    assert!(html.contains("href=\"https://example.com\""));
}

#[test]
fn nested_lists_keep_their_structure() {
    let html = render("- one\n  - two\n    - three");
    assert_eq!(html.matches("<ul>").count(), 3);
}

#[test]
fn fenced_code_without_language_is_still_wrapped() {
    let html = render("```\nplain words here\n```");
    assert!(html.contains("<pre class=\"syntax-highlight\">"));
    assert!(html.contains("plain words here"));
}

#[test]
fn declared_languages_are_kept_on_the_block() {
    let html = render("```python\ndef f():\n    return 1\n```");
    assert!(html.contains("data-language=\"python\""));
    assert!(html.contains("language-python"));
}

#[test]
fn javascript_urls_are_removed() {
    let html = render("[click](javascript:alert(1))");
    assert!(!html.contains("javascript:"));
}

#[test]
fn sample_document_renders_into_a_dark_export() {
    let service = ComrakRenderService::default();
    let output = service
        .render(&RenderRequest::new(SAMPLE_MARKDOWN))
        .expect("sample renders");
    assert!(output.contains_code());
    assert_eq!(output.word_count, word_count(SAMPLE_MARKDOWN));

    let document = build_document(&output.html, Theme::Dark).expect("document");
    assert!(document.as_str().contains("<table>"));
    assert!(document.as_str().contains("class=\"markdown-body\""));
}
