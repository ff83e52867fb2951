use serde::{Deserialize, Serialize};

use crate::application::render::TrustedHtml;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratePdfRequest {
    pub html_content: Option<String>,
    pub markdown: Option<String>,
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateScreenshotRequest {
    pub html_content: Option<String>,
    pub markdown: Option<String>,
    pub theme: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderMarkdownRequest {
    pub markdown: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderMarkdownResponse {
    pub html: TrustedHtml,
    pub word_count: usize,
}
