//! Light and dark colour palettes shared by exported documents.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Colour scheme applied to an exported document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Class placed on the document root to select the palette.
    pub fn root_class(self) -> &'static str {
        self.as_str()
    }

    /// Literal background forced onto `html` and `body`.
    pub fn background(self) -> &'static str {
        self.palette().bg_primary
    }

    pub fn palette(self) -> &'static Palette {
        match self {
            Theme::Light => &LIGHT_PALETTE,
            Theme::Dark => &DARK_PALETTE,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Anything other than `dark` selects the light palette.
    pub fn from_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(DomainError::validation(format!(
                "unknown theme `{other}`, expected `light` or `dark`"
            ))),
        }
    }
}

/// A single CSS custom property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CssVar {
    pub name: &'static str,
    pub value: &'static str,
}

/// GitHub-flavoured colour palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub bg_primary: &'static str,
    pub bg_secondary: &'static str,
    pub text_primary: &'static str,
    pub text_secondary: &'static str,
    pub text_muted: &'static str,
    pub border_primary: &'static str,
    pub code_bg: &'static str,
    pub code_border: &'static str,
    pub blockquote_bg: &'static str,
    pub blockquote_border: &'static str,
    pub table_header_bg: &'static str,
    pub table_border: &'static str,
    pub accent_primary: &'static str,
}

impl Palette {
    pub fn variables(&self) -> [CssVar; 13] {
        [
            CssVar { name: "bg-primary", value: self.bg_primary },
            CssVar { name: "bg-secondary", value: self.bg_secondary },
            CssVar { name: "text-primary", value: self.text_primary },
            CssVar { name: "text-secondary", value: self.text_secondary },
            CssVar { name: "text-muted", value: self.text_muted },
            CssVar { name: "border-primary", value: self.border_primary },
            CssVar { name: "code-bg", value: self.code_bg },
            CssVar { name: "code-border", value: self.code_border },
            CssVar { name: "blockquote-bg", value: self.blockquote_bg },
            CssVar { name: "blockquote-border", value: self.blockquote_border },
            CssVar { name: "table-header-bg", value: self.table_header_bg },
            CssVar { name: "table-border", value: self.table_border },
            CssVar { name: "accent-primary", value: self.accent_primary },
        ]
    }
}

pub const LIGHT_PALETTE: Palette = Palette {
    bg_primary: "#ffffff",
    bg_secondary: "#f6f8fa",
    text_primary: "#24292f",
    text_secondary: "#656d76",
    text_muted: "#8b949e",
    border_primary: "#d1d9e0",
    code_bg: "#f6f8fa",
    code_border: "#d1d9e0",
    blockquote_bg: "#ddf4ff",
    blockquote_border: "#54aeff",
    table_header_bg: "#f6f8fa",
    table_border: "#d1d9e0",
    accent_primary: "#0969da",
};

pub const DARK_PALETTE: Palette = Palette {
    bg_primary: "#0d1117",
    bg_secondary: "#161b22",
    text_primary: "#f0f6fc",
    text_secondary: "#8b949e",
    text_muted: "#6e7681",
    border_primary: "#30363d",
    code_bg: "#161b22",
    code_border: "#30363d",
    blockquote_bg: "#0c2d6b",
    blockquote_border: "#1f6feb",
    table_header_bg: "#161b22",
    table_border: "#30363d",
    accent_primary: "#58a6ff",
};
