//! Editor workspace persisted between sessions: the last draft and the theme.

use std::{collections::HashMap, fmt::Display, sync::Mutex};

use thiserror::Error;
use tracing::warn;

use crate::domain::theme::Theme;

pub const CONTENT_KEY: &str = "markdownContent";
pub const THEME_KEY: &str = "theme";

/// Document shown when no draft has been saved yet.
pub const SAMPLE_MARKDOWN: &str = r#"# Welcome to the Markdown Exporter

Write **Markdown** on the left and watch the preview update.

## Features

- GitHub-flavored Markdown with tables and task lists
- Syntax highlighting for fenced code
- Light and dark themes
- Export to PDF, PNG or JPEG

## Code

```rust
fn main() {
    println!("Hello, world!");
}
```

## Table

| Format | Content-Type |
|--------|--------------|
| PDF    | application/pdf |
| PNG    | image/png |
| JPEG   | image/jpeg |

> Tip: single line breaks
> are kept as written.

- [x] Write Markdown
- [ ] Export it
"#;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("workspace persistence error: {0}")]
    Persistence(String),
    #[error("workspace data is corrupt: {message}")]
    Corrupt { message: String },
    #[error("workspace store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn from_persistence(err: impl Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

/// String key-value persistence for the workspace.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> T,
    ) -> Result<T, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut entries))
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.with_entries(|entries| {
            entries.remove(key);
        })
    }
}

/// Draft and theme persistence on top of a [`KeyValueStore`].
pub struct Workspace<S> {
    store: S,
    system_theme: Theme,
}

impl<S: KeyValueStore> Workspace<S> {
    pub fn new(store: S, system_theme: Theme) -> Self {
        Self {
            store,
            system_theme,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Last saved draft, or the sample document when none exists.
    pub fn draft(&self) -> Result<String, StoreError> {
        Ok(self
            .store
            .load(CONTENT_KEY)?
            .unwrap_or_else(|| SAMPLE_MARKDOWN.to_string()))
    }

    pub fn save_draft(&self, markdown: &str) -> Result<(), StoreError> {
        self.store.save(CONTENT_KEY, markdown)
    }

    pub fn clear_draft(&self) -> Result<(), StoreError> {
        self.store.remove(CONTENT_KEY)
    }

    /// Saved theme, falling back to the system preference.
    pub fn theme(&self) -> Result<Theme, StoreError> {
        let Some(stored) = self.store.load(THEME_KEY)? else {
            return Ok(self.system_theme);
        };
        match stored.parse::<Theme>() {
            Ok(theme) => Ok(theme),
            Err(err) => {
                warn!(
                    target = "markprint::workspace",
                    stored = %stored,
                    error = %err,
                    "ignoring unreadable theme preference"
                );
                Ok(self.system_theme)
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.store.save(THEME_KEY, theme.as_str())
    }

    pub fn toggle_theme(&self) -> Result<Theme, StoreError> {
        let next = self.theme()?.toggled();
        self.save_theme(next)?;
        Ok(next)
    }
}

/// Best-effort system colour scheme from the environment.
pub fn system_theme() -> Theme {
    let scheme = std::env::var("COLORFGBG").ok();
    detect_system_theme(scheme.as_deref())
}

/// `COLORFGBG` is `fg;bg`; background colours 0-6 and 8 are dark.
fn detect_system_theme(colorfgbg: Option<&str>) -> Theme {
    let background = colorfgbg
        .and_then(|value| value.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok());
    match background {
        Some(0..=6 | 8) => Theme::Dark,
        _ => Theme::Light,
    }
}
