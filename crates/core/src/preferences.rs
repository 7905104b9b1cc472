//! Client-local preferences stored next to the configuration.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::i18n::Locale;

/// Colour theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    /// Dark palette.
    Dark,
    /// Light palette.
    Light,
    /// Follow the terminal.
    #[default]
    System,
}

impl ThemeChoice {
    /// Concrete theme, consulting the terminal's `COLORFGBG` for `System`.
    pub fn resolve(self) -> ThemeChoice {
        self.resolve_with(std::env::var("COLORFGBG").ok().as_deref())
    }

    /// Concrete theme given a `COLORFGBG` value (`fg;bg`). Background colours
    /// 7 and 15 are light; anything else, or no hint, is dark.
    pub fn resolve_with(self, colorfgbg: Option<&str>) -> ThemeChoice {
        match self {
            ThemeChoice::System => {
                let background = colorfgbg
                    .and_then(|value| value.rsplit(';').next())
                    .and_then(|bg| bg.trim().parse::<u8>().ok());
                match background {
                    Some(7) | Some(15) => ThemeChoice::Light,
                    _ => ThemeChoice::Dark,
                }
            }
            concrete => concrete,
        }
    }

    /// Opposite of the resolved theme.
    pub fn toggled(self) -> ThemeChoice {
        match self.resolve() {
            ThemeChoice::Light => ThemeChoice::Dark,
            _ => ThemeChoice::Light,
        }
    }
}

/// Persisted language and theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Preferences {
    /// Language code; unsupported codes are read as Russian.
    #[serde(default)]
    pub language: String,
    /// Theme selection.
    #[serde(default)]
    pub theme: ThemeChoice,
}

impl Preferences {
    /// Load preferences, returning defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read preferences {}", path.display()))?;
        let prefs = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse preferences {}", path.display()))?;
        Ok(prefs)
    }

    /// Write preferences, creating parent directories if needed.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create preferences directory {}", parent.display())
            })?;
        }

        let serialized =
            serde_json::to_string_pretty(self).context("failed to serialize preferences")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write preferences {}", path.display()))
    }

    /// Interface locale.
    pub fn locale(&self) -> Locale {
        Locale::from_code(&self.language)
    }

    /// Select a locale.
    pub fn set_locale(&mut self, locale: Locale) {
        self.language = locale.code().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let prefs = Preferences::load(dir.path().join("preferences.json"))?;
        assert_eq!(prefs.locale(), Locale::Ru);
        assert_eq!(prefs.theme, ThemeChoice::System);
        Ok(())
    }

    #[test]
    fn round_trips_through_disk() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested/preferences.json");
        let mut prefs = Preferences::default();
        prefs.set_locale(Locale::En);
        prefs.theme = ThemeChoice::Light;
        prefs.persist(&path)?;

        let raw = fs::read_to_string(&path)?;
        assert!(raw.contains("\"light\""));
        assert_eq!(Preferences::load(&path)?, prefs);
        Ok(())
    }

    #[test]
    fn unsupported_language_reads_as_russian() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"language":"fr"}"#)?;
        let prefs = Preferences::load(&path)?;
        assert_eq!(prefs.locale(), Locale::Ru);
        assert_eq!(prefs.theme, ThemeChoice::System);
        Ok(())
    }

    #[test]
    fn system_theme_follows_terminal_hint() {
        assert_eq!(ThemeChoice::System.resolve_with(Some("0;15")), ThemeChoice::Light);
        assert_eq!(ThemeChoice::System.resolve_with(Some("15;0")), ThemeChoice::Dark);
        assert_eq!(ThemeChoice::System.resolve_with(None), ThemeChoice::Dark);
        assert_eq!(ThemeChoice::Light.resolve_with(Some("15;0")), ThemeChoice::Light);
    }

    #[test]
    fn toggle_flips_concrete_themes() {
        assert_eq!(ThemeChoice::Dark.toggled(), ThemeChoice::Light);
        assert_eq!(ThemeChoice::Light.toggled(), ThemeChoice::Dark);
    }
}
