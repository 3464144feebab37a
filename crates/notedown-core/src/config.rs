//! `notedown.toml`: page, math and render settings. Every key is optional.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::math::MathConfig;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!(
                "unknown theme `{}` (expected auto, light or dark)",
                other
            )),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotedownConfig {
    pub page: PageConfig,
    pub math: MathConfig,
    pub render: RenderConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    pub title: Option<String>,
    pub theme: Theme,
    pub inline_css: bool,
    /// Click-to-reveal behavior for hidden spans.
    pub reveal_script: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: None,
            theme: Theme::Auto,
            inline_css: true,
            reveal_script: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub highlight_code: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            highlight_code: true,
        }
    }
}

impl NotedownConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{NotedownConfig, Theme};
    use crate::error::ConfigError;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = NotedownConfig::from_toml_str("").expect("config");
        assert_eq!(config, NotedownConfig::default());
        assert!(config.page.inline_css);
        assert!(config.render.highlight_code);
        assert_eq!(config.math.tags, "ams");
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let text = r#"
[page]
title = "Lecture 3"
theme = "dark"

[math]
tags = "none"
"#;
        let config = NotedownConfig::from_toml_str(text).expect("config");
        assert_eq!(config.page.title.as_deref(), Some("Lecture 3"));
        assert_eq!(config.page.theme, Theme::Dark);
        assert!(config.page.reveal_script);
        assert_eq!(config.math.tags, "none");
        assert!(config.math.process_escapes);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = NotedownConfig::from_toml_str("[page]\ncolour = \"red\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn theme_parses_case_insensitively() {
        assert_eq!("Dark".parse::<Theme>(), Ok(Theme::Dark));
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.to_string(), "light");
    }
}
