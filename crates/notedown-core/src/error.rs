//! Error types for configuring and loading the renderer.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while registering extensions, before any document is parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("unknown environment keyword `{0}` (expected one of: note, def, warn)")]
    UnknownEnvironment(String),
}

/// Errors raised while loading a `notedown.toml` configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
