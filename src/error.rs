//! Error types for policy loading.
//!
//! The scanning engine itself never fails: malformed rules, oversized files,
//! and unreadable files all degrade into narrower decisions. Only the ambient
//! configuration layer returns [`Error`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving a [`PolicyConfig`](crate::config::PolicyConfig).
#[derive(Debug, Error)]
pub enum Error {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The config file exists but could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for a policy.
    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A scan mode name that is not one of the built-in presets.
    #[error("Invalid mode '{0}'. Use default, strict, or permissive.")]
    UnknownMode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
