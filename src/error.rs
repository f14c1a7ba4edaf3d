//! Error types shared across the crate.

use std::path::PathBuf;

/// Failures that escape a request and end up in the router's generic handler.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// A filesystem operation failed for a reason other than permissions.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A response could not be assembled from the computed parts.
    #[error("failed to build response: {0}")]
    Http(#[from] hyper::http::Error),

    /// The configuration file or environment could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A configured listen address does not parse.
    #[error("invalid address: {0}")]
    Address(String),

    /// An `asis` file does not start with a usable status line and headers.
    #[error("malformed asis file {}: {reason}", path.display())]
    MalformedAsis { path: PathBuf, reason: String },
}

impl ServeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
