//! Error types shared across the crate.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraftError>;

/// Everything that can go wrong while analyzing a project or
/// materializing a template.
#[derive(Debug, Error)]
pub enum GraftError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A Python source file failed to parse. Parse failures are fatal to
    /// analysis: a file whose AST we cannot read is a file whose imports
    /// we cannot classify.
    #[error("failed to parse {}: {details}", path.display())]
    Parse { path: PathBuf, details: String },

    #[error("template fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("invalid template archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid template config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("unsupported template url: {0}")]
    Url(String),

    #[error("no cached template at {}", path.display())]
    CacheMiss { path: PathBuf },

    #[error("{0}")]
    Template(String),

    #[error("prompt failed: {0}")]
    Prompt(#[source] io::Error),
}

impl GraftError {
    /// Wrap an IO error with the path that produced it.
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
