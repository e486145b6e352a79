//! In-memory template archives
//!
//! GitHub repository archives arrive as a zip whose entries all live
//! under a single `{repo}-{ref}/` root directory. Materialization
//! strips that root and writes file contents verbatim.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{GraftError, Result};

/// Name of the optional template manifest at the archive root.
pub const TEMPLATE_CONFIG_FILE: &str = "templateConfig.json";

/// A template archive held in memory.
#[derive(Debug)]
pub struct TemplateArchive {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    root: String,
}

impl TemplateArchive {
    /// Open a zip from raw bytes and locate its root directory.
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        if archive.is_empty() {
            return Err(GraftError::Template(
                "template archive is empty".to_string(),
            ));
        }
        let first = archive.by_index(0)?.name().to_string();
        let root = first.split('/').next().unwrap_or_default().to_string();
        Ok(Self { archive, root })
    }

    /// The top-level directory the archive's entries live under.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Parse `templateConfig.json` from the archive root. A template
    /// without one yields an empty config object.
    pub fn config(&mut self) -> Result<serde_json::Value> {
        let entry = format!("{}/{}", self.root, TEMPLATE_CONFIG_FILE);
        let mut raw = String::new();
        match self.archive.by_name(&entry) {
            Ok(mut file) => {
                file.read_to_string(&mut raw)
                    .map_err(|e| GraftError::io(Path::new(&entry), e))?;
            }
            Err(ZipError::FileNotFound) => return Ok(serde_json::json!({})),
            Err(err) => return Err(err.into()),
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write every regular file into `target` with the root prefix
    /// stripped, creating parent directories as needed. Directory
    /// entries, the config manifest, and entries whose names would
    /// escape the target are skipped. Returns the written paths
    /// relative to `target`.
    pub fn materialize(&mut self, target: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let Some(enclosed) = file.enclosed_name() else {
                continue;
            };
            let relative = match enclosed.strip_prefix(&self.root) {
                Ok(stripped) => stripped.to_path_buf(),
                Err(_) => enclosed,
            };
            if relative.as_os_str().is_empty() || relative.ends_with(TEMPLATE_CONFIG_FILE) {
                continue;
            }
            let dest = target.join(&relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| GraftError::io(parent, e))?;
            }
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)
                .map_err(|e| GraftError::io(&dest, e))?;
            fs::write(&dest, &contents).map_err(|e| GraftError::io(&dest, e))?;
            written.push(relative);
        }
        Ok(written)
    }
}
