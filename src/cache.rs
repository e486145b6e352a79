//! Offline template cache
//!
//! Cached templates live under `offline/template/{host}/{owner}/{name}/`
//! inside the cache root, each entry holding `meta.json` and, unless
//! cached reference-only, the archive bytes as `template.zip`. Entries
//! never expire; `cache-template` overwrites them in place.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GraftError, Result};
use crate::template::RepoRef;

/// Environment override for the cache root.
pub const CACHE_DIR_VAR: &str = "GRAFT_CACHE_DIR";

/// File holding a cached template's archive bytes.
pub const ARCHIVE_FILE: &str = "template.zip";

/// File holding a cached template's metadata.
pub const META_FILE: &str = "meta.json";

/// Metadata stored beside each cached archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntryMeta {
    pub name: String,
    pub owner: String,
    pub source_url: String,
    pub cached_at: DateTime<Utc>,
    /// False for reference-only entries cached without their archive.
    pub has_archive: bool,
}

/// Template cache rooted at `$GRAFT_CACHE_DIR`, or the platform cache
/// directory plus `graft/.cache`.
#[derive(Debug, Clone)]
pub struct TemplateCache {
    root: PathBuf,
}

impl TemplateCache {
    pub fn open() -> Result<Self> {
        if let Some(dir) = env::var_os(CACHE_DIR_VAR) {
            return Ok(Self {
                root: PathBuf::from(dir),
            });
        }
        dirs::cache_dir()
            .map(|dir| Self {
                root: dir.join("graft").join(".cache"),
            })
            .ok_or_else(|| {
                GraftError::Template("no cache directory available on this platform".to_string())
            })
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn templates_dir(&self) -> PathBuf {
        self.root.join("offline").join("template")
    }

    /// Directory of one cached template.
    pub fn entry_dir(&self, repo: &RepoRef) -> PathBuf {
        self.templates_dir()
            .join(&repo.host)
            .join(&repo.owner)
            .join(&repo.name)
    }

    /// Store a template entry: metadata always, archive bytes when
    /// given. Returns the entry directory.
    pub fn store(&self, repo: &RepoRef, source_url: &str, bytes: Option<&[u8]>) -> Result<PathBuf> {
        let dir = self.entry_dir(repo);
        fs::create_dir_all(&dir).map_err(|e| GraftError::io(&dir, e))?;
        if let Some(bytes) = bytes {
            let archive = dir.join(ARCHIVE_FILE);
            fs::write(&archive, bytes).map_err(|e| GraftError::io(&archive, e))?;
        }
        let meta = CacheEntryMeta {
            name: repo.name.clone(),
            owner: repo.owner.clone(),
            source_url: source_url.to_string(),
            cached_at: Utc::now(),
            has_archive: bytes.is_some(),
        };
        let meta_path = dir.join(META_FILE);
        let json = serde_json::to_string_pretty(&meta)?;
        fs::write(&meta_path, json).map_err(|e| GraftError::io(&meta_path, e))?;
        Ok(dir)
    }

    /// Load a cached archive by its `host/owner` source and template
    /// name.
    pub fn load(&self, source: &str, name: &str) -> Result<Vec<u8>> {
        let dir = self.templates_dir().join(source).join(name);
        let archive = dir.join(ARCHIVE_FILE);
        if !archive.is_file() {
            return Err(GraftError::CacheMiss { path: dir });
        }
        fs::read(&archive).map_err(|e| GraftError::io(&archive, e))
    }

    /// Read a cached entry's metadata.
    pub fn read_meta(&self, source: &str, name: &str) -> Result<CacheEntryMeta> {
        let path = self.templates_dir().join(source).join(name).join(META_FILE);
        let raw = fs::read_to_string(&path).map_err(|e| GraftError::io(&path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Directory listed by `show-cache`, optionally narrowed to a
    /// subdirectory of the cache root.
    pub fn listing_dir(&self, subdir: &str) -> PathBuf {
        if subdir.is_empty() {
            self.root.clone()
        } else {
            self.root.join(subdir)
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn demo_repo() -> RepoRef {
        RepoRef::parse("https://github.com/acme/demo").unwrap()
    }

    #[test]
    fn test_store_with_archive() {
        let dir = TempDir::new().unwrap();
        let cache = TemplateCache::with_root(dir.path().to_path_buf());
        let repo = demo_repo();

        let entry = cache
            .store(&repo, "https://github.com/acme/demo", Some(b"zip bytes"))
            .unwrap();

        assert_eq!(
            entry,
            dir.path()
                .join("offline/template/github.com/acme/demo")
        );
        assert!(entry.join(ARCHIVE_FILE).is_file());
        let meta = cache.read_meta("github.com/acme", "demo").unwrap();
        assert_eq!(meta.name, "demo");
        assert_eq!(meta.owner, "acme");
        assert!(meta.has_archive);
    }

    #[test]
    fn test_store_reference_only() {
        let dir = TempDir::new().unwrap();
        let cache = TemplateCache::with_root(dir.path().to_path_buf());
        let entry = cache
            .store(&demo_repo(), "https://github.com/acme/demo", None)
            .unwrap();

        assert!(!entry.join(ARCHIVE_FILE).exists());
        let meta = cache.read_meta("github.com/acme", "demo").unwrap();
        assert!(!meta.has_archive);
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = TemplateCache::with_root(dir.path().to_path_buf());
        cache
            .store(&demo_repo(), "https://github.com/acme/demo", Some(b"abc"))
            .unwrap();

        let bytes = cache.load("github.com/acme", "demo").unwrap();
        assert_eq!(bytes, b"abc");
    }

    #[test]
    fn test_load_miss() {
        let dir = TempDir::new().unwrap();
        let cache = TemplateCache::with_root(dir.path().to_path_buf());
        let err = cache.load("github.com/acme", "absent").unwrap_err();
        assert!(matches!(err, GraftError::CacheMiss { .. }));
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn test_listing_dir_narrows() {
        let dir = TempDir::new().unwrap();
        let cache = TemplateCache::with_root(dir.path().to_path_buf());
        assert_eq!(cache.listing_dir(""), dir.path());
        assert_eq!(
            cache.listing_dir("offline/template"),
            dir.path().join("offline/template")
        );
    }
}
