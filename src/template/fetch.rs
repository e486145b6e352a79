//! Template fetching from repository hosting platforms
//!
//! A template reference is a plain repository URL. Only GitHub serves
//! archive downloads; the parser is platform-generic so the cache can
//! key entries by host.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{GraftError, Result};

/// `https://{host}/{owner}/{repo}` with optional `.git` or trailing
/// slash.
static REPO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://([A-Za-z0-9.-]+)/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$")
        .expect("REPO_URL regex is invalid")
});

/// The one host whose archive layout we know how to download.
pub const GITHUB_HOST: &str = "github.com";

const USER_AGENT: &str = concat!("graft/", env!("CARGO_PKG_VERSION"));

/// A parsed repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse a repository URL into its reference parts. Owner and name
    /// segments that would escape a directory layout (`.` or `..`) are
    /// rejected here so cache paths can trust them.
    pub fn parse(url: &str) -> Result<Self> {
        let caps = REPO_URL
            .captures(url.trim())
            .ok_or_else(|| GraftError::Url(url.to_string()))?;
        let owner = caps[2].to_string();
        let name = caps[3].to_string();
        if matches!(owner.as_str(), "." | "..") || matches!(name.as_str(), "." | "..") {
            return Err(GraftError::Url(url.to_string()));
        }
        Ok(Self {
            host: caps[1].to_string(),
            owner,
            name,
        })
    }

    pub fn is_github(&self) -> bool {
        self.host == GITHUB_HOST
    }

    /// URL of the default-branch zip archive.
    pub fn archive_url(&self) -> String {
        format!(
            "https://{}/{}/{}/archive/HEAD.zip",
            self.host, self.owner, self.name
        )
    }
}

/// Download the archive for a parsed reference into memory.
///
/// Non-success HTTP statuses are errors.
pub fn fetch_archive(repo: &RepoRef) -> Result<Vec<u8>> {
    if !repo.is_github() {
        return Err(GraftError::Template(format!(
            "cannot fetch from {}: only {} templates are supported",
            repo.host, GITHUB_HOST
        )));
    }
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()?;
    let response = client.get(repo.archive_url()).send()?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}
