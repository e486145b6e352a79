//! Template installation
//!
//! The install pipeline: open the archive, choose plugins, answer
//! config prompts, write every file, then audit the result's
//! dependency graph and delete the deselected plugin paths that
//! nothing else imports. Files land before the audit because an import
//! of an absent module never classifies as local, so pruning first
//! would hide real dependencies.

pub mod archive;
pub mod config;
pub mod fetch;
pub mod plugins;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use archive::{TEMPLATE_CONFIG_FILE, TemplateArchive};
pub use fetch::{GITHUB_HOST, RepoRef, fetch_archive};
pub use plugins::TemplatePlugin;

/// Knobs for one install run.
#[derive(Debug, Default, Clone)]
pub struct InstallOptions {
    /// Keep shipped defaults and every plugin instead of prompting.
    pub assume_defaults: bool,
    /// Plugins deselected by name on the command line.
    pub without: Vec<String>,
    /// Write collected env vars to `.env` in the target.
    pub generate_env: bool,
}

/// What an install did.
#[derive(Debug, Default)]
pub struct InstallReport {
    /// Files written, relative to the target.
    pub written: Vec<PathBuf>,
    /// Deselected plugin paths that were deleted.
    pub removed: Vec<PathBuf>,
    /// Deselected plugin paths kept because files outside the
    /// deselected set import them, with those importers.
    pub retained: Vec<(PathBuf, BTreeSet<PathBuf>)>,
    /// Env vars collected from the config.
    pub env_vars: Vec<(String, String)>,
}

/// Materialize template bytes into `target`.
pub fn install(bytes: Vec<u8>, target: &Path, options: &InstallOptions) -> Result<InstallReport> {
    let mut template = TemplateArchive::open(bytes)?;
    let mut template_config = template.config()?;

    let available = plugins::parse_plugins(&template_config);
    let selection =
        plugins::select_plugins(available, &options.without, options.assume_defaults)?;
    let env_vars = config::collect_inputs(&mut template_config, options.assume_defaults)?;

    let written = template.materialize(target)?;

    let audit = plugins::audit_excluded(target, &selection)?;
    for path in &audit.removable {
        plugins::remove_plugin_path(target, path)?;
    }

    if options.generate_env {
        config::write_env_file(target, &env_vars)?;
    }

    Ok(InstallReport {
        written,
        removed: audit.removable,
        retained: audit.retained,
        env_vars,
    })
}
