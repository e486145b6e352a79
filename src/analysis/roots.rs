//! Import root resolution
//!
//! An import root is a directory whose tree participates in local module
//! resolution. The project root always qualifies; `PYTHONPATH` can add
//! more, but only paths inside the project count. Everything else on the
//! search path belongs to the interpreter installation and is already
//! covered by the static origin tables.

use std::env;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Environment variable listing additional import search paths.
pub const PYTHONPATH_VAR: &str = "PYTHONPATH";

/// Path segments that mark a search-path entry as part of a Python
/// environment rather than project source. `.venv` is matched by prefix
/// to cover suffixed layouts like `.venv310`.
const ENV_SEGMENTS: &[&str] = &[".tox", ".pytest_cache"];

/// Resolve the ordered list of import roots for a project.
///
/// The project root comes first, then `PYTHONPATH` entries in listed
/// order. Entries outside the project, entries inside environment
/// directories, empty entries, and duplicates are dropped. Relative
/// entries resolve against the project root, and containment is
/// decided on canonicalized paths, so a `..` segment cannot place a
/// root outside the project.
pub fn import_roots(project_root: &Path) -> Vec<PathBuf> {
    roots_from_search_path(project_root, env::var_os(PYTHONPATH_VAR))
}

fn roots_from_search_path(project_root: &Path, raw: Option<OsString>) -> Vec<PathBuf> {
    let mut roots = vec![project_root.to_path_buf()];
    let Some(raw) = raw else {
        return roots;
    };
    let resolved_root = resolved(project_root);

    for entry in env::split_paths(&raw) {
        if entry.as_os_str().is_empty() {
            continue;
        }
        let joined = if entry.is_absolute() {
            entry
        } else {
            project_root.join(entry)
        };
        let candidate = resolved(&joined);
        if !candidate.starts_with(&resolved_root) {
            continue;
        }
        if in_environment_dir(&candidate) {
            continue;
        }
        if candidate == resolved_root || roots.contains(&candidate) {
            continue;
        }
        roots.push(candidate);
    }

    roots
}

/// Canonical form used for containment checks. A path that cannot be
/// canonicalized, typically because it does not exist, is compared as
/// given.
fn resolved(path: &Path) -> PathBuf {
    match path.canonicalize() {
        Ok(resolved) => resolved,
        Err(_) => path.to_path_buf(),
    }
}

fn in_environment_dir(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with(".venv") || ENV_SEGMENTS.contains(&name.as_ref())
        }
        _ => false,
    })
}
