//! Directory tree construction for Python source layouts
//!
//! Every import root gets one tree, built once per invocation. Dotted
//! module paths are resolved against these trees to decide whether an
//! import is local to the project.

use std::fs;
use std::path::Path;

use serde::Serialize;

/// File suffix that marks a module leaf.
pub const SOURCE_SUFFIX: &str = ".py";

/// Marker file that makes a plain directory an importable package.
pub const INIT_FILE: &str = "__init__.py";

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".mypy_cache",
    ".ruff_cache",
    ".venv",
    "__pycache__",
    "build",
    "dist",
    "venv",
];

/// One node of a source tree: a package directory or a module file.
///
/// A node is a module leaf exactly when `children` is `None`; package
/// directories always carry `Some` children, possibly empty. The matcher
/// relies on that distinction, so leaves must never be given an empty vec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirTreeNode {
    pub name: String,
    pub is_module: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DirTreeNode>>,
}

impl DirTreeNode {
    fn module(name: String) -> Self {
        Self {
            name,
            is_module: true,
            children: None,
        }
    }

    /// Resolve a dotted module path (already split into segments) against
    /// this tree.
    ///
    /// Walks down one segment per level: a segment matches a package child
    /// by name, or a module child by `name + ".py"`. Returns the index of
    /// the deepest matched segment, or `None` when the path leaves the
    /// tree. Reaching a module leaf ends the walk, so the walk can stop
    /// one segment short of the requested depth; a package directory with
    /// no matching terminal file does not count as a match.
    pub fn resolve_module_path(&self, segments: &[&str]) -> Option<usize> {
        let mut node = self;
        let mut index = 0usize;
        loop {
            let children = match &node.children {
                None => return index.checked_sub(1),
                Some(children) => children,
            };
            let segment = *segments.get(index)?;
            let wanted_module = format!("{segment}{SOURCE_SUFFIX}");
            node = children.iter().find(|child| {
                if child.is_module {
                    child.name == wanted_module
                } else {
                    child.name == segment
                }
            })?;
            index += 1;
        }
    }

    /// True when the dotted path names an importable module under this
    /// tree: either a module file, or a package directory carrying an
    /// `__init__.py`.
    ///
    /// This is the classifier's notion of "local" and is deliberately
    /// looser than [`resolve_module_path`]: a bare package import like
    /// `from pkg import thing` is local here even though the matcher,
    /// which needs a terminal file to name, reports no match for it.
    ///
    /// [`resolve_module_path`]: DirTreeNode::resolve_module_path
    pub fn contains_module_path(&self, segments: &[&str]) -> bool {
        let Some((last, descend)) = segments.split_last() else {
            return false;
        };
        let mut node = self;
        for segment in descend {
            let Some(children) = &node.children else {
                return false;
            };
            match children
                .iter()
                .find(|child| !child.is_module && child.name == *segment)
            {
                Some(child) => node = child,
                None => return false,
            }
        }
        let Some(children) = &node.children else {
            return false;
        };
        let wanted_module = format!("{last}{SOURCE_SUFFIX}");
        children.iter().any(|child| {
            if child.is_module {
                child.name == wanted_module
            } else {
                child.name == *last && has_init(child)
            }
        })
    }

    /// Count of (packages, modules) below this node, the node itself
    /// excluded.
    pub fn counts(&self) -> (usize, usize) {
        let mut packages = 0;
        let mut modules = 0;
        let mut stack: Vec<&DirTreeNode> = vec![self];
        while let Some(node) = stack.pop() {
            if let Some(children) = &node.children {
                for child in children {
                    if child.is_module {
                        modules += 1;
                    } else {
                        packages += 1;
                    }
                    stack.push(child);
                }
            }
        }
        (packages, modules)
    }
}

/// Build the source tree rooted at `root`.
///
/// Only `.py` files appear as leaves. Excluded directories are pruned
/// whole; the name check applies at each level of the walk, never to
/// ancestors above the root. Symlinks, unreadable directories, and
/// entries that vanish mid-walk are skipped without error, so the root
/// always yields a node.
pub fn build_dir_tree(root: &Path) -> DirTreeNode {
    let name = root
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());
    DirTreeNode {
        name,
        is_module: false,
        children: Some(read_children(root)),
    }
}

fn read_children(path: &Path) -> Vec<DirTreeNode> {
    let mut children = Vec::new();
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => return children,
    };

    let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|a| a.file_name());

    for entry in entries {
        let entry_path = entry.path();
        // Skip symlinks to keep the walk loop-free
        if entry_path.is_symlink() {
            continue;
        }
        let entry_name = entry.file_name().to_string_lossy().to_string();
        if EXCLUDED_DIRS.contains(&entry_name.as_str()) {
            continue;
        }
        if entry_path.is_file() {
            if has_source_suffix(&entry_name) {
                children.push(DirTreeNode::module(entry_name));
            }
        } else if entry_path.is_dir() {
            children.push(DirTreeNode {
                name: entry_name,
                is_module: false,
                children: Some(read_children(&entry_path)),
            });
        }
    }

    children
}

fn has_source_suffix(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("py"))
}

fn has_init(node: &DirTreeNode) -> bool {
    node.children.as_ref().is_some_and(|children| {
        children
            .iter()
            .any(|child| child.is_module && child.name == INIT_FILE)
    })
}
