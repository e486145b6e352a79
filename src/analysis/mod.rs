//! Project analysis: source trees, import classification, dependency graph
//!
//! `ProjectAnalyzer` is the entry point. Construction resolves the
//! import roots, builds each root's tree exactly once, and probes the
//! Python environment; every classification and extraction afterwards
//! reuses that cached state, so analyzing a whole project touches each
//! directory a single time.

mod graph;
mod imports;
mod origin;
mod roots;
mod tree;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use graph::DependencyGraph;
pub use imports::ImportItem;
pub use origin::{ModuleOrigin, SitePackages, VIRTUAL_ENV_VAR};
pub use roots::{PYTHONPATH_VAR, import_roots};
pub use tree::{DirTreeNode, EXCLUDED_DIRS, INIT_FILE, SOURCE_SUFFIX, build_dir_tree};

use crate::error::Result;

use origin::{is_builtin_module, is_stdlib_module};

/// Analyzer for one project invocation.
#[derive(Debug)]
pub struct ProjectAnalyzer {
    project_root: PathBuf,
    // One tree per import root, in resolution order
    roots: Vec<(PathBuf, DirTreeNode)>,
    site_packages: SitePackages,
}

impl ProjectAnalyzer {
    pub fn new(project_root: &Path) -> Self {
        let roots = import_roots(project_root)
            .into_iter()
            .map(|root| {
                let tree = build_dir_tree(&root);
                (root, tree)
            })
            .collect();
        Self {
            project_root: project_root.to_path_buf(),
            roots,
            site_packages: SitePackages::discover(project_root),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Tree of the project root. `import_roots` always yields the
    /// project root first, so the first cached tree is it.
    pub fn project_tree(&self) -> &DirTreeNode {
        &self.roots[0].1
    }

    /// Classify a module by short name and dotted path.
    ///
    /// Checks run in priority order: built-in table, standard-library
    /// table, site-packages probe on the short name, then the local
    /// probe on the dotted path against every root tree. A module
    /// matching nothing falls back to built-in, which keeps unknowns
    /// out of the local graph.
    pub fn classify(&self, name: &str, full_path: &str) -> ModuleOrigin {
        if is_builtin_module(name) {
            return ModuleOrigin::BuiltIn;
        }
        if is_stdlib_module(name) {
            return ModuleOrigin::StandardLibrary;
        }
        if self.site_packages.contains_module(name) {
            return ModuleOrigin::Environment;
        }
        let segments: Vec<&str> = full_path.split('.').collect();
        if self
            .roots
            .iter()
            .any(|(_, tree)| tree.contains_module_path(&segments))
        {
            return ModuleOrigin::Local;
        }
        ModuleOrigin::BuiltIn
    }

    /// Resolve dotted segments against each root tree in order; the
    /// first root with a match wins.
    pub fn resolve_in_roots(&self, segments: &[&str]) -> Option<usize> {
        self.roots
            .iter()
            .find_map(|(_, tree)| tree.resolve_module_path(segments))
    }

    /// Imports of one file, in source order.
    pub fn extract_imports(&self, file: &Path) -> Result<Vec<ImportItem>> {
        imports::extract_from_file(self, file)
    }

    /// Imports of every module file under the project root, keyed by
    /// absolute file path.
    pub fn file_imports(&self) -> Result<BTreeMap<PathBuf, Vec<ImportItem>>> {
        let mut by_file = BTreeMap::new();
        let mut stack: Vec<(&DirTreeNode, PathBuf)> =
            vec![(self.project_tree(), self.project_root.clone())];
        while let Some((node, path)) = stack.pop() {
            match &node.children {
                None => {
                    let items = self.extract_imports(&path)?;
                    by_file.insert(path, items);
                }
                Some(children) => {
                    for child in children.iter().rev() {
                        stack.push((child, path.join(&child.name)));
                    }
                }
            }
        }
        Ok(by_file)
    }

    /// Reverse dependency graph of the project.
    pub fn build_graph(&self) -> Result<DependencyGraph> {
        graph::build(self)
    }
}
