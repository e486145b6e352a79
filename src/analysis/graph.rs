//! Reverse dependency graph over local imports
//!
//! Keys are imported local modules by dotted path; values are the files
//! importing them. BTree containers keep iteration and serialization
//! deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;

use super::ProjectAnalyzer;
use super::origin::ModuleOrigin;
use super::tree::DirTreeNode;

/// Reverse index from an imported local module's dotted path to the set
/// of files that import it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyGraph {
    #[serde(flatten)]
    edges: BTreeMap<String, BTreeSet<PathBuf>>,
}

impl DependencyGraph {
    /// Files importing `module_path`, when any were recorded.
    pub fn importers(&self, module_path: &str) -> Option<&BTreeSet<PathBuf>> {
        self.edges.get(module_path)
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<PathBuf>)> {
        self.edges.iter()
    }

    fn record(&mut self, module_path: String, importer: PathBuf) {
        self.edges.entry(module_path).or_default().insert(importer);
    }
}

/// Build the reverse graph for the analyzer's project.
///
/// The traversal is pre-order depth-first over the cached project tree,
/// driven by an explicit stack with children pushed in reverse. Every
/// module leaf is extracted; each Local import contributes one edge
/// keyed by the import's dotted path. Duplicate imports from the same
/// file collapse through set semantics.
pub(crate) fn build(analyzer: &ProjectAnalyzer) -> Result<DependencyGraph> {
    let mut graph = DependencyGraph::default();
    let mut stack: Vec<(&DirTreeNode, PathBuf)> = vec![(
        analyzer.project_tree(),
        analyzer.project_root().to_path_buf(),
    )];

    while let Some((node, path)) = stack.pop() {
        match &node.children {
            None => {
                for item in analyzer.extract_imports(&path)? {
                    if item.origin == ModuleOrigin::Local {
                        graph.record(item.full_path, path.clone());
                    }
                }
            }
            Some(children) => {
                for child in children.iter().rev() {
                    stack.push((child, path.join(&child.name)));
                }
            }
        }
    }

    Ok(graph)
}
