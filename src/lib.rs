//! Graft - scaffold Python projects from templates, with import-aware plugin pruning

pub mod analysis;
pub mod cache;
pub mod error;
pub mod output;
pub mod template;

pub use analysis::{DependencyGraph, DirTreeNode, ImportItem, ModuleOrigin, ProjectAnalyzer};
pub use cache::TemplateCache;
pub use error::{GraftError, Result};
pub use output::print_json;
pub use template::{InstallOptions, InstallReport, RepoRef, TemplateArchive};
