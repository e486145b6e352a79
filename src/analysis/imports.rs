//! Import extraction from Python sources
//!
//! Each file is parsed to a full syntax tree and every statement is
//! visited, including bodies nested inside functions, classes,
//! conditionals, loops, try blocks and match arms. An import behind an
//! `if` counts the same as one at the top of the file.

use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use rustpython_parser::{Mode, ast, parse};
use serde::Serialize;

use crate::error::{GraftError, Result};

use super::ProjectAnalyzer;
use super::origin::ModuleOrigin;

/// One recorded import clause.
///
/// `full_path` is the dotted module path as written in the source;
/// `name` is the short module name after resolution. `level` counts the
/// leading dots of a relative `from`-import, zero for absolute forms.
/// `parent` is reserved for parent-module tracking and is never
/// populated by the extractor.
#[derive(Debug, Clone, Serialize)]
pub struct ImportItem {
    pub name: String,
    pub origin: ModuleOrigin,
    pub full_path: String,
    pub parent: Option<String>,
    pub level: u32,
}

/// Identity is `(full_path, name)` only. Origin and level are derived
/// attributes and must not distinguish items.
impl PartialEq for ImportItem {
    fn eq(&self, other: &Self) -> bool {
        self.full_path == other.full_path && self.name == other.name
    }
}

impl Eq for ImportItem {}

impl Hash for ImportItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_path.hash(state);
        self.name.hash(state);
    }
}

/// Parse `file` and collect its import clauses in source order.
///
/// Parse failures are fatal: the error names the file and propagates.
pub(crate) fn extract_from_file(
    analyzer: &ProjectAnalyzer,
    file: &Path,
) -> Result<Vec<ImportItem>> {
    let source = fs::read_to_string(file).map_err(|e| GraftError::io(file, e))?;
    let parsed =
        parse(&source, Mode::Module, &file.to_string_lossy()).map_err(|err| GraftError::Parse {
            path: file.to_path_buf(),
            details: err.to_string(),
        })?;
    // Mode::Module always produces Mod::Module
    let body = match parsed {
        ast::Mod::Module(module) => module.body,
        _ => Vec::new(),
    };

    let mut items = Vec::new();
    let mut stack: Vec<&ast::Stmt> = Vec::new();
    push_suite(&mut stack, &body);
    while let Some(stmt) = stack.pop() {
        match stmt {
            ast::Stmt::Import(import) => {
                for alias in &import.names {
                    items.push(plain_import(analyzer, alias.name.as_str()));
                }
            }
            ast::Stmt::ImportFrom(import) => {
                if let Some(item) = from_import(analyzer, import) {
                    items.push(item);
                }
            }
            other => push_nested(&mut stack, other),
        }
    }
    Ok(items)
}

/// `import a.b.c` records the path as written: the short name is the
/// last segment, classification runs on the first.
fn plain_import(analyzer: &ProjectAnalyzer, dotted: &str) -> ImportItem {
    let root = dotted.split('.').next().unwrap_or(dotted);
    let leaf = dotted.rsplit('.').next().unwrap_or(dotted);
    ImportItem {
        name: leaf.to_string(),
        origin: analyzer.classify(root, dotted),
        full_path: dotted.to_string(),
        parent: None,
        level: 0,
    }
}

/// `from X import A, B` yields a single record for `X`; the imported
/// names are not recorded. Returns `None` when `X`'s root classifies
/// local but no root tree resolves the path, which drops that clause
/// from the result. A module-less relative form (`from . import x`)
/// carries an empty dotted path and classifies through the fallback.
fn from_import(analyzer: &ProjectAnalyzer, import: &ast::StmtImportFrom) -> Option<ImportItem> {
    let level = import.level.map(|l| l.to_u32()).unwrap_or(0);
    let full_path = import
        .module
        .as_ref()
        .map(|module| module.as_str())
        .unwrap_or_default()
        .to_string();
    let segments: Vec<&str> = full_path.split('.').collect();

    let name = if analyzer.classify(segments[0], &full_path) != ModuleOrigin::Local {
        segments[0].to_string()
    } else {
        let index = analyzer.resolve_in_roots(&segments)?;
        segments[index].to_string()
    };
    let origin = analyzer.classify(&name, &full_path);
    Some(ImportItem {
        name,
        origin,
        full_path,
        parent: None,
        level,
    })
}

fn push_suite<'a>(stack: &mut Vec<&'a ast::Stmt>, suite: &'a [ast::Stmt]) {
    for stmt in suite.iter().rev() {
        stack.push(stmt);
    }
}

/// Push the nested bodies of a compound statement, last suite first, so
/// statements pop in source order.
fn push_nested<'a>(stack: &mut Vec<&'a ast::Stmt>, stmt: &'a ast::Stmt) {
    let mut suites: Vec<&'a [ast::Stmt]> = Vec::new();
    match stmt {
        ast::Stmt::FunctionDef(s) => suites.push(&s.body),
        ast::Stmt::AsyncFunctionDef(s) => suites.push(&s.body),
        ast::Stmt::ClassDef(s) => suites.push(&s.body),
        ast::Stmt::For(s) => {
            suites.push(&s.body);
            suites.push(&s.orelse);
        }
        ast::Stmt::AsyncFor(s) => {
            suites.push(&s.body);
            suites.push(&s.orelse);
        }
        ast::Stmt::While(s) => {
            suites.push(&s.body);
            suites.push(&s.orelse);
        }
        ast::Stmt::If(s) => {
            suites.push(&s.body);
            suites.push(&s.orelse);
        }
        ast::Stmt::With(s) => suites.push(&s.body),
        ast::Stmt::AsyncWith(s) => suites.push(&s.body),
        ast::Stmt::Try(s) => {
            suites.push(&s.body);
            for handler in &s.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                suites.push(&handler.body);
            }
            suites.push(&s.orelse);
            suites.push(&s.finalbody);
        }
        ast::Stmt::TryStar(s) => {
            suites.push(&s.body);
            for handler in &s.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                suites.push(&handler.body);
            }
            suites.push(&s.orelse);
            suites.push(&s.finalbody);
        }
        ast::Stmt::Match(s) => {
            for case in &s.cases {
                suites.push(&case.body);
            }
        }
        _ => {}
    }
    for suite in suites.iter().rev() {
        push_suite(stack, suite);
    }
}
