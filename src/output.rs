//! Rendering for trees, import listings, and graphs

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::analysis::{DependencyGraph, DirTreeNode, ImportItem};

/// Format a module tree with box-drawing connectors and a summary line.
/// The root prints bare; every child carries a `(Package)` or `(Module)`
/// label.
pub fn format_tree(node: &DirTreeNode) -> String {
    let mut output = String::new();
    format_node(node, &mut output, "", true, true);
    let (packages, modules) = node.counts();
    output.push_str(&format!("\n{} packages, {} modules\n", packages, modules));
    output
}

fn format_node(
    node: &DirTreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    is_root: bool,
) {
    if is_root {
        output.push_str(&node.name);
        output.push('\n');
    } else {
        let connector = if is_last { "└── " } else { "├── " };
        let label = if node.is_module {
            " (Module)"
        } else {
            " (Package)"
        };
        output.push_str(prefix);
        output.push_str(connector);
        output.push_str(&node.name);
        output.push_str(label);
        output.push('\n');
    }

    let Some(children) = &node.children else {
        return;
    };
    let new_prefix = if is_root {
        String::new()
    } else if is_last {
        format!("{prefix}    ")
    } else {
        format!("{prefix}│   ")
    };
    for (i, child) in children.iter().enumerate() {
        let child_is_last = i == children.len() - 1;
        format_node(child, output, &new_prefix, child_is_last, false);
    }
}

/// Print a module tree to stdout, packages bold blue, modules plain,
/// labels dimmed.
pub fn print_tree(node: &DirTreeNode, use_color: bool) -> io::Result<()> {
    let mut stdout = stream(use_color);
    print_node(node, &mut stdout, "", true, true)?;
    let (packages, modules) = node.counts();
    writeln!(stdout)?;
    writeln!(stdout, "{} packages, {} modules", packages, modules)?;
    Ok(())
}

fn stream(use_color: bool) -> StandardStream {
    let choice = if use_color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn print_node(
    node: &DirTreeNode,
    stdout: &mut StandardStream,
    prefix: &str,
    is_last: bool,
    is_root: bool,
) -> io::Result<()> {
    if !is_root {
        let connector = if is_last { "└── " } else { "├── " };
        write!(stdout, "{}{}", prefix, connector)?;
    }
    if node.is_module {
        write!(stdout, "{}", node.name)?;
    } else {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
        write!(stdout, "{}", node.name)?;
        stdout.reset()?;
    }
    if !is_root {
        let label = if node.is_module {
            " (Module)"
        } else {
            " (Package)"
        };
        stdout.set_color(ColorSpec::new().set_dimmed(true))?;
        write!(stdout, "{}", label)?;
        stdout.reset()?;
    }
    writeln!(stdout)?;

    let Some(children) = &node.children else {
        return Ok(());
    };
    let new_prefix = if is_root {
        String::new()
    } else if is_last {
        format!("{prefix}    ")
    } else {
        format!("{prefix}│   ")
    };
    for (i, child) in children.iter().enumerate() {
        let child_is_last = i == children.len() - 1;
        print_node(child, stdout, &new_prefix, child_is_last, false)?;
    }
    Ok(())
}

/// Plain connector tree over arbitrary files, used for cache listings.
/// Missing or unreadable directories render as just their name.
pub fn format_file_tree(root: &Path) -> String {
    let mut output = String::new();
    let name = root
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string());
    output.push_str(&name);
    output.push('\n');
    append_dir_entries(root, &mut output, "");
    output
}

fn append_dir_entries(dir: &Path, output: &mut String, prefix: &str) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());
    let count = entries.len();
    for (i, entry) in entries.iter().enumerate() {
        let is_last = i == count - 1;
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(connector);
        output.push_str(&entry.file_name().to_string_lossy());
        output.push('\n');
        let path = entry.path();
        if path.is_dir() {
            let child_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };
            append_dir_entries(&path, output, &child_prefix);
        }
    }
}

/// Per-file import listing. File paths print relative to `root`; each
/// import shows its resolved name with relative-import dots, its
/// origin, and the dotted path when that differs from the name.
pub fn format_imports(root: &Path, by_file: &BTreeMap<PathBuf, Vec<ImportItem>>) -> String {
    let mut output = String::new();
    for (file, items) in by_file {
        let shown = file.strip_prefix(root).unwrap_or(file);
        output.push_str(&shown.display().to_string());
        output.push('\n');
        for item in items {
            let dots = ".".repeat(item.level as usize);
            output.push_str(&format!("    {dots}{} ({})", item.name, item.origin));
            if item.full_path != item.name {
                output.push_str(&format!(" from {}", item.full_path));
            }
            output.push('\n');
        }
    }
    output
}

/// Graph listing: one block per imported module, importers indented and
/// shown relative to `root`.
pub fn format_graph(root: &Path, graph: &DependencyGraph) -> String {
    if graph.is_empty() {
        return "no local imports\n".to_string();
    }
    let mut output = String::new();
    for (module, importers) in graph.iter() {
        let suffix = if importers.len() == 1 { "" } else { "s" };
        output.push_str(&format!(
            "{module}  ({} importer{suffix})\n",
            importers.len()
        ));
        for importer in importers {
            let shown = importer.strip_prefix(root).unwrap_or(importer);
            output.push_str(&format!("    {}\n", shown.display()));
        }
    }
    output
}

/// Print any serializable value as pretty-printed JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}
