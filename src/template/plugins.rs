//! Plugin selection and the post-install removal audit
//!
//! Templates can ship optional plugins, each naming the module paths it
//! owns. Deselected plugins are only deleted from the materialized
//! project when the dependency graph shows nothing outside the
//! deselected set importing them.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::analysis::{ProjectAnalyzer, SOURCE_SUFFIX};
use crate::error::{GraftError, Result};

/// Key of the plugin table in a template config.
pub const PLUGINS_KEY: &str = "plugins";

/// One optional feature shipped by a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePlugin {
    pub name: String,
    pub about: String,
    /// Project-relative paths the plugin owns, each a module file or a
    /// package directory. Segment lists in the config become path
    /// components.
    pub module_paths: Vec<PathBuf>,
}

/// Read the plugin table from a template config.
///
/// Shape: `{"plugins": {name: {"about": str, "modulePath":
/// [[segment, ...], ...]}}}`. Missing fields degrade to empty values
/// instead of failing the install.
pub fn parse_plugins(config: &Value) -> Vec<TemplatePlugin> {
    let Some(table) = config.get(PLUGINS_KEY).and_then(Value::as_object) else {
        return Vec::new();
    };
    table
        .iter()
        .map(|(name, body)| TemplatePlugin {
            name: name.clone(),
            about: body
                .get("about")
                .and_then(Value::as_str)
                .unwrap_or("No Description")
                .to_string(),
            module_paths: body
                .get("modulePath")
                .and_then(Value::as_array)
                .map(|paths| paths.iter().filter_map(path_from_segments).collect())
                .unwrap_or_default(),
        })
        .collect()
}

fn path_from_segments(value: &Value) -> Option<PathBuf> {
    let segments = value.as_array()?;
    let mut path = PathBuf::new();
    for segment in segments {
        path.push(segment.as_str()?);
    }
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Partition of a template's plugins into kept and deselected.
#[derive(Debug, Default)]
pub struct PluginSelection {
    pub selected: Vec<TemplatePlugin>,
    pub deselected: Vec<TemplatePlugin>,
}

impl PluginSelection {
    /// Module paths of every deselected plugin.
    pub fn excluded_paths(&self) -> BTreeSet<PathBuf> {
        self.deselected
            .iter()
            .flat_map(|plugin| plugin.module_paths.iter().cloned())
            .collect()
    }
}

/// Choose which plugins to keep.
///
/// `--without` names win and skip the prompt, as does `assume_all`.
/// The interactive multiselect starts with every plugin selected and
/// accepts an empty selection.
pub fn select_plugins(
    plugins: Vec<TemplatePlugin>,
    without: &[String],
    assume_all: bool,
) -> Result<PluginSelection> {
    if plugins.is_empty() {
        return Ok(PluginSelection::default());
    }
    if !without.is_empty() {
        let (deselected, selected): (Vec<_>, Vec<_>) = plugins
            .into_iter()
            .partition(|plugin| without.contains(&plugin.name));
        return Ok(PluginSelection {
            selected,
            deselected,
        });
    }
    if assume_all {
        return Ok(PluginSelection {
            selected: plugins,
            deselected: Vec::new(),
        });
    }

    let mut multi = cliclack::multiselect("Project plugin options");
    for (index, plugin) in plugins.iter().enumerate() {
        multi = multi.item(index, &plugin.name, &plugin.about);
    }
    let keep: Vec<usize> = multi
        .initial_values((0..plugins.len()).collect())
        .required(false)
        .interact()
        .map_err(GraftError::Prompt)?;

    let mut selection = PluginSelection::default();
    for (index, plugin) in plugins.into_iter().enumerate() {
        if keep.contains(&index) {
            selection.selected.push(plugin);
        } else {
            selection.deselected.push(plugin);
        }
    }
    Ok(selection)
}

/// Outcome of the safety audit over deselected plugin paths.
#[derive(Debug, Default)]
pub struct PluginAudit {
    /// Paths with no importer outside the deselected set.
    pub removable: Vec<PathBuf>,
    /// Paths kept alive by importers outside the deselected set, with
    /// those importers.
    pub retained: Vec<(PathBuf, BTreeSet<PathBuf>)>,
}

/// Decide which deselected plugin paths can be deleted from a
/// materialized project.
///
/// Builds the project's dependency graph, then checks each excluded
/// path for importers of its dotted module name or of any module
/// nested beneath it. Importers that are themselves under an excluded
/// path do not block removal.
pub fn audit_excluded(project_root: &Path, selection: &PluginSelection) -> Result<PluginAudit> {
    let mut audit = PluginAudit::default();
    let excluded = selection.excluded_paths();
    if excluded.is_empty() {
        return Ok(audit);
    }

    let analyzer = ProjectAnalyzer::new(project_root);
    let graph = analyzer.build_graph()?;

    for path in &excluded {
        let dotted = dotted_module_path(path);
        let nested_prefix = format!("{dotted}.");
        let mut importers = BTreeSet::new();
        for (module, files) in graph.iter() {
            if module != &dotted && !module.starts_with(&nested_prefix) {
                continue;
            }
            importers.extend(
                files
                    .iter()
                    .filter(|file| !is_under_excluded(project_root, file, &excluded))
                    .cloned(),
            );
        }
        if importers.is_empty() {
            audit.removable.push(path.clone());
        } else {
            audit.retained.push((path.clone(), importers));
        }
    }
    Ok(audit)
}

/// Dotted module name of a plugin path; a `.py` suffix is dropped.
pub fn dotted_module_path(path: &Path) -> String {
    let segments: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let joined = segments.join(".");
    joined
        .strip_suffix(SOURCE_SUFFIX)
        .unwrap_or(&joined)
        .to_string()
}

fn is_under_excluded(project_root: &Path, file: &Path, excluded: &BTreeSet<PathBuf>) -> bool {
    let relative = file.strip_prefix(project_root).unwrap_or(file);
    excluded
        .iter()
        .any(|candidate| relative.starts_with(candidate) || relative == module_file_of(candidate))
}

/// Path of the module file a plugin path names; extensionless paths get
/// the source suffix appended.
fn module_file_of(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        let mut file = path.as_os_str().to_os_string();
        file.push(SOURCE_SUFFIX);
        PathBuf::from(file)
    }
}

/// Delete one removable plugin path under `target`. Directories are
/// removed whole; extensionless paths fall back to their module file.
/// A path that no longer exists is not an error.
pub fn remove_plugin_path(target: &Path, relative: &Path) -> Result<()> {
    let full = target.join(relative);
    if full.is_dir() {
        return fs::remove_dir_all(&full).map_err(|e| GraftError::io(&full, e));
    }
    if full.is_file() {
        return fs::remove_file(&full).map_err(|e| GraftError::io(&full, e));
    }
    let module_file = target.join(module_file_of(relative));
    if module_file.is_file() {
        return fs::remove_file(&module_file).map_err(|e| GraftError::io(&module_file, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn plugin(name: &str, paths: &[&str]) -> TemplatePlugin {
        TemplatePlugin {
            name: name.to_string(),
            about: String::new(),
            module_paths: paths.iter().map(PathBuf::from).collect(),
        }
    }

    fn write(dir: &TempDir, relative: &str, contents: &str) {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_parse_plugins_full_shape() {
        let config = json!({
            "plugins": {
                "stats": {
                    "about": "Usage metrics",
                    "modulePath": [["pkg", "stats.py"], ["pkg", "metrics"]]
                }
            }
        });
        let plugins = parse_plugins(&config);
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name, "stats");
        assert_eq!(plugins[0].about, "Usage metrics");
        assert_eq!(
            plugins[0].module_paths,
            vec![PathBuf::from("pkg/stats.py"), PathBuf::from("pkg/metrics")]
        );
    }

    #[test]
    fn test_parse_plugins_defaults() {
        let config = json!({"plugins": {"bare": {}}});
        let plugins = parse_plugins(&config);
        assert_eq!(plugins[0].about, "No Description");
        assert!(plugins[0].module_paths.is_empty());
    }

    #[test]
    fn test_parse_plugins_skips_malformed_paths() {
        let config = json!({
            "plugins": {
                "odd": {"modulePath": [["ok.py"], [], [1, 2], "not a list"]}
            }
        });
        let plugins = parse_plugins(&config);
        assert_eq!(plugins[0].module_paths, vec![PathBuf::from("ok.py")]);
    }

    #[test]
    fn test_parse_plugins_absent_table() {
        assert!(parse_plugins(&json!({})).is_empty());
        assert!(parse_plugins(&json!({"plugins": 7})).is_empty());
    }

    #[test]
    fn test_select_plugins_without_names() {
        let plugins = vec![plugin("a", &["a.py"]), plugin("b", &["b.py"])];
        let selection =
            select_plugins(plugins, &["b".to_string()], false).unwrap();
        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.selected[0].name, "a");
        assert_eq!(selection.deselected.len(), 1);
        assert_eq!(selection.deselected[0].name, "b");
    }

    #[test]
    fn test_select_plugins_assume_all() {
        let plugins = vec![plugin("a", &["a.py"]), plugin("b", &["b.py"])];
        let selection = select_plugins(plugins, &[], true).unwrap();
        assert_eq!(selection.selected.len(), 2);
        assert!(selection.deselected.is_empty());
    }

    #[test]
    fn test_excluded_paths_flatten_deselected() {
        let selection = PluginSelection {
            selected: vec![plugin("keep", &["keep.py"])],
            deselected: vec![plugin("a", &["a.py", "pkg/a2.py"]), plugin("b", &["b"])],
        };
        let excluded = selection.excluded_paths();
        assert_eq!(excluded.len(), 3);
        assert!(excluded.contains(&PathBuf::from("pkg/a2.py")));
        assert!(!excluded.contains(&PathBuf::from("keep.py")));
    }

    #[test]
    fn test_dotted_module_path() {
        assert_eq!(dotted_module_path(Path::new("pkg/stats.py")), "pkg.stats");
        assert_eq!(dotted_module_path(Path::new("pkg/metrics")), "pkg.metrics");
        assert_eq!(dotted_module_path(Path::new("single.py")), "single");
    }

    #[test]
    fn test_audit_removable_when_unimported() {
        let dir = TempDir::new().unwrap();
        write(&dir, "main.py", "import os\n");
        write(&dir, "stats.py", "x = 1\n");
        let selection = PluginSelection {
            selected: Vec::new(),
            deselected: vec![plugin("stats", &["stats.py"])],
        };
        let audit = audit_excluded(dir.path(), &selection).unwrap();
        assert_eq!(audit.removable, vec![PathBuf::from("stats.py")]);
        assert!(audit.retained.is_empty());
    }

    #[test]
    fn test_audit_retains_when_imported_outside() {
        let dir = TempDir::new().unwrap();
        write(&dir, "main.py", "import stats\n");
        write(&dir, "stats.py", "x = 1\n");
        let selection = PluginSelection {
            selected: Vec::new(),
            deselected: vec![plugin("stats", &["stats.py"])],
        };
        let audit = audit_excluded(dir.path(), &selection).unwrap();
        assert!(audit.removable.is_empty());
        assert_eq!(audit.retained.len(), 1);
        assert_eq!(audit.retained[0].0, PathBuf::from("stats.py"));
        assert!(audit.retained[0].1.contains(&dir.path().join("main.py")));
    }

    #[test]
    fn test_audit_ignores_importers_inside_excluded_set() {
        let dir = TempDir::new().unwrap();
        write(&dir, "main.py", "import os\n");
        write(&dir, "stats.py", "import helper\n");
        write(&dir, "helper.py", "x = 1\n");
        let selection = PluginSelection {
            selected: Vec::new(),
            deselected: vec![plugin("extras", &["stats.py", "helper.py"])],
        };
        let audit = audit_excluded(dir.path(), &selection).unwrap();
        assert_eq!(audit.removable.len(), 2);
        assert!(audit.retained.is_empty());
    }

    #[test]
    fn test_audit_submodule_import_blocks_package_removal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "main.py", "from metrics.engine import run\n");
        write(&dir, "metrics/__init__.py", "");
        write(&dir, "metrics/engine.py", "def run(): pass\n");
        let selection = PluginSelection {
            selected: Vec::new(),
            deselected: vec![plugin("metrics", &["metrics"])],
        };
        let audit = audit_excluded(dir.path(), &selection).unwrap();
        assert!(audit.removable.is_empty());
        assert_eq!(audit.retained.len(), 1);
    }

    #[test]
    fn test_audit_empty_selection_is_empty() {
        let dir = TempDir::new().unwrap();
        write(&dir, "main.py", "import os\n");
        let audit = audit_excluded(dir.path(), &PluginSelection::default()).unwrap();
        assert!(audit.removable.is_empty());
        assert!(audit.retained.is_empty());
    }

    #[test]
    fn test_remove_plugin_path_variants() {
        let dir = TempDir::new().unwrap();
        write(&dir, "solo.py", "");
        write(&dir, "pkg/__init__.py", "");
        write(&dir, "pkg/inner.py", "");
        write(&dir, "bare.py", "");

        remove_plugin_path(dir.path(), Path::new("solo.py")).unwrap();
        assert!(!dir.path().join("solo.py").exists());

        remove_plugin_path(dir.path(), Path::new("pkg")).unwrap();
        assert!(!dir.path().join("pkg").exists());

        remove_plugin_path(dir.path(), Path::new("bare")).unwrap();
        assert!(!dir.path().join("bare.py").exists());

        remove_plugin_path(dir.path(), Path::new("missing.py")).unwrap();
    }
}
