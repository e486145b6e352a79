//! CLI entry point for graft

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use graft::analysis::ProjectAnalyzer;
use graft::cache::TemplateCache;
use graft::error::{GraftError, Result};
use graft::template::{self, GITHUB_HOST, InstallOptions, RepoRef};
use graft::{output, print_json};

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            // Respect FORCE_COLOR environment variable
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            // Respect TERM=dumb
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            // Check if stdout is a TTY
            std::io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "graft")]
#[command(about = "Scaffold Python projects from templates, with import-aware plugin pruning")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a project from a remote or cached template
    LoadTemplate(LoadArgs),

    /// Download a template into the offline cache
    CacheTemplate {
        /// Repository URL of the template
        template_url: String,

        /// Store only the reference metadata, not the archive
        #[arg(long = "only-ref")]
        only_ref: bool,
    },

    /// List the contents of the offline cache
    ShowCache {
        /// Cache subdirectory to list
        #[arg(default_value = "")]
        folder: String,
    },

    /// Analyze a Python project's modules and imports
    Inspect {
        /// Project root to analyze
        #[arg(default_value = ".")]
        path: PathBuf,

        /// List every file's imports with their origins
        #[arg(short = 'i', long = "imports")]
        imports: bool,

        /// Show the reverse dependency graph of local imports
        #[arg(short = 'g', long = "graph")]
        graph: bool,

        /// Output in JSON format
        #[arg(long = "json")]
        json: bool,

        /// Control color output: auto, always, never
        #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
        color: ColorMode,
    },
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Fetch the template from GitHub (the default source)
    #[arg(long, conflicts_with = "local")]
    github: bool,

    /// Load the template from the offline cache
    #[arg(long)]
    local: bool,

    /// Repository URL of the template
    #[arg(long = "template-url")]
    template_url: Option<String>,

    /// Cache source to load from, as host/owner
    #[arg(long)]
    source: Option<String>,

    /// Cached template name
    #[arg(long = "template-name")]
    template_name: Option<String>,

    /// Directory to create the project in
    #[arg(long = "project-name")]
    project_name: Option<String>,

    /// Write collected variables to .env in the new project
    #[arg(long)]
    env: bool,

    /// Deselect a plugin by name (can be used multiple times)
    #[arg(long, value_name = "PLUGIN")]
    without: Vec<String>,

    /// Accept defaults and keep every plugin not excluded
    #[arg(short = 'y', long)]
    yes: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("graft: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::LoadTemplate(args) => load_template(args),
        Command::CacheTemplate {
            template_url,
            only_ref,
        } => cache_template(&template_url, only_ref),
        Command::ShowCache { folder } => show_cache(&folder),
        Command::Inspect {
            path,
            imports,
            graph,
            json,
            color,
        } => inspect(&path, imports, graph, json, color),
    }
}

fn load_template(args: LoadArgs) -> Result<()> {
    cliclack::intro("graft load-template").map_err(GraftError::Prompt)?;

    let remote = if args.github {
        true
    } else if args.local || args.source.is_some() || args.template_name.is_some() {
        false
    } else if args.template_url.is_some() || args.yes {
        true
    } else {
        let choice: &str = cliclack::select("Load template from")
            .item("github", "GitHub", "fetch the repository archive")
            .item("cache", "Offline cache", "use a previously cached template")
            .interact()
            .map_err(GraftError::Prompt)?;
        choice == "github"
    };

    let bytes = if remote {
        let url = prompt_missing(
            args.template_url,
            "Template repository URL",
            "https://github.com/owner/repo",
        )?;
        let repo = RepoRef::parse(&url)?;
        let spinner = cliclack::spinner();
        spinner.start(format!("fetching {}", repo.archive_url()));
        match template::fetch_archive(&repo) {
            Ok(bytes) => {
                spinner.stop(format!("downloaded {}", repo.name));
                bytes
            }
            Err(err) => {
                spinner.stop("download failed");
                return Err(err);
            }
        }
    } else {
        let source = prompt_missing(args.source, "Source of the template", "github.com/owner")?;
        let name = prompt_missing(args.template_name, "Name of the template", "repo")?;
        let cache = TemplateCache::open()?;
        cliclack::log::info(format!("loading {source}/{name} from the offline cache"))
            .map_err(GraftError::Prompt)?;
        cache.load(&source, &name)?
    };

    let project = prompt_missing(args.project_name, "Project directory", "my-project")?;
    let target = PathBuf::from(&project);
    if target.exists() {
        return Err(GraftError::Template(format!(
            "target directory {project} already exists"
        )));
    }

    let options = InstallOptions {
        assume_defaults: args.yes,
        without: args.without,
        generate_env: args.env,
    };
    let report = template::install(bytes, &target, &options)?;

    cliclack::log::success(format!(
        "wrote {} files to {}",
        report.written.len(),
        target.display()
    ))
    .map_err(GraftError::Prompt)?;
    for path in &report.removed {
        cliclack::log::info(format!("removed deselected plugin path {}", path.display()))
            .map_err(GraftError::Prompt)?;
    }
    for (path, importers) in &report.retained {
        let names: Vec<String> = importers
            .iter()
            .map(|file| {
                file.strip_prefix(&target)
                    .unwrap_or(file)
                    .display()
                    .to_string()
            })
            .collect();
        cliclack::log::warning(format!(
            "kept deselected plugin path {}: imported by {}",
            path.display(),
            names.join(", ")
        ))
        .map_err(GraftError::Prompt)?;
    }
    if args.env {
        cliclack::log::info(format!("wrote {} variables to .env", report.env_vars.len()))
            .map_err(GraftError::Prompt)?;
    }

    cliclack::outro("done").map_err(GraftError::Prompt)?;
    Ok(())
}

fn prompt_missing(value: Option<String>, label: &str, placeholder: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    cliclack::input(label)
        .placeholder(placeholder)
        .interact()
        .map_err(GraftError::Prompt)
}

fn cache_template(url: &str, only_ref: bool) -> Result<()> {
    let repo = RepoRef::parse(url)?;
    if !repo.is_github() {
        return Err(GraftError::Template(format!(
            "cannot cache templates from {}: only {} is supported",
            repo.host, GITHUB_HOST
        )));
    }
    let cache = TemplateCache::open()?;
    let bytes = if only_ref {
        None
    } else {
        Some(template::fetch_archive(&repo)?)
    };
    let entry = cache.store(&repo, url, bytes.as_deref())?;
    println!("cached {} at {}", repo.name, entry.display());
    Ok(())
}

fn show_cache(folder: &str) -> Result<()> {
    let cache = TemplateCache::open()?;
    let dir = cache.listing_dir(folder);
    if !dir.exists() {
        println!("cache is empty ({})", dir.display());
        return Ok(());
    }
    print!("{}", output::format_file_tree(&dir));
    Ok(())
}

fn inspect(path: &Path, imports: bool, graph: bool, json: bool, color: ColorMode) -> Result<()> {
    let analyzer = ProjectAnalyzer::new(path);
    let show_tree = !imports && !graph;

    if json {
        let mut doc = serde_json::Map::new();
        if show_tree {
            doc.insert("tree".to_string(), serde_json::to_value(analyzer.project_tree())?);
        }
        if imports {
            let by_file = analyzer.file_imports()?;
            doc.insert("imports".to_string(), serde_json::to_value(&by_file)?);
        }
        if graph {
            let dependency_graph = analyzer.build_graph()?;
            doc.insert("graph".to_string(), serde_json::to_value(&dependency_graph)?);
        }
        return print_json(&serde_json::Value::Object(doc)).map_err(stdout_error);
    }

    if show_tree {
        output::print_tree(analyzer.project_tree(), should_use_color(color)).map_err(stdout_error)?;
    }
    if imports {
        print!("{}", output::format_imports(path, &analyzer.file_imports()?));
    }
    if graph {
        print!("{}", output::format_graph(path, &analyzer.build_graph()?));
    }
    Ok(())
}

fn stdout_error(err: std::io::Error) -> GraftError {
    GraftError::io(Path::new("<stdout>"), err)
}
