//! Module origin classification
//!
//! Imports classify into four origins, checked in priority order:
//! built-in, standard library, environment (site-packages), then local.
//! The first match wins. Classification is static: no Python interpreter
//! is consulted, so the built-in and standard-library sets are fixed
//! tables and environment membership is a filesystem probe.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Where an imported module comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleOrigin {
    BuiltIn,
    StandardLibrary,
    Environment,
    Local,
}

impl ModuleOrigin {
    /// Human-readable label used in listings.
    pub fn label(self) -> &'static str {
        match self {
            ModuleOrigin::BuiltIn => "built-in",
            ModuleOrigin::StandardLibrary => "standard library",
            ModuleOrigin::Environment => "environment",
            ModuleOrigin::Local => "local",
        }
    }
}

impl fmt::Display for ModuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Environment variable naming the active virtual environment.
pub const VIRTUAL_ENV_VAR: &str = "VIRTUAL_ENV";

/// Modules compiled into the CPython interpreter itself, per a typical
/// `sys.builtin_module_names` on Linux.
const PYTHON_BUILTINS: &[&str] = &[
    "_abc", "_ast", "_codecs", "_collections", "_functools", "_imp", "_io", "_locale",
    "_operator", "_signal", "_sre", "_stat", "_string", "_symtable", "_thread", "_tokenize",
    "_tracemalloc", "_typing", "_warnings", "_weakref", "atexit", "builtins", "errno",
    "faulthandler", "gc", "itertools", "marshal", "posix", "pwd", "sys", "time",
];

/// Standard library module names across recent CPython versions.
const PYTHON_STDLIB: &[&str] = &[
    "abc", "aifc", "argparse", "array", "ast", "asynchat", "asyncio", "asyncore", "atexit",
    "audioop", "base64", "bdb", "binascii", "bisect", "builtins", "bz2", "calendar", "cgi",
    "cgitb", "chunk", "cmath", "cmd", "code", "codecs", "codeop", "collections", "colorsys",
    "compileall", "concurrent", "configparser", "contextlib", "contextvars", "copy", "copyreg",
    "cProfile", "crypt", "csv", "ctypes", "curses", "dataclasses", "datetime", "dbm", "decimal",
    "difflib", "dis", "distutils", "doctest", "email", "encodings", "enum", "errno",
    "faulthandler", "fcntl", "filecmp", "fileinput", "fnmatch", "fractions", "ftplib",
    "functools", "gc", "getopt", "getpass", "gettext", "glob", "graphlib", "grp", "gzip",
    "hashlib", "heapq", "hmac", "html", "http", "imaplib", "imghdr", "importlib", "inspect",
    "io", "ipaddress", "itertools", "json", "keyword", "linecache", "locale", "logging", "lzma",
    "mailbox", "mailcap", "marshal", "math", "mimetypes", "mmap", "modulefinder",
    "multiprocessing", "netrc", "nntplib", "numbers", "operator", "optparse", "os", "pathlib",
    "pdb", "pickle", "pickletools", "pipes", "pkgutil", "platform", "plistlib", "poplib",
    "posix", "pprint", "profile", "pstats", "pty", "pwd", "pyclbr", "pydoc", "queue", "quopri",
    "random", "re", "readline", "reprlib", "resource", "rlcompleter", "runpy", "sched",
    "secrets", "select", "selectors", "shelve", "shlex", "shutil", "signal", "site", "smtpd",
    "smtplib", "sndhdr", "socket", "socketserver", "sqlite3", "ssl", "stat", "statistics",
    "string", "stringprep", "struct", "subprocess", "sunau", "symtable", "sys", "sysconfig",
    "syslog", "tabnanny", "tarfile", "telnetlib", "tempfile", "termios", "textwrap",
    "threading", "time", "timeit", "tkinter", "token", "tokenize", "tomllib", "trace",
    "traceback", "tracemalloc", "tty", "turtle", "types", "typing", "unicodedata", "unittest",
    "urllib", "uu", "uuid", "venv", "warnings", "wave", "weakref", "webbrowser", "winreg",
    "winsound", "wsgiref", "xdrlib", "xml", "xmlrpc", "zipapp", "zipfile", "zipimport", "zlib",
    "zoneinfo",
];

pub fn is_builtin_module(name: &str) -> bool {
    PYTHON_BUILTINS.contains(&name)
}

pub fn is_stdlib_module(name: &str) -> bool {
    PYTHON_STDLIB.contains(&name)
}

/// Site-packages directories discovered for a project.
///
/// `$VIRTUAL_ENV` is probed when set; `.venv` and `venv` under the
/// project root are probed either way. Both the Unix
/// `lib/pythonX.Y/site-packages` and the Windows `Lib/site-packages`
/// layouts are recognized.
#[derive(Debug, Clone, Default)]
pub struct SitePackages {
    dirs: Vec<PathBuf>,
}

impl SitePackages {
    pub fn discover(project_root: &Path) -> Self {
        let mut envs: Vec<PathBuf> = Vec::new();
        if let Some(active) = env::var_os(VIRTUAL_ENV_VAR) {
            envs.push(PathBuf::from(active));
        }
        envs.push(project_root.join(".venv"));
        envs.push(project_root.join("venv"));
        Self::from_env_dirs(&envs)
    }

    fn from_env_dirs(envs: &[PathBuf]) -> Self {
        let mut dirs = Vec::new();
        for env_dir in envs {
            let pattern = env_dir.join("lib").join("python*").join("site-packages");
            if let Ok(matches) = glob::glob(&pattern.to_string_lossy()) {
                for site in matches.flatten() {
                    if site.is_dir() && !dirs.contains(&site) {
                        dirs.push(site);
                    }
                }
            }
            let windows_site = env_dir.join("Lib").join("site-packages");
            if windows_site.is_dir() && !dirs.contains(&windows_site) {
                dirs.push(windows_site);
            }
        }
        Self { dirs }
    }

    /// True when `name.py` or a `name/` package exists in any discovered
    /// site-packages directory. The empty name never matches; probing it
    /// would degenerate to the site-packages directory itself.
    pub fn contains_module(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        self.dirs.iter().any(|site| {
            site.join(format!("{name}{}", super::tree::SOURCE_SUFFIX))
                .is_file()
                || site.join(name).is_dir()
        })
    }
}
