use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory names that are never descended into
pub const SKIP_DIRS: &[&str] = &[
    ".git",
    "venv",
    ".venv",
    "env",
    ".env",
    "envs",
    "node_modules",
    "__pycache__",
    "build",
    "dist",
    ".idea",
    ".vscode",
    "site-packages",
];

/// File name of the manifest this tool reads and writes
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Extension of scannable source files
pub const SOURCE_EXTENSION: &str = "py";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to build glob pattern: {0}")]
    GlobError(#[from] globset::Error),
    #[error("Failed to parse {path}: {source}")]
    TomlError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Configuration for scanning
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directory to scan
    pub root: PathBuf,
    /// Directory names excluded in addition to [`SKIP_DIRS`]
    pub exclude_dirs: Vec<String>,
    /// Additional ignore patterns (glob style)
    pub ignore_patterns: Vec<String>,
    /// Python interpreter used to snapshot the environment
    pub python: Option<PathBuf>,
    /// Number of threads (0 = auto)
    pub threads: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            exclude_dirs: vec![],
            ignore_patterns: vec![],
            python: None,
            threads: 0,
        }
    }
}

impl ScanConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    pub fn with_exclude_dirs(mut self, dirs: Vec<String>) -> Self {
        self.exclude_dirs = dirs;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_python(mut self, python: PathBuf) -> Self {
        self.python = Some(python);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Layer settings from `[tool.reqscan]` underneath the explicit ones.
    ///
    /// List values are concatenated (file first); scalar values only apply
    /// when the explicit config left them unset.
    pub fn with_file_config(mut self, file: FileConfig) -> Self {
        let mut exclude_dirs = file.exclude;
        exclude_dirs.append(&mut self.exclude_dirs);
        self.exclude_dirs = exclude_dirs;

        let mut ignore_patterns = file.ignore;
        ignore_patterns.append(&mut self.ignore_patterns);
        self.ignore_patterns = ignore_patterns;

        if self.python.is_none() {
            self.python = file.python.map(|python| {
                if python.is_relative() && python.components().count() > 1 {
                    self.root.join(python)
                } else {
                    python
                }
            });
        }
        if self.threads == 0 {
            self.threads = file.threads.unwrap_or(0);
        }
        self
    }

    /// Layer `[tool.reqscan]` from `<root>/pyproject.toml` when it is usable.
    ///
    /// A pyproject that cannot be read or parsed is logged and ignored.
    pub fn with_project_file(self) -> Self {
        match FileConfig::load(&self.root) {
            Ok(Some(file)) => {
                debug!("Using [tool.reqscan] from pyproject.toml");
                self.with_file_config(file)
            }
            Ok(None) => self,
            Err(err) => {
                warn!("Ignoring [tool.reqscan] settings: {}", err);
                self
            }
        }
    }
}

/// The `[tool.reqscan]` table of a project's `pyproject.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub exclude: Vec<String>,
    pub ignore: Vec<String>,
    pub python: Option<PathBuf>,
    pub threads: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Option<ToolTable>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolTable {
    #[serde(default)]
    reqscan: Option<FileConfig>,
}

impl FileConfig {
    /// Read `[tool.reqscan]` from `<root>/pyproject.toml`, if both exist
    pub fn load(root: &Path) -> Result<Option<Self>, ConfigError> {
        let path = root.join("pyproject.toml");
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let file = Self::from_pyproject(&content)
            .map_err(|source| ConfigError::TomlError { path, source })?;
        if let Some(file) = &file {
            for pattern in &file.ignore {
                Glob::new(pattern)?;
            }
        }
        Ok(file)
    }

    fn from_pyproject(content: &str) -> Result<Option<Self>, toml::de::Error> {
        let pyproject: PyProject = toml::from_str(content)?;
        Ok(pyproject.tool.and_then(|tool| tool.reqscan))
    }
}

/// Check whether a directory is a self-contained virtual environment
pub fn is_virtual_env(dir: &Path) -> bool {
    dir.join("pyvenv.cfg").exists()
        || dir.join("bin").join("python").exists()
        || dir.join("Scripts").join("python.exe").exists()
}

/// Decides which directories and files the walker skips
#[derive(Debug)]
pub struct ExcludeFilter {
    root: PathBuf,
    skip_dirs: HashSet<String>,
    ignore_globs: GlobSet,
}

impl ExcludeFilter {
    pub fn new(config: &ScanConfig) -> Result<Self, ConfigError> {
        let skip_dirs = SKIP_DIRS
            .iter()
            .map(|dir| dir.to_string())
            .chain(config.exclude_dirs.iter().cloned())
            .collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            root: config.root.clone(),
            skip_dirs,
            ignore_globs: builder.build()?,
        })
    }

    /// Check if a directory below the root should be pruned
    pub fn is_excluded_dir(&self, path: &Path) -> bool {
        let named_skip = path
            .file_name()
            .map(|name| self.skip_dirs.contains(name.to_string_lossy().as_ref()))
            .unwrap_or(false);

        named_skip || self.matches_ignore(path) || is_virtual_env(path)
    }

    /// Check if a file matches one of the configured ignore globs
    pub fn is_ignored_file(&self, path: &Path) -> bool {
        self.matches_ignore(path)
    }

    fn matches_ignore(&self, path: &Path) -> bool {
        if self.ignore_globs.is_empty() {
            return false;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.ignore_globs.is_match(relative) || self.ignore_globs.is_match(path)
    }
}
