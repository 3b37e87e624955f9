//! Snapshot of the Python installation the scanned project runs against.
//!
//! The interpreter is asked once for its version, its own stdlib module list,
//! the stdlib directory and `sys.path`. Everything downstream (stdlib
//! detection, module origin lookup, installed distributions) works off that
//! immutable value, so tests can build one by hand.

use crate::stdlib::python_stdlib_modules;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

const PROBE_SCRIPT: &str = r#"
import json, sys, sysconfig
print(json.dumps({
    "version": "%d.%d" % sys.version_info[:2],
    "executable": sys.executable,
    "stdlib_module_names": sorted(getattr(sys, "stdlib_module_names", ())),
    "builtin_module_names": sorted(sys.builtin_module_names),
    "stdlib": sysconfig.get_paths().get("stdlib"),
    "path": sys.path,
}))
"#;

/// Shared-library suffixes an extension module may carry
const EXTENSION_SUFFIXES: &[&str] = &[".so", ".pyd"];

#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("Failed to run {interpreter}: {source}")]
    SpawnError {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{interpreter} exited with {status}: {stderr}")]
    ProbeFailed {
        interpreter: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Unexpected interpreter output: {0}")]
    InvalidOutput(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    version: Option<String>,
    executable: Option<PathBuf>,
    #[serde(default)]
    stdlib_module_names: Vec<String>,
    #[serde(default)]
    builtin_module_names: Vec<String>,
    stdlib: Option<PathBuf>,
    #[serde(default)]
    path: Vec<String>,
}

/// Immutable view of one Python installation
#[derive(Debug, Clone, Default)]
pub struct PythonEnvironment {
    /// Interpreter the snapshot was taken from
    pub interpreter: Option<PathBuf>,
    /// "major.minor"
    pub version: Option<String>,
    /// Canonical stdlib module names
    pub stdlib_names: HashSet<String>,
    /// Modules compiled into the interpreter
    pub builtin_modules: HashSet<String>,
    /// Directory holding the pure-Python stdlib
    pub stdlib_dir: Option<PathBuf>,
    /// `sys.path`, minus the working-directory entry
    pub search_paths: Vec<PathBuf>,
}

impl PythonEnvironment {
    /// Environment known without an interpreter: the embedded stdlib list and
    /// no installed packages.
    pub fn offline() -> Self {
        Self {
            stdlib_names: python_stdlib_modules(),
            ..Default::default()
        }
    }

    /// Probe an interpreter, falling back to [`PythonEnvironment::offline`]
    pub fn detect(python: Option<&Path>) -> Self {
        match Self::probe(python) {
            Ok(environment) => environment,
            Err(err) => {
                warn!("No usable Python interpreter ({}); using the built-in stdlib list", err);
                Self::offline()
            }
        }
    }

    /// Ask the first working interpreter candidate for its environment
    pub fn probe(python: Option<&Path>) -> Result<Self, EnvironmentError> {
        let mut last_error = None;

        for candidate in interpreter_candidates(python) {
            match run_probe(&candidate) {
                Ok(stdout) => {
                    debug!("Probed Python environment via {}", candidate.display());
                    let mut environment = Self::from_probe_output(&stdout)?;
                    if environment.interpreter.is_none() {
                        environment.interpreter = Some(candidate);
                    }
                    return Ok(environment);
                }
                Err(err) => {
                    debug!("Interpreter candidate {} failed: {}", candidate.display(), err);
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| EnvironmentError::SpawnError {
            interpreter: "python".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no candidates"),
        }))
    }

    /// Build an environment from the probe script's JSON output
    pub fn from_probe_output(json: &str) -> Result<Self, EnvironmentError> {
        let output: ProbeOutput = serde_json::from_str(json.trim())?;

        // `sys.stdlib_module_names` only exists from 3.10 on
        let stdlib_names = if output.stdlib_module_names.is_empty() {
            python_stdlib_modules()
        } else {
            output.stdlib_module_names.into_iter().collect()
        };

        let search_paths = output
            .path
            .into_iter()
            .filter(|entry| !entry.is_empty())
            .map(PathBuf::from)
            .collect();

        Ok(Self {
            interpreter: output.executable.filter(|p| !p.as_os_str().is_empty()),
            version: output.version,
            stdlib_names,
            builtin_modules: output.builtin_module_names.into_iter().collect(),
            stdlib_dir: output.stdlib,
            search_paths,
        })
    }

    pub fn with_stdlib_dir(mut self, dir: PathBuf) -> Self {
        self.stdlib_dir = Some(dir);
        self
    }

    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Every name that counts as stdlib: the canonical list, the built-in
    /// modules, and each `*.py` stem directly inside the stdlib directory.
    pub fn stdlib_modules(&self) -> HashSet<String> {
        let mut modules: HashSet<String> = self
            .stdlib_names
            .iter()
            .chain(self.builtin_modules.iter())
            .cloned()
            .collect();

        if let Some(dir) = &self.stdlib_dir {
            match fs::read_dir(dir) {
                Ok(entries) => {
                    for entry in entries.flatten() {
                        let path = entry.path();
                        if path.extension().map(|ext| ext == "py").unwrap_or(false) {
                            if let Some(stem) = path.file_stem() {
                                modules.insert(stem.to_string_lossy().into_owned());
                            }
                        }
                    }
                }
                Err(err) => debug!("Cannot list stdlib dir {}: {}", dir.display(), err),
            }
        }

        modules
    }
}

/// Locates the file a top-level module would be imported from
pub trait ModuleOrigin {
    /// `None` for built-in modules, namespace packages and unknown names
    fn origin(&self, name: &str) -> Option<PathBuf>;
}

impl ModuleOrigin for PythonEnvironment {
    fn origin(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || self.builtin_modules.contains(name) {
            return None;
        }
        // Regular packages and modules win over namespace portions found earlier.
        self.search_paths
            .iter()
            .find_map(|dir| module_in_dir(dir, name))
    }
}

/// Mirror of the path finder for one `sys.path` directory: a package's
/// `__init__`, then an extension module, then a source or bytecode file.
fn module_in_dir(dir: &Path, name: &str) -> Option<PathBuf> {
    let package = dir.join(name);
    if package.is_dir() {
        for init in ["__init__.py", "__init__.pyc"] {
            let init = package.join(init);
            if init.is_file() {
                return Some(init);
            }
        }
    }

    let entries = fs::read_dir(dir).ok()?;
    let mut extension = None;
    let mut source = None;
    let mut bytecode = None;

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        let Some(rest) = file_name.strip_prefix(name) else {
            continue;
        };
        if rest == ".py" {
            source = Some(entry.path());
        } else if rest == ".pyc" {
            bytecode = Some(entry.path());
        } else if rest.starts_with('.')
            && EXTENSION_SUFFIXES.iter().any(|suffix| rest.ends_with(suffix))
        {
            extension = Some(entry.path());
        }
    }

    extension
        .or(source)
        .or(bytecode)
        .filter(|path| path.is_file())
}

fn interpreter_candidates(python: Option<&Path>) -> Vec<PathBuf> {
    if let Some(python) = python {
        return vec![python.to_path_buf()];
    }

    let mut candidates = Vec::new();
    if let Some(venv) = env::var_os("VIRTUAL_ENV") {
        let venv = PathBuf::from(venv);
        if cfg!(windows) {
            candidates.push(venv.join("Scripts").join("python.exe"));
        } else {
            candidates.push(venv.join("bin").join("python"));
        }
    }
    candidates.push(PathBuf::from("python3"));
    candidates.push(PathBuf::from("python"));
    candidates
}

fn run_probe(interpreter: &Path) -> Result<String, EnvironmentError> {
    let output = Command::new(interpreter)
        .arg("-c")
        .arg(PROBE_SCRIPT)
        .output()
        .map_err(|source| EnvironmentError::SpawnError {
            interpreter: interpreter.display().to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(EnvironmentError::ProbeFailed {
            interpreter: interpreter.display().to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
