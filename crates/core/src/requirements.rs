//! Reading, merging and writing `requirements.txt`.
//!
//! Only `==` and `>=` are understood on read; any other line is carried through
//! verbatim as a bare entry so that manual additions survive a merge.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Operators that mark a version string as already qualified
const QUALIFIED_PREFIXES: &[&str] = &[">=", "<=", "=="];

#[derive(Error, Debug)]
pub enum RequirementsError {
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Version part of a manifest line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum VersionSpec {
    /// Bare name
    Any,
    /// `name==version`
    Exact(String),
    /// Operator and version kept as written, e.g. `>=2.0`
    Constraint(String),
}

impl VersionSpec {
    /// Interpret a version value: already-qualified strings are kept, anything
    /// else becomes an exact pin.
    pub fn from_version(version: &str) -> Self {
        if let Some(exact) = version.strip_prefix("==") {
            return if exact.is_empty() {
                Self::Any
            } else {
                Self::Exact(exact.to_string())
            };
        }
        if QUALIFIED_PREFIXES
            .iter()
            .any(|prefix| version.starts_with(prefix))
        {
            return Self::Constraint(version.to_string());
        }
        Self::Exact(version.to_string())
    }
}

/// One manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub version: VersionSpec,
}

impl Requirement {
    pub fn new(name: impl Into<String>, version: VersionSpec) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Parse one non-comment line
    pub fn parse(line: &str) -> Self {
        if let Some((name, version)) = line.split_once("==") {
            let version = version.trim();
            let spec = if version.is_empty() {
                VersionSpec::Any
            } else {
                VersionSpec::Exact(version.to_string())
            };
            return Self::new(name.trim(), spec);
        }
        if let Some((name, version)) = line.split_once(">=") {
            return Self::new(
                name.trim(),
                VersionSpec::Constraint(format!(">={}", version.trim())),
            );
        }
        Self::new(line, VersionSpec::Any)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            VersionSpec::Any => write!(f, "{}", self.name),
            VersionSpec::Exact(version) => write!(f, "{}=={}", self.name, version),
            VersionSpec::Constraint(constraint) => write!(f, "{}{}", self.name, constraint),
        }
    }
}

/// How an existing manifest at the destination is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Keep manual additions, refresh detected versions
    #[default]
    Merge,
    /// Start from an empty manifest
    Overwrite,
}

/// Requirements keyed by lowercased name, rendered in that order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, Requirement>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse manifest text, skipping blank lines and `#` comments
    pub fn parse(content: &str) -> Self {
        let mut manifest = Self::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            manifest.insert(Requirement::parse(line));
        }
        manifest
    }

    pub fn load(path: &Path) -> Result<Self, RequirementsError> {
        let content = fs::read_to_string(path).map_err(|source| RequirementsError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    /// Seed from the manifest at `path` (merge mode, when it exists), then
    /// apply the detected requirements.
    pub fn reconcile<I, S>(path: &Path, mode: MergeMode, detected: I) -> Result<Self, RequirementsError>
    where
        I: IntoIterator<Item = (S, Option<S>)>,
        S: AsRef<str>,
    {
        let mut manifest = match mode {
            MergeMode::Merge if path.exists() => Self::load(path)?,
            _ => Self::new(),
        };
        manifest.merge_detected(detected);
        Ok(manifest)
    }

    /// Insert or replace an entry; names compare case-insensitively
    pub fn insert(&mut self, requirement: Requirement) {
        self.entries
            .insert(requirement.name.to_lowercase(), requirement);
    }

    pub fn get(&self, name: &str) -> Option<&Requirement> {
        self.entries.get(&name.to_lowercase())
    }

    /// Apply freshly detected `(distribution, version)` pairs.
    ///
    /// A detected version replaces any existing entry. A detection without a
    /// version keeps the existing entry, or records a bare one.
    pub fn merge_detected<I, S>(&mut self, detected: I)
    where
        I: IntoIterator<Item = (S, Option<S>)>,
        S: AsRef<str>,
    {
        for (name, version) in detected {
            let name: &str = name.as_ref();
            let version: Option<&str> = version.as_ref().map(|v| v.as_ref());
            match version.filter(|v| !v.is_empty()) {
                Some(version) => {
                    self.insert(Requirement::new(name, VersionSpec::from_version(version)))
                }
                None => {
                    if self.get(name).is_none() {
                        self.insert(Requirement::new(name, VersionSpec::Any));
                    }
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per entry, sorted case-insensitively
    pub fn render(&self) -> String {
        let mut output = String::new();
        for requirement in self.iter() {
            output.push_str(&requirement.to_string());
            output.push('\n');
        }
        output
    }

    pub fn write(&self, path: &Path) -> Result<(), RequirementsError> {
        fs::write(path, self.render()).map_err(|source| RequirementsError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}
