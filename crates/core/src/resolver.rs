//! Mapping of import names to installed distributions and their versions.

use crate::models::ImportSet;
use log::debug;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("No Name field in {0}")]
    MissingName(PathBuf),
}

/// One installed distribution as described by its metadata directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    /// Published name, original casing
    pub name: String,
    /// Installed version, if the metadata declares one
    pub version: Option<String>,
    /// Importable names from `top_level.txt`, when that file is present
    pub top_level: Option<Vec<String>>,
}

impl Distribution {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: Some(version.to_string()),
            top_level: None,
        }
    }

    pub fn with_top_level(mut self, names: &[&str]) -> Self {
        self.top_level = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Read a `*.dist-info` / `*.egg-info` directory, or a single-file `*.egg-info`
    pub fn read(path: &Path) -> Result<Self, MetadataError> {
        let (metadata_path, top_level_path) = if path.is_dir() {
            let metadata = if path.join("METADATA").is_file() {
                path.join("METADATA")
            } else {
                path.join("PKG-INFO")
            };
            (metadata, Some(path.join("top_level.txt")))
        } else {
            (path.to_path_buf(), None)
        };

        let bytes = fs::read(&metadata_path)?;
        let headers = parse_headers(&String::from_utf8_lossy(&bytes));
        let name = headers
            .name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| MetadataError::MissingName(metadata_path.clone()))?;

        let top_level = match top_level_path {
            Some(top_level_path) if top_level_path.is_file() => {
                let content = fs::read_to_string(&top_level_path)?;
                if content.is_empty() {
                    None
                } else {
                    Some(
                        content
                            .lines()
                            .map(str::trim)
                            .filter(|line| !line.is_empty())
                            .map(String::from)
                            .collect(),
                    )
                }
            }
            _ => None,
        };

        Ok(Self {
            name,
            version: headers.version,
            top_level,
        })
    }
}

#[derive(Default)]
struct Headers {
    name: Option<String>,
    version: Option<String>,
}

/// Read `Name` and `Version` from the RFC 822 header block of a metadata file
fn parse_headers(content: &str) -> Headers {
    let mut headers = Headers::default();
    for line in content.lines() {
        if line.trim().is_empty() {
            break;
        }
        if line.starts_with([' ', '\t']) {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim().to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "name" if headers.name.is_none() => headers.name = Some(value),
                "version" if headers.version.is_none() => headers.version = Some(value),
                _ => {}
            }
        }
    }
    headers
}

/// PEP 503 normalized form of a distribution name
pub fn canonicalize_name(name: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[-_.]+").expect("valid regex"));
    separators.replace_all(name, "-").to_lowercase()
}

fn is_metadata_dir(file_name: &str) -> bool {
    file_name.ends_with(".dist-info") || file_name.ends_with(".egg-info")
}

/// Every distribution installed on the search path, in search order
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    distributions: Vec<Distribution>,
    /// Canonical name -> first distribution carrying it
    by_canonical: HashMap<String, usize>,
}

impl PackageIndex {
    pub fn new(distributions: Vec<Distribution>) -> Self {
        let mut by_canonical = HashMap::new();
        for (index, distribution) in distributions.iter().enumerate() {
            by_canonical
                .entry(canonicalize_name(&distribution.name))
                .or_insert(index);
        }
        Self {
            distributions,
            by_canonical,
        }
    }

    /// Enumerate metadata directories on each search path.
    ///
    /// Entries within one directory are visited in name order. Distributions
    /// whose metadata cannot be read are skipped.
    pub fn discover(search_paths: &[PathBuf]) -> Self {
        let mut distributions = Vec::new();

        for dir in search_paths {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!("Skipping search path {}: {}", dir.display(), err);
                    continue;
                }
            };

            let mut paths: Vec<PathBuf> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    path.file_name()
                        .map(|name| is_metadata_dir(&name.to_string_lossy()))
                        .unwrap_or(false)
                })
                .collect();
            paths.sort();

            for path in paths {
                match Distribution::read(&path) {
                    Ok(distribution) => distributions.push(distribution),
                    Err(err) => debug!("Skipping distribution {}: {}", path.display(), err),
                }
            }
        }

        debug!("Indexed {} installed distributions", distributions.len());
        Self::new(distributions)
    }

    pub fn distributions(&self) -> &[Distribution] {
        &self.distributions
    }

    pub fn len(&self) -> usize {
        self.distributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distributions.is_empty()
    }
}

/// Installed-version lookup by distribution name
pub trait DistributionLookup {
    /// `None` when no such distribution is installed
    fn installed_version(&self, distribution: &str) -> Option<String>;
}

impl DistributionLookup for PackageIndex {
    fn installed_version(&self, distribution: &str) -> Option<String> {
        let index = self.by_canonical.get(&canonicalize_name(distribution))?;
        self.distributions[*index].version.clone()
    }
}

/// Import name -> distribution name, first registration wins
#[derive(Debug, Clone, Default)]
pub struct PackageMapping {
    names: HashMap<String, String>,
}

impl PackageMapping {
    pub fn build(index: &PackageIndex) -> Self {
        let mut names = HashMap::new();

        for distribution in index.distributions() {
            let name = &distribution.name;
            match &distribution.top_level {
                Some(top_level) => {
                    for import_name in top_level {
                        names
                            .entry(import_name.clone())
                            .or_insert_with(|| name.clone());
                    }
                }
                None => {
                    let lowered = name.to_lowercase();
                    names
                        .entry(lowered.replace('-', "_"))
                        .or_insert_with(|| name.clone());
                    names.entry(lowered).or_insert_with(|| name.clone());
                }
            }
        }

        Self { names }
    }

    /// Distribution providing an import, or the import name itself
    pub fn distribution_for<'a>(&'a self, import_name: &'a str) -> &'a str {
        self.names
            .get(import_name)
            .map(String::as_str)
            .unwrap_or(import_name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Drop a PEP 440 local version label (`1.2.3+cu121` -> `1.2.3`)
pub fn strip_local_version(version: &str) -> &str {
    version.split('+').next().unwrap_or(version)
}

/// Installed requirements derived from external imports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Distribution name -> installed version
    pub requirements: BTreeMap<String, String>,
    /// Import names whose distribution is not installed
    pub unresolved: Vec<String>,
}

/// Turns external import names into pinned distributions
pub struct PackageResolver<'a> {
    mapping: &'a PackageMapping,
    lookup: &'a dyn DistributionLookup,
}

impl<'a> PackageResolver<'a> {
    pub fn new(mapping: &'a PackageMapping, lookup: &'a dyn DistributionLookup) -> Self {
        Self { mapping, lookup }
    }

    /// Resolve every external import; versions are looked up once per
    /// distinct distribution name.
    pub fn resolve(&self, external: &ImportSet) -> Resolution {
        let mut versions: HashMap<&str, Option<String>> = HashMap::new();
        let mut resolution = Resolution::default();

        for import_name in external {
            let distribution = self.mapping.distribution_for(import_name);
            let version = versions
                .entry(distribution)
                .or_insert_with(|| self.lookup.installed_version(distribution));

            match version {
                Some(version) => {
                    resolution.requirements.insert(
                        distribution.to_string(),
                        strip_local_version(version).to_string(),
                    );
                }
                None => {
                    debug!("{} ({}) is not installed", import_name, distribution);
                    resolution.unresolved.push(import_name.clone());
                }
            }
        }

        resolution
    }
}
