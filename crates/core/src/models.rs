use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Top-level module names imported by one file or a whole project
pub type ImportSet = BTreeSet<String>;

/// Where an imported module comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportType {
    /// Shipped with the interpreter
    Stdlib,
    /// Lives inside the scanned project
    Local,
    /// Anything else: a candidate dependency
    External,
}

/// Imports partitioned into three disjoint sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedImports {
    pub stdlib: ImportSet,
    pub local: ImportSet,
    pub external: ImportSet,
}

impl ClassifiedImports {
    pub fn insert(&mut self, name: String, import_type: ImportType) {
        match import_type {
            ImportType::Stdlib => self.stdlib.insert(name),
            ImportType::Local => self.local.insert(name),
            ImportType::External => self.external.insert(name),
        };
    }

    /// Which set a name landed in, if any
    pub fn import_type(&self, name: &str) -> Option<ImportType> {
        if self.stdlib.contains(name) {
            Some(ImportType::Stdlib)
        } else if self.local.contains(name) {
            Some(ImportType::Local)
        } else if self.external.contains(name) {
            Some(ImportType::External)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.stdlib.len() + self.local.len() + self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of scanning a project, before any manifest is touched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Project root path
    pub root: PathBuf,
    /// Source files parsed, relative to the root
    pub files: Vec<PathBuf>,
    /// Imports grouped by origin
    pub imports: ClassifiedImports,
    /// Installed distribution name -> installed version
    pub requirements: BTreeMap<String, String>,
    /// External imports that matched no installed distribution
    pub unresolved: Vec<String>,
    /// Import statistics
    pub stats: ScanStats,
    /// Scan metadata
    pub metadata: ScanMetadata,
}

impl ScanReport {
    pub fn has_requirements(&self) -> bool {
        !self.requirements.is_empty()
    }
}

/// Statistics about a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_files: usize,
    pub total_imports: usize,
    pub stdlib_imports: usize,
    pub local_imports: usize,
    pub external_imports: usize,
    pub resolved_packages: usize,
    pub unresolved_imports: usize,
}

impl ScanStats {
    pub fn new(
        total_files: usize,
        imports: &ClassifiedImports,
        requirements: &BTreeMap<String, String>,
        unresolved: &[String],
    ) -> Self {
        Self {
            total_files,
            total_imports: imports.len(),
            stdlib_imports: imports.stdlib.len(),
            local_imports: imports.local.len(),
            external_imports: imports.external.len(),
            resolved_packages: requirements.len(),
            unresolved_imports: unresolved.len(),
        }
    }
}

/// Scan metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub scan_duration_ms: u64,
    pub files_per_second: f64,
    pub timestamp: String,
    pub tool_version: String,
    /// Interpreter the environment snapshot came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<PathBuf>,
    /// Interpreter version, e.g. "3.12"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
}

impl Default for ScanMetadata {
    fn default() -> Self {
        Self {
            scan_duration_ms: 0,
            files_per_second: 0.0,
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            interpreter: None,
            python_version: None,
        }
    }
}
