use crate::environment::ModuleOrigin;
use crate::models::{ClassifiedImports, ImportSet, ImportType};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Sorts imported names into stdlib, local and external.
///
/// Stdlib is checked first, so a project file that shadows a stdlib name
/// never turns that import into a dependency.
pub struct ModuleClassifier<'a> {
    /// Stdlib names for the target interpreter
    stdlib: HashSet<String>,
    /// Root name, directory names and file stems found in the project
    local_names: HashSet<String>,
    /// Canonical project root, if it could be resolved
    root: Option<PathBuf>,
    /// Where an import would load from in the target interpreter
    locator: &'a dyn ModuleOrigin,
}

impl<'a> ModuleClassifier<'a> {
    pub fn new(
        stdlib: HashSet<String>,
        local_names: HashSet<String>,
        root: &Path,
        locator: &'a dyn ModuleOrigin,
    ) -> Self {
        let root = match fs::canonicalize(root) {
            Ok(root) => Some(root),
            Err(err) => {
                debug!("Cannot resolve project root {}: {}", root.display(), err);
                None
            }
        };

        Self {
            stdlib,
            local_names,
            root,
            locator,
        }
    }

    /// Classify a single top-level module name
    pub fn categorize(&self, name: &str) -> ImportType {
        if self.stdlib.contains(name) {
            return ImportType::Stdlib;
        }
        if self.local_names.contains(name) || self.resolves_inside_root(name) {
            return ImportType::Local;
        }
        ImportType::External
    }

    /// Partition a set of names; every name lands in exactly one set
    pub fn classify(&self, imports: &ImportSet) -> ClassifiedImports {
        let mut classified = ClassifiedImports::default();
        for name in imports {
            classified.insert(name.clone(), self.categorize(name));
        }
        classified
    }

    /// Whether the module's resolved source file sits inside the project root.
    /// Any lookup or canonicalization failure counts as "not local".
    fn resolves_inside_root(&self, name: &str) -> bool {
        let Some(root) = &self.root else {
            return false;
        };
        let Some(origin) = self.locator.origin(name) else {
            return false;
        };
        match fs::canonicalize(&origin) {
            Ok(origin) => {
                let inside = origin.starts_with(root);
                if inside {
                    debug!("{} resolves to {} inside the project", name, origin.display());
                }
                inside
            }
            Err(err) => {
                debug!("Cannot resolve origin of {}: {}", name, err);
                false
            }
        }
    }
}
