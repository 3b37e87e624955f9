use crate::config::{ExcludeFilter, SOURCE_EXTENSION};
use log::debug;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Walks a project tree, pruning excluded directories and virtual environments
pub struct SourceWalker<'a> {
    root: PathBuf,
    filter: &'a ExcludeFilter,
}

impl<'a> SourceWalker<'a> {
    pub fn new(root: impl Into<PathBuf>, filter: &'a ExcludeFilter) -> Self {
        Self {
            root: root.into(),
            filter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every entry below the root that survives pruning.
    ///
    /// The root itself is never pruned, even when its name is in the skip set.
    fn entries(&self) -> impl Iterator<Item = DirEntry> + '_ {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self.filter.is_excluded_dir(entry.path())
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!("Skipping unreadable entry: {}", err);
                    None
                }
            })
            .filter(|entry| entry.depth() > 0)
    }

    /// Lazily yield every `.py` file under the root.
    ///
    /// Each call starts a fresh traversal.
    pub fn python_files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.entries()
            .filter(|entry| !entry.file_type().is_dir() && is_source_file(entry.path()))
            .filter(|entry| !self.filter.is_ignored_file(entry.path()))
            .map(DirEntry::into_path)
    }

    /// Names that, when imported, refer to code inside this project: the root
    /// directory's name, every surviving subdirectory name and every source
    /// file stem.
    pub fn local_module_names(&self) -> HashSet<String> {
        let mut names = HashSet::new();

        if let Some(name) = self.root.file_name() {
            names.insert(name.to_string_lossy().into_owned());
        }

        for entry in self.entries() {
            if entry.file_type().is_dir() {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            } else if is_source_file(entry.path()) {
                if let Some(stem) = entry.path().file_stem() {
                    names.insert(stem.to_string_lossy().into_owned());
                }
            }
        }

        names
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == SOURCE_EXTENSION)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "main.py");
        touch(root, "README.md");
        touch(root, "mypkg/__init__.py");
        touch(root, "mypkg/core/engine.py");
        touch(root, ".git/hooks/pre-commit.py");
        touch(root, "node_modules/x/setup.py");
        touch(root, "build/lib/generated.py");
        touch(root, "tooling/pyvenv.cfg");
        touch(root, "tooling/lib/inside_venv.py");
        touch(root, "sandbox/Scripts/python.exe");
        touch(root, "sandbox/sandboxed.py");
        touch(root, "types.pyi");
        dir
    }

    fn sorted_files(walker: &SourceWalker<'_>) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walker
            .python_files()
            .map(|p| p.strip_prefix(walker.root()).unwrap().to_path_buf())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_python_files_prunes_excluded_dirs() {
        let dir = project();
        let filter = ExcludeFilter::new(&ScanConfig::new(dir.path().to_path_buf())).unwrap();
        let walker = SourceWalker::new(dir.path(), &filter);

        assert_eq!(
            sorted_files(&walker),
            vec![
                PathBuf::from("main.py"),
                PathBuf::from("mypkg/__init__.py"),
                PathBuf::from("mypkg/core/engine.py"),
            ]
        );
    }

    #[test]
    fn test_traversal_is_restartable() {
        let dir = project();
        let filter = ExcludeFilter::new(&ScanConfig::new(dir.path().to_path_buf())).unwrap();
        let walker = SourceWalker::new(dir.path(), &filter);

        assert_eq!(walker.python_files().count(), 3);
        assert_eq!(walker.python_files().count(), 3);
    }

    #[test]
    fn test_extra_excludes_and_globs() {
        let dir = project();
        let config = ScanConfig::new(dir.path().to_path_buf())
            .with_exclude_dirs(vec!["core".to_string()])
            .with_ignore_patterns(vec!["main.py".to_string()]);
        let filter = ExcludeFilter::new(&config).unwrap();
        let walker = SourceWalker::new(dir.path(), &filter);

        assert_eq!(sorted_files(&walker), vec![PathBuf::from("mypkg/__init__.py")]);
    }

    #[test]
    fn test_local_module_names() {
        let dir = project();
        let filter = ExcludeFilter::new(&ScanConfig::new(dir.path().to_path_buf())).unwrap();
        let walker = SourceWalker::new(dir.path(), &filter);
        let names = walker.local_module_names();

        let root_name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(names.contains(&root_name));
        assert!(names.contains("main"));
        assert!(names.contains("mypkg"));
        assert!(names.contains("core"));
        assert!(names.contains("engine"));
        assert!(names.contains("__init__"));
        assert!(!names.contains("tooling"));
        assert!(!names.contains("sandbox"));
        assert!(!names.contains("generated"));
        assert!(!names.contains("types"));
    }

    #[test]
    fn test_root_named_like_skip_dir_is_scanned() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("build");
        touch(&root, "job.py");
        let filter = ExcludeFilter::new(&ScanConfig::new(root.clone())).unwrap();
        let walker = SourceWalker::new(&root, &filter);

        assert_eq!(walker.python_files().count(), 1);
    }
}
