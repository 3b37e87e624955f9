use crate::categorizer::ModuleClassifier;
use crate::config::{ConfigError, ExcludeFilter, ScanConfig};
use crate::environment::PythonEnvironment;
use crate::models::{ClassifiedImports, ImportSet, ScanMetadata, ScanReport, ScanStats};
use crate::parsers::extract_imports;
use crate::resolver::{PackageIndex, PackageMapping, PackageResolver, Resolution};
use crate::walker::SourceWalker;
use log::debug;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory does not exist: {0}")]
    RootNotFound(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Runs walk -> parse -> classify -> resolve over one project
pub struct DependencyScanner {
    config: ScanConfig,
    exclude_filter: ExcludeFilter,
    environment: PythonEnvironment,
    index: PackageIndex,
}

impl DependencyScanner {
    /// Scanner against the interpreter named in the config, or the first
    /// one found on the system
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        validate_root(&config.root)?;
        let environment = PythonEnvironment::detect(config.python.as_deref());
        let index = PackageIndex::discover(&environment.search_paths);
        Self::with_environment(config, environment, index)
    }

    /// Scanner against an explicit environment snapshot
    pub fn with_environment(
        mut config: ScanConfig,
        environment: PythonEnvironment,
        index: PackageIndex,
    ) -> Result<Self, ScanError> {
        validate_root(&config.root)?;
        config.root = fs::canonicalize(&config.root)?;
        let exclude_filter = ExcludeFilter::new(&config)?;

        Ok(Self {
            config,
            exclude_filter,
            environment,
            index,
        })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn environment(&self) -> &PythonEnvironment {
        &self.environment
    }

    /// Scan the project and return what it depends on
    pub fn scan(&self) -> ScanReport {
        let start = Instant::now();
        let walker = SourceWalker::new(&self.config.root, &self.exclude_filter);

        // 1. Find all source files
        let files: Vec<PathBuf> = walker.python_files().collect();
        debug!("Found {} source files", files.len());

        // 2. Parse all files in parallel
        let (imports, resolution) = if files.is_empty() {
            (ClassifiedImports::default(), Resolution::default())
        } else {
            let all_imports = self.parse_files(&files);

            // 3. Classify
            let classifier = ModuleClassifier::new(
                self.environment.stdlib_modules(),
                walker.local_module_names(),
                &self.config.root,
                &self.environment,
            );
            let imports = classifier.classify(&all_imports);

            // 4. Resolve external imports to installed distributions
            let mapping = PackageMapping::build(&self.index);
            let resolution = PackageResolver::new(&mapping, &self.index).resolve(&imports.external);
            (imports, resolution)
        };

        let stats = ScanStats::new(
            files.len(),
            &imports,
            &resolution.requirements,
            &resolution.unresolved,
        );

        let duration = start.elapsed();
        let metadata = ScanMetadata {
            scan_duration_ms: duration.as_millis() as u64,
            files_per_second: if duration.as_secs_f64() > 0.0 {
                files.len() as f64 / duration.as_secs_f64()
            } else {
                0.0
            },
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            interpreter: self.environment.interpreter.clone(),
            python_version: self.environment.version.clone(),
        };

        let files = files
            .into_iter()
            .map(|path| {
                path.strip_prefix(&self.config.root)
                    .map(Path::to_path_buf)
                    .unwrap_or(path)
            })
            .collect();

        ScanReport {
            root: self.config.root.clone(),
            files,
            imports,
            requirements: resolution.requirements,
            unresolved: resolution.unresolved,
            stats,
            metadata,
        }
    }

    /// Parse every file and union the per-file sets once all tasks finish
    fn parse_files(&self, files: &[PathBuf]) -> ImportSet {
        let per_file: Vec<ImportSet> = if self.config.threads == 1 {
            // Sequential processing
            files.iter().map(|path| extract_imports(path)).collect()
        } else {
            // Parallel processing with rayon
            let pool = if self.config.threads > 0 {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.threads)
                    .build()
                    .ok()
            } else {
                None
            };

            let parse_all = || {
                files
                    .par_iter()
                    .map(|path| extract_imports(path))
                    .collect::<Vec<ImportSet>>()
            };

            match pool {
                Some(pool) => pool.install(parse_all),
                None => parse_all(),
            }
        };

        per_file.into_iter().flatten().collect()
    }
}

fn validate_root(root: &Path) -> Result<(), ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}
