//! MTA Rust ReqScan Core Library
//!
//! This library scans a Python project for the modules it imports, decides
//! which of them are third-party, pins those to the versions installed in the
//! active interpreter, and merges the result into `requirements.txt`.
//!
//! # Features
//!
//! - Parse Python imports (import, from...import) with tree-sitter
//! - Skip VCS, build and cache directories and any nested virtual environment
//! - Classify imports as Stdlib, Local or External
//! - Map import names to the distributions that provide them
//!   (`yaml` -> `PyYAML`, `bs4` -> `beautifulsoup4`)
//! - Merge with an existing `requirements.txt`, keeping manual additions
//! - Output scan reports in JSON, YAML or a text summary
//!
//! # Example
//!
//! ```no_run
//! use mta_rust_reqscan_core::{DependencyScanner, Manifest, MergeMode, ScanConfig};
//! use std::path::PathBuf;
//!
//! let config = ScanConfig::new(PathBuf::from("."));
//! let scanner = DependencyScanner::new(config).unwrap();
//! let report = scanner.scan();
//!
//! let path = scanner.root().join("requirements.txt");
//! let detected = report
//!     .requirements
//!     .iter()
//!     .map(|(name, version)| (name.as_str(), Some(version.as_str())));
//! let manifest = Manifest::reconcile(&path, MergeMode::Merge, detected).unwrap();
//! manifest.write(&path).unwrap();
//! ```

pub mod categorizer;
pub mod config;
pub mod environment;
pub mod models;
pub mod output;
pub mod parsers;
pub mod requirements;
pub mod resolver;
pub mod scanner;
pub mod stdlib;
pub mod walker;

// Re-exports for convenience
pub use categorizer::ModuleClassifier;
pub use config::{FileConfig, ScanConfig, REQUIREMENTS_FILE};
pub use environment::{ModuleOrigin, PythonEnvironment};
pub use models::*;
pub use output::{format_output, format_summary, OutputFormat};
pub use parsers::extract_imports;
pub use requirements::{Manifest, MergeMode, Requirement, VersionSpec};
pub use resolver::{Distribution, PackageIndex, PackageMapping, PackageResolver};
pub use scanner::{DependencyScanner, ScanError};
pub use walker::SourceWalker;
