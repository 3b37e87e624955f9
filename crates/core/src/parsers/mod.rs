mod python;

pub use python::PythonParser;

use crate::models::ImportSet;
use log::debug;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to initialize parser: {0}")]
    InitError(String),
    #[error("Failed to parse source code: {0}")]
    ParseError(String),
}

/// Trait for language-specific import parsers
pub trait ImportParser {
    /// Parse source code and return the top-level module names it imports
    fn parse(&mut self, source: &str) -> Result<ImportSet, ParserError>;
}

/// Extract the top-level imported module names of one file.
///
/// Unreadable files, undecodable bytes and syntax errors all yield an empty set.
pub fn extract_imports(path: &Path) -> ImportSet {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            debug!("Skipping {}: {}", path.display(), err);
            return ImportSet::new();
        }
    };

    let result = PythonParser::new().and_then(|mut parser| parser.parse(&source));
    match result {
        Ok(imports) => imports,
        Err(err) => {
            debug!("Skipping {}: {}", path.display(), err);
            ImportSet::new()
        }
    }
}
