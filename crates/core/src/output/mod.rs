mod json;
mod yaml;

pub use json::to_json;
pub use yaml::to_yaml;

use crate::models::ScanReport;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Summary,
}

/// Format a ScanReport according to the specified format
pub fn format_output(report: &ScanReport, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Yaml => to_yaml(report),
        OutputFormat::Summary => Ok(format_summary(report)),
    }
}

/// Generate a human-readable summary
pub fn format_summary(report: &ScanReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Dependency Scan Summary\n\
         =======================\n\
         Root: {}\n\n",
        report.root.display()
    ));

    output.push_str(&format!(
        "Files Scanned: {}\n\n\
         Unique Imports: {}\n\
         - Stdlib: {}\n\
         - Local: {}\n\
         - External: {}\n\n",
        report.stats.total_files,
        report.stats.total_imports,
        report.stats.stdlib_imports,
        report.stats.local_imports,
        report.stats.external_imports,
    ));

    if !report.requirements.is_empty() {
        output.push_str("Requirements:\n");
        let mut requirements: Vec<_> = report.requirements.iter().collect();
        requirements.sort_by_key(|(name, _)| name.to_lowercase());
        for (name, version) in requirements {
            output.push_str(&format!("  {}=={}\n", name, version));
        }
        output.push('\n');
    }

    if !report.unresolved.is_empty() {
        output.push_str("Not Installed:\n");
        for name in &report.unresolved {
            output.push_str(&format!("  {}\n", name));
        }
        output.push('\n');
    }

    if !report.imports.local.is_empty() {
        output.push_str("Local Modules:\n");
        for name in &report.imports.local {
            output.push_str(&format!("  {}\n", name));
        }
        output.push('\n');
    }

    let interpreter = match (&report.metadata.interpreter, &report.metadata.python_version) {
        (Some(path), Some(version)) => format!("{} (Python {})", path.display(), version),
        (Some(path), None) => path.display().to_string(),
        _ => "none (built-in stdlib list)".to_string(),
    };

    output.push_str(&format!(
        "Interpreter: {}\n\
         Scan Duration: {}ms ({:.2} files/sec)\n\
         Timestamp: {}\n\
         Tool Version: {}\n",
        interpreter,
        report.metadata.scan_duration_ms,
        report.metadata.files_per_second,
        report.metadata.timestamp,
        report.metadata.tool_version
    ));

    output
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ClassifiedImports, ImportType, ScanMetadata, ScanStats};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    pub(crate) fn sample_report() -> ScanReport {
        let mut imports = ClassifiedImports::default();
        imports.insert("os".to_string(), ImportType::Stdlib);
        imports.insert("mypkg".to_string(), ImportType::Local);
        imports.insert("requests".to_string(), ImportType::External);
        imports.insert("ghost".to_string(), ImportType::External);

        let mut requirements = BTreeMap::new();
        requirements.insert("requests".to_string(), "2.31.0".to_string());
        let unresolved = vec!["ghost".to_string()];

        ScanReport {
            root: PathBuf::from("/test"),
            files: vec![PathBuf::from("main.py")],
            stats: ScanStats::new(1, &imports, &requirements, &unresolved),
            imports,
            requirements,
            unresolved,
            metadata: ScanMetadata::default(),
        }
    }

    #[test]
    fn test_summary_sections() {
        let summary = format_summary(&sample_report());
        assert!(summary.contains("Root: /test"));
        assert!(summary.contains("Files Scanned: 1"));
        assert!(summary.contains("- External: 2"));
        assert!(summary.contains("  requests==2.31.0"));
        assert!(summary.contains("Not Installed:\n  ghost"));
        assert!(summary.contains("Local Modules:\n  mypkg"));
        assert!(summary.contains("built-in stdlib list"));
    }

    #[test]
    fn test_format_dispatch() {
        let report = sample_report();
        assert!(format_output(&report, OutputFormat::Json)
            .unwrap()
            .starts_with('{'));
        assert!(format_output(&report, OutputFormat::Summary)
            .unwrap()
            .starts_with("Dependency Scan Summary"));
    }
}
