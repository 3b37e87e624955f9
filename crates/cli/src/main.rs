mod ui;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mta_rust_reqscan_core::{
    format_output, DependencyScanner, Manifest, MergeMode, OutputFormat, ScanConfig,
    ScanReport, REQUIREMENTS_FILE,
};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "reqscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate or update requirements.txt from the imports of a Python project")]
#[command(long_about = "Scans every .py file of a project, separates standard-library, \
    project-local and third-party imports, maps the third-party ones to the distributions \
    installed in the active Python interpreter, and writes them pinned to requirements.txt.\n\n\
    Without arguments the tool asks where the project is, where to save the file and whether \
    to merge with an existing one. Every question can be answered up front with a flag.")]
pub struct Args {
    /// Project root directory to scan (prompted for when omitted)
    pub path: Option<PathBuf>,

    /// Write requirements.txt to this file instead of asking
    #[arg(short, long, conflicts_with = "output_here")]
    pub output: Option<PathBuf>,

    /// Write requirements.txt in the current directory instead of the project
    #[arg(long)]
    pub output_here: bool,

    /// Merge with an existing requirements.txt without asking
    #[arg(long, conflicts_with = "overwrite")]
    pub merge: bool,

    /// Replace an existing requirements.txt without asking
    #[arg(long)]
    pub overwrite: bool,

    /// Accept the default answer to every question
    #[arg(short, long)]
    pub yes: bool,

    /// Print the scan report instead of writing requirements.txt
    #[arg(long)]
    pub dry_run: bool,

    /// Report format for --dry-run
    #[arg(short, long, value_enum, default_value_t = OutputFormatArg::Summary)]
    pub format: OutputFormatArg,

    /// Python interpreter whose installed packages are used
    #[arg(long)]
    pub python: Option<PathBuf>,

    /// Additional directory names to skip
    #[arg(long, action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Additional ignore patterns (glob style, relative to the project root)
    #[arg(long, action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Parallel threads (0 = auto)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Do not print the banner
    #[arg(long)]
    pub no_banner: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Summary,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Yaml => OutputFormat::Yaml,
            OutputFormatArg::Summary => OutputFormat::Summary,
        }
    }
}

impl Args {
    fn interactive(&self) -> bool {
        !self.yes && !self.dry_run
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    #[cfg(windows)]
    let _ = colored::control::set_virtual_terminal(true);

    if !args.no_banner && !args.dry_run {
        ui::banner();
    }

    let cwd = env::current_dir().context("Cannot determine the current directory")?;

    // 1. Project location
    let project_root = choose_project_root(&args, &cwd)?;
    if !project_root.is_dir() {
        println!();
        ui::error(&format!(
            "Error: Directory does not exist: {}",
            project_root.display()
        ));
        return Ok(());
    }

    // 2. Output destination
    let output_file = if args.dry_run {
        project_root.join(REQUIREMENTS_FILE)
    } else {
        choose_output_file(&args, &cwd, &project_root)?
    };

    // 3. Scan
    let config = build_config(&args, &project_root);
    if !args.dry_run {
        println!();
        ui::step(&format!(
            "Scanning project: {}",
            project_root.display().to_string().yellow()
        ));
    }

    let spinner = if args.dry_run {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("     {spinner:.cyan} {msg}")
                .context("Invalid spinner template")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Parsing imports in parallel...");
        Some(pb)
    };

    let report = run_scan(config, spinner.as_ref())?;

    if args.dry_run {
        println!("{}", format_output(&report, args.format.clone().into())?);
        return Ok(());
    }

    ui::success(&format!("Found {} Python files.", report.stats.total_files));
    if report.stats.total_files == 0 {
        ui::error("No files to process. Check your path or excluded directories.");
        return Ok(());
    }

    if !report.has_requirements() {
        println!();
        ui::rule();
        ui::info("No external dependencies detected.");
        ui::done("Your project only uses the Standard Library (or local modules)!");
        ui::rule();
        println!();
        return Ok(());
    }

    for name in &report.unresolved {
        log::info!("{} is imported but not installed; leaving it out", name);
    }

    // 4. Existing requirements.txt
    let mode = if output_file.exists() {
        choose_merge_mode(&args)?
    } else {
        MergeMode::Overwrite
    };

    let detected = report
        .requirements
        .iter()
        .map(|(name, version)| (name.as_str(), Some(version.as_str())));
    let manifest = Manifest::reconcile(&output_file, mode, detected)?;

    // 5. Output
    manifest.write(&output_file)?;

    println!();
    ui::rule();
    ui::done(&format!(
        "Final package count: {}",
        manifest.len().to_string().bold()
    ));
    ui::done(&format!(
        "Successfully generated:\n     {}",
        output_file.display().to_string().yellow()
    ));
    ui::rule();
    println!();

    Ok(())
}

fn choose_project_root(args: &Args, cwd: &Path) -> Result<PathBuf> {
    if let Some(path) = &args.path {
        return Ok(path.clone());
    }
    if !args.interactive() {
        return Ok(cwd.to_path_buf());
    }

    ui::step("Choose project location:");
    ui::option(
        1,
        &format!("Current directory ({})", cwd.display().to_string().yellow()),
    );
    ui::option(2, "Enter a custom path");
    if ui::choose_second("Select (1 or 2)")? {
        println!();
        let raw = ui::ask(&format!(" {} Enter project folder path: ", "[*]".cyan()))?;
        Ok(PathBuf::from(ui::unquote(&raw)))
    } else {
        Ok(cwd.to_path_buf())
    }
}

fn choose_output_file(args: &Args, cwd: &Path, project_root: &Path) -> Result<PathBuf> {
    if let Some(output) = &args.output {
        return Ok(output.clone());
    }
    if args.output_here {
        return Ok(cwd.join(REQUIREMENTS_FILE));
    }
    if !args.interactive() {
        return Ok(project_root.join(REQUIREMENTS_FILE));
    }

    println!();
    ui::step(&format!("Where should {} be saved?", REQUIREMENTS_FILE));
    ui::option(1, "Inside the scanned project directory");
    ui::option(2, "In the current directory (here)");
    if ui::choose_second("Select (1 or 2)")? {
        Ok(cwd.join(REQUIREMENTS_FILE))
    } else {
        Ok(project_root.join(REQUIREMENTS_FILE))
    }
}

fn choose_merge_mode(args: &Args) -> Result<MergeMode> {
    if args.overwrite {
        return Ok(MergeMode::Overwrite);
    }
    if args.merge || !args.interactive() {
        return Ok(MergeMode::Merge);
    }

    println!();
    ui::info(&format!(
        "Found existing {} at the destination.",
        REQUIREMENTS_FILE.bold()
    ));
    ui::option(1, "Merge (Keep manual additions, update detected versions)");
    ui::option(2, "Overwrite (Create a fresh file)");
    if ui::choose_second("Select (1 or 2)")? {
        Ok(MergeMode::Overwrite)
    } else {
        Ok(MergeMode::Merge)
    }
}

/// Scan while the spinner ticks; the spinner is cleared whether or not the
/// scanner could be set up.
fn run_scan(config: ScanConfig, spinner: Option<&ProgressBar>) -> Result<ScanReport> {
    let scanned = DependencyScanner::new(config).map(|scanner| scanner.scan());
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    Ok(scanned?)
}

/// Command-line values on top of `[tool.reqscan]` from the project's pyproject.toml
fn build_config(args: &Args, project_root: &Path) -> ScanConfig {
    let mut config = ScanConfig::new(project_root.to_path_buf())
        .with_exclude_dirs(args.exclude.clone())
        .with_ignore_patterns(args.ignore.clone())
        .with_threads(args.threads);

    if let Some(python) = &args.python {
        config = config.with_python(python.clone());
    }

    config.with_project_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let args = Args::try_parse_from([
            "reqscan",
            "proj",
            "--overwrite",
            "--exclude",
            "fixtures",
            "--exclude",
            "docs",
            "--threads",
            "2",
            "-y",
        ])
        .unwrap();

        assert_eq!(args.path, Some(PathBuf::from("proj")));
        assert!(args.overwrite);
        assert_eq!(args.exclude, vec!["fixtures".to_string(), "docs".to_string()]);
        assert_eq!(args.threads, 2);
        assert!(!args.interactive());
    }

    #[test]
    fn test_merge_conflicts_with_overwrite() {
        assert!(Args::try_parse_from(["reqscan", "--merge", "--overwrite"]).is_err());
    }

    #[test]
    fn test_non_interactive_defaults() {
        let args = Args::try_parse_from(["reqscan", "--yes"]).unwrap();
        let cwd = PathBuf::from("/work");
        let root = choose_project_root(&args, &cwd).unwrap();
        assert_eq!(root, cwd);
        assert_eq!(
            choose_output_file(&args, &cwd, &PathBuf::from("/proj")).unwrap(),
            PathBuf::from("/proj").join(REQUIREMENTS_FILE)
        );
        assert_eq!(choose_merge_mode(&args).unwrap(), MergeMode::Merge);
    }

    #[test]
    fn test_broken_pyproject_keeps_cli_values() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), "[tool.reqscan\n").unwrap();
        let args =
            Args::try_parse_from(["reqscan", "--exclude", "docs", "--threads", "2"]).unwrap();

        let config = build_config(&args, dir.path());
        assert_eq!(config.exclude_dirs, vec!["docs".to_string()]);
        assert_eq!(config.threads, 2);
    }

    #[test]
    fn test_spinner_cleared_when_scan_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let spinner = ProgressBar::hidden();
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = run_scan(ScanConfig::new(dir.path().join("absent")), Some(&spinner));
        assert!(result.is_err());
        assert!(spinner.is_finished());
    }

    #[test]
    fn test_output_here() {
        let args = Args::try_parse_from(["reqscan", "proj", "--output-here"]).unwrap();
        let cwd = PathBuf::from("/work");
        assert_eq!(
            choose_output_file(&args, &cwd, Path::new("/proj")).unwrap(),
            cwd.join(REQUIREMENTS_FILE)
        );
    }
}
