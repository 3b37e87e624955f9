use mta_rust_reqscan_core::{
    DependencyScanner, Manifest, MergeMode, PackageIndex, PythonEnvironment, ScanConfig,
    ScanReport, REQUIREMENTS_FILE,
};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A fake site-packages with one `*.dist-info` per (name, version, top_level)
fn site_packages(dists: &[(&str, &str, Option<&str>)]) -> TempDir {
    let site = TempDir::new().unwrap();
    for (name, version, top_level) in dists {
        let dir = site.path().join(format!("{}-{}.dist-info", name, version));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("METADATA"),
            format!("Metadata-Version: 2.1\nName: {}\nVersion: {}\n", name, version),
        )
        .unwrap();
        if let Some(top_level) = top_level {
            fs::write(dir.join("top_level.txt"), top_level).unwrap();
        }
    }
    site
}

fn scan(root: &Path, site: &Path) -> ScanReport {
    let environment = PythonEnvironment::offline().with_search_paths(vec![site.to_path_buf()]);
    let index = PackageIndex::discover(&environment.search_paths);
    DependencyScanner::with_environment(ScanConfig::new(root.to_path_buf()), environment, index)
        .unwrap()
        .scan()
}

/// Scan and write the manifest the way the CLI does; `None` when nothing
/// would be written.
fn generate(root: &Path, site: &Path, mode: MergeMode) -> Option<String> {
    let report = scan(root, site);
    if !report.has_requirements() {
        return None;
    }
    let path = root.join(REQUIREMENTS_FILE);
    let detected = report
        .requirements
        .iter()
        .map(|(name, version)| (name.as_str(), Some(version.as_str())));
    Manifest::reconcile(&path, mode, detected)
        .unwrap()
        .write(&path)
        .unwrap();
    Some(fs::read_to_string(path).unwrap())
}

#[test]
fn stdlib_and_local_only_writes_nothing() {
    let project = TempDir::new().unwrap();
    let site = site_packages(&[]);
    write(project.path(), "main.py", "import os\nimport sys\nimport helpers\n");
    write(project.path(), "helpers.py", "import os\n");

    let report = scan(project.path(), site.path());
    assert!(report.imports.external.is_empty());
    assert!(report.imports.local.contains("helpers"));

    assert_eq!(generate(project.path(), site.path(), MergeMode::Merge), None);
    assert!(!project.path().join(REQUIREMENTS_FILE).exists());
}

#[test]
fn external_package_pinned_and_local_package_excluded() {
    let project = TempDir::new().unwrap();
    let site = site_packages(&[("requests", "2.31.0", Some("requests\n"))]);
    write(
        project.path(),
        "app.py",
        "import requests\nfrom mypkg.core import run\n",
    );
    write(project.path(), "mypkg/__init__.py", "");
    write(project.path(), "mypkg/core.py", "from . import util\n");
    write(project.path(), "mypkg/util.py", "");

    let manifest = generate(project.path(), site.path(), MergeMode::Merge).unwrap();
    assert_eq!(manifest, "requests==2.31.0\n");
}

#[test]
fn merge_keeps_manual_entries_and_refreshes_versions() {
    let project = TempDir::new().unwrap();
    let site = site_packages(&[("requests", "2.31.0", None)]);
    write(project.path(), "app.py", "import requests\n");
    write(
        project.path(),
        REQUIREMENTS_FILE,
        "requests==2.0.0\n# manually added\nblack\n",
    );

    let manifest = generate(project.path(), site.path(), MergeMode::Merge).unwrap();
    assert_eq!(manifest, "black\nrequests==2.31.0\n");
}

#[test]
fn overwrite_discards_manual_entries() {
    let project = TempDir::new().unwrap();
    let site = site_packages(&[("requests", "2.31.0", None)]);
    write(project.path(), "app.py", "import requests\n");
    write(project.path(), REQUIREMENTS_FILE, "black\nrequests==2.0.0\n");

    let manifest = generate(project.path(), site.path(), MergeMode::Overwrite).unwrap();
    assert_eq!(manifest, "requests==2.31.0\n");
}

#[test]
fn invalid_file_does_not_stop_the_scan() {
    let project = TempDir::new().unwrap();
    let site = site_packages(&[
        ("requests", "2.31.0", None),
        ("numpy", "1.26.4", None),
    ]);
    write(project.path(), "good.py", "import requests\n");
    write(project.path(), "broken.py", "import numpy\ndef oops(:\n");

    let report = scan(project.path(), site.path());
    assert_eq!(report.stats.total_files, 2);
    assert!(report.imports.external.contains("requests"));
    assert!(!report.imports.external.contains("numpy"));
    assert_eq!(report.requirements.len(), 1);
}

#[test]
fn merge_twice_is_byte_identical() {
    let project = TempDir::new().unwrap();
    let site = site_packages(&[
        ("PyYAML", "6.0.1", Some("_yaml\nyaml\n")),
        ("beautifulsoup4", "4.12.3", Some("bs4\n")),
        ("requests", "2.31.0+local", None),
    ]);
    write(
        project.path(),
        "svc/main.py",
        "import yaml\nfrom bs4 import BeautifulSoup\nimport requests.adapters\nimport missing_dist\n",
    );
    write(project.path(), REQUIREMENTS_FILE, "Django>=4.2\nblack\n");

    let first = generate(project.path(), site.path(), MergeMode::Merge).unwrap();
    let second = generate(project.path(), site.path(), MergeMode::Merge).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first,
        "beautifulsoup4==4.12.3\nblack\nDjango>=4.2\nPyYAML==6.0.1\nrequests==2.31.0\n"
    );
}

#[test]
fn virtual_env_inside_project_is_ignored() {
    let project = TempDir::new().unwrap();
    let site = site_packages(&[("requests", "2.31.0", None)]);
    write(project.path(), "app.py", "import requests\n");
    write(project.path(), "runtime/pyvenv.cfg", "home = /usr/bin\n");
    write(
        project.path(),
        "runtime/lib/python3.12/site-packages/flask/__init__.py",
        "import werkzeug\n",
    );

    let report = scan(project.path(), site.path());
    assert_eq!(report.stats.total_files, 1);
    assert!(!report.imports.external.contains("werkzeug"));
}

#[test]
fn removed_stdlib_module_pins_its_backport() {
    let project = TempDir::new().unwrap();
    let site = site_packages(&[("legacy-cgi", "2.6.1", Some("cgi\n"))]);
    write(project.path(), "form.py", "import cgi\nimport os\n");

    let probe = json!({
        "version": "3.13",
        "executable": "/usr/bin/python3.13",
        "stdlib_module_names": ["os", "sys"],
        "builtin_module_names": ["sys"],
        "stdlib": null,
        "path": ["", site.path()],
    });
    let environment = PythonEnvironment::from_probe_output(&probe.to_string()).unwrap();
    let index = PackageIndex::discover(&environment.search_paths);
    let report =
        DependencyScanner::with_environment(ScanConfig::new(project.path().to_path_buf()), environment, index)
            .unwrap()
            .scan();

    assert!(report.imports.stdlib.contains("os"));
    assert!(report.imports.external.contains("cgi"));
    assert_eq!(report.requirements.get("legacy-cgi").map(String::as_str), Some("2.6.1"));
}

#[test]
fn broken_pyproject_does_not_stop_the_scan() {
    let project = TempDir::new().unwrap();
    let site = site_packages(&[("requests", "2.31.0", None)]);
    write(project.path(), "app.py", "import requests\n");
    write(
        project.path(),
        "pyproject.toml",
        "[tool.reqscan]\nexclude = [\"{{ cookiecutter.tests_dir }}\"\nunknown = 1\n",
    );

    let config = ScanConfig::new(project.path().to_path_buf())
        .with_threads(1)
        .with_project_file();
    assert!(config.exclude_dirs.is_empty());
    assert_eq!(config.threads, 1);

    let environment = PythonEnvironment::offline().with_search_paths(vec![site.path().to_path_buf()]);
    let index = PackageIndex::discover(&environment.search_paths);
    let report = DependencyScanner::with_environment(config, environment, index)
        .unwrap()
        .scan();
    assert_eq!(report.requirements.get("requests").map(String::as_str), Some("2.31.0"));
}
