//! Go project directory inspection.

use crate::error::GomakerError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static PACKAGE_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^package\s+([A-Za-z_][A-Za-z0-9_]*)").expect("package pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Canonical project directory.
    pub dir: PathBuf,
    /// Binary name, same as `go build` picks: the directory's last component.
    pub name: String,
    /// The source file whose package clause was checked.
    pub source: PathBuf,
}

pub fn inspect(dir: &Path) -> Result<Project, GomakerError> {
    let dir = fs::canonicalize(dir).map_err(|source| GomakerError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let source = find_go_file(&dir)?.ok_or_else(|| GomakerError::NoGoFiles(dir.clone()))?;
    debug!(source = %source.display(), "checking package clause");

    match package_name(&source)? {
        Some(package) if package == "main" => {}
        Some(package) => return Err(GomakerError::NotMainPackage { path: source, package }),
        None => return Err(GomakerError::MissingPackageClause(source)),
    }

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string());

    Ok(Project { dir, name, source })
}

fn is_go_source(name: &str) -> bool {
    !name.starts_with('.') && name.ends_with(".go")
}

/// First visible `*.go` file by name, preferring non-test sources.
fn find_go_file(dir: &Path) -> Result<Option<PathBuf>, GomakerError> {
    let entries = fs::read_dir(dir).map_err(|source| GomakerError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let unreadable = |source| GomakerError::Directory {
        path: dir.to_path_buf(),
        source,
    };
    let mut sources: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(unreadable)?;
        if !entry.file_type().map_err(unreadable)?.is_file() {
            continue;
        }
        if is_go_source(&entry.file_name().to_string_lossy()) {
            sources.push(entry.path());
        }
    }
    sources.sort();

    let is_test = |p: &PathBuf| p.to_string_lossy().ends_with("_test.go");
    let pick = sources
        .iter()
        .find(|p| !is_test(p))
        .or_else(|| sources.first())
        .cloned();
    Ok(pick)
}

/// Package name from the first `package` clause in a Go file.
pub fn package_name(path: &Path) -> Result<Option<String>, GomakerError> {
    let content = fs::read_to_string(path).map_err(|source| GomakerError::SourceRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PACKAGE_CLAUSE
        .captures(&content)
        .map(|cap| cap[1].to_string()))
}
