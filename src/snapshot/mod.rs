//! Workspace snapshots.
//!
//! A snapshot is the state of one workspace at one instant:
//! - every regular file under the root, keyed by `/`-joined relative path
//! - every installed python distribution, keyed by normalized name
//!
//! Capture is best-effort. Files or package directories that cannot be read
//! are left out and reported as warnings on the returned [`Capture`].

pub mod files;
pub mod packages;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::platform;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Seconds since the unix epoch, sub-second precision kept.
    pub mtime: f64,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub files: BTreeMap<String, FileRecord>,
    pub packages: BTreeMap<String, PackageRecord>,
}

/// A snapshot plus everything that had to be skipped to produce it.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub snapshot: Snapshot,
    pub warnings: Vec<String>,
}

/// Where installed packages are looked up.
#[derive(Debug, Clone)]
pub enum PackageSource {
    /// Ask the python interpreter on PATH for its site directories.
    Interpreter(platform::Platform),
    /// Scan exactly these directories, in order.
    Dirs(Vec<PathBuf>),
    /// Do not track packages.
    Disabled,
}

impl PackageSource {
    pub fn from_config(config: &Config) -> Self {
        if config.package_dirs.is_empty() {
            PackageSource::Interpreter(config.platform)
        } else {
            PackageSource::Dirs(config.package_dirs.clone())
        }
    }

    fn resolve_dirs(&self) -> Vec<PathBuf> {
        match self {
            PackageSource::Interpreter(platform) => platform::python_site_dirs(*platform),
            PackageSource::Dirs(dirs) => dirs.clone(),
            PackageSource::Disabled => Vec::new(),
        }
    }
}

/// Captures the current state of `workspace`. Never fails; anything that
/// could not be observed shows up in `warnings` instead.
pub fn capture(workspace: &Path, source: &PackageSource) -> Capture {
    let mut warnings = Vec::new();

    let files = files::collect(workspace, &mut warnings);

    let dirs = source.resolve_dirs();
    if dirs.is_empty() && !matches!(source, PackageSource::Disabled) {
        warnings.push("no package directories found, package tracking skipped".to_string());
    }
    let packages = packages::collect(&dirs, &mut warnings);

    tracing::debug!(
        workspace = %workspace.display(),
        files = files.len(),
        packages = packages.len(),
        skipped = warnings.len(),
        "snapshot captured"
    );

    Capture {
        snapshot: Snapshot { files, packages },
        warnings,
    }
}
