//! Snapshot comparison engine.
//!
//! Compares two snapshots and reports changes:
//! - Files are matched by relative path only, so a rename is a delete plus a create
//! - A file is modified when its mtime or its size differs
//! - Packages are matched by normalized name; any version change is an upgrade,
//!   downgrades included
//!
//! Output lists are sorted (files by path, packages by name) so the same two
//! snapshots always produce the same diff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedFile {
    pub path: String,
    pub mtime: f64,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedFile {
    pub path: String,
    pub before_mtime: f64,
    pub after_mtime: f64,
    pub before_size: u64,
    pub after_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedFile {
    pub path: String,
    pub mtime: f64,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradedPackage {
    pub name: String,
    pub before_version: String,
    pub after_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileChanges {
    #[serde(default)]
    pub created: Vec<CreatedFile>,
    #[serde(default)]
    pub modified: Vec<ModifiedFile>,
    #[serde(default)]
    pub deleted: Vec<DeletedFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageChanges {
    #[serde(default)]
    pub installed: Vec<PackageVersion>,
    #[serde(default)]
    pub removed: Vec<PackageVersion>,
    #[serde(default)]
    pub upgraded: Vec<UpgradedPackage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    #[serde(default)]
    pub files: FileChanges,
    #[serde(default)]
    pub packages: PackageChanges,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    pub fn change_count(&self) -> usize {
        self.files.created.len()
            + self.files.modified.len()
            + self.files.deleted.len()
            + self.packages.installed.len()
            + self.packages.removed.len()
            + self.packages.upgraded.len()
    }
}

/// Inclusive time range, in epoch seconds, that file changes must fall in to
/// be reported by [`diff_within`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureWindow {
    pub start: f64,
    pub end: f64,
}

impl CaptureWindow {
    pub fn new(start: f64, end: f64) -> Self {
        CaptureWindow { start, end }
    }

    /// Extends both ends by `slack`. Filesystems with coarse timestamps can
    /// stamp a file written just after `start` with a time just before it.
    pub fn widen(self, slack: Duration) -> Self {
        let slack = slack.as_secs_f64();
        CaptureWindow {
            start: self.start - slack,
            end: self.end + slack,
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Every structural difference between `before` and `after`.
pub fn diff(before: &Snapshot, after: &Snapshot) -> Diff {
    compare(before, after, None)
}

/// Like [`diff`], but drops file changes whose timestamp is outside `window`.
/// Created and modified files are judged by their new mtime, deleted files by
/// their last known mtime. Packages carry no timestamp and are never filtered.
pub fn diff_within(before: &Snapshot, after: &Snapshot, window: &CaptureWindow) -> Diff {
    compare(before, after, Some(window))
}

fn compare(before: &Snapshot, after: &Snapshot, window: Option<&CaptureWindow>) -> Diff {
    let in_window = |t: f64| window.map_or(true, |w| w.contains(t));

    let mut files = FileChanges::default();

    // BTreeMap iteration is already sorted by path
    for (path, after_rec) in &after.files {
        match before.files.get(path) {
            None => {
                if in_window(after_rec.mtime) {
                    files.created.push(CreatedFile {
                        path: path.clone(),
                        mtime: after_rec.mtime,
                        size: after_rec.size,
                    });
                }
            }
            Some(before_rec) => {
                let changed = before_rec.mtime != after_rec.mtime || before_rec.size != after_rec.size;
                if changed && in_window(after_rec.mtime) {
                    files.modified.push(ModifiedFile {
                        path: path.clone(),
                        before_mtime: before_rec.mtime,
                        after_mtime: after_rec.mtime,
                        before_size: before_rec.size,
                        after_size: after_rec.size,
                    });
                }
            }
        }
    }

    for (path, before_rec) in &before.files {
        if !after.files.contains_key(path) && in_window(before_rec.mtime) {
            files.deleted.push(DeletedFile {
                path: path.clone(),
                mtime: before_rec.mtime,
                size: before_rec.size,
            });
        }
    }

    let mut packages = PackageChanges::default();

    for (name, after_pkg) in &after.packages {
        match before.packages.get(name) {
            None => packages.installed.push(PackageVersion {
                name: name.clone(),
                version: after_pkg.version.clone(),
            }),
            Some(before_pkg) if before_pkg.version != after_pkg.version => {
                packages.upgraded.push(UpgradedPackage {
                    name: name.clone(),
                    before_version: before_pkg.version.clone(),
                    after_version: after_pkg.version.clone(),
                });
            }
            Some(_) => {}
        }
    }

    for (name, before_pkg) in &before.packages {
        if !after.packages.contains_key(name) {
            packages.removed.push(PackageVersion {
                name: name.clone(),
                version: before_pkg.version.clone(),
            });
        }
    }

    Diff { files, packages }
}
