//! Walks a workspace and records metadata for every regular file.

use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::time::{SystemTime, UNIX_EPOCH};

use walkdir::WalkDir;

use super::FileRecord;

pub fn collect(root: &Path, warnings: &mut Vec<String>) -> BTreeMap<String, FileRecord> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(false).into_iter() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "unknown path".to_string());
                tracing::warn!(path = %path, error = %e, "skipping unreadable entry");
                warnings.push(format!("skipped {path}: {e}"));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(relative) = relative_key(root, entry.path()) else {
            continue;
        };

        // the file can vanish between listing and stat
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %relative, error = %e, "skipping file");
                warnings.push(format!("skipped {relative}: {e}"));
                continue;
            }
        };

        let mtime = match metadata.modified() {
            Ok(t) => epoch_seconds(t),
            Err(e) => {
                warnings.push(format!("skipped {relative}: no modification time ({e})"));
                continue;
            }
        };

        files.insert(
            relative,
            FileRecord {
                mtime,
                size: metadata.len(),
            },
        );
    }

    files
}

/// Seconds since the epoch as a float. Times before 1970 come out negative.
pub fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

// path relative to the workspace, components joined with '/' on every platform
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;

    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return None;
    }

    Some(parts.join("/"))
}
