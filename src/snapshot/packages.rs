//! Installed python distributions, read from site-packages metadata
//! directories (`<name>-<version>.dist-info`, `<name>-<version>.egg-info`).

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::PackageRecord;

/// Collects packages from `dirs`. The first directory that provides a name
/// wins, matching interpreter import order.
pub fn collect(dirs: &[PathBuf], warnings: &mut Vec<String>) -> BTreeMap<String, PackageRecord> {
    let mut packages = BTreeMap::new();

    for dir in dirs {
        let read_dir = match fs::read_dir(dir) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot list package directory");
                warnings.push(format!("skipped package directory {}: {e}", dir.display()));
                continue;
            }
        };

        // name order decides between entries that normalize alike
        let mut names: Vec<_> = read_dir.filter_map(|e| e.ok()).map(|e| e.file_name()).collect();
        names.sort();

        for file_name in &names {
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            if let Some((name, version)) = parse_metadata_dir(file_name) {
                packages
                    .entry(normalize_name(name))
                    .or_insert(PackageRecord {
                        version: version.to_string(),
                    });
            }
        }
    }

    packages
}

/// Lowercases and maps `_` and `.` to `-`, so `My_Pkg` and `my-pkg` are the
/// same package.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_dash = false;

    for c in name.chars() {
        let c = match c {
            '_' | '.' | '-' => '-',
            c => c.to_ascii_lowercase(),
        };
        if c == '-' {
            if last_dash {
                continue;
            }
            last_dash = true;
        } else {
            last_dash = false;
        }
        normalized.push(c);
    }

    normalized
}

/// Splits a metadata directory name into `(name, version)`.
pub fn parse_metadata_dir(file_name: &str) -> Option<(&str, &str)> {
    if let Some(stem) = file_name.strip_suffix(".dist-info") {
        // wheel names escape '-' to '_', so the first '-' separates the version
        let (name, version) = stem.split_once('-')?;
        return non_empty(name, version);
    }

    if let Some(stem) = file_name.strip_suffix(".egg-info") {
        let (name, rest) = stem.split_once('-')?;
        // egg names may carry a "-py3.11" tag after the version
        let version = match rest.find("-py") {
            Some(idx) => &rest[..idx],
            None => rest,
        };
        return non_empty(name, version);
    }

    None
}

fn non_empty<'a>(name: &'a str, version: &'a str) -> Option<(&'a str, &'a str)> {
    if name.is_empty() || version.is_empty() {
        None
    } else {
        Some((name, version))
    }
}
