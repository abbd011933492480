//! Plain text summary of one history entry.
//!
//! Sections appear in a fixed order and only when non-empty:
//! Installed, Upgraded, Removed, Modified, Created, Deleted.

use crate::diff::Diff;
use crate::store::LogEntry;

use super::{NO_CHANGES, NO_HISTORY};

pub fn render(entry: Option<&LogEntry>) -> String {
    let Some(entry) = entry else {
        return format!("{NO_HISTORY}\n");
    };

    render_diff(&entry.diff)
}

pub fn render_diff(diff: &Diff) -> String {
    if diff.is_empty() {
        return format!("{NO_CHANGES}\n");
    }

    let mut output = String::new();
    let packages = &diff.packages;
    let files = &diff.files;

    section(&mut output, "Installed", packages.installed.iter().map(|p| {
        format!("+ {} {}", p.name, p.version)
    }));
    section(&mut output, "Upgraded", packages.upgraded.iter().map(|p| {
        format!("^ {} {} -> {}", p.name, p.before_version, p.after_version)
    }));
    section(&mut output, "Removed", packages.removed.iter().map(|p| {
        format!("- {} {}", p.name, p.version)
    }));
    section(&mut output, "Modified", files.modified.iter().map(|f| format!("~ {}", f.path)));
    section(&mut output, "Created", files.created.iter().map(|f| format!("+ {}", f.path)));
    section(&mut output, "Deleted", files.deleted.iter().map(|f| format!("- {}", f.path)));

    output
}

fn section(output: &mut String, title: &str, lines: impl Iterator<Item = String>) {
    let mut lines = lines.peekable();
    if lines.peek().is_none() {
        return;
    }

    if !output.is_empty() {
        output.push('\n');
    }
    output.push_str(title);
    output.push_str(":\n");
    for line in lines {
        output.push_str("  ");
        output.push_str(&line);
        output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{CreatedFile, DeletedFile, ModifiedFile, PackageVersion, UpgradedPackage};
    use std::path::PathBuf;

    fn entry(diff: Diff) -> LogEntry {
        LogEntry {
            timestamp: "2026-01-01T00:00:00.000Z".into(),
            workspace: PathBuf::from("/ws"),
            diff,
        }
    }

    #[test]
    fn absent_entry_renders_no_history() {
        assert_eq!(render(None), "No trace history found.\n");
    }

    #[test]
    fn empty_diff_renders_no_changes_without_headers() {
        let out = render(Some(&entry(Diff::default())));
        assert_eq!(out, "No changes detected.\n");
        assert!(!out.contains("Created"));
    }

    #[test]
    fn sections_in_fixed_order() {
        let mut diff = Diff::default();
        diff.files.deleted.push(DeletedFile { path: "gone.txt".into(), mtime: 1.0, size: 1 });
        diff.files.created.push(CreatedFile { path: "b.txt".into(), mtime: 2.0, size: 1 });
        diff.files.modified.push(ModifiedFile {
            path: "a.txt".into(),
            before_mtime: 1.0,
            after_mtime: 2.0,
            before_size: 5,
            after_size: 5,
        });
        diff.packages.removed.push(PackageVersion { name: "old".into(), version: "0.1".into() });
        diff.packages.upgraded.push(UpgradedPackage {
            name: "foo".into(),
            before_version: "1.0".into(),
            after_version: "2.0".into(),
        });
        diff.packages.installed.push(PackageVersion { name: "requests".into(), version: "2.0".into() });

        let out = render(Some(&entry(diff)));
        let expected = "\
Installed:
  + requests 2.0

Upgraded:
  ^ foo 1.0 -> 2.0

Removed:
  - old 0.1

Modified:
  ~ a.txt

Created:
  + b.txt

Deleted:
  - gone.txt
";
        assert_eq!(out, expected);
    }

    #[test]
    fn empty_sections_are_omitted() {
        let mut diff = Diff::default();
        diff.files.created.push(CreatedFile { path: "b.txt".into(), mtime: 2.0, size: 1 });

        let out = render(Some(&entry(diff)));
        assert_eq!(out, "Created:\n  + b.txt\n");
    }
}
