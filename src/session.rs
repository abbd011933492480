//! Trace sessions.
//!
//! A [`TraceSession`] holds the "before" snapshot of one workspace. It is an
//! ordinary value, so several traces can be in flight at once, and it
//! serializes so `execdiff start` and `execdiff stop` can run as separate
//! processes.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::diff::{self, CaptureWindow, Diff};
use crate::error::{Error, Result};
use crate::snapshot::{self, files::epoch_seconds, PackageSource, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiffMode {
    /// Report every difference between the two snapshots.
    Full,
    /// Only report file changes stamped inside the trace, widened by `slack`.
    Windowed { slack: Duration },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSession {
    workspace: PathBuf,
    before: Snapshot,
    started_at: f64,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(skip, default = "disabled_source")]
    source: PackageSource,
}

fn disabled_source() -> PackageSource {
    PackageSource::Disabled
}

#[derive(Debug, Clone)]
pub struct TraceOutcome {
    pub workspace: PathBuf,
    pub diff: Diff,
    pub window: CaptureWindow,
    /// Items skipped by either capture.
    pub warnings: Vec<String>,
}

impl TraceSession {
    /// Captures the "before" state of `workspace`.
    pub fn begin(workspace: &Path, config: &Config) -> Result<Self> {
        TraceSession::begin_with(workspace, PackageSource::from_config(config))
    }

    pub fn begin_with(workspace: &Path, source: PackageSource) -> Result<Self> {
        if !workspace.is_dir() {
            return Err(Error::WorkspaceNotFound(workspace.to_path_buf()));
        }
        let workspace = workspace.canonicalize()?;

        let capture = snapshot::capture(&workspace, &source);
        let started_at = epoch_seconds(SystemTime::now());

        tracing::debug!(workspace = %workspace.display(), started_at, "trace started");

        Ok(TraceSession {
            workspace,
            before: capture.snapshot,
            started_at,
            warnings: capture.warnings,
            source,
        })
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn before(&self) -> &Snapshot {
        &self.before
    }

    /// Restores the package source after deserialization, which does not
    /// carry it.
    pub fn with_source(mut self, source: PackageSource) -> Self {
        self.source = source;
        self
    }

    /// Captures the "after" state and diffs it against "before".
    pub fn finish(self, mode: DiffMode) -> TraceOutcome {
        let ended_at = epoch_seconds(SystemTime::now());
        let capture = snapshot::capture(&self.workspace, &self.source);

        let window = CaptureWindow::new(self.started_at, ended_at);
        let diff = match mode {
            DiffMode::Full => diff::diff(&self.before, &capture.snapshot),
            DiffMode::Windowed { slack } => {
                diff::diff_within(&self.before, &capture.snapshot, &window.widen(slack))
            }
        };

        tracing::debug!(
            workspace = %self.workspace.display(),
            changes = diff.change_count(),
            "trace finished"
        );

        let mut warnings = self.warnings;
        warnings.extend(capture.warnings);

        TraceOutcome {
            workspace: self.workspace,
            diff,
            window,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_workspace_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = TraceSession::begin_with(&dir.path().join("nope"), PackageSource::Disabled);
        assert!(matches!(result, Err(Error::WorkspaceNotFound(_))));
    }

    #[test]
    fn full_trace_sees_created_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "k").unwrap();

        let session = TraceSession::begin_with(dir.path(), PackageSource::Disabled).unwrap();
        fs::write(dir.path().join("made.txt"), "made").unwrap();
        let outcome = session.finish(DiffMode::Full);

        assert_eq!(outcome.diff.files.created.len(), 1);
        assert_eq!(outcome.diff.files.created[0].path, "made.txt");
        assert_eq!(outcome.diff.files.created[0].size, 4);
        assert!(outcome.diff.files.modified.is_empty());
        assert!(outcome.window.start <= outcome.window.end);
    }

    #[test]
    fn sessions_are_independent() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();

        let first = TraceSession::begin_with(a.path(), PackageSource::Disabled).unwrap();
        let second = TraceSession::begin_with(b.path(), PackageSource::Disabled).unwrap();
        fs::write(b.path().join("only_b.txt"), "b").unwrap();

        assert!(first.finish(DiffMode::Full).diff.is_empty());
        assert_eq!(second.finish(DiffMode::Full).diff.files.created.len(), 1);
    }

    #[test]
    fn windowed_trace_ignores_preexisting_deletions() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.txt");
        fs::write(&old, "x").unwrap();

        let mut session = TraceSession::begin_with(dir.path(), PackageSource::Disabled).unwrap();
        // pretend the file was last touched long before the trace
        session.before.files.get_mut("old.txt").unwrap().mtime = 1.0;
        fs::remove_file(&old).unwrap();

        let windowed = session.clone().finish(DiffMode::Windowed { slack: Duration::ZERO });
        assert!(windowed.diff.files.deleted.is_empty());

        let full = session.finish(DiffMode::Full);
        assert_eq!(full.diff.files.deleted.len(), 1);
    }

    #[test]
    fn session_survives_serialization() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let session = TraceSession::begin_with(dir.path(), PackageSource::Disabled).unwrap();
        let json = serde_json::to_string(&session).unwrap();
        let restored: TraceSession = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.workspace(), session.workspace());
        assert_eq!(restored.before(), session.before());
    }
}
