//! Append-only trace history.
//!
//! Every finished trace becomes one JSON object on one line of
//! `history.jsonl`, shared by all workspaces:
//!
//! ```text
//! {"timestamp":"2026-01-05T10:00:00Z","workspace":"/src/app","diff":{...}}
//! ```
//!
//! Entries are never rewritten or deleted. With a size bound configured, a
//! full file is renamed to the next numbered generation (`history.jsonl.1`,
//! `history.jsonl.2`, ...) and reads walk every generation, newest first.
//! Appending is best-effort: a history that cannot be written must not break
//! the command being traced.

pub mod sessions;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::diff::Diff;
use crate::error::{Error, Result};

pub const LOG_FILE_NAME: &str = "history.jsonl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-8601 UTC, e.g. `2026-01-05T10:00:00.123Z`.
    pub timestamp: String,
    pub workspace: PathBuf,
    pub diff: Diff,
}

/// Handle on the history file. Open once per command.
pub struct HistoryLog {
    path: PathBuf,
    max_bytes: Option<u64>,
}

impl HistoryLog {
    pub fn open(dir: impl AsRef<Path>) -> Self {
        HistoryLog {
            path: dir.as_ref().join(LOG_FILE_NAME),
            max_bytes: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        HistoryLog::open(&config.log_dir).with_max_bytes(config.max_log_bytes)
    }

    /// Move the file to the next numbered generation once it holds at least
    /// `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records `diff` for `workspace`. Failures are logged, never raised;
    /// the return value says whether the entry reached the file.
    pub fn append(&self, workspace: &Path, diff: &Diff) -> bool {
        match self.try_append(workspace, diff) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to record trace history");
                false
            }
        }
    }

    fn try_append(&self, workspace: &Path, diff: &Diff) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        self.rotate_if_full()?;

        let workspace = resolve_workspace(workspace)?;
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            workspace,
            diff: diff.clone(),
        };

        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        // single write so concurrent appenders interleave whole lines
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;

        tracing::debug!(path = %self.path.display(), "trace recorded");
        Ok(())
    }

    fn rotate_if_full(&self) -> Result<()> {
        let Some(max_bytes) = self.max_bytes else {
            return Ok(());
        };

        let len = match fs::metadata(&self.path) {
            Ok(m) => m.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        if len >= max_bytes {
            let next = self.generations()?.last().map_or(1, |(n, _)| n + 1);
            let rotated = self.generation_path(next);
            fs::rename(&self.path, &rotated)?;
            tracing::debug!(to = %rotated.display(), bytes = len, "rotated trace history");
        }

        Ok(())
    }

    fn generation_path(&self, n: u64) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    // rotated files as (generation, path), oldest first
    fn generations(&self) -> Result<Vec<(u64, PathBuf)>> {
        let Some(dir) = self.path.parent() else {
            return Ok(Vec::new());
        };
        let read_dir = match fs::read_dir(dir) {
            Ok(r) => r,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{LOG_FILE_NAME}.");
        let mut generations: Vec<_> = read_dir
            .filter_map(|e| e.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let n = name.to_str()?.strip_prefix(&prefix)?.parse::<u64>().ok()?;
                Some((n, entry.path()))
            })
            .collect();
        generations.sort_by_key(|(n, _)| *n);

        Ok(generations)
    }

    // every history file, oldest first, current file last
    fn history_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<_> = self.generations()?.into_iter().map(|(_, p)| p).collect();
        files.push(self.path.clone());
        Ok(files)
    }

    /// The newest entry, or the newest for `workspace` when given.
    ///
    /// A missing or empty history is `Ok(None)`. A final line that does not
    /// parse (torn write, corruption) is an error; damaged lines further back
    /// are skipped.
    pub fn read_last(&self, workspace: Option<&Path>) -> Result<Option<LogEntry>> {
        let workspace = workspace.map(resolve_workspace).transpose()?;
        let mut at_final_line = true;

        for path in self.history_files()?.iter().rev() {
            let Some(content) = read_content(path)? else {
                continue;
            };

            for (line_no, line) in numbered_lines(&content).into_iter().rev() {
                match serde_json::from_str::<LogEntry>(line) {
                    Ok(entry) => {
                        if workspace.as_ref().map_or(true, |ws| &entry.workspace == ws) {
                            return Ok(Some(entry));
                        }
                    }
                    Err(source) if at_final_line => {
                        return Err(Error::CorruptEntry { line: line_no, source });
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), line = line_no, error = %e, "skipping corrupt history entry");
                    }
                }
                at_final_line = false;
            }
        }

        Ok(None)
    }

    /// All readable entries across every generation, oldest first, optionally
    /// limited to one workspace.
    pub fn entries(&self, workspace: Option<&Path>) -> Result<Vec<LogEntry>> {
        let workspace = workspace.map(resolve_workspace).transpose()?;
        let mut entries = Vec::new();

        for path in self.history_files()? {
            let Some(content) = read_content(&path)? else {
                continue;
            };

            entries.extend(
                numbered_lines(&content)
                    .into_iter()
                    .filter_map(|(line_no, line)| match serde_json::from_str::<LogEntry>(line) {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            tracing::warn!(path = %path.display(), line = line_no, error = %e, "skipping corrupt history entry");
                            None
                        }
                    })
                    .filter(|entry| workspace.as_ref().map_or(true, |ws| &entry.workspace == ws)),
            );
        }

        Ok(entries)
    }
}

fn read_content(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// canonical when the directory still exists, so symlinked spellings match
fn resolve_workspace(workspace: &Path) -> std::io::Result<PathBuf> {
    workspace
        .canonicalize()
        .or_else(|_| std::path::absolute(workspace))
}

// non-blank lines with 1-based line numbers
fn numbered_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect()
}
