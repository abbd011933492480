//! Pending trace sessions for `execdiff start` / `execdiff stop`.
//!
//! One JSON file per workspace under `<log dir>/sessions/`, named by the
//! SHA-256 of the canonical workspace path.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::session::TraceSession;

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn open(log_dir: impl AsRef<Path>) -> Self {
        SessionStore {
            dir: log_dir.as_ref().join("sessions"),
        }
    }

    /// Saves `session`, replacing any pending session for the same workspace.
    pub fn save(&self, session: &TraceSession) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.session_path(session.workspace());
        let json = serde_json::to_vec(session)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Removes and returns the pending session for `workspace`. Fails with
    /// [`Error::NoActiveTrace`] when none was started for it.
    pub fn take(&self, workspace: &Path) -> Result<TraceSession> {
        if !workspace.is_dir() {
            return Err(Error::WorkspaceNotFound(workspace.to_path_buf()));
        }
        let workspace = workspace.canonicalize()?;
        let path = self.session_path(&workspace);

        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NoActiveTrace(workspace));
            }
            Err(e) => return Err(e.into()),
        };

        let session: TraceSession = serde_json::from_slice(&bytes)?;
        if session.workspace() != workspace.as_path() {
            tracing::warn!(
                requested = %workspace.display(),
                stored = %session.workspace().display(),
                "session file belongs to another workspace"
            );
            return Err(Error::NoActiveTrace(workspace));
        }

        fs::remove_file(&path)?;
        Ok(session)
    }

    fn session_path(&self, workspace: &Path) -> PathBuf {
        self.dir.join(format!("{}.json", session_key(workspace)))
    }
}

fn session_key(workspace: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(workspace.as_os_str().as_encoded_bytes());
    hex::encode(hasher.finalize())
}
