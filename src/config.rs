use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::platform::{self, Platform};

/// Environment variable that overrides the history log directory.
pub const LOG_DIR_ENV: &str = "EXECDIFF_LOG_DIR";

const DEFAULT_DIR_NAME: &str = ".execdiff";

pub struct Config {
    pub log_dir: PathBuf,
    /// Explicit site-packages directories. Empty means ask the interpreter.
    pub package_dirs: Vec<PathBuf>,
    pub window_slack: Duration,
    pub max_log_bytes: Option<u64>,
    pub platform: Platform,
}

/// On-disk shape of config.toml. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub log_dir: Option<PathBuf>,
    pub package_dirs: Vec<PathBuf>,
    pub window_slack: Option<String>,
    pub max_log_bytes: Option<u64>,
}

impl FileConfig {
    /// Reads a config file. A missing file yields the defaults.
    pub fn read(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileConfig::default()),
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Location of config.toml (~/.config/execdiff/config.toml or platform equivalent).
pub fn config_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "execdiff")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    /// Resolves configuration from the environment, the config file and the
    /// built-in defaults, in that order of precedence.
    pub fn load() -> Result<Self> {
        let file = match config_file_path() {
            Some(path) => FileConfig::read(&path)?,
            None => FileConfig::default(),
        };

        Config::resolve(file, std::env::var_os(LOG_DIR_ENV), platform::home_dir())
    }

    /// Like [`Config::load`], but a malformed config file or a missing home
    /// directory is logged and replaced by the defaults instead of failing.
    pub fn load_or_default() -> Self {
        let file = match config_file_path() {
            Some(path) => FileConfig::read(&path),
            None => Ok(FileConfig::default()),
        };

        Config::resolve_or_default(file, std::env::var_os(LOG_DIR_ENV), platform::home_dir())
    }

    /// Resolves `file` when it loaded and is valid. Otherwise the log
    /// directory comes from the environment, then `~/.execdiff`, then the
    /// temp directory, with no slack and no rotation.
    pub fn resolve_or_default(
        file: Result<FileConfig>,
        env_log_dir: Option<OsString>,
        home: Option<PathBuf>,
    ) -> Self {
        let resolved = file.and_then(|f| Config::resolve(f, env_log_dir.clone(), home.clone()));
        match resolved {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring configuration, using defaults");
                let log_dir = env_log_dir
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
                    .or_else(|| home.map(|h| h.join(DEFAULT_DIR_NAME)))
                    .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DIR_NAME));
                Config::with_log_dir(log_dir)
            }
        }
    }

    pub fn resolve(
        file: FileConfig,
        env_log_dir: Option<OsString>,
        home: Option<PathBuf>,
    ) -> Result<Self> {
        let log_dir = match env_log_dir.filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => match file.log_dir {
                Some(dir) => dir,
                None => home.ok_or(Error::NoHomeDir)?.join(DEFAULT_DIR_NAME),
            },
        };

        let window_slack = match file.window_slack.as_deref() {
            Some(s) => humantime::parse_duration(s)?,
            None => Duration::ZERO,
        };

        Ok(Config {
            log_dir,
            package_dirs: file.package_dirs,
            window_slack,
            max_log_bytes: file.max_log_bytes,
            platform: platform::detect(),
        })
    }

    /// Configuration rooted at an explicit log directory, used by tests and
    /// embedders that manage their own storage.
    pub fn with_log_dir(log_dir: impl Into<PathBuf>) -> Self {
        Config {
            log_dir: log_dir.into(),
            package_dirs: Vec::new(),
            window_slack: Duration::ZERO,
            max_log_bytes: None,
            platform: platform::detect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> Option<PathBuf> {
        Some(PathBuf::from("/home/dev"))
    }

    #[test]
    fn default_log_dir_under_home() {
        let config = Config::resolve(FileConfig::default(), None, home()).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/home/dev/.execdiff"));
        assert_eq!(config.window_slack, Duration::ZERO);
        assert!(config.max_log_bytes.is_none());
    }

    #[test]
    fn env_overrides_file() {
        let file = FileConfig {
            log_dir: Some(PathBuf::from("/from/file")),
            ..FileConfig::default()
        };
        let config = Config::resolve(file, Some(OsString::from("/from/env")), home()).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/from/env"));
    }

    #[test]
    fn empty_env_value_ignored() {
        let file = FileConfig {
            log_dir: Some(PathBuf::from("/from/file")),
            ..FileConfig::default()
        };
        let config = Config::resolve(file, Some(OsString::new()), home()).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/from/file"));
    }

    #[test]
    fn missing_home_without_override_is_error() {
        let result = Config::resolve(FileConfig::default(), None, None);
        assert!(matches!(result, Err(Error::NoHomeDir)));
    }

    #[test]
    fn parses_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "window_slack = \"2s\"\nmax_log_bytes = 1024\npackage_dirs = [\"/opt/site\"]\n",
        )
        .unwrap();

        let file = FileConfig::read(&path).unwrap();
        let config = Config::resolve(file, None, home()).unwrap();
        assert_eq!(config.window_slack, Duration::from_secs(2));
        assert_eq!(config.max_log_bytes, Some(1024));
        assert_eq!(config.package_dirs, vec![PathBuf::from("/opt/site")]);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileConfig::read(&dir.path().join("nope.toml")).unwrap();
        assert!(file.log_dir.is_none());
        assert!(file.package_dirs.is_empty());
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_log_bytes = \"lots\"").unwrap();
        assert!(matches!(FileConfig::read(&path), Err(Error::Config { .. })));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_log_bytes = \"lots\"").unwrap();

        let config = Config::resolve_or_default(FileConfig::read(&path), None, home());
        assert_eq!(config.log_dir, PathBuf::from("/home/dev/.execdiff"));
        assert!(config.max_log_bytes.is_none());
        assert_eq!(config.window_slack, Duration::ZERO);
    }

    #[test]
    fn fallback_still_honours_env_log_dir() {
        let file = FileConfig {
            log_dir: Some(PathBuf::from("/from/file")),
            window_slack: Some("soon".into()),
            ..FileConfig::default()
        };
        let config = Config::resolve_or_default(Ok(file), Some(OsString::from("/from/env")), home());
        assert_eq!(config.log_dir, PathBuf::from("/from/env"));
    }

    #[test]
    fn missing_home_falls_back_to_temp_dir() {
        let config = Config::resolve_or_default(Ok(FileConfig::default()), None, None);
        assert_eq!(config.log_dir, std::env::temp_dir().join(".execdiff"));
    }

    #[test]
    fn valid_file_is_used_as_is() {
        let file = FileConfig {
            max_log_bytes: Some(4096),
            ..FileConfig::default()
        };
        let config = Config::resolve_or_default(Ok(file), None, home());
        assert_eq!(config.max_log_bytes, Some(4096));
    }

    #[test]
    fn bad_slack_is_error() {
        let file = FileConfig {
            window_slack: Some("soon".into()),
            ..FileConfig::default()
        };
        assert!(matches!(
            Config::resolve(file, None, home()),
            Err(Error::InvalidDuration(_))
        ));
    }
}
