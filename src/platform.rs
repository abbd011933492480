use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Linux,
    Windows,
    Unknown,
}

pub fn detect() -> Platform {
    match std::env::consts::OS {
        "macos" => Platform::MacOS,
        "linux" => Platform::Linux,
        "windows" => Platform::Windows,
        _ => Platform::Unknown,
    }
}

pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .or_else(|| {
            std::env::var_os("HOME")
                .or_else(|| std::env::var_os("USERPROFILE"))
                .map(PathBuf::from)
        })
}

// asks the interpreter where packages live, in sys.path order (user site first)
const SITE_PROBE: &str = "import site\n\
user = getattr(site, 'getusersitepackages', lambda: None)()\n\
dirs = [user] if user else []\n\
dirs += list(getattr(site, 'getsitepackages', lambda: [])())\n\
print('\\n'.join(dirs))";

/// Site-packages directories reported by the first python interpreter found
/// on PATH. Empty when no interpreter answers.
pub fn python_site_dirs(platform: Platform) -> Vec<PathBuf> {
    let candidates: &[&str] = match platform {
        Platform::Windows => &["python", "py", "python3"],
        Platform::MacOS | Platform::Linux | Platform::Unknown => &["python3", "python"],
    };

    for interpreter in candidates {
        let output = match Command::new(interpreter).arg("-c").arg(SITE_PROBE).output() {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                tracing::debug!(interpreter, status = %o.status, "site probe failed");
                continue;
            }
            Err(e) => {
                tracing::debug!(interpreter, error = %e, "interpreter not available");
                continue;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        return stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();
    }

    Vec::new()
}
