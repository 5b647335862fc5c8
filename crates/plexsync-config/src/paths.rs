use anyhow::{anyhow, Result};
use std::fmt;
use std::path::{Path, PathBuf};

const BASE_PATH_ENV: &str = "PLEXSYNC_BASE_PATH";
const CONTAINER_BASE: &str = "/app";

/// How the config directory was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOrigin {
    /// `PLEXSYNC_BASE_PATH` or an explicit base
    Override,
    /// `/app` exists (container image)
    Container,
    /// `dirs::config_dir()/plexsync`
    Platform,
}

impl fmt::Display for PathOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathOrigin::Override => f.write_str(BASE_PATH_ENV),
            PathOrigin::Container => f.write_str("container"),
            PathOrigin::Platform => f.write_str("platform default"),
        }
    }
}

/// Locations of `config.toml`, `credentials.toml` and the log directory
#[derive(Debug, Clone)]
pub struct PathManager {
    config_dir: PathBuf,
    origin: PathOrigin,
}

impl PathManager {
    pub fn detect() -> Result<Self> {
        if let Ok(base) = std::env::var(BASE_PATH_ENV) {
            if !base.trim().is_empty() {
                return Ok(Self::with_base(base));
            }
        }

        let container = Path::new(CONTAINER_BASE);
        if container.is_dir() {
            return Ok(Self { config_dir: container.to_path_buf(), origin: PathOrigin::Container });
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory; set {}", BASE_PATH_ENV))?
            .join("plexsync");
        Ok(Self { config_dir, origin: PathOrigin::Platform })
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { config_dir: base.into(), origin: PathOrigin::Override }
    }

    pub fn origin(&self) -> PathOrigin {
        self.origin
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn log_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    pub fn default_log_file(&self) -> PathBuf {
        self.log_dir().join("plexsync.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_with_base() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path());
        assert_eq!(paths.origin(), PathOrigin::Override);
        assert_eq!(paths.config_file(), dir.path().join("config.toml"));
        assert_eq!(paths.credentials_file(), dir.path().join("credentials.toml"));
        assert_eq!(paths.default_log_file(), dir.path().join("logs").join("plexsync.log"));

        paths.ensure_directories().unwrap();
        assert!(paths.log_dir().is_dir());
    }
}
