use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const PLACEHOLDER_CLIENT_ID: &str = "YOUR_CLIENT_ID";
const PLACEHOLDER_CLIENT_SECRET: &str = "YOUR_CLIENT_SECRET";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub plex: PlexConfig,
    #[serde(default)]
    pub trakt: TraktConfig,
    #[serde(default)]
    pub sync: SyncOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlexConfig {
    /// Base URL of the Plex Media Server, e.g. `http://localhost:32400`
    #[serde(default)]
    pub server_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl Default for TraktConfig {
    fn default() -> Self {
        Self {
            client_id: PLACEHOLDER_CLIENT_ID.to_string(),
            client_secret: PLACEHOLDER_CLIENT_SECRET.to_string(),
        }
    }
}

/// Which fields the reconciler is allowed to write.
///
/// Read once at startup and passed by reference into the sync engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncOptions {
    #[serde(default = "default_true")]
    pub collection: bool,
    #[serde(default = "default_true")]
    pub ratings: bool,
    #[serde(default = "default_true")]
    pub watched_status: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            collection: true,
            ratings: true,
            watched_status: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plex: PlexConfig::default(),
            trakt: TraktConfig::default(),
            sync: SyncOptions::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the config file, or return defaults when it does not exist yet
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.is_plex_configured() {
            return Err(anyhow::anyhow!(
                "Plex server_url is not set. Run 'plexsync config plex --server-url <URL>' first"
            ));
        }
        if !self.is_trakt_configured() {
            return Err(anyhow::anyhow!(
                "Trakt client_id/client_secret are not set. Run 'plexsync config trakt' first"
            ));
        }
        Ok(())
    }

    pub fn is_plex_configured(&self) -> bool {
        !self.plex.server_url.trim().is_empty()
    }

    pub fn is_trakt_configured(&self) -> bool {
        let trakt = &self.trakt;
        !trakt.client_id.is_empty()
            && !trakt.client_secret.is_empty()
            && trakt.client_id != PLACEHOLDER_CLIENT_ID
            && trakt.client_secret != PLACEHOLDER_CLIENT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn configured() -> Config {
        Config {
            plex: PlexConfig {
                server_url: "http://localhost:32400".to_string(),
            },
            trakt: TraktConfig {
                client_id: "test_id".to_string(),
                client_secret: "test_secret".to_string(),
            },
            sync: SyncOptions {
                collection: false,
                ratings: true,
                watched_status: true,
            },
        }
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        configured().save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.trakt.client_id, "test_id");
        assert_eq!(loaded.plex.server_url, "http://localhost:32400");
        assert!(!loaded.sync.collection);
        assert!(loaded.sync.ratings);
    }

    #[test]
    fn test_config_validate() {
        let mut config = configured();
        assert!(config.validate().is_ok());

        config.trakt = TraktConfig::default();
        assert!(!config.is_trakt_configured());
        assert!(config.validate().is_err());

        config = configured();
        config.plex.server_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sync_options_default_to_enabled() {
        let config: Config = toml::from_str(
            r#"
            [plex]
            server_url = "http://plex:32400"

            [sync]
            ratings = false
            "#,
        )
        .unwrap();
        assert!(config.sync.collection);
        assert!(!config.sync.ratings);
        assert!(config.sync.watched_status);
        assert!(!config.is_trakt_configured());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.sync, SyncOptions::default());
    }
}
