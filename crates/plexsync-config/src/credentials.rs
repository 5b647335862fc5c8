use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Entries of `credentials.toml`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKey {
    PlexToken,
    TraktAccessToken,
    TraktRefreshToken,
    TraktTokenExpires,
}

impl CredentialKey {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKey::PlexToken => "plex_token",
            CredentialKey::TraktAccessToken => "trakt_access_token",
            CredentialKey::TraktRefreshToken => "trakt_refresh_token",
            CredentialKey::TraktTokenExpires => "trakt_token_expires",
        }
    }

    const TRAKT: [CredentialKey; 3] = [
        CredentialKey::TraktAccessToken,
        CredentialKey::TraktRefreshToken,
        CredentialKey::TraktTokenExpires,
    ];
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secrets kept apart from `config.toml`: the Plex token and the Trakt OAuth tokens.
///
/// Unknown keys found on disk are preserved on save.
pub struct CredentialStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, entries: BTreeMap::new() }
    }

    /// A missing file leaves the store empty
    pub fn load(&mut self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        self.entries = toml::from_str(&content).with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(&self.entries)?)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }

    pub fn get(&self, key: CredentialKey) -> Option<&String> {
        self.entries.get(key.as_str()).filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, key: CredentialKey, value: impl Into<String>) {
        self.entries.insert(key.as_str().to_string(), value.into());
    }

    pub fn remove(&mut self, key: CredentialKey) {
        self.entries.remove(key.as_str());
    }

    pub fn get_plex_token(&self) -> Option<&String> {
        self.get(CredentialKey::PlexToken)
    }

    pub fn set_plex_token(&mut self, token: String) {
        self.set(CredentialKey::PlexToken, token);
    }

    pub fn get_trakt_access_token(&self) -> Option<&String> {
        self.get(CredentialKey::TraktAccessToken)
    }

    pub fn set_trakt_access_token(&mut self, token: String) {
        self.set(CredentialKey::TraktAccessToken, token);
    }

    pub fn get_trakt_refresh_token(&self) -> Option<&String> {
        self.get(CredentialKey::TraktRefreshToken)
    }

    pub fn set_trakt_refresh_token(&mut self, token: String) {
        self.set(CredentialKey::TraktRefreshToken, token);
    }

    /// Unparseable timestamps read as absent
    pub fn get_trakt_token_expires(&self) -> Option<DateTime<Utc>> {
        self.get(CredentialKey::TraktTokenExpires)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_trakt_token_expires(&mut self, expires: DateTime<Utc>) {
        self.set(CredentialKey::TraktTokenExpires, expires.to_rfc3339());
    }

    /// Drop every stored Trakt token (forces a new authorization)
    pub fn clear_trakt_tokens(&mut self) {
        for key in CredentialKey::TRAKT {
            self.remove(key);
        }
    }
}
