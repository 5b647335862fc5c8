use async_trait::async_trait;
use plexsync_config::{CredentialStore, PlexConfig};
use plexsync_models::{CatalogItem, MediaKind, Rating};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{SourceError, SourceResult};
use crate::plex::api::PlexHttpClient;
use crate::traits::{LibraryClient, LibrarySection, SectionKind, ServerInfo};

pub struct PlexClient {
    api: PlexHttpClient,
    // Needed for playlist URIs; fetched on first use
    machine_identifier: Arc<RwLock<Option<String>>>,
}

impl PlexClient {
    pub fn new(token: String, server_url: String) -> SourceResult<Self> {
        Ok(Self {
            api: PlexHttpClient::new(token, server_url)?,
            machine_identifier: Arc::new(RwLock::new(None)),
        })
    }

    /// Build a client from the configured server URL and the stored token
    pub fn from_config(config: &PlexConfig, credentials: &CredentialStore) -> SourceResult<Self> {
        let token = credentials
            .get_plex_token()
            .cloned()
            .ok_or_else(|| SourceError::other("Plex token not found in credentials. Run 'plexsync config plex' first"))?;
        if config.server_url.trim().is_empty() {
            return Err(SourceError::other("Plex server_url is not configured"));
        }
        Self::new(token, config.server_url.clone())
    }

    async fn machine_identifier(&self) -> SourceResult<String> {
        {
            let cached = self.machine_identifier.read().await;
            if let Some(ref id) = *cached {
                return Ok(id.clone());
            }
        }

        let info = self.api.get_server_info().await?;
        if info.machine_identifier.is_empty() {
            return Err(SourceError::other("Plex server did not report a machineIdentifier"));
        }
        *self.machine_identifier.write().await = Some(info.machine_identifier.clone());
        Ok(info.machine_identifier)
    }
}

#[async_trait]
impl LibraryClient for PlexClient {
    async fn server_info(&self) -> SourceResult<ServerInfo> {
        let info = self.api.get_server_info().await?;
        if !info.machine_identifier.is_empty() {
            *self.machine_identifier.write().await = Some(info.machine_identifier.clone());
        }
        Ok(info)
    }

    async fn username(&self) -> SourceResult<String> {
        self.api.get_username().await
    }

    async fn sections(&self) -> SourceResult<Vec<LibrarySection>> {
        let sections = self.api.get_sections().await?;
        debug!("Plex: {} movie/show sections on {}", sections.len(), self.api.server_url());
        Ok(sections)
    }

    async fn section_items(&self, section: &LibrarySection) -> SourceResult<Vec<CatalogItem>> {
        self.api.get_section_items(section).await
    }

    async fn episodes(&self, show: &CatalogItem) -> SourceResult<Vec<CatalogItem>> {
        if !matches!(show.kind, MediaKind::Show) {
            return Err(SourceError::other(format!("{} is not a show", show)));
        }
        self.api.get_episodes(&show.key).await
    }

    async fn search(&self, title: &str, kind: SectionKind) -> SourceResult<Vec<CatalogItem>> {
        self.api.search(title, kind).await
    }

    async fn fetch_item(&self, key: &str) -> SourceResult<CatalogItem> {
        self.api.get_metadata_item(key).await
    }

    async fn mark_watched(&self, item: &CatalogItem) -> SourceResult<()> {
        self.api.mark_watched(&item.key).await
    }

    async fn rate(&self, item: &CatalogItem, rating: Rating) -> SourceResult<()> {
        self.api.set_rating(&item.key, rating.as_plex()).await
    }

    async fn update_playlist(&self, name: &str, item_keys: &[String]) -> SourceResult<()> {
        let existing = self.api.get_playlists().await?;
        for playlist in existing.iter().filter(|p| p.title == name) {
            debug!("Plex: Removing previous playlist '{}' ({})", playlist.title, playlist.rating_key);
            self.api.delete_playlist(&playlist.rating_key).await?;
        }

        // Plex refuses to create an empty playlist
        if item_keys.is_empty() {
            info!("Plex: No library items for playlist '{}', leaving it absent", name);
            return Ok(());
        }

        let machine_identifier = self.machine_identifier().await?;
        self.api.create_playlist(name, &machine_identifier, item_keys).await?;
        info!("Plex: Updated playlist '{}' with {} items", name, item_keys.len());
        Ok(())
    }
}
