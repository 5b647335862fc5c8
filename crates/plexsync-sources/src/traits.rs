use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plexsync_models::{
    CatalogItem, EpisodeTable, LikedList, ProviderId, Rating, ShowProgress, TrackedItem, TraktRef,
    WatchedShows,
};
use std::collections::{HashMap, HashSet};

use crate::error::SourceResult;
use crate::submit::FlushReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Movie,
    Show,
}

impl SectionKind {
    pub fn from_type(section_type: &str) -> Option<Self> {
        match section_type {
            "movie" => Some(SectionKind::Movie),
            "show" => Some(SectionKind::Show),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySection {
    pub key: String,
    pub title: String,
    pub kind: SectionKind,
}

#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub machine_identifier: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The local media library (Plex).
///
/// Writes are applied immediately.
#[async_trait]
pub trait LibraryClient: Send + Sync {
    async fn server_info(&self) -> SourceResult<ServerInfo>;
    async fn username(&self) -> SourceResult<String>;

    /// All library sections in server order
    async fn sections(&self) -> SourceResult<Vec<LibrarySection>>;

    /// Movie sections, optionally restricted to the section titled `library`
    async fn movie_sections(&self, library: Option<&str>) -> SourceResult<Vec<LibrarySection>> {
        Ok(filter_sections(self.sections().await?, SectionKind::Movie, library))
    }

    /// Show sections, optionally restricted to the section titled `library`
    async fn show_sections(&self, library: Option<&str>) -> SourceResult<Vec<LibrarySection>> {
        Ok(filter_sections(self.sections().await?, SectionKind::Show, library))
    }

    async fn section_items(&self, section: &LibrarySection) -> SourceResult<Vec<CatalogItem>>;
    async fn episodes(&self, show: &CatalogItem) -> SourceResult<Vec<CatalogItem>>;
    async fn search(&self, title: &str, kind: SectionKind) -> SourceResult<Vec<CatalogItem>>;
    async fn fetch_item(&self, key: &str) -> SourceResult<CatalogItem>;

    async fn mark_watched(&self, item: &CatalogItem) -> SourceResult<()>;
    async fn rate(&self, item: &CatalogItem, rating: Rating) -> SourceResult<()>;

    /// Replace the playlist called `name` with `item_keys`, in order
    async fn update_playlist(&self, name: &str, item_keys: &[String]) -> SourceResult<()>;
}

/// The remote tracking service (Trakt).
///
/// Bulk getters return pre-shaped sets for the baseline snapshot. `rate`,
/// `mark_watched` and `add_to_collection` only append to the outbound queue;
/// nothing reaches the service until `flush`.
#[async_trait]
pub trait TrackingClient: Send + Sync {
    async fn username(&self) -> SourceResult<String>;

    async fn watched_movies(&self) -> SourceResult<HashSet<u64>>;
    async fn watched_shows(&self) -> SourceResult<WatchedShows>;
    async fn movie_collection(&self) -> SourceResult<HashSet<u64>>;
    async fn ratings(&self) -> SourceResult<HashMap<TraktRef, Rating>>;
    /// Watchlisted movie ids in watchlist order
    async fn watchlist_movies(&self) -> SourceResult<Vec<u64>>;
    async fn liked_lists(&self) -> SourceResult<Vec<LikedList>>;
    async fn list_items(&self, list: &LikedList) -> SourceResult<Vec<TraktRef>>;

    /// Find the movie or show matching `provider_id`; `Ok(None)` when Trakt has no match
    async fn find_by_media(&self, item: &CatalogItem, provider_id: &ProviderId) -> SourceResult<Option<TrackedItem>>;

    /// Every episode of `show`
    async fn lookup(&self, show: &TrackedItem) -> SourceResult<EpisodeTable>;

    /// Resolve an episode against a table fetched with `lookup`, without a round trip
    fn find_episode(&self, _show: &TrackedItem, item: &CatalogItem, table: &EpisodeTable) -> Option<TrackedItem> {
        let number = item.episode()?.number;
        table.find(number).cloned()
    }

    /// Collection progress of `show`, per episode
    async fn collected(&self, show: &TrackedItem) -> SourceResult<ShowProgress>;

    fn rate(&self, item: &TrackedItem, rating: Rating);
    fn mark_watched(&self, item: &TrackedItem, watched_at: Option<DateTime<Utc>>);
    fn add_to_collection(&self, item: &TrackedItem, media: &CatalogItem);

    /// Submit everything queued so far
    async fn flush(&self) -> SourceResult<FlushReport>;
}

fn filter_sections(sections: Vec<LibrarySection>, kind: SectionKind, library: Option<&str>) -> Vec<LibrarySection> {
    sections
        .into_iter()
        .filter(|section| section.kind == kind)
        .filter(|section| library.map_or(true, |title| section.title == title))
        .collect()
}
