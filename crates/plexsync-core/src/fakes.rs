//! In-memory Plex and Trakt stand-ins that record every call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plexsync_models::{
    CatalogItem, EpisodeInfo, EpisodeNumber, EpisodeTable, LikedList, MediaIds, MediaKind, Provider,
    ProviderId, Rating, ShowProgress, TrackedItem, TraktKind, TraktRef, WatchedShows,
};
use plexsync_sources::{
    BatchOutcome, FlushReport, LibraryClient, LibrarySection, SectionKind, ServerInfo, SourceError,
    SourceResult, SubmitKind, TrackingClient,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn movie(key: &str, title: &str, guid: &str) -> CatalogItem {
    CatalogItem {
        key: key.to_string(),
        title: title.to_string(),
        year: Some(2000),
        guid: guid.to_string(),
        guids: Vec::new(),
        watched: false,
        last_viewed_at: None,
        added_at: None,
        rating: None,
        kind: MediaKind::Movie,
    }
}

pub fn show(key: &str, title: &str, guid: &str) -> CatalogItem {
    CatalogItem { kind: MediaKind::Show, ..movie(key, title, guid) }
}

pub fn episode(show: &CatalogItem, key: &str, season: u32, number: u32, guid: &str) -> CatalogItem {
    CatalogItem {
        year: None,
        kind: MediaKind::Episode(EpisodeInfo {
            show_key: show.key.clone(),
            show_title: show.title.clone(),
            number: EpisodeNumber::new(season, number),
        }),
        ..movie(key, &format!("Episode {}", number), guid)
    }
}

pub fn tracked(kind: TraktKind, trakt_id: u64, title: &str) -> TrackedItem {
    TrackedItem {
        trakt_id,
        kind,
        title: title.to_string(),
        year: None,
        ids: MediaIds { trakt: Some(trakt_id), ..MediaIds::default() },
        episode: None,
    }
}

pub fn tracked_episode(trakt_id: u64, season: u32, number: u32) -> TrackedItem {
    TrackedItem {
        episode: Some(EpisodeNumber::new(season, number)),
        ..tracked(TraktKind::Episode, trakt_id, &format!("Episode {}", number))
    }
}

pub fn tmdb(id: &str) -> ProviderId {
    ProviderId::new(Provider::Tmdb, id)
}

#[derive(Debug, Clone, PartialEq)]
pub enum LibraryCall {
    MarkWatched(String),
    Rate(String, Rating),
    UpdatePlaylist(String, Vec<String>),
}

#[derive(Default)]
pub struct FakeLibrary {
    sections: Vec<LibrarySection>,
    section_items: HashMap<String, Vec<String>>,
    episodes: HashMap<String, Vec<String>>,
    /// Current state of every item, updated by writes
    items: Mutex<HashMap<String, CatalogItem>>,
    calls: Mutex<Vec<LibraryCall>>,
    fail_writes: bool,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, key: &str, title: &str, kind: SectionKind, items: Vec<CatalogItem>) -> Self {
        self.sections.push(LibrarySection { key: key.to_string(), title: title.to_string(), kind });
        self.section_items
            .insert(key.to_string(), items.iter().map(|item| item.key.clone()).collect());
        self.store(items);
        self
    }

    pub fn with_episodes(mut self, show: &CatalogItem, episodes: Vec<CatalogItem>) -> Self {
        self.episodes
            .insert(show.key.clone(), episodes.iter().map(|item| item.key.clone()).collect());
        self.store(episodes);
        self
    }

    /// Every write is recorded and then refused
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    fn write_result(&self) -> SourceResult<()> {
        if self.fail_writes {
            return Err(SourceError::Api { service: "plex", status: 500, body: "write refused".to_string() });
        }
        Ok(())
    }

    fn store(&mut self, items: Vec<CatalogItem>) {
        let stored = self.items.get_mut().unwrap();
        for item in items {
            stored.insert(item.key.clone(), item);
        }
    }

    fn load(&self, keys: &[String]) -> Vec<CatalogItem> {
        let items = self.items.lock().unwrap();
        keys.iter().filter_map(|key| items.get(key).cloned()).collect()
    }

    pub fn item(&self, key: &str) -> CatalogItem {
        self.items.lock().unwrap()[key].clone()
    }

    pub fn calls(&self) -> Vec<LibraryCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than playlist updates
    pub fn item_writes(&self) -> Vec<LibraryCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, LibraryCall::UpdatePlaylist(..)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl LibraryClient for FakeLibrary {
    async fn server_info(&self) -> SourceResult<ServerInfo> {
        Ok(ServerInfo {
            name: "fake".to_string(),
            version: "1.0".to_string(),
            machine_identifier: "abc".to_string(),
            updated_at: None,
        })
    }

    async fn username(&self) -> SourceResult<String> {
        Ok("plex-user".to_string())
    }

    async fn sections(&self) -> SourceResult<Vec<LibrarySection>> {
        Ok(self.sections.clone())
    }

    async fn section_items(&self, section: &LibrarySection) -> SourceResult<Vec<CatalogItem>> {
        Ok(self.load(self.section_items.get(&section.key).map(Vec::as_slice).unwrap_or_default()))
    }

    async fn episodes(&self, show: &CatalogItem) -> SourceResult<Vec<CatalogItem>> {
        match self.episodes.get(&show.key) {
            Some(keys) => Ok(self.load(keys)),
            None => Err(SourceError::NotFound(format!("episodes of {}", show))),
        }
    }

    async fn search(&self, title: &str, kind: SectionKind) -> SourceResult<Vec<CatalogItem>> {
        let items = self.items.lock().unwrap();
        let mut found: Vec<CatalogItem> = items
            .values()
            .filter(|item| item.title == title)
            .filter(|item| match kind {
                SectionKind::Movie => matches!(item.kind, MediaKind::Movie),
                SectionKind::Show => matches!(item.kind, MediaKind::Show),
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    async fn fetch_item(&self, key: &str) -> SourceResult<CatalogItem> {
        self.items
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("item {}", key)))
    }

    async fn mark_watched(&self, item: &CatalogItem) -> SourceResult<()> {
        self.calls.lock().unwrap().push(LibraryCall::MarkWatched(item.key.clone()));
        self.write_result()?;
        if let Some(stored) = self.items.lock().unwrap().get_mut(&item.key) {
            stored.watched = true;
        }
        Ok(())
    }

    async fn rate(&self, item: &CatalogItem, rating: Rating) -> SourceResult<()> {
        self.calls.lock().unwrap().push(LibraryCall::Rate(item.key.clone(), rating));
        self.write_result()?;
        if let Some(stored) = self.items.lock().unwrap().get_mut(&item.key) {
            stored.rating = Some(rating);
        }
        Ok(())
    }

    async fn update_playlist(&self, name: &str, item_keys: &[String]) -> SourceResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(LibraryCall::UpdatePlaylist(name.to_string(), item_keys.to_vec()));
        self.write_result()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackingCall {
    Rate(TraktRef, Rating),
    MarkWatched(TraktRef, Option<DateTime<Utc>>),
    AddToCollection(TraktRef),
}

#[derive(Default)]
struct TrackingState {
    watched_movies: HashSet<u64>,
    watched_shows: WatchedShows,
    collection: HashSet<u64>,
    collected_episodes: HashMap<u64, ShowProgress>,
    ratings: HashMap<TraktRef, Rating>,
}

#[derive(Default)]
pub struct FakeTracking {
    media: HashMap<ProviderId, TrackedItem>,
    episodes: HashMap<u64, EpisodeTable>,
    /// Episode id to (show id, number), to apply queued episode writes
    episode_index: HashMap<u64, (u64, EpisodeNumber)>,
    watchlist: Vec<u64>,
    lists: Vec<(LikedList, Vec<TraktRef>)>,
    state: Mutex<TrackingState>,
    queued: Mutex<Vec<TrackingCall>>,
    calls: Mutex<Vec<TrackingCall>>,
    reject_flush: bool,
    /// Show ids whose episode lookup fails
    broken_shows: HashSet<u64>,
}

impl FakeTracking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media(mut self, provider_id: ProviderId, item: TrackedItem) -> Self {
        self.media.insert(provider_id, item);
        self
    }

    pub fn with_episodes(mut self, show_id: u64, episodes: Vec<TrackedItem>) -> Self {
        for episode in &episodes {
            if let Some(number) = episode.episode {
                self.episode_index.insert(episode.trakt_id, (show_id, number));
            }
        }
        self.episodes.insert(show_id, episodes.into_iter().collect());
        self
    }

    pub fn with_watched_movie(self, id: u64) -> Self {
        self.state.lock().unwrap().watched_movies.insert(id);
        self
    }

    pub fn with_watched_episode(self, show_id: u64, season: u32, number: u32) -> Self {
        self.mark_episode(show_id, EpisodeNumber::new(season, number), false);
        self
    }

    pub fn with_collected_movie(self, id: u64) -> Self {
        self.state.lock().unwrap().collection.insert(id);
        self
    }

    pub fn with_collected_episode(self, show_id: u64, season: u32, number: u32) -> Self {
        self.mark_episode(show_id, EpisodeNumber::new(season, number), true);
        self
    }

    pub fn with_rating(self, item: TraktRef, value: u8) -> Self {
        if let Some(rating) = Rating::new(value) {
            self.state.lock().unwrap().ratings.insert(item, rating);
        }
        self
    }

    pub fn with_watchlist(mut self, movie_ids: Vec<u64>) -> Self {
        self.watchlist = movie_ids;
        self
    }

    pub fn with_list(mut self, name: &str, items: Vec<TraktRef>) -> Self {
        let list = LikedList { trakt_id: self.lists.len() as u64 + 1, name: name.to_string(), username: "someone".to_string() };
        self.lists.push((list, items));
        self
    }

    pub fn rejecting_flush(mut self) -> Self {
        self.reject_flush = true;
        self
    }

    pub fn failing_lookup(mut self, show_id: u64) -> Self {
        self.broken_shows.insert(show_id);
        self
    }

    fn mark_episode(&self, show_id: u64, number: EpisodeNumber, collected: bool) {
        let mut state = self.state.lock().unwrap();
        if collected {
            state.collected_episodes.entry(show_id).or_default().set_completed(number, true);
        } else {
            state.watched_shows.set_completed(show_id, number, true);
        }
    }

    pub fn calls(&self) -> Vec<TrackingCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn queue(&self, call: TrackingCall) {
        self.calls.lock().unwrap().push(call.clone());
        self.queued.lock().unwrap().push(call);
    }

    fn apply(&self, call: &TrackingCall) {
        match call {
            TrackingCall::Rate(item, rating) => {
                self.state.lock().unwrap().ratings.insert(*item, *rating);
            }
            TrackingCall::AddToCollection(item) => match item.kind {
                TraktKind::Episode => {
                    if let Some((show_id, number)) = self.episode_index.get(&item.id) {
                        self.mark_episode(*show_id, *number, true);
                    }
                }
                _ => {
                    self.state.lock().unwrap().collection.insert(item.id);
                }
            },
            TrackingCall::MarkWatched(item, _) => match item.kind {
                TraktKind::Episode => {
                    if let Some((show_id, number)) = self.episode_index.get(&item.id) {
                        self.mark_episode(*show_id, *number, false);
                    }
                }
                _ => {
                    self.state.lock().unwrap().watched_movies.insert(item.id);
                }
            },
        }
    }
}

fn submit_kind(call: &TrackingCall) -> SubmitKind {
    match call {
        TrackingCall::Rate(..) => SubmitKind::Ratings,
        TrackingCall::MarkWatched(..) => SubmitKind::History,
        TrackingCall::AddToCollection(..) => SubmitKind::Collection,
    }
}

#[async_trait]
impl TrackingClient for FakeTracking {
    async fn username(&self) -> SourceResult<String> {
        Ok("trakt-user".to_string())
    }

    async fn watched_movies(&self) -> SourceResult<HashSet<u64>> {
        Ok(self.state.lock().unwrap().watched_movies.clone())
    }

    async fn watched_shows(&self) -> SourceResult<WatchedShows> {
        Ok(self.state.lock().unwrap().watched_shows.clone())
    }

    async fn movie_collection(&self) -> SourceResult<HashSet<u64>> {
        Ok(self.state.lock().unwrap().collection.clone())
    }

    async fn ratings(&self) -> SourceResult<HashMap<TraktRef, Rating>> {
        Ok(self.state.lock().unwrap().ratings.clone())
    }

    async fn watchlist_movies(&self) -> SourceResult<Vec<u64>> {
        Ok(self.watchlist.clone())
    }

    async fn liked_lists(&self) -> SourceResult<Vec<LikedList>> {
        Ok(self.lists.iter().map(|(list, _)| list.clone()).collect())
    }

    async fn list_items(&self, list: &LikedList) -> SourceResult<Vec<TraktRef>> {
        Ok(self
            .lists
            .iter()
            .find(|(candidate, _)| candidate.trakt_id == list.trakt_id)
            .map(|(_, items)| items.clone())
            .unwrap_or_default())
    }

    async fn find_by_media(&self, _item: &CatalogItem, provider_id: &ProviderId) -> SourceResult<Option<TrackedItem>> {
        Ok(self.media.get(provider_id).cloned())
    }

    async fn lookup(&self, show: &TrackedItem) -> SourceResult<EpisodeTable> {
        if self.broken_shows.contains(&show.trakt_id) {
            return Err(SourceError::Api {
                service: "trakt",
                status: 502,
                body: "Failed to fetch show seasons".to_string(),
            });
        }
        Ok(self.episodes.get(&show.trakt_id).cloned().unwrap_or_default())
    }

    async fn collected(&self, show: &TrackedItem) -> SourceResult<ShowProgress> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .collected_episodes
            .get(&show.trakt_id)
            .cloned()
            .unwrap_or_default())
    }

    fn rate(&self, item: &TrackedItem, rating: Rating) {
        self.queue(TrackingCall::Rate(item.reference(), rating));
    }

    fn mark_watched(&self, item: &TrackedItem, watched_at: Option<DateTime<Utc>>) {
        self.queue(TrackingCall::MarkWatched(item.reference(), watched_at));
    }

    fn add_to_collection(&self, item: &TrackedItem, _media: &CatalogItem) {
        self.queue(TrackingCall::AddToCollection(item.reference()));
    }

    async fn flush(&self) -> SourceResult<FlushReport> {
        let queued = std::mem::take(&mut *self.queued.lock().unwrap());
        let mut report = FlushReport::default();
        for call in &queued {
            let error = if self.reject_flush {
                Some("HTTP 500".to_string())
            } else {
                self.apply(call);
                None
            };
            report.push(BatchOutcome { kind: submit_kind(call), items: 1, not_found: 0, error });
        }
        Ok(report)
    }
}
