use plexsync_models::{
    EpisodeNumber, EpisodeTable, LikedList, MediaIds, ProviderId, Rating, ShowProgress, TrackedItem,
    TraktKind, TraktRef, WatchedShows,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::error::{SourceError, SourceResult as Result};

const API_BASE_URL: &str = "https://api.trakt.tv";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraktIds {
    pub trakt: Option<u64>,
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
    pub tvdb: Option<u64>,
    pub slug: Option<String>,
}

impl From<TraktIds> for MediaIds {
    fn from(ids: TraktIds) -> Self {
        MediaIds {
            trakt: ids.trakt,
            // Trakt sometimes includes slashes in IMDB ids
            imdb: ids.imdb.map(|s| s.replace('/', "")).filter(|s| !s.is_empty()),
            tmdb: ids.tmdb,
            tvdb: ids.tvdb,
            slug: ids.slug,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TraktMedia {
    title: Option<String>,
    year: Option<u32>,
    ids: TraktIds,
}

#[derive(Debug, Deserialize)]
struct TraktEpisode {
    season: u32,
    number: u32,
    title: Option<String>,
    ids: TraktIds,
}

#[derive(Debug, Deserialize)]
struct MovieEntry {
    movie: TraktMedia,
}

#[derive(Debug, Deserialize)]
struct WatchedShowEntry {
    show: TraktMedia,
    #[serde(default)]
    seasons: Vec<WatchedSeason>,
}

#[derive(Debug, Deserialize)]
struct WatchedSeason {
    number: u32,
    #[serde(default)]
    episodes: Vec<WatchedEpisode>,
}

#[derive(Debug, Deserialize)]
struct WatchedEpisode {
    number: u32,
    #[serde(default)]
    plays: u32,
}

/// Shared shape of ratings, list items and search results
#[derive(Debug, Deserialize)]
struct TypedEntry {
    #[serde(rename = "type")]
    item_type: String,
    rating: Option<u8>,
    movie: Option<TraktMedia>,
    show: Option<TraktMedia>,
    episode: Option<TraktEpisode>,
}

impl TypedEntry {
    fn reference(&self) -> Option<TraktRef> {
        let kind = TraktKind::from_type(&self.item_type)?;
        let id = match kind {
            TraktKind::Movie => self.movie.as_ref()?.ids.trakt?,
            TraktKind::Show => self.show.as_ref()?.ids.trakt?,
            TraktKind::Episode => self.episode.as_ref()?.ids.trakt?,
        };
        Some(TraktRef { kind, id })
    }
}

#[derive(Debug, Deserialize)]
struct LikedListEntry {
    list: LikedListBody,
}

#[derive(Debug, Deserialize)]
struct LikedListBody {
    name: String,
    ids: TraktIds,
    user: ListUser,
}

#[derive(Debug, Deserialize)]
struct ListUser {
    username: String,
    ids: Option<TraktIds>,
}

#[derive(Debug, Deserialize)]
struct SeasonEntry {
    #[serde(default)]
    episodes: Vec<TraktEpisode>,
}

#[derive(Debug, Deserialize)]
struct CollectionProgress {
    #[serde(default)]
    seasons: Vec<ProgressSeason>,
}

#[derive(Debug, Deserialize)]
struct ProgressSeason {
    number: u32,
    #[serde(default)]
    episodes: Vec<ProgressEpisode>,
}

#[derive(Debug, Deserialize)]
struct ProgressEpisode {
    number: u32,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub not_found: NotFound,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotFound {
    #[serde(default)]
    pub movies: Vec<serde_json::Value>,
    #[serde(default)]
    pub shows: Vec<serde_json::Value>,
    #[serde(default)]
    pub episodes: Vec<serde_json::Value>,
}

impl NotFound {
    pub fn count(&self) -> usize {
        self.movies.len() + self.shows.len() + self.episodes.len()
    }
}

/// Add the Trakt API v2 headers
fn authorized(request: RequestBuilder, access_token: &str, client_id: &str) -> RequestBuilder {
    request
        .header("Authorization", format!("Bearer {}", access_token))
        .header("trakt-api-version", "2")
        .header("trakt-api-key", client_id)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    access_token: &str,
    client_id: &str,
    path: &str,
    what: &str,
) -> Result<T> {
    let url = format!("{}{}", API_BASE_URL, path);
    debug!("Trakt GET {}", url);
    let response = authorized(client.get(&url), access_token, client_id).send().await?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(SourceError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Api { service: "trakt", status: status.as_u16(), body });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| SourceError::other(format!("Failed to parse {} response: {}", what, e)))
}

/// Get the username slug of the authenticated user
pub async fn get_username(client: &Client, access_token: &str, client_id: &str) -> Result<String> {
    let json: serde_json::Value = get_json(client, access_token, client_id, "/users/me", "user info").await?;
    json["ids"]["slug"]
        .as_str()
        .or_else(|| json["username"].as_str())
        .map(str::to_string)
        .ok_or_else(|| SourceError::other("Missing username slug"))
}

pub async fn get_watched_movies(client: &Client, access_token: &str, client_id: &str) -> Result<HashSet<u64>> {
    let items: Vec<MovieEntry> =
        get_json(client, access_token, client_id, "/sync/watched/movies", "watched movies").await?;
    Ok(items.into_iter().filter_map(|item| item.movie.ids.trakt).collect())
}

pub async fn get_watched_shows(client: &Client, access_token: &str, client_id: &str) -> Result<WatchedShows> {
    let items: Vec<WatchedShowEntry> =
        get_json(client, access_token, client_id, "/sync/watched/shows", "watched shows").await?;

    let mut watched = WatchedShows::new();
    for item in items {
        let Some(show_id) = item.show.ids.trakt else {
            continue;
        };
        let mut progress = ShowProgress::new();
        for season in item.seasons {
            for episode in season.episodes {
                progress.set_completed(EpisodeNumber::new(season.number, episode.number), episode.plays > 0);
            }
        }
        watched.insert(show_id, progress);
    }
    Ok(watched)
}

pub async fn get_collected_movies(client: &Client, access_token: &str, client_id: &str) -> Result<HashSet<u64>> {
    let items: Vec<MovieEntry> =
        get_json(client, access_token, client_id, "/sync/collection/movies", "movie collection").await?;
    Ok(items.into_iter().filter_map(|item| item.movie.ids.trakt).collect())
}

pub async fn get_ratings(client: &Client, access_token: &str, client_id: &str) -> Result<HashMap<TraktRef, Rating>> {
    let items: Vec<TypedEntry> = get_json(client, access_token, client_id, "/sync/ratings", "ratings").await?;

    let mut ratings = HashMap::new();
    let mut skipped = 0;
    for item in items {
        match (item.reference(), item.rating.and_then(Rating::new)) {
            (Some(reference), Some(rating)) => {
                ratings.insert(reference, rating);
            }
            _ => skipped += 1,
        }
    }
    debug!("Fetched Trakt ratings: total={}, skipped={}", ratings.len(), skipped);
    Ok(ratings)
}

pub async fn get_watchlist_movies(client: &Client, access_token: &str, client_id: &str) -> Result<Vec<u64>> {
    let items: Vec<MovieEntry> = get_json(
        client,
        access_token,
        client_id,
        "/sync/watchlist/movies/rank",
        "watchlist",
    )
    .await?;
    Ok(items.into_iter().filter_map(|item| item.movie.ids.trakt).collect())
}

pub async fn get_liked_lists(client: &Client, access_token: &str, client_id: &str) -> Result<Vec<LikedList>> {
    let items: Vec<LikedListEntry> =
        get_json(client, access_token, client_id, "/users/likes/lists", "liked lists").await?;

    let mut lists = Vec::new();
    for item in items {
        let Some(trakt_id) = item.list.ids.trakt else {
            warn!("Trakt liked list '{}' has no id, skipping", item.list.name);
            continue;
        };
        let username = item
            .list
            .user
            .ids
            .and_then(|ids| ids.slug)
            .unwrap_or(item.list.user.username);
        lists.push(LikedList { trakt_id, name: item.list.name, username });
    }
    Ok(lists)
}

pub async fn get_list_items(client: &Client, access_token: &str, client_id: &str, list: &LikedList) -> Result<Vec<TraktRef>> {
    let path = format!(
        "/users/{}/lists/{}/items",
        urlencoding::encode(&list.username),
        list.trakt_id
    );
    let items: Vec<TypedEntry> = get_json(client, access_token, client_id, &path, "list items").await?;
    Ok(items.iter().filter_map(TypedEntry::reference).collect())
}

/// Look up a movie or show by external id
pub async fn search_by_id(
    client: &Client,
    access_token: &str,
    client_id: &str,
    provider_id: &ProviderId,
    kind: TraktKind,
) -> Result<Option<TrackedItem>> {
    let type_name = match kind {
        TraktKind::Movie => "movie",
        TraktKind::Show => "show",
        TraktKind::Episode => "episode",
    };
    let path = format!(
        "/search/{}/{}?type={}",
        provider_id.provider.as_str(),
        urlencoding::encode(&provider_id.id),
        type_name
    );
    let items: Vec<TypedEntry> = get_json(client, access_token, client_id, &path, "search").await?;
    Ok(pick_search_result(items, kind, provider_id))
}

/// First result of `kind` that actually carries `provider_id`
fn pick_search_result(items: Vec<TypedEntry>, kind: TraktKind, provider_id: &ProviderId) -> Option<TrackedItem> {
    items
        .into_iter()
        .filter(|item| TraktKind::from_type(&item.item_type) == Some(kind))
        .filter_map(|item| match kind {
            TraktKind::Movie | TraktKind::Show => item.movie.or(item.show).and_then(|media| tracked_media(media, kind)),
            TraktKind::Episode => item.episode.and_then(tracked_episode),
        })
        .find(|tracked| {
            let matched = tracked.ids.matches(provider_id);
            if !matched {
                debug!("Ignoring Trakt search result {} without {}", tracked, provider_id);
            }
            matched
        })
}

pub async fn get_show_episodes(client: &Client, access_token: &str, client_id: &str, show_id: u64) -> Result<EpisodeTable> {
    let path = format!("/shows/{}/seasons?extended=episodes", show_id);
    let seasons: Vec<SeasonEntry> = get_json(client, access_token, client_id, &path, "show seasons").await?;
    Ok(seasons
        .into_iter()
        .flat_map(|season| season.episodes)
        .filter_map(tracked_episode)
        .collect())
}

pub async fn get_collection_progress(client: &Client, access_token: &str, client_id: &str, show_id: u64) -> Result<ShowProgress> {
    let path = format!("/shows/{}/progress/collection", show_id);
    let body: CollectionProgress =
        get_json(client, access_token, client_id, &path, "collection progress").await?;

    let mut progress = ShowProgress::new();
    for season in body.seasons {
        for episode in season.episodes {
            progress.set_completed(EpisodeNumber::new(season.number, episode.number), episode.completed);
        }
    }
    Ok(progress)
}

/// POST to one of the `/sync/...` endpoints
pub async fn post_sync(
    client: &Client,
    access_token: &str,
    client_id: &str,
    endpoint: &str,
    payload: &serde_json::Value,
) -> Result<SyncResponse> {
    let url = format!("{}/sync/{}", API_BASE_URL, endpoint);
    let response = authorized(client.post(&url), access_token, client_id)
        .json(payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Api { service: "trakt", status: status.as_u16(), body });
    }

    Ok(response.json().await.unwrap_or_default())
}

fn tracked_media(media: TraktMedia, kind: TraktKind) -> Option<TrackedItem> {
    let trakt_id = media.ids.trakt?;
    Some(TrackedItem {
        trakt_id,
        kind,
        title: media.title.unwrap_or_default(),
        year: media.year,
        ids: media.ids.into(),
        episode: None,
    })
}

fn tracked_episode(episode: TraktEpisode) -> Option<TrackedItem> {
    let trakt_id = episode.ids.trakt?;
    Some(TrackedItem {
        trakt_id,
        kind: TraktKind::Episode,
        title: episode.title.unwrap_or_default(),
        year: None,
        ids: episode.ids.into(),
        episode: Some(EpisodeNumber::new(episode.season, episode.number)),
    })
}
