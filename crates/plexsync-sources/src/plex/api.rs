use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use plexsync_models::{CatalogItem, EpisodeInfo, EpisodeNumber, MediaKind, Rating};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::traits::{LibrarySection, SectionKind, ServerInfo};

const PLEX_TV_BASE_URL: &str = "https://plex.tv";
const CLIENT_IDENTIFIER: &str = "plexsync-cli";
const LIBRARY_IDENTIFIER: &str = "com.plexapp.plugins.library";

#[derive(Debug, Clone)]
pub struct Playlist {
    pub rating_key: String,
    pub title: String,
}

pub struct PlexHttpClient {
    client: Client,
    token: String,
    server_url: String,
}

/// Check a token against plex.tv.
///
/// `Ok(Some(username))` when the token is accepted, `Ok(None)` when plex.tv rejects it.
pub async fn verify_token(token: &str) -> SourceResult<Option<String>> {
    let client = PlexHttpClient::new(token.to_string(), PLEX_TV_BASE_URL.to_string())?;
    match client.get_username().await {
        Ok(username) => Ok(Some(username)),
        Err(SourceError::Api { status: 401 | 403, .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

impl PlexHttpClient {
    pub fn new(token: String, server_url: String) -> SourceResult<Self> {
        let client = Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-token"),
                    reqwest::header::HeaderValue::from_str(&token)
                        .context("Invalid token format")?,
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-client-identifier"),
                    reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-product"),
                    reqwest::header::HeaderValue::from_static("plexsync"),
                );
                headers
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> SourceResult<Response> {
        let response = request
            .header("X-Plex-Token", &self.token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api { service: "plex", status: status.as_u16(), body });
        }
        Ok(response)
    }

    async fn get_json(&self, path: &str, what: &str) -> SourceResult<Value> {
        let url = format!("{}{}", self.server_url, path);
        debug!("Plex GET {}", url);
        let response = self.send(self.client.get(&url), what).await?;
        let json: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", what))?;
        Ok(json)
    }

    /// Account name of the token owner
    pub async fn get_username(&self) -> SourceResult<String> {
        let url = format!("{}/api/v2/user", PLEX_TV_BASE_URL);
        let response = self.send(self.client.get(&url), "plex account").await?;
        let json: Value = response.json().await.context("Failed to parse Plex account response")?;
        json.get("username")
            .or_else(|| json.get("title"))
            .and_then(|u| u.as_str())
            .map(str::to_string)
            .ok_or_else(|| SourceError::other("Plex account response has no username"))
    }

    pub async fn get_server_info(&self) -> SourceResult<ServerInfo> {
        let json = self.get_json("/", "server info").await?;
        let container = media_container(&json)?;
        Ok(ServerInfo {
            name: str_field(container, "friendlyName").unwrap_or_default(),
            version: str_field(container, "version").unwrap_or_default(),
            machine_identifier: str_field(container, "machineIdentifier").unwrap_or_default(),
            updated_at: parse_timestamp(container.get("updatedAt")),
        })
    }

    pub async fn get_sections(&self) -> SourceResult<Vec<LibrarySection>> {
        let json = self.get_json("/library/sections", "library sections").await?;
        let container = media_container(&json)?;

        let mut sections = Vec::new();
        for dir in array_field(container, "Directory") {
            let section_type = str_field(dir, "type").unwrap_or_default();
            let Some(kind) = SectionKind::from_type(&section_type) else {
                debug!("Plex: Ignoring library section of type '{}'", section_type);
                continue;
            };
            sections.push(LibrarySection {
                key: str_field(dir, "key").unwrap_or_default(),
                title: str_field(dir, "title").unwrap_or_default(),
                kind,
            });
        }
        Ok(sections)
    }

    pub async fn get_section_items(&self, section: &LibrarySection) -> SourceResult<Vec<CatalogItem>> {
        let type_num = match section.kind {
            SectionKind::Movie => 1,
            SectionKind::Show => 2,
        };
        let path = format!("/library/sections/{}/all?type={}&includeGuids=1", section.key, type_num);
        let json = self.get_json(&path, "library section").await?;
        Ok(parse_metadata_list(media_container(&json)?, &section.title))
    }

    /// Every episode of a show (`allLeaves`)
    pub async fn get_episodes(&self, show_key: &str) -> SourceResult<Vec<CatalogItem>> {
        let path = format!("/library/metadata/{}/allLeaves?includeGuids=1", metadata_id(show_key));
        let json = self.get_json(&path, "show episodes").await?;
        Ok(parse_metadata_list(media_container(&json)?, show_key))
    }

    pub async fn search(&self, title: &str, kind: SectionKind) -> SourceResult<Vec<CatalogItem>> {
        let type_num = match kind {
            SectionKind::Movie => "1",
            SectionKind::Show => "2",
        };
        let path = format!(
            "/library/search?query={}&type={}&includeGuids=1",
            urlencoding::encode(title),
            type_num
        );
        let json = self.get_json(&path, "search").await?;
        let container = media_container(&json)?;

        // Newer servers wrap each hit in a SearchResult entry
        let results = array_field(container, "SearchResult");
        if !results.is_empty() {
            return Ok(results
                .iter()
                .filter_map(|result| result.get("Metadata"))
                .filter_map(parse_metadata_item)
                .collect());
        }
        Ok(parse_metadata_list(container, title))
    }

    pub async fn get_metadata_item(&self, key: &str) -> SourceResult<CatalogItem> {
        let path = format!("/library/metadata/{}?includeGuids=1", metadata_id(key));
        let json = self.get_json(&path, &format!("metadata item {}", key)).await?;
        let container = media_container(&json)?;
        array_field(container, "Metadata")
            .first()
            .and_then(parse_metadata_item)
            .ok_or_else(|| SourceError::NotFound(format!("metadata item {}", key)))
    }

    pub async fn mark_watched(&self, key: &str) -> SourceResult<()> {
        let url = format!(
            "{}/:/scrobble?identifier={}&key={}",
            self.server_url,
            LIBRARY_IDENTIFIER,
            metadata_id(key)
        );
        debug!("Plex API: Calling mark_watched for rating_key={}", key);
        self.send(self.client.put(&url), "scrobble").await?;
        Ok(())
    }

    pub async fn set_rating(&self, key: &str, rating: f64) -> SourceResult<()> {
        let url = format!(
            "{}/:/rate?identifier={}&key={}&rating={}",
            self.server_url,
            LIBRARY_IDENTIFIER,
            metadata_id(key),
            rating
        );
        self.send(self.client.put(&url), "rate").await?;
        Ok(())
    }

    pub async fn get_playlists(&self) -> SourceResult<Vec<Playlist>> {
        let json = self.get_json("/playlists?playlistType=video", "playlists").await?;
        let container = media_container(&json)?;
        Ok(array_field(container, "Metadata")
            .iter()
            .filter_map(|item| {
                Some(Playlist {
                    rating_key: str_field(item, "ratingKey")?,
                    title: str_field(item, "title")?,
                })
            })
            .collect())
    }

    pub async fn delete_playlist(&self, rating_key: &str) -> SourceResult<()> {
        let url = format!("{}/playlists/{}", self.server_url, rating_key);
        self.send(self.client.delete(&url), "playlist").await?;
        Ok(())
    }

    pub async fn create_playlist(&self, title: &str, machine_identifier: &str, item_keys: &[String]) -> SourceResult<()> {
        let ids: Vec<&str> = item_keys.iter().map(|key| metadata_id(key)).collect();
        let uri = format!(
            "server://{}/{}/library/metadata/{}",
            machine_identifier,
            LIBRARY_IDENTIFIER,
            ids.join(",")
        );
        let url = format!(
            "{}/playlists?type=video&smart=0&title={}&uri={}",
            self.server_url,
            urlencoding::encode(title),
            urlencoding::encode(&uri)
        );
        self.send(self.client.post(&url), "playlist").await?;
        Ok(())
    }
}

/// Strip the `/library/metadata/` prefix Plex uses in `key` fields
fn metadata_id(key: &str) -> &str {
    key.trim_start_matches("/library/metadata/").trim()
}

fn media_container(json: &Value) -> SourceResult<&Value> {
    json.get("MediaContainer")
        .ok_or_else(|| SourceError::other("Plex response has no MediaContainer"))
}

fn array_field<'a>(value: &'a Value, name: &str) -> &'a [Value] {
    value
        .get(name)
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn str_field(value: &Value, name: &str) -> Option<String> {
    match value.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn u32_field(value: &Value, name: &str) -> Option<u32> {
    value.get(name).and_then(|v| v.as_u64()).and_then(|v| u32::try_from(v).ok())
}

fn parse_guid_array(guid_value: Option<&Value>) -> Vec<String> {
    match guid_value {
        Some(Value::Array(guids)) => guids
            .iter()
            .filter_map(|guid| {
                guid.get("id")
                    .and_then(|id| id.as_str())
                    .or_else(|| guid.as_str())
                    .map(str::to_string)
            })
            .collect(),
        Some(Value::Object(guid)) => guid
            .get("id")
            .and_then(|id| id.as_str())
            .map(|id| vec![id.to_string()])
            .unwrap_or_default(),
        Some(Value::String(id)) => vec![id.clone()],
        _ => Vec::new(),
    }
}

fn parse_timestamp(timestamp: Option<&Value>) -> Option<DateTime<Utc>> {
    timestamp
        .and_then(|t| t.as_i64())
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
}

fn parse_metadata_list(container: &Value, context: &str) -> Vec<CatalogItem> {
    let items = array_field(container, "Metadata");
    let parsed: Vec<CatalogItem> = items.iter().filter_map(parse_metadata_item).collect();
    if parsed.len() < items.len() {
        debug!(
            "Plex: Skipped {} of {} items in '{}' that couldn't be parsed",
            items.len() - parsed.len(),
            items.len(),
            context
        );
    }
    parsed
}

pub(crate) fn parse_metadata_item(item: &Value) -> Option<CatalogItem> {
    let key = str_field(item, "ratingKey")?;
    let title = str_field(item, "title")?;
    let kind = match item.get("type")?.as_str()? {
        "movie" => MediaKind::Movie,
        "show" => MediaKind::Show,
        "episode" => MediaKind::Episode(EpisodeInfo {
            show_key: str_field(item, "grandparentRatingKey").unwrap_or_default(),
            show_title: str_field(item, "grandparentTitle").unwrap_or_default(),
            number: EpisodeNumber::new(u32_field(item, "parentIndex")?, u32_field(item, "index")?),
        }),
        _ => return None,
    };

    // Shows report viewedLeafCount/leafCount instead of viewCount
    let watched = match kind {
        MediaKind::Show => {
            let leaves = u32_field(item, "leafCount").unwrap_or(0);
            leaves > 0 && u32_field(item, "viewedLeafCount").unwrap_or(0) >= leaves
        }
        _ => u32_field(item, "viewCount").unwrap_or(0) > 0,
    };

    Some(CatalogItem {
        key,
        title,
        year: u32_field(item, "year"),
        guid: str_field(item, "guid").unwrap_or_default(),
        guids: parse_guid_array(item.get("Guid")),
        watched,
        last_viewed_at: parse_timestamp(item.get("lastViewedAt")),
        added_at: parse_timestamp(item.get("addedAt")),
        rating: item.get("userRating").and_then(|r| r.as_f64()).and_then(Rating::from_plex),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_movie() {
        let item = json!({
            "ratingKey": "1001",
            "type": "movie",
            "title": "The Matrix",
            "year": 1999,
            "guid": "plex://movie/5d7768...",
            "Guid": [{"id": "imdb://tt0133093"}, {"id": "tmdb://603"}],
            "viewCount": 2,
            "lastViewedAt": 1_600_000_000,
            "addedAt": 1_500_000_000,
            "userRating": 9.0
        });

        let movie = parse_metadata_item(&item).unwrap();
        assert_eq!(movie.key, "1001");
        assert_eq!(movie.kind, MediaKind::Movie);
        assert_eq!(movie.guids, vec!["imdb://tt0133093".to_string(), "tmdb://603".to_string()]);
        assert!(movie.watched);
        assert_eq!(movie.rating, Rating::new(9));
        assert_eq!(movie.last_viewed_at.map(|d| d.timestamp()), Some(1_600_000_000));
    }

    #[test]
    fn test_parse_unwatched_unrated_episode() {
        let item = json!({
            "ratingKey": 2002,
            "type": "episode",
            "title": "Pilot",
            "guid": "com.plexapp.agents.thetvdb://73739/1/1?lang=en",
            "grandparentTitle": "Lost",
            "grandparentRatingKey": "2000",
            "parentIndex": 1,
            "index": 1
        });

        let episode = parse_metadata_item(&item).unwrap();
        assert_eq!(episode.key, "2002");
        assert!(!episode.watched);
        assert_eq!(episode.rating, None);
        let info = episode.episode().unwrap();
        assert_eq!(info.show_title, "Lost");
        assert_eq!(info.number, EpisodeNumber::new(1, 1));
    }

    #[test]
    fn test_parse_rejects_unknown_types_and_missing_numbers() {
        assert!(parse_metadata_item(&json!({"ratingKey": "1", "type": "artist", "title": "x"})).is_none());
        assert!(parse_metadata_item(&json!({"ratingKey": "1", "type": "episode", "title": "x"})).is_none());
    }

    #[test]
    fn test_show_watched_from_leaf_counts() {
        let item = json!({
            "ratingKey": "5", "type": "show", "title": "Lost",
            "leafCount": 10, "viewedLeafCount": 10
        });
        assert!(parse_metadata_item(&item).unwrap().watched);
    }

    #[test]
    fn test_out_of_range_numbers_are_dropped() {
        let value = json!({"year": 1999, "index": 4_294_967_297u64, "parentIndex": -1});
        assert_eq!(u32_field(&value, "year"), Some(1999));
        assert_eq!(u32_field(&value, "index"), None);
        assert_eq!(u32_field(&value, "parentIndex"), None);
        assert_eq!(u32_field(&value, "missing"), None);
    }

    #[test]
    fn test_metadata_id() {
        assert_eq!(metadata_id("/library/metadata/123"), "123");
        assert_eq!(metadata_id("123"), "123");
    }
}
