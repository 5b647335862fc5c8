use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::guid::{GuidError, ParsedGuid};
use crate::rating::Rating;

/// An item of the local Plex library (movie, show or episode).
///
/// The library owns these; the sync engine only holds them while an item is
/// being reconciled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    /// Plex rating key
    pub key: String,
    pub title: String,
    pub year: Option<u32>,
    /// Primary guid, e.g. `plex://movie/5d77...` or `com.plexapp.agents.imdb://tt0111161?lang=en`
    pub guid: String,
    /// Secondary guids reported by new Plex agents (`imdb://...`, `tmdb://...`, `tvdb://...`)
    #[serde(default)]
    pub guids: Vec<String>,
    pub watched: bool,
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub added_at: Option<DateTime<Utc>>,
    pub rating: Option<Rating>,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Show,
    Episode(EpisodeInfo),
}

/// Episode-only attributes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeInfo {
    pub show_key: String,
    pub show_title: String,
    pub number: EpisodeNumber,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeNumber {
    pub season: u32,
    pub number: u32,
}

impl EpisodeNumber {
    pub fn new(season: u32, number: u32) -> Self {
        Self { season, number }
    }
}

impl fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.number)
    }
}

impl MediaKind {
    pub fn name(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
            MediaKind::Episode(_) => "episode",
        }
    }
}

impl CatalogItem {
    /// Resolve the guid that identifies this item with an external provider.
    ///
    /// Fails when the item uses a new-agent guid and Plex reported no secondary guids.
    pub fn parsed_guid(&self) -> Result<ParsedGuid, GuidError> {
        ParsedGuid::from_item(&self.guid, &self.guids)
    }

    /// Timestamp sent to Trakt when this item is marked watched remotely
    pub fn seen_date(&self) -> Option<DateTime<Utc>> {
        self.last_viewed_at
    }

    pub fn episode(&self) -> Option<&EpisodeInfo> {
        match &self.kind {
            MediaKind::Episode(info) => Some(info),
            _ => None,
        }
    }

    pub fn is_movie(&self) -> bool {
        matches!(self.kind, MediaKind::Movie)
    }
}

impl fmt::Display for CatalogItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MediaKind::Episode(info) => write!(
                f,
                "<Episode:{}:{} {}:{}>",
                self.key, info.show_title, info.number, self.title
            ),
            kind => match self.year {
                Some(year) => write!(f, "<{}:{}:{} ({})>", capitalize(kind.name()), self.key, self.title, year),
                None => write!(f, "<{}:{}:{}>", capitalize(kind.name()), self.key, self.title),
            },
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie() -> CatalogItem {
        CatalogItem {
            key: "42".to_string(),
            title: "Heat".to_string(),
            year: Some(1995),
            guid: "com.plexapp.agents.imdb://tt0113277?lang=en".to_string(),
            guids: vec![],
            watched: false,
            last_viewed_at: None,
            added_at: None,
            rating: None,
            kind: MediaKind::Movie,
        }
    }

    #[test]
    fn test_display_movie() {
        assert_eq!(movie().to_string(), "<Movie:42:Heat (1995)>");
    }

    #[test]
    fn test_display_episode() {
        let mut item = movie();
        item.title = "Pilot".to_string();
        item.kind = MediaKind::Episode(EpisodeInfo {
            show_key: "7".to_string(),
            show_title: "Lost".to_string(),
            number: EpisodeNumber::new(1, 2),
        });
        assert_eq!(item.to_string(), "<Episode:42:Lost S01E02:Pilot>");
        assert_eq!(item.episode().map(|e| e.number.season), Some(1));
        assert!(!item.is_movie());
    }
}
