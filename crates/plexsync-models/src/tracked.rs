use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::media::EpisodeNumber;
use crate::media_ids::MediaIds;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TraktKind {
    Movie,
    Show,
    Episode,
}

impl TraktKind {
    pub fn from_type(item_type: &str) -> Option<Self> {
        match item_type {
            "movie" => Some(TraktKind::Movie),
            "show" => Some(TraktKind::Show),
            "episode" => Some(TraktKind::Episode),
            _ => None,
        }
    }
}

/// Typed Trakt id. Movie, show and episode ids live in separate id spaces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TraktRef {
    pub kind: TraktKind,
    pub id: u64,
}

impl TraktRef {
    pub fn movie(id: u64) -> Self {
        Self { kind: TraktKind::Movie, id }
    }

    pub fn show(id: u64) -> Self {
        Self { kind: TraktKind::Show, id }
    }

    pub fn episode(id: u64) -> Self {
        Self { kind: TraktKind::Episode, id }
    }
}

/// Trakt-side identity of a matched movie, show or episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedItem {
    pub trakt_id: u64,
    pub kind: TraktKind,
    pub title: String,
    pub year: Option<u32>,
    pub ids: MediaIds,
    /// Season and episode number, episodes only
    pub episode: Option<EpisodeNumber>,
}

impl TrackedItem {
    pub fn reference(&self) -> TraktRef {
        TraktRef { kind: self.kind, id: self.trakt_id }
    }
}

impl fmt::Display for TrackedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.episode, self.year) {
            (Some(number), _) => write!(f, "<Trakt {:?}:{}:{} {}>", self.kind, self.trakt_id, number, self.title),
            (None, Some(year)) => write!(f, "<Trakt {:?}:{}:{} ({})>", self.kind, self.trakt_id, self.title, year),
            (None, None) => write!(f, "<Trakt {:?}:{}:{}>", self.kind, self.trakt_id, self.title),
        }
    }
}

/// Full episode listing of one show, keyed by season/episode number
#[derive(Debug, Clone, Default)]
pub struct EpisodeTable {
    episodes: HashMap<EpisodeNumber, TrackedItem>,
}

impl EpisodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, episode: TrackedItem) {
        if let Some(number) = episode.episode {
            self.episodes.insert(number, episode);
        }
    }

    pub fn find(&self, number: EpisodeNumber) -> Option<&TrackedItem> {
        self.episodes.get(&number)
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

impl FromIterator<TrackedItem> for EpisodeTable {
    fn from_iter<I: IntoIterator<Item = TrackedItem>>(iter: I) -> Self {
        let mut table = EpisodeTable::new();
        for episode in iter {
            table.insert(episode);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(trakt_id: u64, season: u32, number: u32) -> TrackedItem {
        TrackedItem {
            trakt_id,
            kind: TraktKind::Episode,
            title: format!("Episode {}", number),
            year: None,
            ids: MediaIds::default(),
            episode: Some(EpisodeNumber::new(season, number)),
        }
    }

    #[test]
    fn test_episode_table_find() {
        let table: EpisodeTable = vec![episode(11, 1, 1), episode(12, 1, 2)].into_iter().collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table.find(EpisodeNumber::new(1, 2)).map(|e| e.trakt_id), Some(12));
        assert!(table.find(EpisodeNumber::new(2, 1)).is_none());
    }

    #[test]
    fn test_episode_table_ignores_items_without_number() {
        let mut show = episode(1, 0, 0);
        show.kind = TraktKind::Show;
        show.episode = None;
        let mut table = EpisodeTable::new();
        table.insert(show);
        assert!(table.is_empty());
    }

    #[test]
    fn test_reference_is_typed() {
        let ep = episode(5, 1, 1);
        assert_eq!(ep.reference(), TraktRef::episode(5));
        assert_ne!(ep.reference(), TraktRef::movie(5));
    }
}
