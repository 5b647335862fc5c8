use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::media::EpisodeNumber;

/// Per-episode completion of one show (watched or collected, depending on the source)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowProgress {
    seasons: BTreeMap<u32, BTreeMap<u32, bool>>,
}

impl ShowProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_completed(&mut self, number: EpisodeNumber, completed: bool) {
        self.seasons
            .entry(number.season)
            .or_default()
            .insert(number.number, completed);
    }

    /// Unknown episodes count as not completed
    pub fn get_completed(&self, number: EpisodeNumber) -> bool {
        self.seasons
            .get(&number.season)
            .and_then(|episodes| episodes.get(&number.number))
            .copied()
            .unwrap_or(false)
    }

    pub fn completed_count(&self) -> usize {
        self.seasons
            .values()
            .flat_map(|episodes| episodes.values())
            .filter(|completed| **completed)
            .count()
    }
}

/// Watched progress for every show the user has watched, keyed by Trakt show id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchedShows {
    shows: HashMap<u64, ShowProgress>,
}

impl WatchedShows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, show_id: u64, progress: ShowProgress) {
        self.shows.insert(show_id, progress);
    }

    pub fn set_completed(&mut self, show_id: u64, number: EpisodeNumber, completed: bool) {
        self.shows.entry(show_id).or_default().set_completed(number, completed);
    }

    pub fn get_completed(&self, show_id: u64, number: EpisodeNumber) -> bool {
        self.shows
            .get(&show_id)
            .map(|progress| progress.get_completed(number))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }
}
