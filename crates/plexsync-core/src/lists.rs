use plexsync_models::TraktRef;
use plexsync_sources::LibraryClient;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info};

use crate::snapshot::BaselineSnapshot;
use crate::stats::SyncStats;
use crate::timing::TimedPhase;

pub const WATCHLIST_NAME: &str = "Trakt Watchlist";

/// One Trakt list mirrored into a Plex playlist
#[derive(Debug, Clone)]
struct TrackedList {
    name: String,
    /// Position of each Trakt item in the list
    positions: HashMap<TraktRef, usize>,
    /// Plex keys found so far, by list position
    members: BTreeMap<usize, String>,
}

impl TrackedList {
    fn new(name: String, items: impl IntoIterator<Item = TraktRef>) -> Self {
        let mut positions = HashMap::new();
        for (position, item) in items.into_iter().enumerate() {
            positions.entry(item).or_insert(position);
        }
        Self { name, positions, members: BTreeMap::new() }
    }

    fn plex_keys(&self) -> Vec<String> {
        self.members.values().cloned().collect()
    }
}

/// Collects which library items belong on which Trakt list during a run,
/// then writes every list to Plex at the end.
#[derive(Debug, Clone, Default)]
pub struct ListAccumulator {
    lists: Vec<TrackedList>,
}

impl ListAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The watchlist (movies only) plus every liked list
    pub fn from_snapshot(snapshot: &BaselineSnapshot) -> Self {
        let mut accumulator = Self::new();
        if !snapshot.watchlist.is_empty() {
            accumulator.add_list(WATCHLIST_NAME, snapshot.watchlist.iter().map(|id| TraktRef::movie(*id)));
        }
        for contents in &snapshot.liked_lists {
            accumulator.add_list(&contents.list.name, contents.items.iter().copied());
        }
        accumulator
    }

    pub fn add_list(&mut self, name: &str, items: impl IntoIterator<Item = TraktRef>) {
        let list = TrackedList::new(name.to_string(), items);
        debug!("Tracking list '{}' with {} items", list.name, list.positions.len());
        self.lists.push(list);
    }

    /// Record `plex_key` on every list containing `item`. Recording the same
    /// item again has no further effect.
    pub fn record(&mut self, item: TraktRef, plex_key: &str) {
        for list in &mut self.lists {
            if let Some(position) = list.positions.get(&item) {
                list.members.entry(*position).or_insert_with(|| plex_key.to_string());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Plex keys recorded for list `name`, in Trakt list order
    pub fn members(&self, name: &str) -> Option<Vec<String>> {
        self.lists.iter().find(|list| list.name == name).map(TrackedList::plex_keys)
    }

    /// Replace each Plex playlist with the recorded members; a failed list is
    /// logged and counted, the rest are still written.
    pub async fn flush(&self, library: &dyn LibraryClient, stats: &mut SyncStats) {
        let _phase = TimedPhase::start("Updated plex watchlist");

        for list in &self.lists {
            let keys = list.plex_keys();
            info!("Updating Plex list '{}' ({} of {} items in library)", list.name, keys.len(), list.positions.len());
            match library.update_playlist(&list.name, &keys).await {
                Ok(()) => stats.local_writes += 1,
                Err(e) => {
                    error!("Failed to update Plex list '{}': {}", list.name, e);
                    stats.local_failures += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_idempotent_and_ordered() {
        let mut lists = ListAccumulator::new();
        lists.add_list("Favorites", [TraktRef::episode(3), TraktRef::movie(1), TraktRef::episode(2)]);

        lists.record(TraktRef::episode(2), "200");
        lists.record(TraktRef::episode(3), "300");
        lists.record(TraktRef::episode(2), "200");
        lists.record(TraktRef::episode(99), "999");

        assert_eq!(lists.members("Favorites"), Some(vec!["300".to_string(), "200".to_string()]));
    }

    #[test]
    fn test_ids_are_typed() {
        let mut lists = ListAccumulator::new();
        lists.add_list(WATCHLIST_NAME, [TraktRef::movie(5)]);

        lists.record(TraktRef::episode(5), "ep");
        assert_eq!(lists.members(WATCHLIST_NAME), Some(vec![]));

        lists.record(TraktRef::movie(5), "movie");
        assert_eq!(lists.members(WATCHLIST_NAME), Some(vec!["movie".to_string()]));
    }

    #[test]
    fn test_item_on_several_lists() {
        let mut lists = ListAccumulator::new();
        lists.add_list("A", [TraktRef::movie(1)]);
        lists.add_list("B", [TraktRef::movie(2), TraktRef::movie(1)]);

        lists.record(TraktRef::movie(1), "10");
        assert_eq!(lists.members("A"), Some(vec!["10".to_string()]));
        assert_eq!(lists.members("B"), Some(vec!["10".to_string()]));
        assert_eq!(lists.members("C"), None);
    }

    #[test]
    fn test_watchlist_only_seeded_when_present() {
        let empty = ListAccumulator::from_snapshot(&BaselineSnapshot::default());
        assert!(empty.is_empty());

        let snapshot = BaselineSnapshot { watchlist: vec![4, 2], ..BaselineSnapshot::default() };
        let lists = ListAccumulator::from_snapshot(&snapshot);
        assert_eq!(lists.members(WATCHLIST_NAME), Some(vec![]));
    }
}
