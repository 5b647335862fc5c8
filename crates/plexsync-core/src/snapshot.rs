use plexsync_models::{EpisodeNumber, LikedList, Rating, TraktRef, WatchedShows};
use plexsync_sources::{SourceResult, TrackingClient};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::timing::TimedPhase;

/// A liked Trakt list and its items in list order
#[derive(Debug, Clone)]
pub struct ListContents {
    pub list: LikedList,
    pub items: Vec<TraktRef>,
}

/// Trakt state fetched once at the start of a run.
///
/// Read-only afterwards; changes made on Trakt while the run is in progress
/// are not seen.
#[derive(Debug, Clone, Default)]
pub struct BaselineSnapshot {
    pub watched_movies: HashSet<u64>,
    pub watched_shows: WatchedShows,
    pub movie_collection: HashSet<u64>,
    pub ratings: HashMap<TraktRef, Rating>,
    /// Watchlisted movie ids in watchlist order
    pub watchlist: Vec<u64>,
    pub liked_lists: Vec<ListContents>,
}

impl BaselineSnapshot {
    pub async fn load(trakt: &dyn TrackingClient) -> SourceResult<Self> {
        let _phase = TimedPhase::start("Loaded Trakt lists");

        let watched_movies = trakt.watched_movies().await?;
        let watched_shows = trakt.watched_shows().await?;
        let movie_collection = trakt.movie_collection().await?;
        let ratings = trakt.ratings().await?;
        let watchlist = trakt.watchlist_movies().await?;

        let mut liked_lists = Vec::new();
        for list in trakt.liked_lists().await? {
            let items = trakt.list_items(&list).await?;
            debug!("Trakt list '{}' by {}: {} items", list.name, list.username, items.len());
            liked_lists.push(ListContents { list, items });
        }

        info!(
            "Trakt baseline: {} watched movies, {} watched shows, {} collected movies, {} ratings, {} watchlist, {} liked lists",
            watched_movies.len(),
            watched_shows.len(),
            movie_collection.len(),
            ratings.len(),
            watchlist.len(),
            liked_lists.len()
        );

        Ok(Self { watched_movies, watched_shows, movie_collection, ratings, watchlist, liked_lists })
    }

    pub fn is_movie_watched(&self, movie_id: u64) -> bool {
        self.watched_movies.contains(&movie_id)
    }

    pub fn is_episode_watched(&self, show_id: u64, number: EpisodeNumber) -> bool {
        self.watched_shows.get_completed(show_id, number)
    }

    pub fn is_movie_collected(&self, movie_id: u64) -> bool {
        self.movie_collection.contains(&movie_id)
    }

    pub fn rating(&self, item: TraktRef) -> Option<Rating> {
        self.ratings.get(&item).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexsync_models::ShowProgress;

    #[test]
    fn test_lookups() {
        let mut progress = ShowProgress::new();
        progress.set_completed(EpisodeNumber::new(1, 1), true);
        let mut watched_shows = WatchedShows::new();
        watched_shows.insert(7, progress);

        let snapshot = BaselineSnapshot {
            watched_movies: HashSet::from([1]),
            watched_shows,
            movie_collection: HashSet::from([2]),
            ratings: HashMap::from([(TraktRef::movie(1), Rating::new(8).unwrap())]),
            ..BaselineSnapshot::default()
        };

        assert!(snapshot.is_movie_watched(1));
        assert!(!snapshot.is_movie_watched(2));
        assert!(snapshot.is_movie_collected(2));
        assert!(snapshot.is_episode_watched(7, EpisodeNumber::new(1, 1)));
        assert!(!snapshot.is_episode_watched(7, EpisodeNumber::new(1, 2)));
        assert_eq!(snapshot.rating(TraktRef::movie(1)), Rating::new(8));
        // Episode and movie ids are separate
        assert_eq!(snapshot.rating(TraktRef::episode(1)), None);
    }
}
