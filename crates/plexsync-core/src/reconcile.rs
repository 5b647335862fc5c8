use plexsync_config::SyncOptions;
use plexsync_models::{CatalogItem, Rating, TrackedItem};
use plexsync_sources::{LibraryClient, TrackingClient};
use tracing::{error, info};

use crate::matcher::ShowContext;
use crate::snapshot::BaselineSnapshot;
use crate::stats::SyncStats;

/// Which side a differing rating is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingAction {
    Keep,
    PushToTrakt(Rating),
    ApplyToPlex(Rating),
}

/// Plex wins whenever it has a rating; absent on both sides is equal
pub fn rating_action(plex: Option<Rating>, trakt: Option<Rating>) -> RatingAction {
    if plex == trakt {
        return RatingAction::Keep;
    }
    match (plex, trakt) {
        (Some(rating), _) => RatingAction::PushToTrakt(rating),
        (None, Some(rating)) => RatingAction::ApplyToPlex(rating),
        (None, None) => RatingAction::Keep,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchedAction {
    Keep,
    MarkOnTrakt,
    MarkOnPlex,
}

pub fn watched_action(plex: bool, trakt: bool) -> WatchedAction {
    match (plex, trakt) {
        (true, false) => WatchedAction::MarkOnTrakt,
        (false, true) => WatchedAction::MarkOnPlex,
        _ => WatchedAction::Keep,
    }
}

/// Compares one matched pair field by field and issues at most one write per
/// field. Trakt writes are queued; Plex writes are applied immediately.
pub struct FieldReconciler<'a> {
    library: &'a dyn LibraryClient,
    trakt: &'a dyn TrackingClient,
    options: SyncOptions,
    snapshot: &'a BaselineSnapshot,
}

impl<'a> FieldReconciler<'a> {
    pub fn new(
        library: &'a dyn LibraryClient,
        trakt: &'a dyn TrackingClient,
        options: SyncOptions,
        snapshot: &'a BaselineSnapshot,
    ) -> Self {
        Self { library, trakt, options, snapshot }
    }

    pub async fn reconcile_movie(&self, item: &CatalogItem, tracked: &TrackedItem, stats: &mut SyncStats) {
        stats.reconciled += 1;

        if self.options.collection && !self.snapshot.is_movie_collected(tracked.trakt_id) {
            info!("To be added to collection: {}", item);
            self.trakt.add_to_collection(tracked, item);
            stats.remote_writes += 1;
        }

        if self.options.ratings {
            self.sync_rating(item, tracked, stats).await;
        }

        if self.options.watched_status {
            let watched_on_trakt = self.snapshot.is_movie_watched(tracked.trakt_id);
            self.sync_watched(item, tracked, watched_on_trakt, stats).await;
        }
    }

    pub async fn reconcile_episode(
        &self,
        show: &ShowContext,
        item: &CatalogItem,
        tracked: &TrackedItem,
        stats: &mut SyncStats,
    ) {
        stats.reconciled += 1;
        let Some(number) = item.episode().map(|info| info.number).or(tracked.episode) else {
            return;
        };

        if self.options.collection && !show.collected.get_completed(number) {
            info!("Add to Trakt Collection: {}", item);
            self.trakt.add_to_collection(tracked, item);
            stats.remote_writes += 1;
        }

        if self.options.ratings {
            self.sync_rating(item, tracked, stats).await;
        }

        if self.options.watched_status {
            let watched_on_trakt = self.snapshot.is_episode_watched(show.show.trakt_id, number);
            self.sync_watched(item, tracked, watched_on_trakt, stats).await;
        }
    }

    async fn sync_rating(&self, item: &CatalogItem, tracked: &TrackedItem, stats: &mut SyncStats) {
        let trakt_rating = self.snapshot.rating(tracked.reference());
        match rating_action(item.rating, trakt_rating) {
            RatingAction::Keep => {}
            RatingAction::PushToTrakt(rating) => {
                info!("Rating {} with {} on Trakt", item, rating);
                self.trakt.rate(tracked, rating);
                stats.remote_writes += 1;
            }
            RatingAction::ApplyToPlex(rating) => {
                info!("Rating {} with {} on Plex", item, rating);
                match self.library.rate(item, rating).await {
                    Ok(()) => stats.local_writes += 1,
                    Err(e) => {
                        error!("Failed to rate {} on Plex: {}", item, e);
                        stats.local_failures += 1;
                    }
                }
            }
        }
    }

    async fn sync_watched(&self, item: &CatalogItem, tracked: &TrackedItem, watched_on_trakt: bool, stats: &mut SyncStats) {
        match watched_action(item.watched, watched_on_trakt) {
            WatchedAction::Keep => {}
            WatchedAction::MarkOnTrakt => {
                info!("Marking as watched on Trakt: {}", item);
                self.trakt.mark_watched(tracked, item.seen_date());
                stats.remote_writes += 1;
            }
            WatchedAction::MarkOnPlex => {
                info!("Marking as watched in Plex: {}", item);
                match self.library.mark_watched(item).await {
                    Ok(()) => stats.local_writes += 1,
                    Err(e) => {
                        error!("Failed to mark {} as watched in Plex: {}", item, e);
                        stats.local_failures += 1;
                    }
                }
            }
        }
    }
}
