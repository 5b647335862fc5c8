use plexsync_models::{CatalogItem, EpisodeTable, ShowProgress, TrackedItem};
use plexsync_sources::{SourceResult, TrackingClient};
use tracing::{debug, error, warn};

use crate::error::SyncResult;
use crate::resolver;
use crate::stats::SyncStats;

/// A matched show with the Trakt data needed to reconcile its episodes
#[derive(Debug, Clone)]
pub struct ShowContext {
    pub show: TrackedItem,
    pub episodes: EpisodeTable,
    /// Collection progress; empty when collection sync is disabled
    pub collected: ShowProgress,
}

/// Matches library items to Trakt by external id
pub struct Matcher<'a> {
    trakt: &'a dyn TrackingClient,
}

impl<'a> Matcher<'a> {
    pub fn new(trakt: &'a dyn TrackingClient) -> Self {
        Self { trakt }
    }

    /// Resolve the provider id of a movie or show and look it up on Trakt.
    ///
    /// Unsupported ids, Trakt misses and failed lookups are logged and yield
    /// `Ok(None)`. Only transport and authentication failures are returned.
    pub async fn find_pair(&self, item: &CatalogItem, stats: &mut SyncStats) -> SyncResult<Option<TrackedItem>> {
        let Some(provider_id) = resolver::supported_id(item, stats) else {
            return Ok(None);
        };

        match self.trakt.find_by_media(item, &provider_id).await {
            Ok(Some(tracked)) => Ok(Some(tracked)),
            Ok(None) => {
                warn!("Skipping {}: Not found on Trakt", item);
                stats.not_found += 1;
                Ok(None)
            }
            Err(e) if e.is_not_found() => {
                warn!("Skipping {}: Not found on Trakt ({})", item, e);
                stats.not_found += 1;
                Ok(None)
            }
            Err(e) if !e.is_fatal() => {
                error!("Skipping {}: Trakt lookup failed ({})", item, e);
                stats.lookup_failures += 1;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch the episode listing of a matched show, plus its collection
    /// progress when `with_collection` is set.
    pub async fn show_context(&self, show: TrackedItem, with_collection: bool) -> SourceResult<ShowContext> {
        let episodes = self.trakt.lookup(&show).await?;
        let collected = if with_collection {
            self.trakt.collected(&show).await?
        } else {
            ShowProgress::new()
        };
        debug!("{}: {} episodes on Trakt, {} collected", show, episodes.len(), collected.completed_count());
        Ok(ShowContext { show, episodes, collected })
    }

    /// Match an episode against its show's table; no Trakt round trip
    pub fn find_episode(&self, context: &ShowContext, item: &CatalogItem, stats: &mut SyncStats) -> Option<TrackedItem> {
        resolver::supported_id(item, stats)?;

        let found = self.trakt.find_episode(&context.show, item, &context.episodes);
        if found.is_none() {
            warn!("Skipping {}: Not found on Trakt", item);
            stats.not_found += 1;
        }
        found
    }
}
