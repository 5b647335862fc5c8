use plexsync_config::SyncOptions;
use plexsync_models::CatalogItem;
use plexsync_sources::{FlushReport, LibraryClient, LibrarySection, SectionKind, TrackingClient};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

use crate::error::{SyncError, SyncResult};
use crate::lists::ListAccumulator;
use crate::matcher::Matcher;
use crate::progress::{NoProgress, SyncProgress};
use crate::reconcile::FieldReconciler;
use crate::snapshot::BaselineSnapshot;
use crate::stats::SyncStats;
use crate::timing::TimedPhase;


/// What a single run covers
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncRequest {
    /// Only sections with this title
    pub library: Option<String>,
    /// Search the library for this show and sync only its episodes
    pub show: Option<String>,
    pub movies: bool,
    pub tv: bool,
}

impl SyncRequest {
    pub fn all() -> Self {
        Self { movies: true, tv: true, ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        !self.movies && !self.tv
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub stats: SyncStats,
    #[serde(skip)]
    pub flush: FlushReport,
    pub duration: Duration,
}

/// Drives one run: baseline snapshot, movies, shows, lists, then the single
/// Trakt flush.
pub struct Synchronizer<'a> {
    library: &'a dyn LibraryClient,
    trakt: &'a dyn TrackingClient,
    options: SyncOptions,
    progress: &'a dyn SyncProgress,
}

struct RunState<'a> {
    reconciler: FieldReconciler<'a>,
    lists: ListAccumulator,
    stats: SyncStats,
}

impl<'a> Synchronizer<'a> {
    pub fn new(library: &'a dyn LibraryClient, trakt: &'a dyn TrackingClient, options: SyncOptions) -> Self {
        Self { library, trakt, options, progress: &NoProgress }
    }

    pub fn with_progress(mut self, progress: &'a dyn SyncProgress) -> Self {
        self.progress = progress;
        self
    }

    #[instrument(skip(self), fields(library = ?request.library, show = ?request.show))]
    pub async fn run(&self, request: &SyncRequest) -> SyncResult<SyncOutcome> {
        let started = Instant::now();

        let snapshot = BaselineSnapshot::load(self.trakt).await?;
        let mut state = RunState {
            reconciler: FieldReconciler::new(self.library, self.trakt, self.options, &snapshot),
            lists: ListAccumulator::from_snapshot(&snapshot),
            stats: SyncStats::default(),
        };

        if request.movies {
            for section in self.library.movie_sections(request.library.as_deref()).await? {
                self.sync_movie_section(&section, &mut state).await?;
            }
        }

        if request.tv {
            match request.show.as_deref() {
                Some(title) => self.sync_named_show(title, &mut state).await?,
                None => {
                    for section in self.library.show_sections(request.library.as_deref()).await? {
                        self.sync_show_section(&section, &mut state).await?;
                    }
                }
            }
        }

        state.lists.flush(self.library, &mut state.stats).await;

        let flush = self.trakt.flush().await?;
        info!("Sync summary: {}", state.stats);
        if !flush.is_success() {
            return Err(SyncError::Submission(flush));
        }

        Ok(SyncOutcome { stats: state.stats, flush, duration: started.elapsed() })
    }

    async fn sync_movie_section(&self, section: &LibrarySection, state: &mut RunState<'_>) -> SyncResult<()> {
        let phase = TimedPhase::start(format!("Processing {}", section.title));
        let items = self.library.section_items(section).await?;
        self.progress.section_started(phase.label(), items.len());
        let matcher = Matcher::new(self.trakt);

        for item in &items {
            state.stats.examined += 1;
            if let Some(tracked) = matcher.find_pair(item, &mut state.stats).await? {
                state.reconciler.reconcile_movie(item, &tracked, &mut state.stats).await;
                state.lists.record(tracked.reference(), &item.key);
            }
            self.progress.item_processed();
        }

        self.progress.section_finished();
        Ok(())
    }

    async fn sync_show_section(&self, section: &LibrarySection, state: &mut RunState<'_>) -> SyncResult<()> {
        let phase = TimedPhase::start(format!("Processing {}", section.title));
        let shows = self.library.section_items(section).await?;
        self.progress.section_started(phase.label(), shows.len());

        for show in &shows {
            self.sync_show(show, state).await?;
            self.progress.item_processed();
        }

        self.progress.section_finished();
        Ok(())
    }

    async fn sync_named_show(&self, title: &str, state: &mut RunState<'_>) -> SyncResult<()> {
        let found = self.library.search(title, SectionKind::Show).await?;
        if found.is_empty() {
            warn!("Skipping show '{}': Not found in Plex library", title);
            state.stats.not_found += 1;
            return Ok(());
        }

        for show in &found {
            self.sync_show(show, state).await?;
        }
        Ok(())
    }

    async fn sync_show(&self, show: &CatalogItem, state: &mut RunState<'_>) -> SyncResult<()> {
        state.stats.examined += 1;
        let matcher = Matcher::new(self.trakt);
        let Some(tracked_show) = matcher.find_pair(show, &mut state.stats).await? else {
            return Ok(());
        };

        state.lists.record(tracked_show.reference(), &show.key);

        let context = match matcher.show_context(tracked_show, self.options.collection).await {
            Ok(context) => context,
            Err(e) if !e.is_fatal() => {
                error!("Skipping {}: failed to load episodes from Trakt ({})", show, e);
                state.stats.lookup_failures += 1;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let episodes = match self.library.episodes(show).await {
            Ok(episodes) => episodes,
            Err(e) if e.is_not_found() => {
                warn!("Skipping {}: episodes not found in Plex ({})", show, e);
                state.stats.not_found += 1;
                return Ok(());
            }
            Err(e) if !e.is_fatal() => {
                error!("Skipping {}: failed to load episodes from Plex ({})", show, e);
                state.stats.lookup_failures += 1;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for episode in &episodes {
            state.stats.examined += 1;
            let Some(tracked) = matcher.find_episode(&context, episode, &mut state.stats) else {
                continue;
            };
            state.reconciler.reconcile_episode(&context, episode, &tracked, &mut state.stats).await;
            state.lists.record(tracked.reference(), &episode.key);
        }
        Ok(())
    }
}
