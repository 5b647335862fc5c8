use color_eyre::eyre::{eyre, Result};
use plexsync_config::{Config, CredentialStore, PathManager};
use plexsync_core::timing::TimedPhase;
use plexsync_core::{SyncError, SyncOutcome, SyncRequest, Synchronizer};
use plexsync_sources::{LibraryClient, PlexClient, TrackingClient, TraktClient};
use serde_json::json;
use tracing::{info, warn};

use crate::commands::sync_ui::SectionProgress;
use crate::output::Output;
use crate::SyncScope;

pub struct SyncArgs {
    pub library: Option<String>,
    pub show: Option<String>,
    pub scope: SyncScope,
    pub batch_size: usize,
}

/// `--show` always restricts the run to TV
fn build_request(args: &SyncArgs) -> SyncRequest {
    let (movies, tv) = match (args.show.is_some(), args.scope) {
        (true, _) => (false, true),
        (false, SyncScope::All) => (true, true),
        (false, SyncScope::Movies) => (true, false),
        (false, SyncScope::Tv) => (false, true),
    };
    SyncRequest { library: args.library.clone(), show: args.show.clone(), movies, tv }
}

pub async fn run_sync(args: SyncArgs, output: &Output) -> Result<()> {
    let request = build_request(&args);
    if request.is_empty() {
        output.warn("Nothing to sync!");
        return Ok(());
    }

    let paths = PathManager::detect().map_err(|e| eyre!("{}", e))?;
    let config = Config::load_or_default(&paths.config_file()).map_err(|e| eyre!("{}", e))?;
    config.validate().map_err(|e| eyre!("{}", e))?;

    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials.load().map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    let plex = PlexClient::from_config(&config.plex, &credentials).map_err(|e| eyre!("{}", e))?;
    let mut trakt = TraktClient::from_config(&config.trakt, args.batch_size);
    trakt
        .authenticate(&mut credentials)
        .await
        .map_err(|e| eyre!("Trakt authentication failed: {}", e))?;

    print_banner(&plex, &trakt, &request, output).await?;

    let phase = TimedPhase::start("Completed full sync");
    let progress = SectionProgress::new(output.is_human());
    let result = Synchronizer::new(&plex, &trakt, config.sync)
        .with_progress(&progress)
        .run(&request)
        .await;
    drop(phase);

    match result {
        Ok(outcome) => {
            report_outcome(&outcome, output);
            Ok(())
        }
        Err(SyncError::Submission(report)) => {
            for batch in report.failed() {
                output.error(format!(
                    "Trakt {} batch of {} item(s) rejected: {}",
                    batch.kind,
                    batch.items,
                    batch.error.as_deref().unwrap_or("unknown error")
                ));
            }
            Err(eyre!("Sync finished but {} Trakt write(s) were not submitted", report.failed_items()))
        }
        Err(e) => Err(eyre!("Sync failed: {}", e)),
    }
}

async fn print_banner(
    plex: &PlexClient,
    trakt: &TraktClient,
    request: &SyncRequest,
    output: &Output,
) -> Result<()> {
    let plex_user = plex.username().await.map_err(|e| eyre!("{}", e))?;
    let trakt_user = trakt.username().await.map_err(|e| eyre!("{}", e))?;
    let server = plex.server_info().await.map_err(|e| eyre!("{}", e))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting sync");
    output.info(format!("plexsync {}", env!("CARGO_PKG_VERSION")));
    output.info(format!("Syncing with Plex {} and Trakt {}", plex_user, trakt_user));
    match server.updated_at {
        Some(updated_at) => output.info(format!(
            "Server version {} updated at: {}",
            server.version, updated_at
        )),
        None => output.info(format!("Server version {}", server.version)),
    }

    match &request.show {
        Some(show) => output.info(format!("Syncing Show: {}", show)),
        None => output.info(format!("Syncing TV={}, Movies={}", request.tv, request.movies)),
    }
    if let Some(library) = &request.library {
        output.info(format!("Only library section: {}", library));
    }
    Ok(())
}

fn report_outcome(outcome: &SyncOutcome, output: &Output) {
    let stats = &outcome.stats;
    if stats.not_found > 0 || stats.lookup_failures > 0 || stats.local_failures > 0 {
        warn!(
            not_found = stats.not_found,
            lookup_failures = stats.lookup_failures,
            local_failures = stats.local_failures,
            "Some items could not be synced"
        );
    }

    if output.is_human() {
        output.success(format!("Sync complete in {:.1}s", outcome.duration.as_secs_f64()));
        output.field("Examined", stats.examined);
        output.field("Reconciled", stats.reconciled);
        output.field("Skipped", stats.skipped());
        output.field("Trakt writes", format!("{} submitted", outcome.flush.submitted()));
        output.field("Plex writes", stats.local_writes);
        if stats.local_failures > 0 {
            output.warn(format!("{} Plex write(s) failed, see log for details", stats.local_failures));
        }
    } else {
        output.json(&json!({
            "type": "sync_result",
            "stats": stats,
            "submitted": outcome.flush.submitted(),
            "trakt_not_found": outcome.flush.not_found(),
            "duration_secs": outcome.duration.as_secs_f64(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(show: Option<&str>, scope: SyncScope) -> SyncArgs {
        SyncArgs { library: None, show: show.map(str::to_string), scope, batch_size: 1 }
    }

    #[test]
    fn test_scope_selection() {
        let all = build_request(&args(None, SyncScope::All));
        assert!(all.movies && all.tv);

        let movies = build_request(&args(None, SyncScope::Movies));
        assert!(movies.movies && !movies.tv);

        let tv = build_request(&args(None, SyncScope::Tv));
        assert!(!tv.movies && tv.tv);
    }

    #[test]
    fn test_show_implies_tv_only() {
        let request = build_request(&args(Some("Frasier"), SyncScope::Movies));
        assert!(!request.movies);
        assert!(request.tv);
        assert_eq!(request.show.as_deref(), Some("Frasier"));
    }
}
