use color_eyre::eyre::{eyre, Result};
use plexsync_config::{Config, CredentialStore, PathManager};
use plexsync_core::{resolve, Matcher, Resolution, SyncStats};
use plexsync_models::CatalogItem;
use plexsync_sources::{LibraryClient, PlexClient, TraktClient};
use serde_json::json;

use crate::output::Output;

/// Accepts a bare rating key or anything containing `/library/metadata/<key>`
fn parse_rating_key(input: &str) -> Option<String> {
    let input = input.trim();
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        return Some(input.to_string());
    }

    let decoded = input.replace("%2F", "/").replace("%2f", "/");
    let (_, rest) = decoded.split_once("/library/metadata/")?;
    let key: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    (!key.is_empty()).then_some(key)
}

pub async fn run_inspect(input: &str, output: &Output) -> Result<()> {
    let key = parse_rating_key(input).ok_or_else(|| eyre!("Unable to parse rating key from '{}'", input))?;

    let paths = PathManager::detect().map_err(|e| eyre!("{}", e))?;
    let config = Config::load_or_default(&paths.config_file()).map_err(|e| eyre!("{}", e))?;
    config.validate().map_err(|e| eyre!("{}", e))?;
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials.load().map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    let plex = PlexClient::from_config(&config.plex, &credentials).map_err(|e| eyre!("{}", e))?;
    let item = plex
        .fetch_item(&key)
        .await
        .map_err(|e| eyre!("Failed to fetch item {}: {}", key, e))?;

    let mut trakt = TraktClient::from_config(&config.trakt, 1);
    trakt
        .authenticate(&mut credentials)
        .await
        .map_err(|e| eyre!("Trakt authentication failed: {}", e))?;

    let resolution = resolve(&item).map_err(|e| e.to_string());
    let matched = match &resolution {
        Ok(Resolution::Supported(_)) => {
            let mut stats = SyncStats::default();
            Matcher::new(&trakt)
                .find_pair(&item, &mut stats)
                .await
                .map(|found| found.map(|tracked| tracked.to_string()))
                .map_err(|e| e.to_string())
        }
        _ => Ok(None),
    };

    if output.is_human() {
        print_human(&item, &resolution, &matched, output);
    } else {
        output.json(&json!({
            "type": "inspect",
            "key": item.key,
            "title": item.title,
            "year": item.year,
            "kind": item.kind.name(),
            "guid": item.guid,
            "guids": item.guids,
            "resolution": describe(&resolution),
            "trakt": matched.as_ref().ok().cloned().flatten(),
            "trakt_error": matched.as_ref().err(),
        }));
    }
    Ok(())
}

fn describe(resolution: &Result<Resolution, String>) -> String {
    match resolution {
        Ok(Resolution::Supported(id)) => id.to_string(),
        Ok(Resolution::Unsupported(provider)) => format!("{} (not synced)", provider),
        Ok(Resolution::Unrecognized(provider)) => format!("{} (unrecognized provider)", provider),
        Err(e) => format!("error: {}", e),
    }
}

fn print_human(
    item: &CatalogItem,
    resolution: &Result<Resolution, String>,
    matched: &Result<Option<String>, String>,
    output: &Output,
) {
    output.info(format!("--- {} ---", item.title));
    output.field("Key", &item.key);
    output.field("Type", item.kind.name());
    if let Some(year) = item.year {
        output.field("Year", year);
    }
    output.field("Guid", &item.guid);
    for guid in &item.guids {
        output.field("Guid", guid);
    }
    output.field("Provider", describe(resolution));
    match matched {
        Ok(Some(tracked)) => output.field("Trakt", tracked),
        Ok(None) if matches!(resolution, Ok(Resolution::Supported(_))) => output.field("Trakt", "not found"),
        Ok(None) => {}
        Err(e) => output.error(format!("Trakt lookup failed: {}", e)),
    }
}
