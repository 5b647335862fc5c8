use plexsync_models::{CatalogItem, ProviderId};
use tracing::{debug, error};

use crate::error::{SyncError, SyncResult};
use crate::stats::SyncStats;

/// Agents that never carry an external id
const UNSUPPORTED_PROVIDERS: &[&str] = &["local", "none", "agents.none"];

/// Outcome of resolving the external id of a library item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Supported(ProviderId),
    /// Local or `none` agent: skipped without complaint
    Unsupported(String),
    /// Some other agent Trakt cannot match against
    Unrecognized(String),
}

pub fn resolve(item: &CatalogItem) -> SyncResult<Resolution> {
    let parsed = item.parsed_guid().map_err(|source| SyncError::MetadataUnavailable {
        item: item.to_string(),
        source,
    })?;

    if let Some(provider_id) = parsed.provider_id() {
        return Ok(Resolution::Supported(provider_id));
    }
    if UNSUPPORTED_PROVIDERS.contains(&parsed.provider.as_str()) {
        return Ok(Resolution::Unsupported(parsed.provider));
    }
    Ok(Resolution::Unrecognized(parsed.provider))
}

/// Resolve `item` and log why it is skipped when it has no usable id.
///
/// Never fails: every skip reason is local to the item.
pub fn supported_id(item: &CatalogItem, stats: &mut SyncStats) -> Option<ProviderId> {
    match resolve(item) {
        Ok(Resolution::Supported(provider_id)) => Some(provider_id),
        Ok(Resolution::Unsupported(provider)) => {
            debug!("Skipping {}: provider '{}' not supported", item, provider);
            stats.skipped_unsupported += 1;
            None
        }
        Ok(Resolution::Unrecognized(provider)) => {
            error!(
                "{}: Unable to parse a valid provider from guid:'{}', guids:{:?} (got '{}')",
                item, item.guid, item.guids, provider
            );
            stats.skipped_unrecognized += 1;
            None
        }
        Err(e) => {
            error!("Skipping {}: {}", item, e);
            stats.skipped_unavailable += 1;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexsync_models::{MediaKind, Provider};

    fn movie(guid: &str, guids: &[&str]) -> CatalogItem {
        CatalogItem {
            key: "1".to_string(),
            title: "Heat".to_string(),
            year: Some(1995),
            guid: guid.to_string(),
            guids: guids.iter().map(|g| g.to_string()).collect(),
            watched: false,
            last_viewed_at: None,
            added_at: None,
            rating: None,
            kind: MediaKind::Movie,
        }
    }

    #[test]
    fn test_supported_providers() {
        assert_eq!(
            resolve(&movie("com.plexapp.agents.imdb://tt0113277?lang=en", &[])).unwrap(),
            Resolution::Supported(ProviderId::new(Provider::Imdb, "tt0113277"))
        );
        assert_eq!(
            resolve(&movie("plex://movie/5d7", &["tmdb://949"])).unwrap(),
            Resolution::Supported(ProviderId::new(Provider::Tmdb, "949"))
        );
    }

    #[test]
    fn test_local_agents_are_unsupported() {
        for guid in ["local://55", "com.plexapp.agents.none://55?lang=xn", "tv.plex.agents.none://55"] {
            assert!(matches!(resolve(&movie(guid, &[])).unwrap(), Resolution::Unsupported(_)), "{}", guid);
        }
    }

    #[test]
    fn test_unknown_agent_is_unrecognized() {
        assert_eq!(
            resolve(&movie("com.plexapp.agents.anidb://1234", &[])).unwrap(),
            Resolution::Unrecognized("anidb".to_string())
        );
    }

    #[test]
    fn test_missing_guids_is_metadata_unavailable() {
        let err = resolve(&movie("plex://movie/5d7", &[])).unwrap_err();
        assert!(matches!(err, SyncError::MetadataUnavailable { .. }));
    }

    #[test]
    fn test_supported_id_counts_skips() {
        let mut stats = SyncStats::default();
        assert!(supported_id(&movie("local://1", &[]), &mut stats).is_none());
        assert!(supported_id(&movie("com.plexapp.agents.anidb://1", &[]), &mut stats).is_none());
        assert!(supported_id(&movie("plex://movie/5d7", &[]), &mut stats).is_none());
        assert!(supported_id(&movie("tmdb://1", &[]), &mut stats).is_some());

        assert_eq!(stats.skipped_unsupported, 1);
        assert_eq!(stats.skipped_unrecognized, 1);
        assert_eq!(stats.skipped_unavailable, 1);
    }
}
