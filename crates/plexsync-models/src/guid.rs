use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// External metadata providers Trakt can match against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Provider {
    Imdb,
    Tmdb,
    Tvdb,
}

impl Provider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "imdb" => Some(Provider::Imdb),
            "tmdb" => Some(Provider::Tmdb),
            "tvdb" => Some(Provider::Tvdb),
            _ => None,
        }
    }

    /// Id type name used by the Trakt search endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Imdb => "imdb",
            Provider::Tmdb => "tmdb",
            Provider::Tvdb => "tvdb",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-qualified external id, e.g. `tmdb:100`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProviderId {
    pub provider: Provider,
    pub id: String,
}

impl ProviderId {
    pub fn new(provider: Provider, id: impl Into<String>) -> Self {
        Self { provider, id: id.into() }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.id)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuidError {
    #[error("no secondary guids available for '{0}'")]
    MissingGuids(String),
    #[error("unable to parse guid '{0}'")]
    Malformed(String),
}

/// Provider name and id extracted from a Plex guid.
///
/// The provider is normalized to the names Trakt uses, but is not yet checked
/// against the supported set: `local`, `none` and unknown agents pass through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGuid {
    pub guid: String,
    pub provider: String,
    pub id: String,
}

impl ParsedGuid {
    /// Pick the identifying guid of an item and parse it.
    ///
    /// New Plex agents use `plex://` guids that Trakt does not understand; the
    /// first secondary guid is used for those instead.
    pub fn from_item(guid: &str, guids: &[String]) -> Result<Self, GuidError> {
        if guid.starts_with("plex://") {
            let secondary = guids
                .first()
                .ok_or_else(|| GuidError::MissingGuids(guid.to_string()))?;
            return Self::parse(secondary);
        }
        Self::parse(guid)
    }

    pub fn parse(guid: &str) -> Result<Self, GuidError> {
        let (agent, rest) = guid
            .split_once("://")
            .ok_or_else(|| GuidError::Malformed(guid.to_string()))?;

        let id = rest.split('?').next().unwrap_or_default().to_string();
        if id.is_empty() {
            return Err(GuidError::Malformed(guid.to_string()));
        }

        Ok(Self {
            guid: guid.to_string(),
            provider: normalize_provider(agent),
            id,
        })
    }

    /// Provider id when the provider is one Trakt can match against
    pub fn provider_id(&self) -> Option<ProviderId> {
        Provider::from_name(&self.provider).map(|provider| ProviderId::new(provider, self.id.clone()))
    }
}

fn normalize_provider(agent: &str) -> String {
    let name = agent
        .trim_start_matches("com.plexapp.agents.")
        .trim_start_matches("tv.plex.agents.");
    match name {
        "themoviedb" => "tmdb".to_string(),
        "thetvdb" => "tvdb".to_string(),
        "xbmcnfo" => "imdb".to_string(),
        "xbmcnfotv" => "tvdb".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_imdb_agent() {
        let parsed = ParsedGuid::parse("com.plexapp.agents.imdb://tt0111161?lang=en").unwrap();
        assert_eq!(parsed.provider, "imdb");
        assert_eq!(parsed.id, "tt0111161");
        assert_eq!(parsed.provider_id(), Some(ProviderId::new(Provider::Imdb, "tt0111161")));
    }

    #[test]
    fn test_parse_renamed_agents() {
        assert_eq!(ParsedGuid::parse("com.plexapp.agents.themoviedb://603?lang=en").unwrap().provider, "tmdb");
        assert_eq!(ParsedGuid::parse("com.plexapp.agents.thetvdb://79169/1/2?lang=en").unwrap().provider, "tvdb");
        assert_eq!(ParsedGuid::parse("com.plexapp.agents.xbmcnfo://tt0133093").unwrap().provider, "imdb");
        assert_eq!(ParsedGuid::parse("com.plexapp.agents.xbmcnfotv://79169").unwrap().provider, "tvdb");
    }

    #[test]
    fn test_local_and_none_agents_pass_through() {
        let local = ParsedGuid::parse("local://1234").unwrap();
        assert_eq!(local.provider, "local");
        assert_eq!(local.provider_id(), None);

        let none = ParsedGuid::parse("com.plexapp.agents.none://abc?lang=xn").unwrap();
        assert_eq!(none.provider, "none");
        assert_eq!(none.provider_id(), None);
    }

    #[test]
    fn test_new_agent_uses_secondary_guid() {
        let guids = vec!["tmdb://100".to_string(), "imdb://tt0000100".to_string()];
        let parsed = ParsedGuid::from_item("plex://movie/5d776b59ad5437001f79c6f8", &guids).unwrap();
        assert_eq!(parsed.provider_id(), Some(ProviderId::new(Provider::Tmdb, "100")));
    }

    #[test]
    fn test_new_agent_without_guids_is_unavailable() {
        let err = ParsedGuid::from_item("plex://movie/5d776b59ad5437001f79c6f8", &[]).unwrap_err();
        assert!(matches!(err, GuidError::MissingGuids(_)));
    }

    #[test]
    fn test_malformed_guid() {
        assert!(matches!(ParsedGuid::parse("garbage"), Err(GuidError::Malformed(_))));
        assert!(matches!(ParsedGuid::parse("imdb://"), Err(GuidError::Malformed(_))));
    }
}
