use serde::{Deserialize, Serialize};

use crate::guid::{Provider, ProviderId};

/// Remote identifiers Trakt reports for a movie, show or episode
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MediaIds {
    pub trakt: Option<u64>,
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
    pub tvdb: Option<u64>,
    pub slug: Option<String>,
}

impl MediaIds {
    /// Check whether these ids contain the given provider id
    pub fn matches(&self, provider_id: &ProviderId) -> bool {
        match provider_id.provider {
            Provider::Imdb => self.imdb.as_deref() == Some(provider_id.id.as_str()),
            Provider::Tmdb => self.tmdb.map(|id| id.to_string()) == Some(provider_id.id.clone()),
            Provider::Tvdb => self.tvdb.map(|id| id.to_string()) == Some(provider_id.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_provider_id() {
        let ids = MediaIds { tmdb: Some(100), imdb: Some("tt0000100".to_string()), ..MediaIds::default() };
        assert!(ids.matches(&ProviderId::new(Provider::Tmdb, "100")));
        assert!(ids.matches(&ProviderId::new(Provider::Imdb, "tt0000100")));
        assert!(!ids.matches(&ProviderId::new(Provider::Tvdb, "100")));
    }
}
