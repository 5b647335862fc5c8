use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use plexsync_config::{CredentialStore, TraktConfig};
use plexsync_models::{
    CatalogItem, EpisodeTable, LikedList, ProviderId, Rating, ShowProgress, TrackedItem, TraktKind,
    TraktRef, WatchedShows,
};
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, warn};

use crate::error::{SourceError, SourceResult};
use crate::submit::{BatchOutcome, FlushReport};
use crate::traits::TrackingClient;
use crate::trakt::api;
use crate::trakt::auth;
use crate::trakt::queue::SubmitQueue;

pub struct TraktClient {
    client: Client,
    access_token: Option<String>,
    client_id: String,
    client_secret: String,
    username: Option<String>,
    batch_size: usize,
    queue: SubmitQueue,
}

impl TraktClient {
    pub fn new(client_id: String, client_secret: String, batch_size: usize) -> Self {
        Self {
            client: auth::create_trakt_client(),
            access_token: None,
            client_id,
            client_secret,
            username: None,
            batch_size,
            queue: SubmitQueue::new(),
        }
    }

    pub fn from_config(config: &TraktConfig, batch_size: usize) -> Self {
        Self::new(config.client_id.clone(), config.client_secret.clone(), batch_size)
    }

    /// Reuse the stored access token while it is valid; otherwise refresh it
    /// or authorize again, saving the new tokens to `credentials`.
    pub async fn authenticate(&mut self, credentials: &mut CredentialStore) -> SourceResult<()> {
        if let Some(saved_token) = credentials.get_trakt_access_token().cloned() {
            let expiry = credentials.get_trakt_token_expires();
            let fresh = expiry.map_or(true, |expires_at| expires_at > Utc::now() + Duration::minutes(5));

            if fresh {
                match api::get_username(&self.client, &saved_token, &self.client_id).await {
                    Ok(username) => {
                        self.access_token = Some(saved_token);
                        self.username = Some(username);
                        match expiry {
                            Some(expires_at) => info!("Using saved Trakt access token (expires at {})", expires_at),
                            None => info!("Using saved Trakt access token (no expiration info)"),
                        }
                        return Ok(());
                    }
                    Err(e) => info!("Saved Trakt token appears invalid, attempting refresh: {}", e),
                }
            } else if let Some(expires_at) = expiry {
                info!("Trakt access token expired or expiring soon (expires at {}), refreshing", expires_at);
            }
        }

        let refresh_token = credentials.get_trakt_refresh_token().cloned();
        let token_info = auth::authenticate(
            &self.client,
            &self.client_id,
            &self.client_secret,
            refresh_token.as_deref(),
        )
        .await?;

        let username = api::get_username(&self.client, &token_info.access_token, &self.client_id).await?;
        self.access_token = Some(token_info.access_token.clone());
        self.username = Some(username);

        credentials.set_trakt_access_token(token_info.access_token);
        credentials.set_trakt_refresh_token(token_info.refresh_token);
        credentials.set_trakt_token_expires(token_info.expires_at);
        credentials.save()?;

        info!("Authenticated to Trakt");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.username.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn access_token(&self) -> SourceResult<&str> {
        self.access_token.as_deref().ok_or(SourceError::NotAuthenticated("trakt"))
    }
}

#[async_trait]
impl TrackingClient for TraktClient {
    async fn username(&self) -> SourceResult<String> {
        self.username.clone().ok_or(SourceError::NotAuthenticated("trakt"))
    }

    async fn watched_movies(&self) -> SourceResult<HashSet<u64>> {
        api::get_watched_movies(&self.client, self.access_token()?, &self.client_id).await
    }

    async fn watched_shows(&self) -> SourceResult<WatchedShows> {
        api::get_watched_shows(&self.client, self.access_token()?, &self.client_id).await
    }

    async fn movie_collection(&self) -> SourceResult<HashSet<u64>> {
        api::get_collected_movies(&self.client, self.access_token()?, &self.client_id).await
    }

    async fn ratings(&self) -> SourceResult<HashMap<TraktRef, Rating>> {
        api::get_ratings(&self.client, self.access_token()?, &self.client_id).await
    }

    async fn watchlist_movies(&self) -> SourceResult<Vec<u64>> {
        api::get_watchlist_movies(&self.client, self.access_token()?, &self.client_id).await
    }

    async fn liked_lists(&self) -> SourceResult<Vec<LikedList>> {
        api::get_liked_lists(&self.client, self.access_token()?, &self.client_id).await
    }

    async fn list_items(&self, list: &LikedList) -> SourceResult<Vec<TraktRef>> {
        api::get_list_items(&self.client, self.access_token()?, &self.client_id, list).await
    }

    async fn find_by_media(&self, item: &CatalogItem, provider_id: &ProviderId) -> SourceResult<Option<TrackedItem>> {
        let kind = if item.is_movie() { TraktKind::Movie } else { TraktKind::Show };
        let found = api::search_by_id(
            &self.client,
            self.access_token()?,
            &self.client_id,
            provider_id,
            kind,
        )
        .await?;
        debug!("Trakt search {} for {}: {:?}", provider_id, item, found.as_ref().map(|t| t.trakt_id));
        Ok(found)
    }

    async fn lookup(&self, show: &TrackedItem) -> SourceResult<EpisodeTable> {
        api::get_show_episodes(&self.client, self.access_token()?, &self.client_id, show.trakt_id).await
    }

    async fn collected(&self, show: &TrackedItem) -> SourceResult<ShowProgress> {
        api::get_collection_progress(&self.client, self.access_token()?, &self.client_id, show.trakt_id).await
    }

    fn rate(&self, item: &TrackedItem, rating: Rating) {
        self.queue.add_rating(item.reference(), rating.value(), Utc::now());
    }

    fn mark_watched(&self, item: &TrackedItem, watched_at: Option<DateTime<Utc>>) {
        self.queue.add_to_history(item.reference(), watched_at);
    }

    fn add_to_collection(&self, item: &TrackedItem, media: &CatalogItem) {
        self.queue.add_to_collection(item.reference(), media.added_at);
    }

    async fn flush(&self) -> SourceResult<FlushReport> {
        let access_token = self.access_token()?;
        let mut report = FlushReport::default();

        for batch in self.queue.drain(self.batch_size) {
            let endpoint = batch.kind.to_string();
            let outcome = match api::post_sync(&self.client, access_token, &self.client_id, &endpoint, &batch.payload).await {
                Ok(response) => {
                    let not_found = response.not_found.count();
                    if not_found > 0 {
                        warn!("Trakt: {} of {} {} items not found", not_found, batch.items, batch.kind);
                    }
                    debug!("Trakt: Submitted {} {} items", batch.items, batch.kind);
                    BatchOutcome { kind: batch.kind, items: batch.items, not_found, error: None }
                }
                Err(e) => {
                    error!("Trakt: Failed to submit {} {} items: {}", batch.items, batch.kind, e);
                    BatchOutcome { kind: batch.kind, items: batch.items, not_found: 0, error: Some(e.to_string()) }
                }
            };
            report.push(outcome);
        }

        if !report.batches.is_empty() {
            info!("Trakt: {}", report);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_requires_authentication() {
        let client = TraktClient::new("id".to_string(), "secret".to_string(), 10);
        assert!(!client.is_authenticated());
        assert!(matches!(client.username().await, Err(SourceError::NotAuthenticated("trakt"))));
        assert!(matches!(client.flush().await, Err(SourceError::NotAuthenticated("trakt"))));
    }

    #[test]
    fn test_writes_are_queued() {
        let client = TraktClient::new("id".to_string(), "secret".to_string(), 10);
        let item = TrackedItem {
            trakt_id: 5,
            kind: TraktKind::Movie,
            title: "Heat".to_string(),
            year: Some(1995),
            ids: Default::default(),
            episode: None,
        };
        client.mark_watched(&item, None);
        client.rate(&item, Rating::new(9).unwrap());
        assert_eq!(client.queued(), 2);
    }
}
