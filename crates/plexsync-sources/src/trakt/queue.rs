use chrono::{DateTime, SecondsFormat, Utc};
use plexsync_models::{TraktKind, TraktRef};
use serde_json::{json, Map, Value};
use std::sync::{Mutex, MutexGuard};

use crate::submit::SubmitKind;

#[derive(Debug, Clone, PartialEq)]
struct Pending {
    kind: TraktKind,
    body: Value,
}

#[derive(Debug, Default)]
struct Buckets {
    collection: Vec<Pending>,
    history: Vec<Pending>,
    ratings: Vec<Pending>,
}

impl Buckets {
    fn bucket(&mut self, kind: SubmitKind) -> &mut Vec<Pending> {
        match kind {
            SubmitKind::Collection => &mut self.collection,
            SubmitKind::History => &mut self.history,
            SubmitKind::Ratings => &mut self.ratings,
        }
    }
}

/// One chunk ready to POST to `/sync/<kind>`
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub kind: SubmitKind,
    pub items: usize,
    pub payload: Value,
}

/// Outbound writes held until the end of the run.
///
/// Appends take `&self` so the queue can live behind the read-only
/// `TrackingClient` methods.
#[derive(Debug, Default)]
pub struct SubmitQueue {
    buckets: Mutex<Buckets>,
}

impl SubmitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_to_collection(&self, item: TraktRef, collected_at: Option<DateTime<Utc>>) {
        let mut body = ids_body(item);
        if let Some(at) = collected_at {
            body.insert("collected_at".to_string(), Value::String(timestamp(at)));
        }
        self.push(SubmitKind::Collection, item.kind, body);
    }

    pub fn add_to_history(&self, item: TraktRef, watched_at: Option<DateTime<Utc>>) {
        let mut body = ids_body(item);
        if let Some(at) = watched_at {
            body.insert("watched_at".to_string(), Value::String(timestamp(at)));
        }
        self.push(SubmitKind::History, item.kind, body);
    }

    pub fn add_rating(&self, item: TraktRef, rating: u8, rated_at: DateTime<Utc>) {
        let mut body = ids_body(item);
        body.insert("rating".to_string(), json!(rating));
        body.insert("rated_at".to_string(), Value::String(timestamp(rated_at)));
        self.push(SubmitKind::Ratings, item.kind, body);
    }

    fn push(&self, submit: SubmitKind, kind: TraktKind, body: Map<String, Value>) {
        self.lock().bucket(submit).push(Pending { kind, body: Value::Object(body) });
    }

    pub fn len(&self) -> usize {
        let buckets = self.lock();
        buckets.collection.len() + buckets.history.len() + buckets.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty the queue into chunks of at most `batch_size` items each
    /// (0 is treated as 1), in collection, history, ratings order.
    pub fn drain(&self, batch_size: usize) -> Vec<Batch> {
        let batch_size = batch_size.max(1);
        let mut buckets = self.lock();
        let mut batches = Vec::new();

        for kind in [SubmitKind::Collection, SubmitKind::History, SubmitKind::Ratings] {
            let pending = std::mem::take(buckets.bucket(kind));
            for chunk in pending.chunks(batch_size) {
                batches.push(Batch { kind, items: chunk.len(), payload: payload(chunk) });
            }
        }
        batches
    }
}

fn ids_body(item: TraktRef) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("ids".to_string(), json!({ "trakt": item.id }));
    body
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn payload(chunk: &[Pending]) -> Value {
    let mut movies = Vec::new();
    let mut shows = Vec::new();
    let mut episodes = Vec::new();
    for pending in chunk {
        let target = match pending.kind {
            TraktKind::Movie => &mut movies,
            TraktKind::Show => &mut shows,
            TraktKind::Episode => &mut episodes,
        };
        target.push(pending.body.clone());
    }

    let mut body = Map::new();
    for (key, values) in [("movies", movies), ("shows", shows), ("episodes", episodes)] {
        if !values.is_empty() {
            body.insert(key.to_string(), Value::Array(values));
        }
    }
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_drain_chunks_by_batch_size() {
        let queue = SubmitQueue::new();
        for id in 1..=5 {
            queue.add_to_history(TraktRef::episode(id), None);
        }
        queue.add_to_collection(TraktRef::movie(9), None);
        assert_eq!(queue.len(), 6);

        let batches = queue.drain(2);
        assert!(queue.is_empty());

        let kinds: Vec<_> = batches.iter().map(|b| (b.kind, b.items)).collect();
        assert_eq!(
            kinds,
            vec![
                (SubmitKind::Collection, 1),
                (SubmitKind::History, 2),
                (SubmitKind::History, 2),
                (SubmitKind::History, 1),
            ]
        );
    }

    #[test]
    fn test_zero_batch_size_means_one() {
        let queue = SubmitQueue::new();
        queue.add_to_history(TraktRef::movie(1), None);
        queue.add_to_history(TraktRef::movie(2), None);
        assert_eq!(queue.drain(0).len(), 2);
    }

    #[test]
    fn test_payload_groups_by_kind() {
        let queue = SubmitQueue::new();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        queue.add_rating(TraktRef::movie(10), 8, at);
        queue.add_rating(TraktRef::episode(20), 6, at);

        let batches = queue.drain(100);
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].payload,
            json!({
                "movies": [{"ids": {"trakt": 10}, "rating": 8, "rated_at": "2024-03-01T12:00:00.000Z"}],
                "episodes": [{"ids": {"trakt": 20}, "rating": 6, "rated_at": "2024-03-01T12:00:00.000Z"}]
            })
        );
    }

    #[test]
    fn test_history_carries_watched_at() {
        let queue = SubmitQueue::new();
        let at = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        queue.add_to_history(TraktRef::movie(3), Some(at));

        let batches = queue.drain(10);
        assert_eq!(batches[0].payload["movies"][0]["watched_at"], "2020-01-02T03:04:05.000Z");
    }
}
