use serde::Serialize;
use std::fmt;

/// Counters for one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Movies, shows and episodes read from the library
    pub examined: usize,
    /// Pairs handed to the reconciler
    pub reconciled: usize,
    /// Items with a local or `none` agent
    pub skipped_unsupported: usize,
    pub skipped_unrecognized: usize,
    pub skipped_unavailable: usize,
    pub not_found: usize,
    /// Items dropped because a Trakt or Plex lookup failed
    pub lookup_failures: usize,
    /// Writes appended to the Trakt queue
    pub remote_writes: usize,
    /// Writes applied to Plex
    pub local_writes: usize,
    pub local_failures: usize,
}

impl SyncStats {
    pub fn skipped(&self) -> usize {
        self.skipped_unsupported + self.skipped_unrecognized + self.skipped_unavailable + self.not_found + self.lookup_failures
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Examined: {} | Reconciled: {} | Skipped: {} | Trakt writes: {} | Plex writes: {} | Plex failures: {}",
            self.examined,
            self.reconciled,
            self.skipped(),
            self.remote_writes,
            self.local_writes,
            self.local_failures
        )
    }
}
