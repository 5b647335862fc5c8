use plexsync_models::GuidError;
use plexsync_sources::{FlushReport, SourceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Provider or id of a library item could not be determined
    #[error("metadata unavailable for {item}: {source}")]
    MetadataUnavailable {
        item: String,
        #[source]
        source: GuidError,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    /// Some queued Trakt writes were rejected; the report lists every batch
    #[error("failed to submit queued Trakt writes ({0})")]
    Submission(FlushReport),
}

pub type SyncResult<T> = Result<T, SyncError>;
