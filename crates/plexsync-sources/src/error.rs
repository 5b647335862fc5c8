use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("not authenticated to {0}")]
    NotAuthenticated(&'static str),

    #[error("{service} request failed: {status} - {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SourceError {
    pub fn other(message: impl Into<String>) -> Self {
        SourceError::Other(anyhow::anyhow!(message.into()))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_)) || matches!(self, SourceError::Api { status: 404, .. })
    }

    /// Transport and authentication failures; anything else concerns a single item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SourceError::Http(_) | SourceError::NotAuthenticated(_) | SourceError::Api { status: 401 | 403, .. }
        )
    }
}

pub type SourceResult<T> = Result<T, SourceError>;
