pub mod error;
pub mod plex;
pub mod submit;
pub mod traits;
pub mod trakt;

pub use error::{SourceError, SourceResult};
pub use plex::{verify_plex_token, PlexClient};
pub use submit::{BatchOutcome, FlushReport, SubmitKind};
pub use traits::{LibraryClient, LibrarySection, SectionKind, ServerInfo, TrackingClient};
pub use trakt::TraktClient;
