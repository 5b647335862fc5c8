pub mod guid;
pub mod list;
pub mod media;
pub mod media_ids;
pub mod progress;
pub mod rating;
pub mod tracked;

pub use guid::{GuidError, ParsedGuid, Provider, ProviderId};
pub use list::LikedList;
pub use media::{CatalogItem, EpisodeInfo, EpisodeNumber, MediaKind};
pub use media_ids::MediaIds;
pub use progress::{ShowProgress, WatchedShows};
pub use rating::Rating;
pub use tracked::{EpisodeTable, TrackedItem, TraktKind, TraktRef};
