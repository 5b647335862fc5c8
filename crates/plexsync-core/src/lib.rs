pub mod error;
pub mod lists;
pub mod matcher;
pub mod progress;
pub mod reconcile;
pub mod resolver;
pub mod snapshot;
pub mod stats;
pub mod sync;
pub mod timing;

#[cfg(test)]
mod fakes;

pub use error::{SyncError, SyncResult};
pub use lists::{ListAccumulator, WATCHLIST_NAME};
pub use matcher::{Matcher, ShowContext};
pub use progress::{NoProgress, SyncProgress};
pub use reconcile::FieldReconciler;
pub use resolver::{resolve, Resolution};
pub use snapshot::BaselineSnapshot;
pub use stats::SyncStats;
pub use sync::{SyncOutcome, SyncRequest, Synchronizer};
