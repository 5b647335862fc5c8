use serde::{Deserialize, Serialize};

/// A Trakt list the user has liked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikedList {
    pub trakt_id: u64,
    pub name: String,
    /// Owner of the list, used to build the list items URL
    pub username: String,
}
