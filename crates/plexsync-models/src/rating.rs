use serde::{Deserialize, Serialize};
use std::fmt;

/// A user rating on the shared 1-10 integer scale.
///
/// Trakt stores 1-10 integers; Plex stores `userRating` as a 0-10 float where 0
/// means unrated. "No rating" is always `Option::<Rating>::None`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Option<Self> {
        (1..=10).contains(&value).then_some(Self(value))
    }

    /// Convert a Plex `userRating` (rounded to the nearest integer)
    pub fn from_plex(user_rating: f64) -> Option<Self> {
        if !user_rating.is_finite() {
            return None;
        }
        let rounded = user_rating.round();
        if rounded < 1.0 {
            return None;
        }
        Self::new(rounded.min(10.0) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn as_plex(self) -> f64 {
        f64::from(self.0)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
