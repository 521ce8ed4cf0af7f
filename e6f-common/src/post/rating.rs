//! General enum for rating posts
//! # Post Rating
//! The site classifies every post by how explicit it is, using a single letter on the wire:
//! * `s`: Posts that don't involve anything suggestive.
//! * `q`: Posts that involve nude/seminude characters or other suggestive art.
//! * `e`: Posts that are explicitly pornographic or have other sensitive content such as gore, etc.
//!

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub enum Rating {
    /// Represents posts that are don't involve anything suggestive or sensitive.
    Safe,
    /// Represents posts that have some degree of nudity or sexually suggestive elements.
    Questionable,
    /// Represents posts that have explicit elements of pornography, gore, death, etc.
    Explicit,
    /// Represents a failure to parse the `rating` tag into one of the above.
    #[default]
    Unknown,
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Questionable => write!(f, "Questionable"),
            Self::Explicit => write!(f, "Explicit"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

impl Rating {
    /// Guess the variant according to the rating string present in the post or in a filter.
    pub fn from_rating_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "s" | "safe" => Self::Safe,
            "q" | "questionable" => Self::Questionable,
            "e" | "explicit" => Self::Explicit,
            _ => Self::Unknown,
        }
    }

    /// The single-letter form used by the site's API.
    pub const fn short(&self) -> &'static str {
        match self {
            Self::Safe => "s",
            Self::Questionable => "q",
            Self::Explicit => "e",
            Self::Unknown => "",
        }
    }
}

#[cfg(test)]
mod test {
    use super::Rating;

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(Rating::from_rating_str("e"), Rating::Explicit);
        assert_eq!(Rating::from_rating_str("Questionable"), Rating::Questionable);
        assert_eq!(Rating::from_rating_str(" s "), Rating::Safe);
        assert_eq!(Rating::from_rating_str("g"), Rating::Unknown);
    }
}
