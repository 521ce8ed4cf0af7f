//! Main representation of a post
//!
//! # PostData
//! A [`PostData`] is an immutable snapshot of one post as the filter engine sees it.
//! It is rebuilt wholesale every time the post is fetched again or edited, never patched
//! field by field.
use serde::{Deserialize, Serialize};

use std::{cmp::Ordering, fmt::Debug};

use self::{extension::Extension, flags::PostFlags, rating::Rating, tags::PostTags};

pub mod error;
pub mod extension;
pub mod flags;
pub mod rating;
pub mod tags;

/// Metadata of the original file attached to a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileInfo {
    pub extension: Extension,
    pub width: u32,
    pub height: u32,
    /// File size in bytes.
    pub size: u64,
    /// Playback length in seconds, only present for videos.
    pub duration: Option<f64>,
}

impl FileInfo {
    /// Width over height, or `None` for files without a known height.
    #[inline]
    pub fn ratio(&self) -> Option<f64> {
        (self.height > 0).then(|| f64::from(self.width) / f64::from(self.height))
    }
}

/// Catchall model for every post attribute a blacklist line can refer to.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct PostData {
    /// ID number of the post given by the site
    pub id: u64,
    /// Rating of the post. Can be:
    ///
    /// * `Rating::Safe` for SFW posts
    /// * `Rating::Questionable` for a not necessarily SFW post
    /// * `Rating::Explicit` for NSFW posts
    /// * `Rating::Unknown` in case none of the above are correctly parsed
    pub rating: Rating,
    /// Total score (upvotes plus downvotes).
    pub score: i64,
    /// How many users have favorited the post.
    pub favorites: u64,
    /// Whether the current user has favorited the post.
    pub is_favorited: bool,
    pub tags: PostTags,
    pub flags: PostFlags,
    pub uploader: u64,
    /// Uploader name, when the source provides it.
    pub uploader_name: Option<String>,
    pub approver: Option<u64>,
    pub file: FileInfo,
    pub has_children: bool,
    pub has_parent: bool,
}

impl Debug for PostData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostData")
            .field("Post ID", &self.id)
            .field("Rating", &self.rating)
            .field("Score", &self.score)
            .field("Favorites", &self.favorites)
            .field("Flags", &self.flags)
            .field("Uploader", &self.uploader)
            .field("File", &self.file)
            .field("Tag List", &self.tags.joined())
            .finish()
    }
}

impl Ord for PostData {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl PartialOrd for PostData {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PostData {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PostData {}

/// Anything that identifies a single post.
///
/// Lets lookups accept either a full [`PostData`] or a bare post id.
pub trait PostIdent {
    fn post_id(&self) -> u64;
}

impl PostIdent for u64 {
    #[inline]
    fn post_id(&self) -> u64 {
        *self
    }
}

impl PostIdent for PostData {
    #[inline]
    fn post_id(&self) -> u64 {
        self.id
    }
}

impl<T: PostIdent + ?Sized> PostIdent for &T {
    #[inline]
    fn post_id(&self) -> u64 {
        (**self).post_id()
    }
}
