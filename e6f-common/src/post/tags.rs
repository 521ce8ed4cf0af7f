//! # Post Tags Module
//!
//! The site groups every tag of a post into one of a fixed set of categories.
//! [`PostTags`] keeps those groups together with a flattened set used for fast
//! membership checks.
//!
//! Posts rebuilt from a flat tag string (for instance the `data-tags` attribute of a
//! thumbnail) have no category information until it is looked up separately. Those are
//! marked as *unresolved* and per-category counts are not available for them.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Categorizes the type or nature of a tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TagCategory {
    /// Tags identifying the artist(s) of the work.
    Artist,
    /// Tags related to copyright, series, or franchise.
    Copyright,
    /// Tags identifying the species of characters.
    Species,
    /// Tags identifying specific characters depicted.
    Character,
    /// General descriptive tags about the content, scene, or attributes.
    General,
    /// Tags that were invalidated by the site but are still attached to the post.
    Invalid,
    /// Meta-tags related to the post itself (e.g., "hi_res", "animated").
    Meta,
    /// Tags related to lore or setting.
    Lore,
}

impl TagCategory {
    pub const ALL: [Self; 8] = [
        Self::Artist,
        Self::Copyright,
        Self::Species,
        Self::Character,
        Self::General,
        Self::Invalid,
        Self::Meta,
        Self::Lore,
    ];

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Copyright => "copyright",
            Self::Species => "species",
            Self::Character => "character",
            Self::General => "general",
            Self::Invalid => "invalid",
            Self::Meta => "meta",
            Self::Lore => "lore",
        }
    }
}

impl Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Every tag attached to a post, grouped by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostTags {
    categories: [Vec<String>; 8],
    all: AHashSet<String>,
    resolved: bool,
}

impl PostTags {
    /// Builds a resolved tag collection from categorised lists.
    pub fn from_categories<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (TagCategory, Vec<S>)>,
        S: Into<String>,
    {
        let mut tags = Self {
            resolved: true,
            ..Default::default()
        };

        for (category, list) in groups {
            for tag in list {
                tags.push(category, tag.into());
            }
        }

        tags
    }

    /// Builds an unresolved collection from a whitespace-separated tag string.
    ///
    /// All tags end up in the `General` group until their categories are known.
    pub fn from_flat(tag_string: &str) -> Self {
        let mut tags = Self::default();
        for tag in tag_string.split_whitespace() {
            tags.push(TagCategory::General, tag.to_lowercase());
        }
        tags
    }

    fn push(&mut self, category: TagCategory, tag: String) {
        if self.all.insert(tag.clone()) {
            self.categories[category.index()].push(tag);
        }
    }

    /// Flattened set of all tags, regardless of category.
    #[inline]
    pub const fn all(&self) -> &AHashSet<String> {
        &self.all
    }

    #[inline]
    pub fn contains(&self, tag: &str) -> bool {
        self.all.contains(tag)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Tags in a single category.
    #[inline]
    pub fn category(&self, category: TagCategory) -> &[String] {
        &self.categories[category.index()]
    }

    /// Number of tags in a category, or `None` while categories are unresolved.
    pub fn category_count(&self, category: TagCategory) -> Option<usize> {
        self.resolved.then(|| self.categories[category.index()].len())
    }

    /// Whether tag categories are known for this post.
    #[inline]
    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Space-joined tag string, in category order.
    pub fn joined(&self) -> String {
        self.categories
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<&str>>()
            .join(" ")
    }
}
