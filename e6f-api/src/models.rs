//! e621 JSON shapes and their mapping into [`PostData`].
use e6f_common::post::{
    error::PostError,
    extension::Extension,
    flags::PostFlags,
    rating::Rating,
    tags::{PostTags, TagCategory},
    FileInfo, PostData,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct E621Post {
    pub id: Option<u64>,
    pub file: E621File,
    pub score: E621Score,
    pub tags: E621Tags,
    pub flags: E621Flags,
    pub rating: String,
    pub fav_count: u64,
    pub is_favorited: bool,
    pub uploader_id: u64,
    pub uploader_name: Option<String>,
    pub approver_id: Option<u64>,
    pub relationships: E621Relationships,
    pub duration: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct E621File {
    pub width: u32,
    pub height: u32,
    pub ext: Option<String>,
    pub size: u64,
    pub md5: Option<String>,
    pub url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct E621Score {
    pub up: i64,
    pub down: i64,
    pub total: i64,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct E621Tags {
    pub general: Vec<String>,
    pub species: Vec<String>,
    pub character: Vec<String>,
    pub copyright: Vec<String>,
    pub artist: Vec<String>,
    pub invalid: Vec<String>,
    pub lore: Vec<String>,
    pub meta: Vec<String>,
}

impl E621Tags {
    pub fn map_tags(self) -> PostTags {
        PostTags::from_categories([
            (TagCategory::Artist, self.artist),
            (TagCategory::Copyright, self.copyright),
            (TagCategory::Species, self.species),
            (TagCategory::Character, self.character),
            (TagCategory::General, self.general),
            (TagCategory::Invalid, self.invalid),
            (TagCategory::Meta, self.meta),
            (TagCategory::Lore, self.lore),
        ])
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct E621Flags {
    pub pending: bool,
    pub flagged: bool,
    pub note_locked: bool,
    pub status_locked: bool,
    pub rating_locked: bool,
    pub deleted: bool,
}

impl E621Flags {
    pub fn map_flags(&self) -> PostFlags {
        let mut flags = PostFlags::empty();
        flags.set(PostFlags::PENDING, self.pending);
        flags.set(PostFlags::FLAGGED, self.flagged);
        flags.set(PostFlags::DELETED, self.deleted);
        flags.set(PostFlags::NOTE_LOCKED, self.note_locked);
        flags.set(PostFlags::STATUS_LOCKED, self.status_locked);
        flags.set(PostFlags::RATING_LOCKED, self.rating_locked);
        flags
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct E621Relationships {
    pub parent_id: Option<u64>,
    pub has_children: bool,
    pub has_active_children: bool,
    pub children: Vec<u64>,
}

impl TryFrom<E621Post> for PostData {
    type Error = PostError;

    fn try_from(item: E621Post) -> Result<Self, Self::Error> {
        let id = item.id.ok_or_else(|| PostError::MissingField {
            field: String::from("id"),
        })?;

        let flags = item.flags.map_flags();
        let extension = Extension::guess_format(item.file.ext.as_deref().unwrap_or_default());

        Ok(Self {
            id,
            rating: Rating::from_rating_str(&item.rating),
            score: item.score.total,
            favorites: item.fav_count,
            is_favorited: item.is_favorited,
            tags: item.tags.map_tags(),
            flags,
            uploader: item.uploader_id,
            uploader_name: item.uploader_name,
            approver: item.approver_id,
            file: FileInfo {
                extension,
                width: item.file.width,
                height: item.file.height,
                size: item.file.size,
                duration: item.duration,
            },
            has_children: item.relationships.has_children,
            has_parent: item.relationships.parent_id.is_some(),
        })
    }
}

/// Profile returned by `/users/<name>.json`.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct E621User {
    pub success: Option<bool>,
    pub id: Option<u64>,
    pub name: Option<String>,
    pub blacklisted_tags: Option<String>,
}

/// The logged-in account and the blacklist saved in its profile.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub id: u64,
    pub name: String,
    pub blacklisted_tags: Vec<String>,
}

impl TryFrom<E621User> for UserData {
    type Error = PostError;

    fn try_from(user: E621User) -> Result<Self, Self::Error> {
        let id = user.id.ok_or_else(|| PostError::MissingField {
            field: String::from("id"),
        })?;

        // Profile blacklists allow `//` comment lines.
        let blacklisted_tags = user
            .blacklisted_tags
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("//"))
            .map(String::from)
            .collect();

        Ok(Self {
            id,
            name: user.name.unwrap_or_default(),
            blacklisted_tags,
        })
    }
}
