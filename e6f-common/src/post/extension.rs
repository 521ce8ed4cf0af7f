//! # Post Extension Module
//!
//! This module defines the [`Extension`] enum, the file type of the media attached to a
//! post. It is matched against `type:` filter clauses and tells videos apart from images.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PostError;

/// Represents the file extension of a post's original file.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Extension {
    /// The `JPG` variant also encompasses the other extensions a jpeg might have, including `.jpg`, `.jpeg` and `.jfif`
    JPG,
    /// The `PNG` variant can also include the rare `.apng` whenever it's present.
    PNG,
    WEBP,
    GIF,
    WEBM,
    MP4,
    /// Legacy flash uploads.
    SWF,
    /// Used for any file whose extension is unknown or not currently supported by this library.
    #[default]
    Unknown,
}

impl Extension {
    /// Attempts to determine the `Extension` from a string slice, defaulting to [`Extension::Unknown`].
    ///
    /// # Examples
    /// ```
    /// # use e6f_common::post::extension::Extension;
    /// assert_eq!(Extension::guess_format("jpeg"), Extension::JPG);
    /// assert_eq!(Extension::guess_format("WEBM"), Extension::WEBM);
    /// assert_eq!(Extension::guess_format("nonexistent"), Extension::Unknown);
    /// ```
    pub fn guess_format(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Self::Unknown)
    }

    /// Checks if the extension represents a video or animated format.
    pub const fn is_video(&self) -> bool {
        matches!(self, Self::WEBM | Self::MP4 | Self::SWF)
    }
}

impl FromStr for Extension {
    type Err = PostError;

    /// Case-insensitive parse of a file extension.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpg" | "jpeg" | "jfif" => Ok(Self::JPG),
            "png" | "apng" => Ok(Self::PNG),
            "webp" => Ok(Self::WEBP),
            "webm" => Ok(Self::WEBM),
            "mp4" => Ok(Self::MP4),
            "gif" => Ok(Self::GIF),
            "swf" => Ok(Self::SWF),
            _ => Err(PostError::UnknownExtension {
                message: s.to_string(),
            }),
        }
    }
}

impl Display for Extension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JPG => write!(f, "jpg"),
            Self::PNG => write!(f, "png"),
            Self::WEBP => write!(f, "webp"),
            Self::GIF => write!(f, "gif"),
            Self::WEBM => write!(f, "webm"),
            Self::MP4 => write!(f, "mp4"),
            Self::SWF => write!(f, "swf"),
            Self::Unknown => write!(f, "bin"),
        }
    }
}
