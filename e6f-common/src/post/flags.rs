//! Moderation state of a post.
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Status flags raised on a post by the site's moderation queue.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PostFlags: u8 {
        const PENDING = 0b0000_0001;
        const FLAGGED = 0b0000_0010;
        const DELETED = 0b0000_0100;
        const RATING_LOCKED = 0b0000_1000;
        const NOTE_LOCKED = 0b0001_0000;
        const STATUS_LOCKED = 0b0010_0000;
    }
}

impl PostFlags {
    /// Flags that take a post out of the `active` state.
    pub const MODERATION: Self = Self::PENDING.union(Self::FLAGGED).union(Self::DELETED);

    /// Tests a status name as written in a `status:` clause.
    ///
    /// Returns `None` for names that don't describe a status.
    pub fn has_status(&self, status: &str) -> Option<bool> {
        let flag = match status {
            "pending" => Self::PENDING,
            "flagged" => Self::FLAGGED,
            "deleted" => Self::DELETED,
            "active" => return Some(!self.intersects(Self::MODERATION)),
            "ratinglocked" | "rating_locked" => Self::RATING_LOCKED,
            "notelocked" | "note_locked" => Self::NOTE_LOCKED,
            "statuslocked" | "status_locked" => Self::STATUS_LOCKED,
            _ => return None,
        };
        Some(self.contains(flag))
    }
}
