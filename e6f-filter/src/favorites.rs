//! Locally known favorites of the current user.
//!
//! Posts fetched without authentication don't carry `is_favorited`, so the cache fills it
//! in before they reach the blacklist. When the local set drifts from the remote one it is
//! replaced wholesale with [`replace_all`](FavoriteCache::replace_all).
use ahash::AHashSet;
use e6f_common::{
    log::debug,
    post::{PostData, PostIdent},
    settings::SettingsStore,
};

use crate::error::BlacklistError;

/// Settings key holding the favorite ids.
pub const FAVORITES_KEY: &str = "favorites";

#[derive(Debug, Clone, Default)]
pub struct FavoriteCache {
    ids: AHashSet<u64>,
}

impl FavoriteCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the cache from the store, starting empty if nothing was saved.
    pub fn load<S: SettingsStore + ?Sized>(store: &S) -> Result<Self, BlacklistError> {
        let Some(value) = store.get(FAVORITES_KEY) else {
            return Ok(Self::default());
        };

        let ids: Vec<u64> =
            serde_json::from_value(value).map_err(|source| BlacklistError::StoredStateDecode {
                key: FAVORITES_KEY.to_string(),
                source,
            })?;
        debug!("Loaded {} cached favorites", ids.len());

        Ok(Self {
            ids: ids.into_iter().collect(),
        })
    }

    pub fn save<S: SettingsStore + ?Sized>(&self, store: &mut S) -> Result<(), BlacklistError> {
        let mut ids: Vec<u64> = self.ids.iter().copied().collect();
        ids.sort_unstable();

        let value =
            serde_json::to_value(ids).map_err(|source| BlacklistError::StoredStateEncode {
                key: FAVORITES_KEY.to_string(),
                source,
            })?;
        store.set(FAVORITES_KEY, value)?;
        Ok(())
    }

    /// Returns `false` if the post was already cached.
    #[inline]
    pub fn add<P: PostIdent>(&mut self, post: P) -> bool {
        self.ids.insert(post.post_id())
    }

    /// Returns `false` if the post wasn't cached.
    #[inline]
    pub fn remove<P: PostIdent>(&mut self, post: P) -> bool {
        self.ids.remove(&post.post_id())
    }

    #[inline]
    pub fn has<P: PostIdent>(&self, post: P) -> bool {
        self.ids.contains(&post.post_id())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Swaps the whole cache for an authoritative list.
    pub fn replace_all<I: IntoIterator<Item = u64>>(&mut self, ids: I) {
        let before = self.ids.len();
        self.ids = ids.into_iter().collect();
        debug!(
            "Favorite cache resynced: {} -> {} posts",
            before,
            self.ids.len()
        );
    }

    /// Sets `is_favorited` on every post the cache knows about.
    ///
    /// Posts already flagged by the site are left untouched.
    pub fn mark(&self, posts: &mut [PostData]) {
        posts
            .iter_mut()
            .filter(|post| self.ids.contains(&post.id))
            .for_each(|post| post.is_favorited = true);
    }
}
