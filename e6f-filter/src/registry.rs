//! Blacklist-wide post filter
//!
//! # The Blacklist
//! The blacklist is a list of lines, each compiled into one [`FilterSet`]. A post is
//! hidden while any enabled line matches it.
//!
//! [`FilterRegistry`] owns those lines. Every post that is created, fetched or edited goes
//! through [`add_post`](FilterRegistry::add_post) once, after which visibility questions are
//! answered from each line's match cache without evaluating anything.
//!
//! ## Persistence
//! The lines and their enabled state are saved to a [`SettingsStore`] under the
//! `blacklist` key:
//! ```json
//! { "blacklist": [ { "text": "gore", "enabled": true }, { "text": "-solo score:>50", "enabled": false } ] }
//! ```
use ahash::AHashMap;
use e6f_common::{
    log::debug,
    post::{PostData, PostIdent},
    settings::SettingsStore,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::{
    error::BlacklistError,
    filter::{FilterBuiltins, FilterSet, MatchState},
};

/// Settings key holding the blacklist lines.
pub const BLACKLIST_KEY: &str = "blacklist";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct StoredFilter {
    text: String,
    enabled: bool,
}

/// All blacklist lines of a session, keyed by their normalized text.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: AHashMap<String, FilterSet>,
}

impl FilterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter for every non-blank line that isn't registered yet.
    pub fn load<I, S>(&mut self, lines: I, enabled: bool, builtins: &FilterBuiltins)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.filters.len();
        for line in lines {
            self.create_filter(line.as_ref(), enabled, builtins);
        }
        debug!(
            "Blacklist loaded {} new filters ({} total)",
            self.filters.len() - before,
            self.filters.len()
        );
    }

    /// Registers one line. Returns `false` if it was blank or already present.
    pub fn create_filter(&mut self, text: &str, enabled: bool, builtins: &FilterBuiltins) -> bool {
        let key = normalize(text);
        if key.is_empty() || self.filters.contains_key(&key) {
            return false;
        }

        let filter = FilterSet::new(&key, enabled, builtins);
        self.filters.insert(key, filter);
        true
    }

    /// Removes one line. Returns `false` if it wasn't registered.
    pub fn delete_filter(&mut self, text: &str) -> bool {
        self.filters.remove(&normalize(text)).is_some()
    }

    #[inline]
    pub fn get(&self, text: &str) -> Option<&FilterSet> {
        self.filters.get(&normalize(text))
    }

    #[inline]
    pub fn get_mut(&mut self, text: &str) -> Option<&mut FilterSet> {
        self.filters.get_mut(&normalize(text))
    }

    /// Flips one line on or off, returning its new state.
    pub fn toggle_filter(&mut self, text: &str) -> Option<bool> {
        self.get_mut(text).map(FilterSet::toggle_enabled)
    }

    pub fn enable_all(&mut self) {
        self.filters.values_mut().for_each(|f| f.set_enabled(true));
    }

    pub fn disable_all(&mut self) {
        self.filters.values_mut().for_each(|f| f.set_enabled(false));
    }

    /// Pushes posts through every filter.
    ///
    /// Returns the number of filters that matched at least one post of the batch, zero for an
    /// empty batch.
    pub fn add_post(&mut self, posts: &[PostData]) -> usize {
        if posts.is_empty() {
            return 0;
        }
        let start = Instant::now();

        let count = self
            .filters
            .values_mut()
            .map(|filter| {
                posts
                    .iter()
                    .fold(false, |any, post| filter.update(post, true) || any)
            })
            .filter(|&hit| hit)
            .count();

        debug!(
            "Filtering {} posts through {} filters took {:?}",
            posts.len(),
            self.filters.len(),
            start.elapsed()
        );
        count
    }

    /// Whether any filter currently matches the post.
    pub fn check_post<P: PostIdent>(&self, post: P, ignore_disabled: bool) -> bool {
        let id = post.post_id();
        self.filters
            .values()
            .any(|filter| filter.matches_id(id, ignore_disabled))
    }

    /// Aggregated tri-state: any enabled match wins over disabled ones.
    pub fn check_post_alt<P: PostIdent>(&self, post: P) -> MatchState {
        let id = post.post_id();
        let mut state = MatchState::NoMatch;

        for filter in self.filters.values() {
            match filter.matches_id_alt(id) {
                MatchState::Enabled => return MatchState::Enabled,
                MatchState::Disabled => state = MatchState::Disabled,
                MatchState::NoMatch => {}
            }
        }

        state
    }

    /// Filters currently matching at least one post.
    pub fn active_filters(&self) -> impl Iterator<Item = &FilterSet> {
        self.filters.values().filter(|f| f.match_count() > 0)
    }

    pub fn filters(&self) -> impl Iterator<Item = &FilterSet> {
        self.filters.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Empties every filter's match cache, keeping the filters themselves.
    pub fn clear(&mut self) {
        self.filters.values_mut().for_each(FilterSet::clear);
    }

    /// Rebuilds every match cache from scratch.
    pub fn reindex(&mut self, posts: &[PostData]) -> usize {
        self.clear();
        self.add_post(posts)
    }

    /// Writes every line and its enabled state to the store.
    pub fn save<S: SettingsStore + ?Sized>(&self, store: &mut S) -> Result<(), BlacklistError> {
        let mut stored: Vec<StoredFilter> = self
            .filters
            .values()
            .map(|f| StoredFilter {
                text: f.text().to_string(),
                enabled: f.is_enabled(),
            })
            .collect();
        stored.sort_by(|a, b| a.text.cmp(&b.text));

        let value =
            serde_json::to_value(&stored).map_err(|source| BlacklistError::StoredStateEncode {
                key: BLACKLIST_KEY.to_string(),
                source,
            })?;
        store.set(BLACKLIST_KEY, value)?;
        Ok(())
    }

    /// Loads previously saved lines. Returns `false` if the store holds none.
    pub fn restore<S: SettingsStore + ?Sized>(
        &mut self,
        store: &S,
        builtins: &FilterBuiltins,
    ) -> Result<bool, BlacklistError> {
        let Some(value) = store.get(BLACKLIST_KEY) else {
            return Ok(false);
        };

        let stored: Vec<StoredFilter> =
            serde_json::from_value(value).map_err(|source| BlacklistError::StoredStateDecode {
                key: BLACKLIST_KEY.to_string(),
                source,
            })?;

        for entry in &stored {
            self.create_filter(&entry.text, entry.enabled, builtins);
        }
        debug!("Restored {} blacklist lines", stored.len());

        Ok(true)
    }
}

#[inline]
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod test {
    use super::FilterRegistry;
    use crate::filter::{FilterBuiltins, MatchState};
    use e6f_common::{
        post::{
            rating::Rating,
            tags::{PostTags, TagCategory},
            FileInfo, PostData,
        },
        settings::{MemoryStore, SettingsStore},
    };
    use serde_json::json;

    fn post(id: u64, tags: &[&str]) -> PostData {
        PostData {
            id,
            tags: PostTags::from_categories([(TagCategory::General, tags.to_vec())]),
            ..Default::default()
        }
    }

    #[test]
    fn create_is_idempotent() {
        let mut registry = FilterRegistry::new();
        let builtins = FilterBuiltins::default();

        assert!(registry.create_filter("gore", true, &builtins));
        assert!(!registry.create_filter("gore", true, &builtins));
        assert!(!registry.create_filter("  GORE ", false, &builtins));
        assert!(!registry.create_filter("   ", true, &builtins));
        assert_eq!(registry.len(), 1);

        assert!(registry.delete_filter("gore"));
        assert!(!registry.delete_filter("gore"));
        assert!(registry.is_empty());
    }

    #[test]
    fn load_skips_blank_and_duplicate_lines() {
        let mut registry = FilterRegistry::new();
        registry.load(["gore", "", "solo", "gore"], true, &FilterBuiltins::default());
        registry.load(vec![String::from("solo")], true, &FilterBuiltins::default());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn add_post_counts_matching_filters() {
        let mut registry = FilterRegistry::new();
        registry.load(["solo", "canine", "feline"], true, &FilterBuiltins::default());

        assert_eq!(registry.add_post(&[post(1, &["solo", "canine"])]), 2);
        assert_eq!(registry.add_post(&[post(2, &["duo"])]), 0);

        assert!(registry.check_post(1_u64, false));
        assert!(!registry.check_post(&post(2, &[]), false));
        assert_eq!(registry.add_post(&[]), 0);

        let active: Vec<&str> = {
            let mut names: Vec<&str> = registry.active_filters().map(|f| f.text()).collect();
            names.sort_unstable();
            names
        };
        assert_eq!(active, ["canine", "solo"]);
    }

    #[test]
    fn mixed_batch_counts_partial_matches() {
        let mut registry = FilterRegistry::new();
        registry.load(["solo", "gore"], true, &FilterBuiltins::default());

        let hits = registry.add_post(&[post(1, &["solo"]), post(2, &["duo"])]);

        assert_eq!(hits, 1);
        assert!(registry.check_post(1_u64, false));
        assert!(!registry.check_post(2_u64, false));
        assert_eq!(registry.get("solo").unwrap().match_count(), 1);
    }

    #[test]
    fn edits_evict_stale_matches() {
        let mut registry = FilterRegistry::new();
        registry.load(["solo"], true, &FilterBuiltins::default());

        registry.add_post(&[post(1, &["solo"])]);
        assert!(registry.check_post(1_u64, false));

        registry.add_post(&[post(1, &["duo"])]);
        assert!(!registry.check_post(1_u64, false));
    }

    #[test]
    fn tri_state_prefers_enabled_matches() {
        let mut registry = FilterRegistry::new();
        registry.load(["solo", "canine"], true, &FilterBuiltins::default());
        registry.add_post(&[post(1, &["solo", "canine"]), post(2, &["solo"])]);

        assert_eq!(registry.check_post_alt(1_u64), MatchState::Enabled);

        registry.toggle_filter("solo");
        assert_eq!(registry.check_post_alt(1_u64), MatchState::Enabled);
        assert_eq!(registry.check_post_alt(2_u64), MatchState::Disabled);
        assert_eq!(registry.check_post_alt(3_u64), MatchState::NoMatch);

        assert!(!registry.check_post(2_u64, false));
        assert!(registry.check_post(2_u64, true));

        registry.disable_all();
        assert_eq!(registry.check_post_alt(1_u64), MatchState::Disabled);
        registry.enable_all();
        assert_eq!(registry.check_post_alt(2_u64), MatchState::Enabled);
    }

    #[test]
    fn reindex_rebuilds_caches() {
        let mut registry = FilterRegistry::new();
        registry.load(["solo"], true, &FilterBuiltins::default());
        registry.add_post(&[post(1, &["solo"])]);

        registry.reindex(&[post(2, &["solo"])]);
        assert!(!registry.check_post(1_u64, false));
        assert!(registry.check_post(2_u64, false));

        registry.clear();
        assert_eq!(registry.active_filters().count(), 0);
    }

    #[test]
    fn save_and_restore() {
        let mut store = MemoryStore::new();
        let mut registry = FilterRegistry::new();
        registry.load(["solo", "gore"], true, &FilterBuiltins::default());
        registry.toggle_filter("gore");
        registry.save(&mut store).unwrap();

        assert_eq!(
            store.get("blacklist"),
            Some(json!([
                { "text": "gore", "enabled": false },
                { "text": "solo", "enabled": true },
            ]))
        );

        let mut restored = FilterRegistry::new();
        assert!(restored.restore(&store, &FilterBuiltins::default()).unwrap());
        assert_eq!(restored.len(), 2);
        assert!(!restored.get("gore").unwrap().is_enabled());
        assert!(restored.get("solo").unwrap().is_enabled());

        let empty = MemoryStore::new();
        assert!(!FilterRegistry::new()
            .restore(&empty, &FilterBuiltins::default())
            .unwrap());
    }

    #[test]
    fn inverted_tag_with_score_threshold() {
        let mut registry = FilterRegistry::new();
        registry.load(["-solo score:>50"], true, &FilterBuiltins::default());

        let solo = PostData {
            score: 60,
            ..post(1, &["solo", "canine"])
        };
        let duo = PostData {
            score: 60,
            ..post(2, &["duo", "canine"])
        };

        assert_eq!(registry.add_post(&[solo]), 0);
        assert_eq!(registry.add_post(&[duo]), 1);
        assert!(!registry.check_post(1_u64, false));
        assert!(registry.check_post(2_u64, false));
    }

    #[test]
    fn rating_with_file_size() {
        let mut registry = FilterRegistry::new();
        registry.load(["rating:e filesize:>5mb"], true, &FilterBuiltins::default());

        let explicit = PostData {
            id: 1,
            rating: Rating::Explicit,
            file: FileInfo {
                size: 6 * 1024 * 1024,
                ..Default::default()
            },
            ..Default::default()
        };
        let safe = PostData {
            id: 2,
            rating: Rating::Safe,
            ..explicit.clone()
        };

        registry.add_post(&[explicit]);
        registry.add_post(&[safe]);
        assert!(registry.check_post(1_u64, false));
        assert!(!registry.check_post(2_u64, false));
    }

    #[test]
    fn corrupted_state_is_an_error() {
        let mut store = MemoryStore::new();
        store.set("blacklist", json!("not a list")).unwrap();

        assert!(FilterRegistry::new()
            .restore(&store, &FilterBuiltins::default())
            .is_err());
    }
}
