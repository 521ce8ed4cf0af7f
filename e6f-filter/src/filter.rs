//! Compiled blacklist line
//!
//! A [`FilterSet`] is built once from one line of the blacklist and keeps the ids of the
//! posts it currently matches. The cache is updated incrementally as posts arrive or
//! change, so answering "is this post hidden" is a set lookup.
//!
//! A post matches when every required clause matches and, if the line has any `~`
//! clauses, at least one of them matches too.
use ahash::AHashSet;
use e6f_common::{
    post::{PostData, PostIdent},
    unique_tokens,
};
use serde::{Deserialize, Serialize};

use crate::expression::{FilterExpression, FilterField};

/// Clauses added to every line by the blacklist itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterBuiltins {
    /// Never hide posts the current user has favorited.
    pub exclude_favorites: bool,
    /// Never hide posts uploaded by this user id.
    pub exclude_uploads: Option<u64>,
    /// Never hide posts carrying any of these tags.
    pub whitelist: Vec<String>,
}

impl FilterBuiltins {
    fn expressions(&self) -> Vec<FilterExpression> {
        let mut list = Vec::with_capacity(self.whitelist.len() + 2);
        if self.exclude_favorites {
            list.push(FilterExpression::excluding(FilterField::Favorited, "true"));
        }
        if let Some(user) = self.exclude_uploads {
            list.push(FilterExpression::excluding(
                FilterField::Uploader,
                &user.to_string(),
            ));
        }
        list.extend(
            self.whitelist
                .iter()
                .map(|tag| FilterExpression::excluding(FilterField::Tag, &tag.to_lowercase())),
        );
        list
    }
}

/// Tri-state answer of a match lookup.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchState {
    /// No filter matches the post.
    NoMatch = 0,
    /// A matching filter is enabled, the post should be hidden.
    Enabled = 1,
    /// Only disabled filters match the post.
    Disabled = 2,
}

impl MatchState {
    #[inline]
    pub const fn is_match(self) -> bool {
        !matches!(self, Self::NoMatch)
    }
}

/// One compiled blacklist line and the posts it currently matches.
#[derive(Debug, Clone)]
pub struct FilterSet {
    text: String,
    expressions: Vec<FilterExpression>,
    optional: usize,
    enabled: bool,
    matches: AHashSet<u64>,
}

impl FilterSet {
    /// Compiles `text` with builtin clauses placed ahead of the user's tokens.
    pub fn new(text: &str, enabled: bool, builtins: &FilterBuiltins) -> Self {
        let text = text.trim().to_lowercase();

        let mut expressions = builtins.expressions();
        expressions.extend(
            unique_tokens!(text)
                .iter()
                .map(|token| FilterExpression::parse(token)),
        );

        let optional = expressions.iter().filter(|e| e.is_optional()).count();

        Self {
            text,
            expressions,
            optional,
            enabled,
            matches: AHashSet::new(),
        }
    }

    /// The normalized source line.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn expressions(&self) -> &[FilterExpression] {
        &self.expressions
    }

    /// Number of `~` clauses.
    #[inline]
    pub const fn optional_count(&self) -> usize {
        self.optional
    }

    #[inline]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Flips the enabled state, returning the new one.
    #[inline]
    pub fn toggle_enabled(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Evaluates the line against a post without touching the cache.
    pub fn evaluate(&self, post: &PostData) -> bool {
        let mut optional_hits = 0;

        for expression in &self.expressions {
            let hit = expression.matches(post);
            if expression.is_optional() {
                if hit {
                    optional_hits += 1;
                }
            } else if !hit {
                return false;
            }
        }

        self.optional == 0 || optional_hits > 0
    }

    /// Re-evaluates a post and records the result in the match cache.
    ///
    /// A post that no longer matches is only evicted when `should_decrement` is set.
    /// Posts seen for the first time can skip eviction, they were never in the cache.
    pub fn update(&mut self, post: &PostData, should_decrement: bool) -> bool {
        let result = self.evaluate(post);

        if result {
            self.matches.insert(post.id);
        } else if should_decrement {
            self.matches.remove(&post.id);
        }

        result
    }

    /// Updates every post in the batch. Returns true only if all of them matched.
    pub fn update_many(&mut self, posts: &[PostData], should_decrement: bool) -> bool {
        posts
            .iter()
            .fold(true, |all, post| self.update(post, should_decrement) && all)
    }

    /// Whether the post is cached as matching and the filter is enabled.
    #[inline]
    pub fn matches<P: PostIdent>(&self, post: P) -> bool {
        self.matches_id(post.post_id(), false)
    }

    /// Cache lookup, ignoring the enabled state if `ignore_disabled` is set.
    #[inline]
    pub fn matches_id(&self, id: u64, ignore_disabled: bool) -> bool {
        (self.enabled || ignore_disabled) && self.matches.contains(&id)
    }

    /// Tells a suppressed match apart from no match at all.
    pub fn matches_id_alt(&self, id: u64) -> MatchState {
        match (self.matches.contains(&id), self.enabled) {
            (false, _) => MatchState::NoMatch,
            (true, true) => MatchState::Enabled,
            (true, false) => MatchState::Disabled,
        }
    }

    /// Number of posts currently cached as matching.
    #[inline]
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Ids of the posts currently cached as matching.
    #[inline]
    pub const fn matched_ids(&self) -> &AHashSet<u64> {
        &self.matches
    }

    /// Empties the match cache.
    #[inline]
    pub fn clear(&mut self) {
        self.matches.clear();
    }
}

#[cfg(test)]
mod test {
    use super::{FilterBuiltins, FilterSet, MatchState};
    use e6f_common::post::{
        tags::{PostTags, TagCategory},
        PostData,
    };

    fn post(id: u64, tags: &[&str], score: i64) -> PostData {
        PostData {
            id,
            score,
            tags: PostTags::from_categories([(TagCategory::General, tags.to_vec())]),
            ..Default::default()
        }
    }

    #[test]
    fn source_is_normalized_and_tokens_deduplicated() {
        let filter = FilterSet::new("  Solo  solo CANINE ", true, &FilterBuiltins::default());
        assert_eq!(filter.text(), "solo  solo canine");
        assert_eq!(filter.expressions().len(), 2);
    }

    #[test]
    fn and_semantics_ignore_clause_order() {
        let lines = [
            "canine score:>10 -solo",
            "-solo canine score:>10",
            "score:>10 -solo canine",
        ];
        let posts = [
            post(1, &["canine"], 20),
            post(2, &["canine", "solo"], 20),
            post(3, &["canine"], 5),
            post(4, &["feline"], 20),
        ];

        for p in &posts {
            let expected = p.tags.contains("canine") && p.score > 10 && !p.tags.contains("solo");
            for line in lines {
                let filter = FilterSet::new(line, true, &FilterBuiltins::default());
                assert_eq!(filter.evaluate(p), expected, "{line} on #{}", p.id);
            }
        }
    }

    #[test]
    fn optional_clauses_need_one_hit() {
        let mut filter = FilterSet::new("required ~opta ~optb", true, &FilterBuiltins::default());
        assert_eq!(filter.optional_count(), 2);

        assert!(filter.update(&post(1, &["required", "opta"], 0), true));
        assert!(filter.update(&post(2, &["required", "optb"], 0), true));
        assert!(!filter.update(&post(3, &["required"], 0), true));
        assert!(!filter.update(&post(4, &["opta", "optb"], 0), true));

        assert!(filter.matches(1_u64));
        assert!(filter.matches(2_u64));
        assert!(!filter.matches(3_u64));
        assert!(!filter.matches(4_u64));
    }

    #[test]
    fn decrement_asymmetry() {
        let mut filter = FilterSet::new("solo", true, &FilterBuiltins::default());
        filter.update(&post(5, &["solo"], 0), true);
        assert!(filter.matches(5_u64));

        let edited = post(5, &["duo"], 0);
        assert!(!filter.update(&edited, false));
        assert!(filter.matches(5_u64));

        assert!(!filter.update(&edited, true));
        assert!(!filter.matches(5_u64));
    }

    #[test]
    fn update_many_reports_all_matched() {
        let mut filter = FilterSet::new("solo", true, &FilterBuiltins::default());

        assert!(filter.update_many(&[post(1, &["solo"], 0), post(2, &["solo"], 0)], true));
        assert!(!filter.update_many(&[post(3, &["solo"], 0), post(4, &["duo"], 0)], true));

        // Every post is still evaluated after the first miss.
        assert!(filter.matches(3_u64));
        assert_eq!(filter.match_count(), 3);
    }

    #[test]
    fn enabled_state_gates_lookups() {
        let mut filter = FilterSet::new("solo", true, &FilterBuiltins::default());
        filter.update(&post(1, &["solo"], 0), true);

        assert_eq!(filter.matches_id_alt(1), MatchState::Enabled);
        assert_eq!(filter.matches_id_alt(2), MatchState::NoMatch);

        assert!(!filter.toggle_enabled());
        assert!(!filter.matches(1_u64));
        assert!(filter.matches_id(1, true));
        assert_eq!(filter.matches_id_alt(1), MatchState::Disabled);

        filter.set_enabled(true);
        assert!(filter.matches(1_u64));
    }

    #[test]
    fn builtins_exclude_favorites_uploads_and_whitelist() {
        let builtins = FilterBuiltins {
            exclude_favorites: true,
            exclude_uploads: Some(99),
            whitelist: vec![String::from("Safe_Tag")],
        };
        let filter = FilterSet::new("canine", true, &builtins);
        assert_eq!(filter.expressions().len(), 4);
        assert!(filter.expressions()[..3].iter().all(|e| e.is_inverted()));

        let plain = post(1, &["canine"], 0);
        assert!(filter.evaluate(&plain));

        let favorited = PostData {
            is_favorited: true,
            ..plain.clone()
        };
        assert!(!filter.evaluate(&favorited));

        let own = PostData {
            uploader: 99,
            ..plain.clone()
        };
        assert!(!filter.evaluate(&own));

        assert!(!filter.evaluate(&post(2, &["canine", "safe_tag"], 0)));
    }
}
