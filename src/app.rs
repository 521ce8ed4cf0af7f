//! Session service object
//!
//! [`App`] owns everything one session needs: the blacklist registry, the favorites cache,
//! the settings store they persist to and the API client feeding them posts. It also keeps every
//! post it has seen, indexed by id, so blacklist edits can be applied to them right away.
use std::{path::Path, time::Instant};

use ahash::AHashMap;
use e6f_api::{models::E621Post, E621Client, ReqwestTransport, Transport, UserData};
use e6f_common::{post::PostData, settings::SettingsStore};
use e6f_filter::{
    config::BlacklistConfig,
    favorites::FavoriteCache,
    filter::{FilterBuiltins, MatchState},
    registry::FilterRegistry,
};
use futures::{future::try_join_all, TryFutureExt};
use log::{debug, warn};
use serde_json::Value;

use crate::{config::AppConfig, error::AppError, progress_bars::FetchProgress};

/// Filtering outcome for one post.
#[derive(Debug, Clone)]
pub struct PostReport {
    pub post: PostData,
    pub state: MatchState,
    /// Lines matching the post, enabled or not.
    pub filters: Vec<String>,
}

/// One blacklist line as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSummary {
    pub text: String,
    pub enabled: bool,
    pub matches: usize,
}

pub struct App<S: SettingsStore, T: Transport = ReqwestTransport> {
    registry: FilterRegistry,
    favorites: FavoriteCache,
    store: S,
    client: E621Client<T>,
    config: BlacklistConfig,
    builtins: FilterBuiltins,
    user: Option<UserData>,
    posts: AHashMap<u64, PostData>,
}

impl<S: SettingsStore, T: Transport> App<S, T> {
    /// Starts an offline session. Own uploads can't be excluded since the account is unknown.
    pub fn new(config: &AppConfig, store: S, client: E621Client<T>) -> Result<Self, AppError> {
        Self::with_user(config, store, client, None)
    }

    /// Starts a session, logging in first if credentials are configured.
    ///
    /// A failed login is logged and the session continues anonymously.
    pub async fn connect(
        config: &AppConfig,
        store: S,
        client: E621Client<T>,
    ) -> Result<Self, AppError> {
        let user = match client.authenticate().await {
            Ok(user) => user,
            Err(err) => {
                warn!("Login failed, continuing without an account: {err}");
                None
            }
        };
        Self::with_user(config, store, client, user)
    }

    fn with_user(
        config: &AppConfig,
        mut store: S,
        client: E621Client<T>,
        user: Option<UserData>,
    ) -> Result<Self, AppError> {
        let blacklist = config.blacklist.clone();
        let builtins = blacklist.builtins(user.as_ref().map(|u| u.id));

        let mut registry = FilterRegistry::new();
        if !registry.restore(&store, &builtins)? {
            debug!("No saved blacklist, seeding it from the config file");
            registry.load(&blacklist.filters, blacklist.enabled, &builtins);
            if let Some(user) = &user {
                registry.load(&user.blacklisted_tags, blacklist.enabled, &builtins);
            }
            registry.save(&mut store)?;
        }

        let favorites = FavoriteCache::load(&store)?;

        Ok(Self {
            registry,
            favorites,
            store,
            client,
            config: blacklist,
            builtins,
            user,
            posts: AHashMap::new(),
        })
    }

    #[inline]
    pub const fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    #[inline]
    pub const fn favorites(&self) -> &FavoriteCache {
        &self.favorites
    }

    #[inline]
    pub const fn user(&self) -> Option<&UserData> {
        self.user.as_ref()
    }

    #[inline]
    pub const fn client(&self) -> &E621Client<T> {
        &self.client
    }

    #[inline]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Pushes new or updated posts through the blacklist and remembers them.
    pub fn ingest(&mut self, mut posts: Vec<PostData>) -> Vec<PostReport> {
        self.favorites.mark(&mut posts);
        self.registry.add_post(&posts);

        posts
            .into_iter()
            .map(|post| {
                let report = self.report(&post);
                self.posts.insert(post.id, post);
                report
            })
            .collect()
    }

    /// Current filtering outcome for a post.
    pub fn report(&self, post: &PostData) -> PostReport {
        let mut filters: Vec<String> = self
            .registry
            .filters()
            .filter(|f| f.matched_ids().contains(&post.id))
            .map(|f| f.text().to_string())
            .collect();
        filters.sort_unstable();

        PostReport {
            post: post.clone(),
            state: self.registry.check_post_alt(post),
            filters,
        }
    }

    /// Every post seen this session, ordered by id.
    pub fn known_posts(&self) -> Vec<&PostData> {
        let mut posts: Vec<&PostData> = self.posts.values().collect();
        posts.sort_unstable();
        posts
    }

    /// Runs a tag search over `pages` consecutive pages.
    ///
    /// All pages are requested at once, the queue spaces them out.
    pub async fn search(
        &mut self,
        tags: &[String],
        start_page: u16,
        pages: u16,
        limit: u16,
        progress: Option<&FetchProgress>,
    ) -> Result<Vec<PostReport>, AppError> {
        let start = Instant::now();
        let client = &self.client;

        let requests = (start_page..start_page.saturating_add(pages)).map(|page| {
            client.find_posts(tags, page, limit).inspect_ok(move |posts| {
                if let Some(bar) = progress {
                    bar.page_done(posts.len() as u64);
                }
            })
        });
        let posts: Vec<PostData> = try_join_all(requests).await?.into_iter().flatten().collect();

        debug!("Search fetched {} posts in {:?}", posts.len(), start.elapsed());
        Ok(self.ingest(posts))
    }

    /// Fetches posts by id.
    pub async fn fetch_ids(&mut self, ids: &[u64]) -> Result<Vec<PostReport>, AppError> {
        if ids.is_empty() {
            return Err(AppError::NoPostsInInput);
        }
        let posts = self.client.get_posts(ids).await?;
        Ok(self.ingest(posts))
    }

    /// Evaluates a saved API response offline.
    ///
    /// Accepts a post list, a single post, or either wrapped in a `posts`/`post` node.
    pub async fn check_file(&mut self, path: &Path) -> Result<Vec<PostReport>, AppError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let invalid = |source| AppError::InvalidDump {
            path: path.display().to_string(),
            source,
        };

        let value: Value = serde_json::from_str(&raw).map_err(invalid)?;
        let value = match value {
            Value::Object(mut map) if map.contains_key("posts") => map.remove("posts"),
            Value::Object(mut map) if map.contains_key("post") => map.remove("post"),
            other => Some(other),
        }
        .unwrap_or(Value::Null);

        let items: Vec<E621Post> = match value {
            Value::Array(_) => serde_json::from_value(value).map_err(invalid)?,
            single => vec![serde_json::from_value(single).map_err(invalid)?],
        };

        let posts: Vec<PostData> = items
            .into_iter()
            .filter_map(|item| match PostData::try_from(item) {
                Ok(post) => Some(post),
                Err(err) => {
                    debug!("Skipping post: {err}");
                    None
                }
            })
            .collect();

        if posts.is_empty() {
            return Err(AppError::NoPostsInInput);
        }
        Ok(self.ingest(posts))
    }

    /// Every line with its state and current match count, sorted by text.
    pub fn lines(&self) -> Vec<LineSummary> {
        let mut lines: Vec<LineSummary> = self
            .registry
            .filters()
            .map(|f| LineSummary {
                text: f.text().to_string(),
                enabled: f.is_enabled(),
                matches: f.match_count(),
            })
            .collect();
        lines.sort_unstable_by(|a, b| a.text.cmp(&b.text));
        lines
    }

    /// Adds a line and applies it to every known post. Returns `false` if it already existed.
    pub fn add_line(&mut self, text: &str) -> Result<bool, AppError> {
        if !self
            .registry
            .create_filter(text, self.config.enabled, &self.builtins)
        {
            return Ok(false);
        }

        if let Some(filter) = self.registry.get_mut(text) {
            for post in self.posts.values() {
                filter.update(post, false);
            }
        }

        self.registry.save(&mut self.store)?;
        Ok(true)
    }

    pub fn remove_line(&mut self, text: &str) -> Result<bool, AppError> {
        let removed = self.registry.delete_filter(text);
        if removed {
            self.registry.save(&mut self.store)?;
        }
        Ok(removed)
    }

    /// Returns the new state of the line, or `None` if it doesn't exist.
    pub fn toggle_line(&mut self, text: &str) -> Result<Option<bool>, AppError> {
        let state = self.registry.toggle_filter(text);
        if state.is_some() {
            self.registry.save(&mut self.store)?;
        }
        Ok(state)
    }

    pub fn enable_all(&mut self) -> Result<(), AppError> {
        self.registry.enable_all();
        Ok(self.registry.save(&mut self.store)?)
    }

    pub fn disable_all(&mut self) -> Result<(), AppError> {
        self.registry.disable_all();
        Ok(self.registry.save(&mut self.store)?)
    }

    /// Replaces the favorites cache with the account's real favorites and re-evaluates
    /// every known post against it.
    pub async fn sync_favorites(&mut self) -> Result<usize, AppError> {
        let user_id = self.user.as_ref().ok_or(AppError::NotAuthenticated)?.id;

        let ids = self.client.favorite_ids(Some(user_id)).await?;
        self.favorites.replace_all(ids);
        self.favorites.save(&mut self.store)?;

        self.reindex();
        Ok(self.favorites.len())
    }

    /// Re-runs every line against every known post.
    pub fn reindex(&mut self) {
        let mut posts: Vec<PostData> = self.posts.drain().map(|(_, post)| post).collect();
        for post in &mut posts {
            post.is_favorited = self.favorites.has(post.id);
        }
        self.registry.reindex(&posts);
        self.posts = posts.into_iter().map(|post| (post.id, post)).collect();
    }
}

#[cfg(test)]
mod test {
    use super::App;
    use crate::config::AppConfig;
    use e6f_api::{
        ApiConfig, E621Client, HttpRequest, HttpResponse, Transport, TransportError,
    };
    use e6f_common::{
        post::{
            tags::{PostTags, TagCategory},
            PostData,
        },
        settings::{MemoryStore, SettingsStore},
    };
    use e6f_filter::filter::MatchState;
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[derive(Clone)]
    struct StaticSite {
        body: Arc<Value>,
    }

    impl Transport for StaticSite {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse {
                status: 200,
                body: self.body.to_string(),
            })
        }
    }

    fn client(body: Value) -> E621Client<StaticSite> {
        E621Client::with_transport(
            StaticSite {
                body: Arc::new(body),
            },
            ApiConfig::default(),
        )
    }

    fn config(lines: &[&str]) -> AppConfig {
        let mut config = AppConfig::default();
        config.blacklist.filters = lines.iter().map(|l| l.to_string()).collect();
        config
    }

    fn post(id: u64, tags: &[&str]) -> PostData {
        PostData {
            id,
            tags: PostTags::from_categories([(TagCategory::General, tags.to_vec())]),
            ..Default::default()
        }
    }

    #[test]
    fn config_seeds_only_the_first_session() {
        let app = App::new(&config(&["gore"]), MemoryStore::new(), client(json!([]))).unwrap();
        assert_eq!(app.lines().len(), 1);
        assert!(app.store().get("blacklist").is_some());

        let store = app.store().clone();
        let resumed = App::new(&config(&["solo", "duo"]), store, client(json!([]))).unwrap();
        let texts: Vec<String> = resumed.lines().into_iter().map(|l| l.text).collect();
        assert_eq!(texts, ["gore"]);
    }

    #[test]
    fn ingest_reports_visibility() {
        let mut app =
            App::new(&config(&["solo", "canine"]), MemoryStore::new(), client(json!([]))).unwrap();
        app.toggle_line("canine").unwrap();

        let reports = app.ingest(vec![
            post(1, &["solo"]),
            post(2, &["canine"]),
            post(3, &["feline"]),
        ]);

        assert_eq!(reports[0].state, MatchState::Enabled);
        assert_eq!(reports[0].filters, ["solo"]);
        assert_eq!(reports[1].state, MatchState::Disabled);
        assert_eq!(reports[2].state, MatchState::NoMatch);
        assert!(reports[2].filters.is_empty());
    }

    #[test]
    fn new_lines_apply_to_known_posts() {
        let mut app = App::new(&config(&[]), MemoryStore::new(), client(json!([]))).unwrap();
        app.ingest(vec![post(1, &["solo"]), post(2, &["duo"])]);

        assert!(app.add_line("solo").unwrap());
        assert!(!app.add_line("SOLO").unwrap());
        assert_eq!(app.lines()[0].matches, 1);

        assert!(app.remove_line("solo").unwrap());
        assert!(app.lines().is_empty());
        assert_eq!(app.store().get("blacklist"), Some(json!([])));
    }

    #[test]
    fn favorites_are_excluded() {
        let mut config = config(&["solo"]);
        config.blacklist.exclude_favorites = true;

        let mut store = MemoryStore::new();
        store.set("favorites", json!([1])).unwrap();
        let mut app = App::new(&config, store, client(json!([]))).unwrap();

        let reports = app.ingest(vec![post(1, &["solo"]), post(2, &["solo"])]);
        assert!(reports[0].post.is_favorited);
        assert_eq!(reports[0].state, MatchState::NoMatch);
        assert_eq!(reports[1].state, MatchState::Enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn search_runs_through_the_queue() {
        let body = json!({ "posts": [
            { "id": 10, "rating": "e", "tags": { "general": ["solo"] } },
            { "id": 11, "rating": "s", "tags": { "general": ["duo"] } }
        ] });
        let mut app = App::new(&config(&["rating:e"]), MemoryStore::new(), client(body)).unwrap();

        let reports = app
            .search(&[String::from("canine")], 1, 2, 2, None)
            .await
            .unwrap();

        // Both pages answer with the same two posts.
        assert_eq!(reports.len(), 4);
        assert_eq!(app.known_posts().len(), 2);
        assert_eq!(reports[0].state, MatchState::Enabled);
        assert_eq!(reports[1].state, MatchState::NoMatch);
    }

    #[tokio::test]
    async fn check_file_accepts_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");
        std::fs::write(
            &path,
            json!({ "posts": [
                { "id": 1, "score": { "total": 60 }, "tags": { "general": ["duo", "canine"] } },
                { "id": 2, "score": { "total": 60 }, "tags": { "general": ["solo", "canine"] } },
                { "rating": "s" }
            ] })
            .to_string(),
        )
        .unwrap();

        let mut app =
            App::new(&config(&["-solo score:>50"]), MemoryStore::new(), client(json!([]))).unwrap();
        let reports = app.check_file(&path).await.unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].state, MatchState::Enabled);
        assert_eq!(reports[1].state, MatchState::NoMatch);

        std::fs::write(&path, "not json").unwrap();
        assert!(app.check_file(&path).await.is_err());
    }

    #[tokio::test]
    async fn favorites_sync_needs_an_account() {
        let mut app = App::new(&config(&[]), MemoryStore::new(), client(json!([]))).unwrap();
        assert!(app.sync_favorites().await.is_err());
    }
}
