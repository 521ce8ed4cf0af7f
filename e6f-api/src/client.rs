//! e621 API client
//!
//! [`E621Client`] turns high level calls (search, fetch by id, list favorites) into requests
//! pushed through its [`RequestQueue`], then maps the answers into [`PostData`].
use e6f_common::{
    join_tags,
    log::debug,
    post::PostData,
    reqwest::Url,
};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::{
    endpoint::Endpoint,
    error::ApiError,
    models::{E621Post, E621User, UserData},
    queue::{RequestQueue, DEFAULT_DELAY, MIN_DELAY},
    transport::{HttpRequest, ReqwestTransport, Transport},
};

pub const DEFAULT_BASE_URL: &str = "https://e621.net";

pub const DEFAULT_USER_AGENT: &str = concat!("e6filter/", env!("CARGO_PKG_VERSION"));

/// Largest page the site will return.
pub const MAX_LIMIT: u16 = 320;

/// Highest page number reachable through plain page numbers.
pub const MAX_PAGE: u16 = 750;

/// Ids packed into a single `id:` search.
const IDS_PER_QUERY: usize = 100;

/// `[api]` section of the config file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Pause between two requests, in milliseconds.
    pub delay_ms: u64,
    pub username: Option<String>,
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            user_agent: String::from(DEFAULT_USER_AGENT),
            delay_ms: DEFAULT_DELAY.as_millis() as u64,
            username: None,
            api_key: None,
        }
    }
}

impl ApiConfig {
    /// Configured request spacing, never below [`MIN_DELAY`].
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms).max(MIN_DELAY)
    }

    /// Username and API key, when both are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.api_key.as_deref()) {
            (Some(user), Some(key)) if !user.is_empty() && !key.is_empty() => Some((user, key)),
            _ => None,
        }
    }
}

pub struct E621Client<T: Transport = ReqwestTransport> {
    queue: RequestQueue<T>,
    config: ApiConfig,
}

impl E621Client<ReqwestTransport> {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        let transport = ReqwestTransport::new(&config.user_agent);
        Self::with_transport(transport, config)
    }
}

impl<T: Transport> E621Client<T> {
    #[must_use]
    pub fn with_transport(transport: T, config: ApiConfig) -> Self {
        Self {
            queue: RequestQueue::with_delay(transport, config.delay()),
            config,
        }
    }

    #[inline]
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[inline]
    pub const fn queue(&self) -> &RequestQueue<T> {
        &self.queue
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.config.credentials().is_some()
    }

    fn request(&self, url: &str, query: &[(&str, String)]) -> Result<HttpRequest, ApiError> {
        let parsed = if query.is_empty() {
            Url::parse(url)
        } else {
            Url::parse_with_params(url, query)
        }
        .map_err(|err| ApiError::InvalidUrl(format!("{url}: {err}")))?;

        let mut request = HttpRequest::get(parsed.as_str()).header("Accept", "application/json");
        if let Some((username, api_key)) = self.config.credentials() {
            request = request.basic_auth(username, api_key);
        }
        Ok(request)
    }

    async fn search(&self, tags: String, page: u16, limit: u16) -> Result<Vec<PostData>, ApiError> {
        let query = [
            ("limit", limit.clamp(1, MAX_LIMIT).to_string()),
            ("page", page.clamp(1, MAX_PAGE).to_string()),
            ("tags", tags),
        ];
        let url = Endpoint::Posts.url::<u64>(&self.config.base_url, None);
        let request = self.request(&url, &query)?;

        let response = self.queue.enqueue(request, Endpoint::Posts, None).await?;
        map_posts(response.payload)
    }

    /// One page of a tag search.
    pub async fn find_posts(
        &self,
        tags: &[String],
        page: u16,
        limit: u16,
    ) -> Result<Vec<PostData>, ApiError> {
        let posts = self.search(join_tags!(tags), page, limit).await?;
        debug!("Page {page} of \"{}\" returned {} posts", tags.join(" "), posts.len());
        Ok(posts)
    }

    pub async fn get_post(&self, id: u64) -> Result<PostData, ApiError> {
        let url = Endpoint::Post.url(&self.config.base_url, Some(id));
        let request = self.request(&url, &[])?;

        let response = self.queue.enqueue(request, Endpoint::Post, None).await?;
        let item: E621Post = serde_json::from_value(response.payload)?;
        Ok(PostData::try_from(item)?)
    }

    /// Fetches many posts by id, packing them into as few searches as possible.
    ///
    /// Ids the site doesn't return (deleted or hidden posts) are simply missing from the result.
    pub async fn get_posts(&self, ids: &[u64]) -> Result<Vec<PostData>, ApiError> {
        let searches = ids.chunks(IDS_PER_QUERY).map(|chunk| {
            let list: Vec<String> = chunk.iter().map(u64::to_string).collect();
            self.search(format!("id:{}", list.join(",")), 1, chunk.len() as u16)
        });

        let posts: Vec<PostData> = try_join_all(searches).await?.into_iter().flatten().collect();
        debug!("Fetched {} of {} requested posts", posts.len(), ids.len());
        Ok(posts)
    }

    /// Every post id in a user's favorites, walking pages until a short one.
    ///
    /// `None` lists the favorites of the authenticated account.
    pub async fn favorite_ids(&self, user_id: Option<u64>) -> Result<Vec<u64>, ApiError> {
        let url = Endpoint::Favorites.url::<u64>(&self.config.base_url, None);
        let mut ids = Vec::new();

        for page in 1..=MAX_PAGE {
            let mut query = vec![
                ("limit", MAX_LIMIT.to_string()),
                ("page", page.to_string()),
            ];
            if let Some(user) = user_id {
                query.push(("user_id", user.to_string()));
            }
            let request = self.request(&url, &query)?;

            let response = self.queue.enqueue(request, Endpoint::Favorites, None).await?;
            let posts = map_posts(response.payload)?;
            let fetched = posts.len();
            ids.extend(posts.into_iter().map(|post| post.id));

            if fetched < usize::from(MAX_LIMIT) {
                break;
            }
        }

        debug!("Found {} favorites", ids.len());
        Ok(ids)
    }

    /// Checks the configured credentials and reads the account's profile blacklist.
    ///
    /// Returns `None` without touching the network when no credentials are configured.
    pub async fn authenticate(&self) -> Result<Option<UserData>, ApiError> {
        let Some((username, _)) = self.config.credentials() else {
            return Ok(None);
        };

        let url = Endpoint::Users.url(&self.config.base_url, Some(username));
        let request = self.request(&url, &[])?;
        let response = self.queue.enqueue(request, Endpoint::Users, None).await?;

        let user: E621User = serde_json::from_value(response.payload)?;
        if user.success == Some(false) {
            return Err(ApiError::RequestFailed {
                status: response.status,
                message: String::from("Invalid username or API key"),
                endpoint: Endpoint::Users.name(),
            });
        }

        let data = UserData::try_from(user)?;
        debug!("Authenticated as {} (#{})", data.name, data.id);
        Ok(Some(data))
    }
}

/// Maps a post list, skipping entries without an id.
fn map_posts(payload: Value) -> Result<Vec<PostData>, ApiError> {
    let items: Vec<E621Post> = serde_json::from_value(payload)?;
    let mut posts = Vec::with_capacity(items.len());

    for item in items {
        match PostData::try_from(item) {
            Ok(post) => posts.push(post),
            Err(err) => debug!("Skipping post: {err}"),
        }
    }

    Ok(posts)
}

#[cfg(test)]
mod test {
    use super::{ApiConfig, E621Client};
    use crate::{
        error::{ApiError, TransportError},
        transport::{HttpRequest, HttpResponse, Transport},
    };
    use serde_json::{json, Value};
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    type Handler = dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync;

    #[derive(Clone)]
    struct FakeSite {
        handler: Arc<Handler>,
        seen: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl FakeSite {
        fn new(handler: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static) -> Self {
            Self {
                handler: Arc::new(handler),
                seen: Arc::default(),
            }
        }

        fn seen(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for FakeSite {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let response = (self.handler)(&request);
            self.seen.lock().unwrap().push(request);
            Ok(response)
        }
    }

    fn ok(body: Value) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    fn raw_post(id: u64) -> Value {
        json!({ "id": id, "rating": "s", "tags": { "general": ["solo"] } })
    }

    #[tokio::test(start_paused = true)]
    async fn search_encodes_query_and_auth() {
        let site = FakeSite::new(|_| ok(json!({ "posts": [raw_post(1), raw_post(2)] })));
        let config = ApiConfig {
            username: Some(String::from("someone")),
            api_key: Some(String::from("secret")),
            ..Default::default()
        };
        let client = E621Client::with_transport(site.clone(), config);
        assert!(client.is_authenticated());

        let posts = client
            .find_posts(&[String::from("rating:s"), String::from("solo")], 0, 1000)
            .await
            .unwrap();
        assert_eq!(posts.len(), 2);

        let seen = site.seen();
        assert!(seen[0].url.starts_with("https://e621.net/posts.json?"));
        assert!(seen[0].url.contains("limit=320"));
        assert!(seen[0].url.contains("page=1"));
        assert!(seen[0].url.contains("tags=rating%3As+solo"));
        assert_eq!(
            seen[0].basic_auth,
            Some((String::from("someone"), String::from("secret")))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn get_post_unwraps_single_node() {
        let site = FakeSite::new(|_| ok(json!({ "post": raw_post(42) })));
        let client = E621Client::with_transport(site.clone(), ApiConfig::default());

        let post = client.get_post(42).await.unwrap();
        assert_eq!(post.id, 42);
        assert_eq!(site.seen()[0].url, "https://e621.net/posts/42.json");
        assert!(site.seen()[0].basic_auth.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn get_posts_packs_ids() {
        let site = FakeSite::new(|request| {
            if request.url.contains("id%3A1%2C") {
                ok(json!({ "posts": (1..=100).map(raw_post).collect::<Vec<_>>() }))
            } else {
                ok(json!({ "posts": [raw_post(101)] }))
            }
        });
        let client = E621Client::with_transport(site.clone(), ApiConfig::default());

        let ids: Vec<u64> = (1..=101).collect();
        let posts = client.get_posts(&ids).await.unwrap();

        assert_eq!(posts.len(), 101);
        assert_eq!(site.seen().len(), 2);
        assert!(site.seen()[1].url.contains("limit=1"));
    }

    #[tokio::test(start_paused = true)]
    async fn favorites_walk_pages() {
        let site = FakeSite::new(|request| {
            if request.url.contains("page=1&") {
                ok(json!({ "posts": (1..=320).map(raw_post).collect::<Vec<_>>() }))
            } else {
                ok(json!({ "posts": [raw_post(321)] }))
            }
        });
        let client = E621Client::with_transport(site.clone(), ApiConfig::default());

        let ids = client.favorite_ids(Some(5)).await.unwrap();
        assert_eq!(ids.len(), 321);
        assert_eq!(site.seen().len(), 2);
        assert!(site.seen()[0].url.contains("user_id=5"));
    }

    #[tokio::test(start_paused = true)]
    async fn authenticate_reads_profile_blacklist() {
        let site = FakeSite::new(|_| {
            ok(json!({ "id": 5, "name": "someone", "blacklisted_tags": "gore\n// off\nscat" }))
        });
        let config = ApiConfig {
            username: Some(String::from("someone")),
            api_key: Some(String::from("secret")),
            ..Default::default()
        };
        let client = E621Client::with_transport(site.clone(), config);

        let user = client.authenticate().await.unwrap().unwrap();
        assert_eq!(user.id, 5);
        assert_eq!(user.blacklisted_tags, ["gore", "scat"]);
        assert_eq!(site.seen()[0].url, "https://e621.net/users/someone.json");

        let anonymous = E621Client::with_transport(site.clone(), ApiConfig::default());
        assert!(anonymous.authenticate().await.unwrap().is_none());
        assert_eq!(site.seen().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_are_propagated() {
        let site = FakeSite::new(|_| HttpResponse {
            status: 404,
            body: String::from(r#"{"success":false,"reason":"not found"}"#),
        });
        let client = E621Client::with_transport(site, ApiConfig::default());

        let err = client.get_post(1).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(matches!(err, ApiError::RequestFailed { .. }));
    }

    #[test]
    fn delay_is_floored() {
        let config = ApiConfig {
            delay_ms: 100,
            ..Default::default()
        };
        assert_eq!(config.delay(), Duration::from_millis(500));
        assert_eq!(ApiConfig::default().delay(), Duration::from_millis(1000));
    }
}
