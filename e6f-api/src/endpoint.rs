//! Static table of the e621 endpoints the client talks to.
use std::fmt::Display;

/// One remote API endpoint.
///
/// Each endpoint carries a fixed path template and, for endpoints wrapping their payload in an
/// envelope object, the name of the node holding the actual data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Posts,
    Post,
    Favorites,
    Pools,
    PostSets,
    Tags,
    Users,
}

impl Endpoint {
    pub const ALL: [Self; 7] = [
        Self::Posts,
        Self::Post,
        Self::Favorites,
        Self::Pools,
        Self::PostSets,
        Self::Tags,
        Self::Users,
    ];

    /// Logical name reported alongside every response.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Post => "post",
            Self::Favorites => "favorites",
            Self::Pools => "pools",
            Self::PostSets => "post_sets",
            Self::Tags => "tags",
            Self::Users => "users",
        }
    }

    /// Path relative to the site root. `{}` is replaced by the resource id.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Posts => "/posts.json",
            Self::Post => "/posts/{}.json",
            Self::Favorites => "/favorites.json",
            Self::Pools => "/pools.json",
            Self::PostSets => "/post_sets.json",
            Self::Tags => "/tags.json",
            Self::Users => "/users/{}.json",
        }
    }

    /// JSON node unwrapped from the response body before it is handed to the caller.
    #[must_use]
    pub const fn node(self) -> Option<&'static str> {
        match self {
            Self::Posts | Self::Favorites => Some("posts"),
            Self::Post => Some("post"),
            Self::Pools | Self::PostSets | Self::Tags | Self::Users => None,
        }
    }

    /// Full url of the endpoint below `base_url`, filling the id slot if there is one.
    #[must_use]
    pub fn url<I: Display>(self, base_url: &str, id: Option<I>) -> String {
        let base = base_url.trim_end_matches('/');
        let path = match id {
            Some(id) => self.path().replace("{}", &id.to_string()),
            None => self.path().to_string(),
        };
        format!("{base}{path}")
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use super::Endpoint;

    #[test]
    fn urls_fill_ids() {
        assert_eq!(
            Endpoint::Post.url("https://e621.net/", Some(42)),
            "https://e621.net/posts/42.json"
        );
        assert_eq!(
            Endpoint::Posts.url::<u64>("https://e621.net", None),
            "https://e621.net/posts.json"
        );
        assert_eq!(
            Endpoint::Users.url("https://e621.net", Some("someone")),
            "https://e621.net/users/someone.json"
        );
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = Endpoint::ALL.iter().map(|e| e.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Endpoint::ALL.len());
    }
}
