/// Builds a `reqwest::Client` carrying the given user-agent.
///
/// Falls back to a default client if the builder rejects the configuration.
#[macro_export]
macro_rules! client {
    ($ua:expr) => {{
        $crate::reqwest::Client::builder()
            .user_agent($ua)
            .build()
            .unwrap_or_default()
    }};
}

/// Joins search tags the way the site expects them inside a `tags=` query.
#[macro_export]
macro_rules! join_tags {
    ($x:expr) => {{
        let tl = $x.join(" ");
        tl
    }};
}

/// Splits a filter or search line into unique, whitespace-separated tokens, keeping the first occurrence order.
#[macro_export]
macro_rules! unique_tokens {
    ($x:expr) => {{
        let mut seen = $crate::ahash::AHashSet::new();
        $x.split_whitespace()
            .filter(|t| seen.insert(*t))
            .map(String::from)
            .collect::<Vec<String>>()
    }};
}
