//! HTTP seam under the request queue.
//!
//! The queue only ever sees [`HttpRequest`] and [`HttpResponse`]. [`ReqwestTransport`] is the
//! real implementation; tests plug in their own [`Transport`] to script responses.
use e6f_common::{client, log::debug, reqwest};
use std::future::Future;

use crate::error::TransportError;

/// Transport-agnostic description of a `GET` request, the only kind the API client sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub basic_auth: Option<(String, String)>,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn basic_auth(mut self, username: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), api_key.into()));
        self
    }
}

/// Raw answer of the server. Any status code is a valid response at this level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Something able to perform one HTTP round-trip.
pub trait Transport: Send + Sync + 'static {
    /// Sends the request and returns whatever the server answered.
    ///
    /// Only failures that prevent getting an answer at all are errors.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: client!(user_agent),
        }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|err| TransportError::InvalidRequest(format!("{}: {err}", request.url)))?;

        let mut builder = self.client.get(url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some((username, api_key)) = &request.basic_auth {
            builder = builder.basic_auth(username, Some(api_key));
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("{} answered {status} ({} bytes)", request.url, body.len());

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod test {
    use super::{HttpRequest, ReqwestTransport, Transport};
    use crate::error::TransportError;

    #[test]
    fn builds_authenticated_get() {
        let request = HttpRequest::get("https://e621.net/posts.json")
            .header("Accept", "application/json")
            .basic_auth("someone", "key");

        assert_eq!(request.url, "https://e621.net/posts.json");
        assert_eq!(
            request.headers,
            [(String::from("Accept"), String::from("application/json"))]
        );
        assert_eq!(
            request.basic_auth,
            Some((String::from("someone"), String::from("key")))
        );
    }

    #[tokio::test]
    async fn rejects_malformed_url_before_sending() {
        let transport = ReqwestTransport::new("e6filter-test");

        match transport.send(HttpRequest::get("not a url")).await {
            Err(TransportError::InvalidRequest(message)) => assert!(message.contains("not a url")),
            other => panic!("expected an invalid request, got {other:?}"),
        }
    }
}
