use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;

use crate::{FailureKind, FetchError, PostContent};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            user_agent: concat!("post_watcher/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait PostFetcher: Send + Sync {
    async fn fetch_post(&self, post_url: &str) -> Result<PostContent, FetchError>;
}

/// JSON listing address for a post: the post URL without its trailing slash,
/// followed by `/.json`.
pub fn post_json_url(post_url: &str) -> String {
    format!("{}/.json", post_url.trim_end_matches('/'))
}

/// Reads `[0].data.children[0].data` out of a post listing.
///
/// A `null` body counts as empty text; a missing body is a parse failure.
pub fn parse_post_listing(bytes: &[u8]) -> Result<PostContent, FetchError> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|err| FetchError::new(FailureKind::Parse, err.to_string()))?;
    let post = root
        .pointer("/0/data/children/0/data")
        .ok_or_else(|| FetchError::new(FailureKind::Parse, "no post in listing"))?;

    let selftext = match post.get("selftext") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) => String::new(),
        Some(_) => {
            return Err(FetchError::new(
                FailureKind::Parse,
                "selftext is not a string",
            ))
        }
        None => return Err(FetchError::new(FailureKind::Parse, "post has no selftext")),
    };
    let title = post
        .get("title")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    Ok(PostContent { selftext, title })
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(
                self.settings.redirect_limit,
            ))
            .user_agent(self.settings.user_agent.as_str())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    fn too_large(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl PostFetcher for ReqwestFetcher {
    async fn fetch_post(&self, post_url: &str) -> Result<PostContent, FetchError> {
        let parsed = reqwest::Url::parse(&post_json_url(post_url))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = self.build_client()?;

        let response = client.get(parsed).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        parse_post_listing(&bytes)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
