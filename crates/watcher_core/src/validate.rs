use url::Url;

/// Listing prefix every monitored post must start with unless overridden.
pub const DEFAULT_POST_PREFIX: &str = "https://www.reddit.com/r/";

const POST_ID_SEGMENT: &str = "/comments/";

/// Shape rules for acceptable post URLs.
///
/// A post URL is absolute, starts with the forum's listing prefix, carries a
/// `/comments/` segment after that prefix and has something after the segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRules {
    listing_prefix: String,
}

impl UrlRules {
    pub fn new(listing_prefix: impl Into<String>) -> Self {
        Self {
            listing_prefix: listing_prefix.into(),
        }
    }

    pub fn listing_prefix(&self) -> &str {
        &self.listing_prefix
    }

    pub fn is_valid_post_url(&self, url: &str) -> bool {
        if url.is_empty() || url.chars().any(char::is_whitespace) {
            return false;
        }
        let Some(rest) = url.strip_prefix(self.listing_prefix.as_str()) else {
            return false;
        };
        let Some(idx) = rest.find(POST_ID_SEGMENT) else {
            return false;
        };
        let after_segment = &rest[idx + POST_ID_SEGMENT.len()..];
        if after_segment.trim_matches('/').is_empty() {
            return false;
        }
        matches!(Url::parse(url), Ok(parsed) if matches!(parsed.scheme(), "http" | "https"))
    }
}

impl Default for UrlRules {
    fn default() -> Self {
        Self::new(DEFAULT_POST_PREFIX)
    }
}

/// Checks `url` against the default forum prefix.
pub fn is_valid_post_url(url: &str) -> bool {
    UrlRules::default().is_valid_post_url(url)
}
