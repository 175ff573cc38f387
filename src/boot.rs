//! Boot parameters and initial content
//!
//! A launch location may carry `content` (plain or `b64:`-encoded text) or
//! `url` (fetched at boot) in its query string, or in the fragment when the
//! query has neither. Either key marks the document as externally supplied, so
//! persisted content never replaces it.

use std::time::Duration;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use thiserror::Error;

/// Prefix of base64url-encoded `content` values
pub const ENCODED_PREFIX: &str = "b64:";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Shown when nothing else supplies content
pub const DEFAULT_CONTENT: &str = r#"# markon

A distraction-free markdown editor. Start typing on the left; the preview on
the right follows along.

## Scroll sync

Scroll either side and the other side catches up to the same heading or
paragraph.

## Code blocks

```rust
fn main() {
    println!("highlighted lazily");
}
```

```python
def greet(name):
    return f"hello {name}"
```

## Persistence

Everything you type is saved in the background and restored next time.

> Tip: pass `?content=...` or `?url=...` to start from something else.
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootParams {
    /// Inline content, already decoded
    pub content: Option<String>,
    /// Remote document to fetch
    pub url: Option<String>,
    /// The `url` key was present, even with a blank value
    pub url_requested: bool,
}

impl BootParams {
    /// Parse a form-urlencoded query (a leading `?` or `#` is ignored)
    pub fn from_query(query: &str) -> Self {
        let query = query
            .strip_prefix('?')
            .or_else(|| query.strip_prefix('#'))
            .unwrap_or(query);

        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "content" if params.content.is_none() => {
                    params.content = Some(decode_content(&value));
                }
                "url" => {
                    params.url_requested = true;
                    let value = value.trim();
                    if params.url.is_none() && !value.is_empty() {
                        params.url = Some(value.to_string());
                    }
                }
                _ => {}
            }
        }
        params
    }

    /// Query string first; the fragment only when the query has neither key
    pub fn from_location(search: Option<&str>, fragment: Option<&str>) -> Self {
        let from_search = search.map(Self::from_query).unwrap_or_default();
        if from_search.has_external_content() {
            return from_search;
        }
        fragment.map(Self::from_query).unwrap_or_default()
    }

    pub fn has_external_content(&self) -> bool {
        self.content.is_some() || self.url_requested
    }
}

fn base64url() -> GeneralPurpose {
    GeneralPurpose::new(
        &alphabet::URL_SAFE,
        GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
    )
}

/// Decode a `content` value: `b64:<base64url>` is decoded, anything else
/// (including undecodable payloads) is used verbatim
pub fn decode_content(value: &str) -> String {
    let Some(payload) = value.strip_prefix(ENCODED_PREFIX) else {
        return value.to_string();
    };

    match base64url()
        .decode(payload.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    {
        Some(decoded) => decoded,
        None => {
            tracing::debug!("Boot content is not valid base64url, using it verbatim");
            value.to_string()
        }
    }
}

/// Inverse of [`decode_content`] for encoded values
pub fn encode_content(text: &str) -> String {
    format!("{}{}", ENCODED_PREFIX, base64url().encode(text))
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(u16),
}

/// Retrieves remote documents
pub trait ContentFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP(S) fetcher
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl ContentFetcher for HttpFetcher {
    fn fetch(&self, raw: &str) -> Result<String, FetchError> {
        let parsed = url::Url::parse(raw).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(raw.to_string()));
        }

        let response = self.client.get(parsed).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }
}

/// Where the initial document came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Inline,
    Remote(String),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialContent {
    pub text: String,
    pub source: ContentSource,
    /// Stored content must not replace this document
    pub external: bool,
}

/// Pick the boot document: inline content, then a remote fetch, then `default`.
///
/// A failed fetch falls back to `default` but still counts as external, so a
/// late `CONTENT_LOADED` cannot replace what the user asked for.
pub fn resolve_initial_content(
    params: &BootParams,
    default: &str,
    fetcher: Option<&dyn ContentFetcher>,
) -> InitialContent {
    let external = params.has_external_content();

    if let Some(content) = &params.content {
        return InitialContent {
            text: content.clone(),
            source: ContentSource::Inline,
            external,
        };
    }

    if let Some(url) = &params.url {
        match fetcher.map(|fetcher| fetcher.fetch(url)) {
            Some(Ok(text)) => {
                tracing::info!(url = %url, bytes = text.len(), "Fetched boot content");
                return InitialContent {
                    text,
                    source: ContentSource::Remote(url.clone()),
                    external,
                };
            }
            Some(Err(e)) => tracing::warn!("Failed to fetch {}: {}", url, e),
            None => tracing::warn!("No fetcher available for {}", url),
        }
    }

    InitialContent {
        text: default.to_string(),
        source: ContentSource::Default,
        external,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_content_is_form_decoded() {
        let params = BootParams::from_query("?content=%23+Hello%0Aworld");
        assert_eq!(params.content.as_deref(), Some("# Hello\nworld"));
        assert!(params.has_external_content());
    }

    #[test]
    fn test_encoded_content_is_decoded() {
        let encoded = encode_content("## Über ünïcode?");
        assert!(encoded.starts_with("b64:"));
        assert_eq!(decode_content(&encoded), "## Über ünïcode?");
    }

    #[test]
    fn test_undecodable_content_is_verbatim() {
        assert_eq!(decode_content("b64:***"), "b64:***");
        assert_eq!(decode_content("plain"), "plain");
    }

    #[test]
    fn test_query_wins_over_fragment() {
        let params = BootParams::from_location(Some("?content=query"), Some("#content=fragment"));
        assert_eq!(params.content.as_deref(), Some("query"));

        let params = BootParams::from_location(Some("?theme=dark"), Some("#url=https://x.test/a.md"));
        assert_eq!(params.url.as_deref(), Some("https://x.test/a.md"));
        assert_eq!(params.content, None);

        assert!(!BootParams::from_location(None, None).has_external_content());
    }

    #[test]
    fn test_blank_url_is_still_external() {
        let params = BootParams::from_query("url=%20");
        assert_eq!(params.url, None);
        assert!(params.has_external_content());

        let params = BootParams::from_query("?url=");
        assert!(params.url_requested);
        assert!(params.has_external_content());
    }

    #[test]
    fn test_blank_search_url_hides_the_fragment() {
        let params = BootParams::from_location(Some("?url="), Some("#content=late"));
        assert_eq!(params.content, None);
        assert!(params.has_external_content());
    }
}
