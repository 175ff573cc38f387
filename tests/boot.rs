//! Boot tests - launch parameters, remote content and the fallback document

use std::cell::Cell;

use markon::boot::{
    encode_content, resolve_initial_content, BootParams, ContentFetcher, ContentSource,
    FetchError, DEFAULT_CONTENT,
};

struct StubFetcher {
    result: Result<String, u16>,
    calls: Cell<usize>,
}

impl StubFetcher {
    fn ok(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            calls: Cell::new(0),
        }
    }

    fn status(code: u16) -> Self {
        Self {
            result: Err(code),
            calls: Cell::new(0),
        }
    }
}

impl ContentFetcher for StubFetcher {
    fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone().map_err(FetchError::Status)
    }
}

#[test]
fn test_no_params_uses_default_and_allows_restore() {
    let initial = resolve_initial_content(&BootParams::default(), DEFAULT_CONTENT, None);
    assert_eq!(initial.text, DEFAULT_CONTENT);
    assert_eq!(initial.source, ContentSource::Default);
    assert!(!initial.external);
}

#[test]
fn test_encoded_content_round_trips_through_the_query() {
    let text = "# Notes\n\n- [x] done & dusted\n";
    let query = format!("?content={}", encode_content(text));
    let params = BootParams::from_query(&query);

    let initial = resolve_initial_content(&params, DEFAULT_CONTENT, None);
    assert_eq!(initial.text, text);
    assert_eq!(initial.source, ContentSource::Inline);
    assert!(initial.external);
}

#[test]
fn test_inline_content_skips_the_fetch() {
    let fetcher = StubFetcher::ok("remote");
    let params = BootParams::from_query("content=inline&url=https://example.test/a.md");

    let initial = resolve_initial_content(&params, DEFAULT_CONTENT, Some(&fetcher));
    assert_eq!(initial.text, "inline");
    assert_eq!(fetcher.calls.get(), 0);
}

#[test]
fn test_url_content_is_fetched() {
    let fetcher = StubFetcher::ok("# Remote doc");
    let params = BootParams::from_location(None, Some("#url=https%3A%2F%2Fexample.test%2Fa.md"));

    let initial = resolve_initial_content(&params, DEFAULT_CONTENT, Some(&fetcher));
    assert_eq!(initial.text, "# Remote doc");
    assert_eq!(
        initial.source,
        ContentSource::Remote("https://example.test/a.md".to_string())
    );
    assert!(initial.external);
}

#[test]
fn test_failed_fetch_falls_back_but_stays_external() {
    let fetcher = StubFetcher::status(404);
    let params = BootParams::from_query("url=https://example.test/missing.md");

    let initial = resolve_initial_content(&params, "fallback", Some(&fetcher));
    assert_eq!(initial.text, "fallback");
    assert_eq!(initial.source, ContentSource::Default);
    assert!(initial.external);
    assert_eq!(fetcher.calls.get(), 1);
}

#[test]
fn test_default_content_has_headings_and_code() {
    let tree = markon::preview::render_preview(DEFAULT_CONTENT);
    assert!(tree.headings().count() >= 3);
    assert!(tree.code_blocks().len() >= 2);
}

#[test]
fn test_empty_url_keeps_the_default_and_blocks_restore() {
    let fetcher = StubFetcher::ok("remote");
    let params = BootParams::from_query("?url=");

    let initial = resolve_initial_content(&params, DEFAULT_CONTENT, Some(&fetcher));
    assert_eq!(initial.text, DEFAULT_CONTENT);
    assert_eq!(initial.source, ContentSource::Default);
    assert!(initial.external);
    assert_eq!(fetcher.calls.get(), 0);
}
