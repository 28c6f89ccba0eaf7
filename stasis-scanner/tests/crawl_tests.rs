// Crawl tests against an in-memory site

use stasis_scanner::error::{MirrorError, Result};
use stasis_scanner::{ContentKind, Crawler, FetchResponse, LinkRecord, OutputDir, Transport};
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

const ORIGIN: &str = "https://site.test/";

/// Serves canned responses and counts how often each path is requested.
struct StaticSite {
    pages: HashMap<String, (Option<&'static str>, Vec<u8>)>,
    hits: Mutex<HashMap<String, usize>>,
}

impl StaticSite {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            hits: Mutex::new(HashMap::new()),
        }
    }

    fn html(mut self, path: &str, body: &str) -> Self {
        self.pages
            .insert(path.to_string(), (Some("UTF-8"), body.as_bytes().to_vec()));
        self
    }

    fn binary(mut self, path: &str, body: &[u8]) -> Self {
        self.pages.insert(path.to_string(), (None, body.to_vec()));
        self
    }

    fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

impl Transport for StaticSite {
    async fn fetch(&self, path: &str) -> Result<FetchResponse> {
        *self.hits.lock().unwrap().entry(path.to_string()).or_default() += 1;
        let url = format!("http://upstream.test{}", path);
        Ok(match self.pages.get(path) {
            Some((encoding, body)) => FetchResponse {
                url,
                status: 200,
                body: body.clone(),
                declared_encoding: encoding.map(str::to_string),
            },
            None => FetchResponse {
                url,
                status: 404,
                body: Vec::new(),
                declared_encoding: None,
            },
        })
    }
}

fn link(path: &str) -> String {
    format!(r#"<a href="{}{}">x</a>"#, ORIGIN, path)
}

// ============================================================================
// Frontier termination
// ============================================================================

#[tokio::test]
async fn test_cyclic_site_terminates_with_every_path_visited_once() {
    let site = StaticSite::new()
        .html("/", &format!("{}{}", link("a/"), link("b/")))
        .html("/a/", &format!("{}{}{}", link(""), link("b/"), link("a/deep/")))
        .html("/b/", &format!("{}{}", link("a/"), link("a/deep/")))
        .html("/a/deep/", &link(""));

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::new(&site, OutputDir::new(dir.path()), ORIGIN);
    let outcome = crawler.crawl().await.unwrap();

    assert_eq!(outcome.frontier.len(), 4);
    assert_eq!(outcome.frontier.unvisited_count(), 0);
    for path in ["/", "/a/", "/b/", "/a/deep/"] {
        assert_eq!(site.hits(path), 1, "{} fetched more than once", path);
        assert!(outcome.frontier.get(path).unwrap().is_visited());
    }
}

#[tokio::test]
async fn test_records_carry_stored_and_save_names() {
    let site = StaticSite::new()
        .html(
            "/",
            &format!(
                r#"<script src="{o}wp-includes/js/wp-embed.min.js?ver=4.9.7"></script><a href="{o}feed/?x">Feed</a>"#,
                o = ORIGIN
            ),
        )
        .binary("/wp-includes/js/wp-embed.min.js?ver=4.9.7", b"!function(){}")
        .html("/feed/", "<rss></rss>");

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::new(&site, OutputDir::new(dir.path()), ORIGIN);
    let outcome = crawler.crawl().await.unwrap();

    assert_eq!(
        outcome.frontier.get("/"),
        Some(&LinkRecord::Visited {
            stored_name: "/".to_string(),
            save_path: "/index.html".to_string(),
        })
    );
    assert_eq!(
        outcome.frontier.get("/wp-includes/js/wp-embed.min.js?ver=4.9.7"),
        Some(&LinkRecord::Visited {
            stored_name: "/wp-includes/js/wp-embed.min.ver_4.9.7.js".to_string(),
            save_path: "/wp-includes/js/wp-embed.min.ver_4.9.7.js".to_string(),
        })
    );
    assert_eq!(
        outcome.frontier.get("/feed/"),
        Some(&LinkRecord::Visited {
            stored_name: "/feed.xml".to_string(),
            save_path: "/feed.xml".to_string(),
        })
    );
    assert!(dir.path().join("wp-includes/js/wp-embed.min.ver_4.9.7.js").exists());
    assert!(dir.path().join("feed.xml").exists());

    let kinds: Vec<ContentKind> = outcome.pages.iter().map(|p| p.kind).collect();
    assert_eq!(kinds, vec![ContentKind::Text, ContentKind::Binary, ContentKind::Text]);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_missing_page_is_fatal() {
    let site = StaticSite::new().html("/", &link("gone/"));

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::new(&site, OutputDir::new(dir.path()), ORIGIN);

    match crawler.crawl().await {
        Err(MirrorError::FetchFailure { url, status }) => {
            assert_eq!(url, "http://upstream.test/gone/");
            assert_eq!(status, 404);
        }
        other => panic!("expected FetchFailure, got {:?}", other.map(|o| o.pages.len())),
    }
}

#[tokio::test]
async fn test_invalid_utf8_under_utf8_declaration_is_fatal() {
    let mut site = StaticSite::new();
    site.pages
        .insert("/".to_string(), (Some("utf-8"), vec![0x3c, 0xff, 0xfe, 0x3e]));

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::new(&site, OutputDir::new(dir.path()), ORIGIN);

    assert!(matches!(
        crawler.crawl().await,
        Err(MirrorError::Decode { path }) if path == "/"
    ));
}
