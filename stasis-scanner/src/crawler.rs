use crate::error::{MirrorError, Result};
use crate::extract::extract_links;
use crate::frontier::Frontier;
use crate::normalize::{normalize, save_name};
use crate::output::OutputDir;
use crate::result::{ContentKind, FetchedPage};
use crate::sanitize::{restore_escaped_whitespace, sanitize};
use crate::transport::Transport;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Called after each stored path with the running count and the path.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Frozen state of a finished crawl.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub frontier: Frontier,
    pub pages: Vec<FetchedPage>,
}

/// Walks every path of the origin reachable from `/`, storing each one once.
pub struct Crawler<T: Transport> {
    transport: T,
    output: OutputDir,
    origin_base: String,
    threads: usize,
    progress_callback: Option<ProgressCallback>,
}

impl<T: Transport> Crawler<T> {
    /// `origin_base` is the absolute base URL the site uses in its own
    /// content, e.g. `https://blog.example.org/`.
    pub fn new(transport: T, output: OutputDir, origin_base: impl Into<String>) -> Self {
        Self {
            transport,
            output,
            origin_base: origin_base.into(),
            threads: 1,
            progress_callback: None,
        }
    }

    /// Number of paths fetched concurrently per round. One keeps the crawl
    /// strictly sequential.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn output(&self) -> &OutputDir {
        &self.output
    }

    /// Crawl until no unvisited path remains.
    ///
    /// Each round claims up to `threads` paths, fetches them together and then
    /// records the results, so the frontier only ever changes here. The first
    /// failure aborts the crawl; files already written stay on disk.
    pub async fn crawl(&self) -> Result<CrawlOutcome> {
        info!(
            "Starting crawl of {} with {} concurrent fetches",
            self.origin_base, self.threads
        );

        let mut frontier = Frontier::seeded();
        let mut pages = Vec::new();

        loop {
            let batch = frontier.claim_batch(self.threads);
            if batch.is_empty() {
                break;
            }

            let fetched = try_join_all(batch.iter().map(|path| self.fetch_and_persist(path))).await?;

            for page in fetched {
                frontier.mark_visited(&page.path, page.stored_name.clone(), page.save_path.clone())?;
                let added = frontier.push_all(&page.links_found);
                debug!(
                    "{} -> {} links, {} new",
                    page.path,
                    page.links_found.len(),
                    added
                );
                let path = page.path.clone();
                pages.push(page);

                if let Some(ref callback) = self.progress_callback {
                    callback(pages.len(), path);
                }
            }
        }

        info!("Crawl complete. Stored {} paths", pages.len());
        Ok(CrawlOutcome { frontier, pages })
    }

    /// Fetch one path and store it under its normalized name.
    ///
    /// Text content is sanitized before it is written and scanned for links;
    /// anything else is written untouched.
    pub async fn fetch_and_persist(&self, path: &str) -> Result<FetchedPage> {
        let response = self.transport.fetch(path).await?;
        if !response.is_success() {
            return Err(MirrorError::FetchFailure {
                url: response.url,
                status: response.status,
            });
        }

        let stored_name = normalize(path);
        let save_path = save_name(&stored_name);

        let (kind, size, links_found) = if response.is_text() {
            let text = String::from_utf8(response.body).map_err(|_| MirrorError::Decode {
                path: path.to_string(),
            })?;
            let cleaned = restore_escaped_whitespace(&sanitize(&self.origin_base, &text));
            self.output.write_text(&save_path, &cleaned)?;
            let links = extract_links(&self.origin_base, &cleaned)?;
            (ContentKind::Text, cleaned.len(), links)
        } else {
            self.output.write_bytes(&save_path, &response.body)?;
            (ContentKind::Binary, response.body.len(), Vec::new())
        };

        Ok(FetchedPage {
            path: path.to_string(),
            url: response.url,
            status_code: response.status,
            stored_name,
            save_path,
            kind,
            size,
            links_found,
        })
    }
}
