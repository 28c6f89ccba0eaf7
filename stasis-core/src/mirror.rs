use crate::config::MirrorConfig;
use crate::fingerprint::{FingerprintedAsset, fingerprint_assets};
use crate::mapping::NameMapping;
use crate::rewrite::{RewriteRules, rewrite_documents};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use stasis_scanner::error::Result;
use stasis_scanner::{Crawler, FetchedPage, Frontier, HttpTransport, OutputDir, Transport};
use std::sync::Arc;
use tracing::info;

/// Callback for reporting phase changes of a mirror run
pub type MirrorProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Everything a finished run produced.
#[derive(Debug)]
pub struct MirrorOutcome {
    pub frontier: Frontier,
    pub pages: Vec<FetchedPage>,
    pub mapping: NameMapping,
    pub fingerprinted: Vec<FingerprintedAsset>,
    pub rewritten_documents: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Mirror the configured site over HTTP.
pub async fn execute_mirror(
    config: &MirrorConfig,
    progress_callback: Option<MirrorProgressCallback>,
    show_progress_bar: bool,
) -> Result<MirrorOutcome> {
    let transport = HttpTransport::with_timeout(
        &config.upstream,
        &config.virtual_host()?,
        config.timeout_secs,
    )?;
    run_pipeline(config, transport, progress_callback, show_progress_bar).await
}

/// Run crawl, fingerprinting and rewrite in order against any transport.
///
/// Each phase starts only once the previous one has finished, so
/// fingerprinting sees the final stored bytes and the rewrite sees final
/// names. Any error aborts the run; output already written stays on disk.
pub async fn run_pipeline<T: Transport>(
    config: &MirrorConfig,
    transport: T,
    progress_callback: Option<MirrorProgressCallback>,
    show_progress_bar: bool,
) -> Result<MirrorOutcome> {
    let started_at = Utc::now();
    let config = config.clone().validate()?;
    let report = |msg: String| {
        if let Some(ref callback) = progress_callback {
            callback(msg);
        }
    };

    let output = OutputDir::new(&config.output_dir);
    output.prepare(config.force)?;

    let progress_bar = if show_progress_bar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let mut crawler = Crawler::new(transport, output.clone(), config.origin_base.clone())
        .with_threads(config.threads);
    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        crawler = crawler.with_progress_callback(Arc::new(move |count: usize, path: String| {
            pb_clone.set_message(format!("Crawling... {} paths stored, last {}", count, path));
            pb_clone.tick();
        }));
    }

    report(format!("Crawling {} via {}", config.origin_base, config.upstream));
    let crawl = match crawler.crawl().await {
        Ok(crawl) => crawl,
        Err(e) => {
            if let Some(ref pb) = progress_bar {
                pb.abandon_with_message("Crawl failed");
            }
            return Err(e);
        }
    };

    if let Some(ref pb) = progress_bar {
        pb.set_message("Fingerprinting assets...");
    }
    report(format!("Crawled {} paths, fingerprinting assets", crawl.pages.len()));
    let fingerprints = fingerprint_assets(&crawl.frontier, &output)?;

    if let Some(ref pb) = progress_bar {
        pb.set_message("Rewriting documents...");
    }
    report(format!(
        "Fingerprinted {} assets, rewriting documents",
        fingerprints.assets.len()
    ));
    let rules = RewriteRules::new(&config.origin_base, &config.target_base, &fingerprints.mapping);
    let rewritten_documents = rewrite_documents(&output, &rules)?;

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Mirror complete! {} paths stored in {}",
            crawl.pages.len(),
            output.root().display()
        ));
    }
    info!(
        "Mirror of {} complete: {} paths, {} fingerprinted, {} documents rewritten",
        config.origin_base,
        crawl.pages.len(),
        fingerprints.assets.len(),
        rewritten_documents
    );

    Ok(MirrorOutcome {
        frontier: crawl.frontier,
        pages: crawl.pages,
        mapping: fingerprints.mapping,
        fingerprinted: fingerprints.assets,
        rewritten_documents,
        started_at,
        finished_at: Utc::now(),
    })
}
