//! Bounded-concurrency record enrichment
//!
//! Each record of a page is enriched in its own task:
//! - At most `width` tasks hold a permit at once (tokio `Semaphore`)
//! - Tasks are joined through a `JoinSet`; a task that panics drops only its
//!   own record
//! - Results are re-sorted by input position so a page keeps its API order

use crate::crawler::asset::AssetDownloader;
use crate::crawler::detail::DetailEnricher;
use crate::record::{EnrichedRecord, SearchRecord};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outputs of a fan-out, keyed by input position
#[derive(Debug)]
pub struct FanOut<O> {
    /// `(input position, output)` pairs, sorted by position
    pub completed: Vec<(usize, O)>,

    /// Number of tasks that panicked or were cancelled
    pub failed: usize,
}

/// Runs `worker` over every input with at most `width` tasks in flight
///
/// Returns once every task has finished.
pub async fn fan_out<I, O, F, Fut>(width: usize, inputs: Vec<I>, mut worker: F) -> FanOut<O>
where
    F: FnMut(I) -> Fut,
    Fut: Future<Output = O> + Send + 'static,
    O: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(width.max(1)));
    let mut join_set = JoinSet::new();
    let total = inputs.len();

    for (position, input) in inputs.into_iter().enumerate() {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let task = worker(input);

        join_set.spawn(async move {
            let _permit = permit;
            (position, task.await)
        });
    }

    let mut completed = Vec::with_capacity(total);
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(pair) => completed.push(pair),
            Err(e) => tracing::error!("Enrichment task failed: {}", e),
        }
    }

    completed.sort_by_key(|(position, _)| *position);
    FanOut {
        failed: total - completed.len(),
        completed,
    }
}

/// Result of enriching one page of records
#[derive(Debug, Default)]
pub struct EnrichmentReport {
    /// Enriched records in input order, minus failed tasks
    pub records: Vec<EnrichedRecord>,

    /// Records dropped because their task failed
    pub failed: usize,

    /// Records whose detail page could not be fetched
    pub details_degraded: usize,

    /// Records without a stored image
    pub images_missing: usize,
}

struct Enriched {
    record: EnrichedRecord,
    detail_found: bool,
    image_found: bool,
}

/// Runs detail and image enrichment for the records of a page
pub struct EnrichmentPool {
    enricher: Arc<DetailEnricher>,
    downloader: Arc<AssetDownloader>,
    assets_dir: PathBuf,
    width: usize,
}

impl EnrichmentPool {
    /// Creates a pool
    ///
    /// # Arguments
    ///
    /// * `enricher` - Detail page fetcher shared by every task
    /// * `downloader` - Image downloader shared by every task
    /// * `assets_dir` - Destination for downloaded images
    /// * `width` - Maximum number of records enriched concurrently
    pub fn new(
        enricher: Arc<DetailEnricher>,
        downloader: Arc<AssetDownloader>,
        assets_dir: PathBuf,
        width: usize,
    ) -> Self {
        Self {
            enricher,
            downloader,
            assets_dir,
            width: width.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Enriches every record, waiting for all tasks to finish
    pub async fn process(&self, records: Vec<SearchRecord>) -> EnrichmentReport {
        if records.is_empty() {
            return EnrichmentReport::default();
        }

        let enricher = Arc::clone(&self.enricher);
        let downloader = Arc::clone(&self.downloader);
        let assets_dir = self.assets_dir.clone();

        let outcome = fan_out(self.width, records, move |record| {
            let enricher = Arc::clone(&enricher);
            let downloader = Arc::clone(&downloader);
            let assets_dir = assets_dir.clone();
            async move { enrich_record(&enricher, &downloader, &assets_dir, record).await }
        })
        .await;

        let mut report = EnrichmentReport {
            failed: outcome.failed,
            ..Default::default()
        };
        for (_, enriched) in outcome.completed {
            if !enriched.detail_found {
                report.details_degraded += 1;
            }
            if !enriched.image_found {
                report.images_missing += 1;
            }
            report.records.push(enriched.record);
        }

        report
    }
}

async fn enrich_record(
    enricher: &DetailEnricher,
    downloader: &AssetDownloader,
    assets_dir: &Path,
    record: SearchRecord,
) -> Enriched {
    let mut enriched = EnrichedRecord::from_search(record);

    let detail = enricher.fetch(&enriched.detail_url).await;
    let detail_found = detail.is_some();
    if let Some(detail) = detail {
        enriched.apply_detail(detail);
    }

    enriched.local_image_path = downloader.fetch(&enriched.image_url, assets_dir).await;
    let image_found = enriched.local_image_path.is_some();

    tracing::debug!(
        "Enriched '{}' (detail: {}, image: {})",
        enriched.title,
        detail_found,
        image_found
    );

    Enriched {
        record: enriched,
        detail_found,
        image_found,
    }
}
